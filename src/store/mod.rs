pub mod fence;
pub mod filter;
pub mod job_store;
pub mod state;

pub use filter::{JobFilters, KeywordMode};
pub use job_store::JobStore;
pub use state::{JobAction, JobState};
