pub mod application;
pub mod job;
pub mod user;

pub use application::{Application, ApplicationStatus};
pub use job::{EmploymentType, Job};
pub use user::{ProfileRow, Role, User};
