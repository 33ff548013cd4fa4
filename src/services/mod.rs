pub mod application_service;
pub mod notice_service;
pub mod remote;
pub mod session_service;
pub mod supabase_service;
