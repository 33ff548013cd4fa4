pub mod admin_gate;
pub mod rate_limit;
