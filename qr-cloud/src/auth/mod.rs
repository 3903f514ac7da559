//! Authentication: staff JWTs, table sessions, rate limits and plan quotas

pub mod quota;
pub mod rate_limit;
pub mod session;
pub mod staff_auth;

pub use session::TableSession;
pub use staff_auth::{StaffIdentity, require_manager};
