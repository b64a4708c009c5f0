//! Cross-cutting HTTP middleware applied by the router

pub mod rate_limit;
pub mod security_headers;

pub use rate_limit::{rate_limit, IpRateLimiter};
pub use security_headers::with_security_headers;
