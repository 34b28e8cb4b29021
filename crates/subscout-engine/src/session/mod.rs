//! Concrete HTTP session shared by every source of an enumeration

mod http;
mod rate_limit;

pub use http::{HttpSession, SessionConfig, DEFAULT_USER_AGENT};
pub use rate_limit::{RateLimitConfig, RateLimiter};
