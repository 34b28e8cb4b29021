//! # Subscout Engine
//!
//! Drives many sources concurrently against one domain.
//!
//! ```text
//! SourceRegistry ──► Agent::new(criteria) ──► Agent::enumerate(domain)
//!                                                  │
//!                          ┌───────────────────────┼───────────────────────┐
//!                          ▼                       ▼                       ▼
//!                    Source::run              Source::run             Source::run
//!                          │                       │                       │
//!                          └──────── forwarders ───┴──► merged mpsc ──► caller
//! ```
//!
//! All sources share one `CancellationToken` and one `Session`.

pub mod agent;
pub mod aggregation;
pub mod registry;
pub mod report;
pub mod session;

pub use agent::Agent;
pub use aggregation::{DeliveryCounter, Enumeration, MERGED_BUFFER};
pub use registry::{SourceInfo, SourceRegistry};
pub use report::SourceReport;
pub use session::{HttpSession, RateLimitConfig, RateLimiter, SessionConfig, DEFAULT_USER_AGENT};
