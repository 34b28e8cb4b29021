//! # Subscout Core Library
//!
//! Plugin contract and shared types for passive subdomain discovery.
//!
//! ## Modules
//!
//! - `domain` - Results, statistics, credentials and selection criteria
//! - `source` - The `Source` trait every provider implements, plus `ResultSink`
//! - `session` - The HTTP capability sources consume (`Session`)
//! - `extract` - Host normalization and free-text subdomain extraction
//! - `config` - Provider credential configuration file
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   run(cancel, domain, session)   ┌─────────────────────┐
//! │    Agent     │ ───────────────────────────────▶ │  Arc<dyn Source>    │
//! │ (engine crate)│ ◀─────── mpsc::Receiver ──────── │  fofa, crtsh, ...   │
//! └──────────────┘         ScrapeResult             └─────────┬───────────┘
//!                                                             │ simple_get
//!                                                             ▼
//!                                                   ┌─────────────────────┐
//!                                                   │  Arc<dyn Session>   │
//!                                                   └─────────────────────┘
//! ```

pub mod config;
pub mod domain;
pub mod extract;
pub mod session;
pub mod source;

pub use config::{ConfigError, ProviderConfig};
pub use domain::*;
pub use extract::{normalize_host, strip_scheme, SubdomainExtractor};
pub use session::{discard_failed, Session, SessionError};
pub use source::{ResultSink, Source, RESULT_BUFFER};

/// Cancellation handle threaded from the caller through every source and request.
pub use tokio_util::sync::CancellationToken;
