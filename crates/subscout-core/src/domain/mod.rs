//! Domain types shared by sources, the agent and callers
//!
//! - Results emitted on the merged stream (`ScrapeResult`, `ScrapeError`)
//! - Per-source run statistics (`Statistics`, `StatsRecorder`)
//! - Credential records and name-seeded key picking (`KeyRing`)
//! - Source selection criteria (`SelectionCriteria`)

mod credential;
mod result;
mod selection;
mod statistics;

pub use credential::*;
pub use result::*;
pub use selection::*;
pub use statistics::*;
