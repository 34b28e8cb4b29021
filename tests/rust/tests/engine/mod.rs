//! Engine integration tests
//!
//! Source selection, concurrent aggregation, cancellation and statistics.

mod aggregation;
mod selection;
