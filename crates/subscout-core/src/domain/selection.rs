//! Source selection criteria

use serde::{Deserialize, Serialize};

/// Which sources an agent should run.
///
/// Resolution order: `use_all`, else explicit `sources`, else every default
/// source; then `exclude` is removed; then, with `recursive_only`, every source
/// without recursive support is removed. Names match case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionCriteria {
    /// Explicit source names to use
    pub sources: Vec<String>,
    /// Source names to remove after resolution
    pub exclude: Vec<String>,
    /// Start from every registered source
    pub use_all: bool,
    /// Keep only recursion-capable sources
    pub recursive_only: bool,
}

impl SelectionCriteria {
    /// Default sources, no exclusions
    pub fn new() -> Self {
        Self::default()
    }

    /// Every registered source
    pub fn all() -> Self {
        Self {
            use_all: true,
            ..Self::default()
        }
    }

    pub fn with_sources<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn excluding<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_use_all(mut self, use_all: bool) -> Self {
        self.use_all = use_all;
        self
    }

    pub fn with_recursive_only(mut self, recursive_only: bool) -> Self {
        self.recursive_only = recursive_only;
        self
    }
}
