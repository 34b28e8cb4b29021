//! Source Registry - catalogue of every known source
//!
//! Built once at startup and read-only afterwards. Lookups are by lowercase
//! name. Instances are shared: an agent holds clones of the same `Arc`s, so two
//! overlapping enumerations must not drive the same registry concurrently.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use subscout_core::{ProviderConfig, Source};
use tracing::{debug, warn};

/// Capability flags of a registered source
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceInfo {
    pub name: String,
    pub is_default: bool,
    pub has_recursive_support: bool,
    pub needs_key: bool,
}

impl SourceInfo {
    fn of(source: &dyn Source) -> Self {
        Self {
            name: source.name().to_string(),
            is_default: source.is_default(),
            has_recursive_support: source.has_recursive_support(),
            needs_key: source.needs_key(),
        }
    }
}

/// Ordered list of sources plus a name index
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
    by_name: HashMap<String, Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Build a registry from explicit instances. Later duplicates of a name are ignored.
    pub fn new(sources: Vec<Arc<dyn Source>>) -> Self {
        let mut ordered = Vec::with_capacity(sources.len());
        let mut by_name = HashMap::with_capacity(sources.len());

        for source in sources {
            let key = source.name().to_lowercase();
            if by_name.contains_key(&key) {
                warn!(source = %key, "[Registry] Duplicate source name, ignoring");
                continue;
            }
            by_name.insert(key, source.clone());
            ordered.push(source);
        }

        debug!(count = ordered.len(), "[Registry] Sources registered");
        Self {
            sources: ordered,
            by_name,
        }
    }

    /// Registry with every built-in provider
    pub fn with_all_sources() -> Self {
        Self::new(subscout_sources::all_sources())
    }

    /// Case-insensitive lookup
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Source>> {
        self.by_name.get(&name.to_lowercase())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// All sources in registration order
    pub fn sources(&self) -> &[Arc<dyn Source>] {
        &self.sources
    }

    pub fn names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Capability listing for `--list-sources`
    pub fn list(&self) -> Vec<SourceInfo> {
        self.sources.iter().map(|s| SourceInfo::of(s.as_ref())).collect()
    }

    /// Inject configured keys into matching sources
    pub fn apply_provider_config(&self, config: &ProviderConfig) -> usize {
        let configured = config.apply(&self.sources);
        debug!(configured, "[Registry] Applied provider keys");
        configured
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::with_all_sources()
    }
}

impl fmt::Debug for SourceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceRegistry")
            .field("sources", &self.names())
            .finish()
    }
}
