//! Provider configuration - raw API keys per source
//!
//! Stored as a JSON object keyed by lowercase source name:
//!
//! ```json
//! {
//!   "fofa": ["user@example.com:0123456789abcdef"],
//!   "securitytrails": ["key-one", "key-two"]
//! }
//! ```
//!
//! Environment variables `SUBSCOUT_<NAME>_KEYS` (comma-separated) are merged
//! on top of the file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::source::Source;

/// Default file name inside the config directory
pub const PROVIDER_CONFIG_FILE: &str = "provider-config.json";

/// Errors loading or saving the provider config
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read provider config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid provider config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Raw API keys for every configured source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderConfig {
    keys: BTreeMap<String, Vec<String>>,
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// `~/.config/subscout/provider-config.json` (platform equivalent)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("subscout").join(PROVIDER_CONFIG_FILE))
    }

    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: ProviderConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        info!(
            path = %path.display(),
            sources = config.keys.len(),
            "[ProviderConfig] Loaded provider keys"
        );
        Ok(config.normalized())
    }

    /// Load a config file, or start empty when it does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "[ProviderConfig] No provider config, using empty");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write the config as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let content = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        std::fs::write(path, content).map_err(io_err)
    }

    /// Set the raw keys of one source
    pub fn insert(&mut self, source: &str, keys: Vec<String>) {
        self.keys.insert(source.to_lowercase(), keys);
    }

    /// Raw keys configured for `source`
    pub fn keys_for(&self, source: &str) -> &[String] {
        self.keys
            .get(&source.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Merge `SUBSCOUT_<NAME>_KEYS` variables for the given source names
    pub fn merge_env<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        self.merge_env_with(names, |var| std::env::var(var).ok());
    }

    /// Same as `merge_env` with an injectable lookup
    pub fn merge_env_with<'a, F>(&mut self, names: impl IntoIterator<Item = &'a str>, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for name in names {
            let var = env_var_name(name);
            if let Some(value) = lookup(&var) {
                let keys: Vec<String> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .collect();
                if !keys.is_empty() {
                    debug!(source = name, var = %var, "[ProviderConfig] Keys from environment");
                    self.insert(name, keys);
                }
            }
        }
    }

    /// Inject keys into every source that has an entry. Returns how many were configured.
    pub fn apply<'a>(&self, sources: impl IntoIterator<Item = &'a Arc<dyn Source>>) -> usize {
        let mut configured = 0;
        for source in sources {
            let keys = self.keys_for(source.name());
            if !keys.is_empty() {
                source.add_api_keys(keys);
                configured += 1;
            }
        }
        configured
    }

    fn normalized(self) -> Self {
        Self {
            keys: self
                .keys
                .into_iter()
                .map(|(name, keys)| (name.to_lowercase(), keys))
                .collect(),
        }
    }
}

/// `SUBSCOUT_<NAME>_KEYS`, with non-alphanumerics mapped to `_`
pub fn env_var_name(source: &str) -> String {
    let name: String = source
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("SUBSCOUT_{}_KEYS", name)
}
