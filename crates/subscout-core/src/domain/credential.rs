//! Credential records - raw key parsing and name-seeded key selection
//!
//! Raw keys arrive as plain strings from the provider config. Their shape is
//! provider-defined: a single token (`"abc123"`) or a pair split on the first
//! separator (`"user@example.com:secret"`).

use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A credential record a source can authenticate with
pub trait ApiKey: Clone + Send + Sync + 'static {
    /// Whether the record carries everything the provider needs
    fn is_usable(&self) -> bool;
}

impl ApiKey for String {
    fn is_usable(&self) -> bool {
        !self.trim().is_empty()
    }
}

/// Username (or email/id) plus secret
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub username: String,
    pub secret: String,
}

impl KeyPair {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }
}

impl ApiKey for KeyPair {
    fn is_usable(&self) -> bool {
        !self.username.is_empty() && !self.secret.is_empty()
    }
}

/// Parse `"user:secret"` strings, splitting on the first `:`.
///
/// Entries without a separator are dropped.
pub fn parse_key_pairs(raw: &[String]) -> Vec<KeyPair> {
    raw.iter()
        .filter_map(|key| key.trim().split_once(':'))
        .map(|(username, secret)| KeyPair::new(username, secret))
        .collect()
}

/// Parse single-token keys, dropping blank entries
pub fn parse_single_keys(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|key| key.trim())
        .filter(|key| !key.is_empty())
        .map(str::to_string)
        .collect()
}

/// Stable 64-bit FNV-1a hash, used to seed per-source key selection
pub fn name_seed(name: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    name.bytes()
        .fold(OFFSET, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(PRIME))
}

/// Credential set of one source with pseudo-random selection.
///
/// The generator is seeded from the source name, so the sequence of picks is
/// reproducible for a given source and differs between sources.
#[derive(Debug)]
pub struct KeyRing<K> {
    keys: RwLock<Vec<K>>,
    rng: Mutex<StdRng>,
}

impl<K: ApiKey> KeyRing<K> {
    pub fn new(source_name: &str) -> Self {
        Self {
            keys: RwLock::new(Vec::new()),
            rng: Mutex::new(StdRng::seed_from_u64(name_seed(source_name))),
        }
    }

    /// Replace every stored key. Unusable records are discarded.
    pub fn replace(&self, keys: Vec<K>) {
        *self.keys.write() = keys.into_iter().filter(|key| key.is_usable()).collect();
    }

    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.read().is_empty()
    }

    /// Pick one key, or `None` when no usable key is configured
    pub fn pick(&self) -> Option<K> {
        let keys = self.keys.read();
        if keys.is_empty() {
            return None;
        }
        let index = self.rng.lock().gen_range(0..keys.len());
        keys.get(index).cloned()
    }
}
