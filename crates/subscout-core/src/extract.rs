//! Host normalization and free-text subdomain extraction

use regex::Regex;

const SCHEMES: [&str; 2] = ["http://", "https://"];

/// Strip a leading `http://` or `https://` (any case)
pub fn strip_scheme(value: &str) -> &str {
    for scheme in SCHEMES {
        if let Some(prefix) = value.get(..scheme.len()) {
            if prefix.eq_ignore_ascii_case(scheme) {
                return &value[scheme.len()..];
            }
        }
    }
    value
}

/// Canonical form of an emitted host: scheme stripped, lowercased.
///
/// Ports, paths and wildcard labels are left untouched.
pub fn normalize_host(value: &str) -> String {
    strip_scheme(value).to_lowercase()
}

/// Pulls `*.domain` host names out of arbitrary text (HTML, CSV, plain lists)
#[derive(Debug, Clone)]
pub struct SubdomainExtractor {
    pattern: Regex,
}

impl SubdomainExtractor {
    pub fn new(domain: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"(?i)[a-z0-9\*_.-]+\.{}",
            regex::escape(domain)
        ))?;
        Ok(Self { pattern })
    }

    /// All matches in `text`, in order of appearance
    pub fn extract(&self, text: &str) -> Vec<String> {
        self.pattern
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }
}
