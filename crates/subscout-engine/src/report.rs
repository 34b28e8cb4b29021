//! Per-source statistics report

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde::Serialize;
use subscout_core::Statistics;

/// Statistics of every source an agent drove, ordered by name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SourceReport {
    entries: BTreeMap<String, Statistics>,
}

impl SourceReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, source: impl Into<String>, stats: Statistics) {
        self.entries.insert(source.into(), stats);
    }

    pub fn get(&self, source: &str) -> Option<&Statistics> {
        self.entries.get(source)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Statistics)> {
        self.entries.iter().map(|(name, stats)| (name.as_str(), stats))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_results(&self) -> usize {
        self.entries.values().map(|s| s.results).sum()
    }

    pub fn total_errors(&self) -> usize {
        self.entries.values().map(|s| s.errors).sum()
    }

    /// Plain-text table; skipped sources are listed separately below it
    pub fn render_table(&self) -> String {
        let width = self
            .entries
            .keys()
            .map(String::len)
            .max()
            .unwrap_or(0)
            .max("Source".len());

        let mut out = String::new();
        let _ = writeln!(
            out,
            "{:<width$}  {:>10}  {:>7}  {:>6}",
            "Source", "Duration", "Results", "Errors"
        );
        let _ = writeln!(out, "{}", "-".repeat(width + 31));

        let mut skipped = Vec::new();
        for (name, stats) in &self.entries {
            if stats.skipped {
                skipped.push(name.as_str());
                continue;
            }
            let _ = writeln!(
                out,
                "{:<width$}  {:>9.2}s  {:>7}  {:>6}",
                name,
                stats.time_taken.as_secs_f64(),
                stats.results,
                stats.errors
            );
        }

        if !skipped.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(
                out,
                "Skipped (no API key configured): {}",
                skipped.join(", ")
            );
        }
        out
    }
}
