//! Agent - the selected set of sources for one enumeration session

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use subscout_core::{ScrapeResult, SelectionCriteria, Session, Source};

use crate::aggregation::{self, DeliveryCounter, Enumeration};
use crate::registry::SourceRegistry;
use crate::report::SourceReport;

struct Selected {
    source: Arc<dyn Source>,
    delivered: Arc<DeliveryCounter>,
}

/// Immutable working set of sources, keyed by lowercase name.
///
/// Holds no result state. Enumerations through one agent must not overlap:
/// each source resets its own statistics at the start of a run. After the
/// result stream closes, [`Agent::wait_finished`] waits for sources that were
/// stopped early.
pub struct Agent {
    sources: HashMap<String, Selected>,
    in_flight: Mutex<Option<JoinHandle<()>>>,
}

impl Agent {
    /// Resolve `criteria` against `registry`.
    ///
    /// `use_all` starts from the whole registry, otherwise explicit names,
    /// otherwise every default source. Excludes are removed next, then
    /// non-recursive sources when `recursive_only` is set. Unknown names are
    /// logged and dropped.
    pub fn new(registry: &SourceRegistry, criteria: &SelectionCriteria) -> Self {
        let mut sources: HashMap<String, Arc<dyn Source>> = HashMap::new();

        if criteria.use_all {
            for source in registry.sources() {
                sources.insert(source.name().to_lowercase(), source.clone());
            }
        } else if !criteria.sources.is_empty() {
            for name in &criteria.sources {
                let key = name.trim().to_lowercase();
                match registry.get(&key) {
                    Some(source) => {
                        sources.insert(key, source.clone());
                    }
                    None => warn!(source = %name, "[Agent] Unknown source, ignoring"),
                }
            }
        } else {
            for source in registry.sources().iter().filter(|s| s.is_default()) {
                sources.insert(source.name().to_lowercase(), source.clone());
            }
        }

        for name in &criteria.exclude {
            let key = name.trim().to_lowercase();
            if sources.remove(&key).is_none() && !registry.contains(&key) {
                warn!(source = %name, "[Agent] Unknown excluded source, ignoring");
            }
        }

        if criteria.recursive_only {
            sources.retain(|_, source| source.has_recursive_support());
        }

        let agent = Self {
            sources: sources
                .into_iter()
                .map(|(name, source)| {
                    let delivered = Arc::new(DeliveryCounter::new());
                    (name, Selected { source, delivered })
                })
                .collect(),
            in_flight: Mutex::new(None),
        };
        debug!(sources = ?agent.source_names(), "[Agent] Selected sources");
        agent
    }

    /// Working set, in no particular order
    pub fn sources(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.values().map(|selected| &selected.source)
    }

    /// Selected names, sorted
    pub fn source_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.sources.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Run every selected source against `domain` and merge their results.
    ///
    /// The returned stream closes once every source stream has closed, or
    /// promptly after `cancel` fires.
    pub fn enumerate(
        &self,
        cancel: &CancellationToken,
        domain: &str,
        session: Arc<dyn Session>,
    ) -> mpsc::Receiver<ScrapeResult> {
        self.start(cancel, domain, session, None)
    }

    /// Like [`Agent::enumerate`], cancelled automatically after `timeout`
    pub fn enumerate_with_timeout(
        &self,
        cancel: &CancellationToken,
        domain: &str,
        session: Arc<dyn Session>,
        timeout: Duration,
    ) -> mpsc::Receiver<ScrapeResult> {
        self.start(cancel, domain, session, Some(timeout))
    }

    /// Wait until every source of the last enumeration has returned.
    ///
    /// Resolves at once when nothing is in flight. Statistics read after
    /// this are final, and the next enumeration cannot overlap a stopped one.
    pub async fn wait_finished(&self) {
        let handle = self.in_flight.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "[Agent] Enumeration supervisor failed");
            }
        }
    }

    /// Statistics of every selected source.
    ///
    /// `results` and `errors` count what reached the merged stream, so their
    /// totals match what the consumer received even after a cancellation.
    pub fn statistics(&self) -> SourceReport {
        let mut report = SourceReport::new();
        for (name, selected) in &self.sources {
            let mut stats = selected.source.statistics();
            stats.results = selected.delivered.results();
            stats.errors = selected.delivered.errors();
            report.insert(name.clone(), stats);
        }
        report
    }

    fn start(
        &self,
        cancel: &CancellationToken,
        domain: &str,
        session: Arc<dyn Session>,
        deadline: Option<Duration>,
    ) -> mpsc::Receiver<ScrapeResult> {
        let mut in_flight = self.in_flight.lock();
        if in_flight.as_ref().is_some_and(|handle| !handle.is_finished()) {
            warn!(domain, "[Agent] Previous enumeration has not finished yet");
        }

        let Enumeration { results, finished } =
            aggregation::enumerate(self.working_set(), cancel, domain, session, deadline);
        *in_flight = Some(finished);
        results
    }

    fn working_set(&self) -> Vec<(Arc<dyn Source>, Arc<DeliveryCounter>)> {
        self.sources
            .values()
            .map(|selected| (selected.source.clone(), selected.delivered.clone()))
            .collect()
    }
}

impl fmt::Debug for Agent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Agent")
            .field("sources", &self.source_names())
            .finish()
    }
}
