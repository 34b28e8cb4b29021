//! Source - the plugin contract every provider implements
//!
//! A source runs at most once at a time. `run` spawns the provider work on the
//! tokio runtime and hands back the receiving end of its result channel; the
//! channel closing is the only completion signal callers observe.
//!
//! Providers follow the same shape:
//!
//! ```ignore
//! fn run(self: Arc<Self>, cancel: CancellationToken, domain: String, session: Arc<dyn Session>)
//!     -> mpsc::Receiver<ScrapeResult>
//! {
//!     let (tx, rx) = mpsc::channel(RESULT_BUFFER);
//!     tokio::spawn(async move {
//!         let sink = ResultSink::start(self.name(), tx, &self.stats, cancel.clone());
//!         self.scrape(&sink, &cancel, &domain, session.as_ref()).await;
//!     });
//!     rx
//! }
//! ```

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::{ScrapeError, ScrapeResult, Statistics, StatsRecorder};
use crate::extract::normalize_host;
use crate::session::Session;

/// Capacity of each source's result channel
pub const RESULT_BUFFER: usize = 16;

/// A passive subdomain data provider
pub trait Source: Send + Sync + 'static {
    /// Stable identifier, unique across the registry (lowercase)
    fn name(&self) -> &str;

    /// Participates when no explicit source list is given
    fn is_default(&self) -> bool;

    /// Results are reliable enough for recursive enumeration
    fn has_recursive_support(&self) -> bool;

    /// Cannot do anything without credentials
    fn needs_key(&self) -> bool;

    /// Parse raw credential strings, replacing any previous keys
    fn add_api_keys(&self, keys: &[String]);

    /// Start discovery for `domain`. Statistics are reset at the start of the run.
    fn run(
        self: Arc<Self>,
        cancel: CancellationToken,
        domain: String,
        session: Arc<dyn Session>,
    ) -> mpsc::Receiver<ScrapeResult>;

    /// Counters of the last run; read after its stream has closed
    fn statistics(&self) -> Statistics;
}

/// Sending half of a source run.
///
/// Resets the source's statistics on creation and counts every result the
/// run's own channel accepted. A consumer that stops reading early may never
/// see the last of them. The elapsed time is recorded when the sink is
/// dropped, just before the channel closes.
pub struct ResultSink<'a> {
    source: String,
    tx: mpsc::Sender<ScrapeResult>,
    stats: &'a StatsRecorder,
    cancel: CancellationToken,
    started: Instant,
}

impl<'a> ResultSink<'a> {
    pub fn start(
        source: &str,
        tx: mpsc::Sender<ScrapeResult>,
        stats: &'a StatsRecorder,
        cancel: CancellationToken,
    ) -> Self {
        stats.reset();
        Self {
            source: source.to_string(),
            tx,
            stats,
            cancel,
            started: Instant::now(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Emit a discovered host. Returns `false` once the run should stop
    /// (cancelled or nobody is listening).
    pub async fn subdomain(&self, host: &str) -> bool {
        let result = ScrapeResult::subdomain(&self.source, normalize_host(host));
        let delivered = self.send(result).await;
        if delivered {
            self.stats.record_result();
        }
        delivered
    }

    /// Emit the terminal error of this run
    pub async fn error(&self, error: impl Into<ScrapeError>) {
        let error = error.into();
        tracing::debug!(source = %self.source, error = %error, "[Source] Run failed");
        if self.send(ScrapeResult::error(&self.source, error)).await {
            self.stats.record_error();
        }
    }

    /// No usable credentials: finish without emitting anything
    pub fn skip(&self) {
        tracing::debug!(source = %self.source, "[Source] No API key configured, skipping");
        self.stats.mark_skipped();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    async fn send(&self, result: ScrapeResult) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            sent = self.tx.send(result) => sent.is_ok(),
        }
    }
}

impl Drop for ResultSink<'_> {
    fn drop(&mut self) {
        self.stats.set_time_taken(self.started.elapsed());
    }
}
