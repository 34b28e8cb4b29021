//! Aggregation engine - fan out to every source, fan in one stream
//!
//! Each source runs on its own task (spawned by `Source::run`). A forwarder
//! task per source relays that source's results into one shared channel and
//! counts what it delivered. The merged channel closes when the last
//! forwarder drops its sender, so it closes only after every per-source
//! stream has closed.
//!
//! Cancellation: forwarders stop as soon as the token fires and drop their
//! merged-stream senders. The merged stream therefore closes without waiting
//! for a source stuck inside a network call. The supervisor keeps the
//! per-source receivers and drains them, so [`Enumeration::finished`]
//! resolves only once every source task has returned and finalised its own
//! statistics.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use subscout_core::{ScrapeResult, Session, Source};

/// Capacity of the merged stream
pub const MERGED_BUFFER: usize = 64;

/// Results and errors one source got onto the merged stream
#[derive(Debug, Default)]
pub struct DeliveryCounter {
    results: AtomicUsize,
    errors: AtomicUsize,
}

impl DeliveryCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> usize {
        self.results.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.results.store(0, Ordering::SeqCst);
        self.errors.store(0, Ordering::SeqCst);
    }

    fn record(&self, is_error: bool) {
        let counter = if is_error { &self.errors } else { &self.results };
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

/// A running enumeration
pub struct Enumeration {
    /// Merged result stream
    pub results: mpsc::Receiver<ScrapeResult>,
    /// Completes once every source task has returned
    pub finished: JoinHandle<()>,
}

/// What a forwarder hands back to the supervisor
struct Forwarded {
    source: String,
    forwarded: usize,
    /// Per-source stream, kept when the forwarder stopped before it closed
    remainder: Option<mpsc::Receiver<ScrapeResult>>,
}

/// Run `sources` concurrently against `domain` and merge their results.
///
/// Each source's counter is reset, then counts exactly what that source got
/// onto the merged stream. With `deadline`, the enumeration is cancelled once
/// it elapses. The caller's `cancel` token is never cancelled by the engine
/// itself.
pub fn enumerate(
    sources: Vec<(Arc<dyn Source>, Arc<DeliveryCounter>)>,
    cancel: &CancellationToken,
    domain: &str,
    session: Arc<dyn Session>,
    deadline: Option<Duration>,
) -> Enumeration {
    let (tx, rx) = mpsc::channel(MERGED_BUFFER);
    let run_token = cancel.child_token();
    let started = Instant::now();

    info!(
        domain,
        sources = sources.len(),
        "[Enumerate] Starting enumeration"
    );

    if let Some(deadline) = deadline {
        spawn_deadline(run_token.clone(), deadline);
    }

    let forwarders: Vec<_> = sources
        .into_iter()
        .map(|(source, delivered)| {
            delivered.reset();
            let name = source.name().to_string();
            let source_rx = source.run(run_token.clone(), domain.to_string(), session.clone());
            tokio::spawn(forward(
                name,
                source_rx,
                tx.clone(),
                delivered,
                run_token.clone(),
            ))
        })
        .collect();
    drop(tx);

    let domain = domain.to_string();
    let finished = tokio::spawn(async move {
        let outcomes: Vec<Forwarded> = join_all(forwarders)
            .await
            .into_iter()
            .filter_map(Result::ok)
            .collect();
        let cancelled = run_token.is_cancelled();

        // Stops sources still in flight after the consumer went away, and
        // releases the deadline timer.
        run_token.cancel();

        let forwarded: usize = outcomes.iter().map(|outcome| outcome.forwarded).sum();
        join_all(
            outcomes
                .into_iter()
                .filter_map(|outcome| outcome.remainder.map(|rx| settle(outcome.source, rx))),
        )
        .await;

        if cancelled {
            warn!(
                domain = %domain,
                forwarded,
                "[Enumerate] Enumeration cancelled before all sources finished"
            );
        } else {
            info!(
                domain = %domain,
                forwarded,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "[Enumerate] Enumeration finished"
            );
        }
    });

    Enumeration {
        results: rx,
        finished,
    }
}

fn spawn_deadline(token: CancellationToken, deadline: Duration) {
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(deadline) => {
                warn!(
                    deadline_secs = deadline.as_secs_f64(),
                    "[Enumerate] Deadline elapsed, cancelling sources"
                );
                token.cancel();
            }
            _ = token.cancelled() => {}
        }
    });
}

/// Relay one source's stream into the merged stream.
///
/// Stops on cancellation or once the merged stream has no receiver. The
/// merged sender is dropped on return either way.
async fn forward(
    source: String,
    mut source_rx: mpsc::Receiver<ScrapeResult>,
    tx: mpsc::Sender<ScrapeResult>,
    delivered: Arc<DeliveryCounter>,
    cancel: CancellationToken,
) -> Forwarded {
    let mut forwarded = 0;

    let closed = loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => break false,
            _ = tx.closed() => break false,
            next = source_rx.recv() => next,
        };
        let Some(result) = next else {
            break true;
        };

        let is_error = result.is_error();
        let sent = tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            sent = tx.send(result) => sent.is_ok(),
        };
        if !sent {
            break false;
        }
        delivered.record(is_error);
        forwarded += 1;
    };

    debug!(source = %source, forwarded, closed, "[Enumerate] Source stream finished");
    Forwarded {
        source,
        forwarded,
        remainder: (!closed).then_some(source_rx),
    }
}

/// Wait for a stopped source to close its stream, discarding what it still
/// had buffered.
async fn settle(source: String, mut source_rx: mpsc::Receiver<ScrapeResult>) {
    let mut discarded = 0;
    while source_rx.recv().await.is_some() {
        discarded += 1;
    }
    debug!(source = %source, discarded, "[Enumerate] Stopped source settled");
}
