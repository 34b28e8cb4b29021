//! HackerTarget host search
//!
//! Plain-text API: one `host,ip` pair per line. Quota and input problems come
//! back as a single line of text with a 200 status.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use subscout_core::{
    discard_failed, ResultSink, ScrapeError, ScrapeResult, Session, Source, Statistics,
    StatsRecorder, SubdomainExtractor, RESULT_BUFFER,
};

use crate::decode::read_text;

const NAME: &str = "hackertarget";
const DEFAULT_BASE_URL: &str = "https://api.hackertarget.com";

/// Body prefixes the API uses instead of an error status
const ERROR_PREFIXES: [&str; 2] = ["error", "api count exceeded"];

pub struct HackerTarget {
    stats: StatsRecorder,
    base_url: String,
}

impl HackerTarget {
    pub fn new() -> Self {
        Self {
            stats: StatsRecorder::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn search_url(&self, domain: &str) -> String {
        format!(
            "{}/hostsearch/?q={}",
            self.base_url,
            urlencoding::encode(domain)
        )
    }

    async fn scrape(
        &self,
        sink: &ResultSink<'_>,
        cancel: &CancellationToken,
        domain: &str,
        session: &dyn Session,
    ) {
        let extractor = match SubdomainExtractor::new(domain) {
            Ok(extractor) => extractor,
            Err(e) => {
                sink.error(ScrapeError::provider(format!("invalid domain {}: {}", domain, e)))
                    .await;
                return;
            }
        };

        let url = self.search_url(domain);
        debug!(domain, "[hackertarget] Querying host search");

        let response = match session.simple_get(cancel, &url).await {
            Ok(response) => response,
            Err(err) => {
                sink.error(discard_failed(session, err).await).await;
                return;
            }
        };

        let body = match read_text(response).await {
            Ok(body) => body,
            Err(e) => {
                sink.error(e).await;
                return;
            }
        };

        let trimmed = body.trim();
        let lowered = trimmed.to_lowercase();
        if ERROR_PREFIXES.iter().any(|prefix| lowered.starts_with(prefix)) {
            sink.error(ScrapeError::provider(trimmed)).await;
            return;
        }

        for line in trimmed.lines() {
            for host in extractor.extract(line) {
                if !sink.subdomain(&host).await {
                    return;
                }
            }
        }
    }
}

impl Default for HackerTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for HackerTarget {
    fn name(&self) -> &str {
        NAME
    }

    fn is_default(&self) -> bool {
        true
    }

    fn has_recursive_support(&self) -> bool {
        true
    }

    fn needs_key(&self) -> bool {
        false
    }

    fn add_api_keys(&self, _keys: &[String]) {}

    fn run(
        self: Arc<Self>,
        cancel: CancellationToken,
        domain: String,
        session: Arc<dyn Session>,
    ) -> mpsc::Receiver<ScrapeResult> {
        let (tx, rx) = mpsc::channel(RESULT_BUFFER);
        tokio::spawn(async move {
            let sink = ResultSink::start(self.name(), tx, &self.stats, cancel.clone());
            self.scrape(&sink, &cancel, &domain, session.as_ref()).await;
        });
        rx
    }

    fn statistics(&self) -> Statistics {
        self.stats.snapshot()
    }
}
