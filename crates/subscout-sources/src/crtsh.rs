//! crt.sh certificate transparency search

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use subscout_core::{
    discard_failed, ResultSink, ScrapeResult, Session, Source, Statistics, StatsRecorder,
    RESULT_BUFFER,
};

use crate::decode::read_json;

const NAME: &str = "crtsh";
const DEFAULT_BASE_URL: &str = "https://crt.sh";

#[derive(Debug, Deserialize)]
struct CertificateEntry {
    /// Newline-separated SAN entries
    #[serde(default)]
    name_value: String,
}

pub struct Crtsh {
    stats: StatsRecorder,
    base_url: String,
}

impl Crtsh {
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

    async fn scrape(
        &self,
        sink: &ResultSink<'_>,
        cancel: &CancellationToken,
        domain: &str,
        session: &dyn Session,
    ) {
        let url = format!(
            "{}/?q=%25.{}&output=json",
            self.base_url,
            urlencoding::encode(domain)
        );
        debug!(domain, "[crtsh] Querying certificates");

        let response = match session.simple_get(cancel, &url).await {
            Ok(response) => response,
            Err(err) => {
                sink.error(discard_failed(session, err).await).await;
                return;
            }
        };

        let entries: Vec<CertificateEntry> = match read_json(response).await {
            Ok(entries) => entries,
            Err(e) => {
                sink.error(e).await;
                return;
            }
        };

        for entry in &entries {
            for name in entry.name_value.lines().map(str::trim).filter(|n| !n.is_empty()) {
                if !sink.subdomain(name).await {
                    return;
                }
            }
        }
    }
}

impl Default for Crtsh {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for Crtsh {
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
