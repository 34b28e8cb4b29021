//! SecurityTrails domain subdomains

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use subscout_core::{
    discard_failed, parse_single_keys, KeyRing, ResultSink, ScrapeError, ScrapeResult, Session,
    Source, Statistics, StatsRecorder, RESULT_BUFFER,
};

use crate::decode::read_json;

const NAME: &str = "securitytrails";
const DEFAULT_BASE_URL: &str = "https://api.securitytrails.com";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SubdomainsResponse {
    /// Labels relative to the queried domain (`www`, `api.eu`)
    subdomains: Vec<String>,
    message: Option<String>,
}

pub struct SecurityTrails {
    keys: KeyRing<String>,
    stats: StatsRecorder,
    base_url: String,
}

impl SecurityTrails {
    pub fn new() -> Self {
        Self {
            keys: KeyRing::new(NAME),
            stats: StatsRecorder::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn subdomains_url(&self, domain: &str) -> String {
        format!(
            "{}/v1/domain/{}/subdomains",
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
        let Some(key) = self.keys.pick() else {
            sink.skip();
            return;
        };

        let url = self.subdomains_url(domain);
        debug!(domain, "[securitytrails] Querying subdomains");

        let response = match session.get(cancel, &url, &[("APIKEY", key.as_str())]).await {
            Ok(response) => response,
            Err(err) => {
                sink.error(discard_failed(session, err).await).await;
                return;
            }
        };

        let payload: SubdomainsResponse = match read_json(response).await {
            Ok(payload) => payload,
            Err(e) => {
                sink.error(e).await;
                return;
            }
        };

        if let Some(message) = payload.message.filter(|_| payload.subdomains.is_empty()) {
            sink.error(ScrapeError::provider(message)).await;
            return;
        }

        let suffix = format!(".{}", domain);
        for label in &payload.subdomains {
            let host = if label.ends_with(&suffix) {
                label.clone()
            } else {
                format!("{}{}", label, suffix)
            };
            if !sink.subdomain(&host).await {
                return;
            }
        }
    }
}

impl Default for SecurityTrails {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for SecurityTrails {
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
        true
    }

    fn add_api_keys(&self, keys: &[String]) {
        self.keys.replace(parse_single_keys(keys));
    }

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
