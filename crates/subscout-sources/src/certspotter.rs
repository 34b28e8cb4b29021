//! SSLMate Cert Spotter issuances
//!
//! Cursor-paginated with `after=<last issuance id>`; an empty page ends the run.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use subscout_core::{
    discard_failed, parse_single_keys, KeyRing, ResultSink, ScrapeResult, Session, Source,
    Statistics, StatsRecorder, RESULT_BUFFER,
};

use crate::decode::read_json;

const NAME: &str = "certspotter";
const DEFAULT_BASE_URL: &str = "https://api.certspotter.com";

#[derive(Debug, Deserialize)]
struct Issuance {
    id: String,
    #[serde(default)]
    dns_names: Vec<String>,
}

pub struct CertSpotter {
    keys: KeyRing<String>,
    stats: StatsRecorder,
    base_url: String,
}

impl CertSpotter {
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

    fn page_url(&self, domain: &str, after: Option<&str>) -> String {
        let mut url = format!(
            "{}/v1/issuances?domain={}&include_subdomains=true&expand=dns_names",
            self.base_url,
            urlencoding::encode(domain)
        );
        if let Some(after) = after {
            url.push_str("&after=");
            url.push_str(&urlencoding::encode(after));
        }
        url
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
        let authorization = format!("Bearer {}", key);
        let mut after: Option<String> = None;

        loop {
            debug!(domain, after = ?after, "[certspotter] Querying issuances");

            let url = self.page_url(domain, after.as_deref());
            let response = match session
                .get(cancel, &url, &[("Authorization", authorization.as_str())])
                .await
            {
                Ok(response) => response,
                Err(err) => {
                    sink.error(discard_failed(session, err).await).await;
                    return;
                }
            };

            let issuances: Vec<Issuance> = match read_json(response).await {
                Ok(issuances) => issuances,
                Err(e) => {
                    sink.error(e).await;
                    return;
                }
            };

            let Some(last) = issuances.last() else {
                return;
            };
            if after.as_deref() == Some(last.id.as_str()) {
                return;
            }

            for issuance in &issuances {
                for name in &issuance.dns_names {
                    if !sink.subdomain(name).await {
                        return;
                    }
                }
            }
            after = Some(last.id.clone());
        }
    }
}

impl Default for CertSpotter {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for CertSpotter {
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
