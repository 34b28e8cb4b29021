//! AlienVault OTX passive DNS

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use subscout_core::{
    discard_failed, ResultSink, ScrapeError, ScrapeResult, Session, Source, Statistics,
    StatsRecorder, RESULT_BUFFER,
};

use crate::decode::read_json;

const NAME: &str = "alienvault";
const DEFAULT_BASE_URL: &str = "https://otx.alienvault.com";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PassiveDnsResponse {
    detail: String,
    error: String,
    passive_dns: Vec<PassiveDnsRecord>,
}

#[derive(Debug, Deserialize)]
struct PassiveDnsRecord {
    hostname: String,
}

pub struct AlienVault {
    stats: StatsRecorder,
    base_url: String,
}

impl AlienVault {
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
            "{}/api/v1/indicators/domain/{}/passive_dns",
            self.base_url,
            urlencoding::encode(domain)
        );
        debug!(domain, "[alienvault] Querying passive DNS");

        let response = match session.simple_get(cancel, &url).await {
            Ok(response) => response,
            Err(err) => {
                sink.error(discard_failed(session, err).await).await;
                return;
            }
        };

        let payload: PassiveDnsResponse = match read_json(response).await {
            Ok(payload) => payload,
            Err(e) => {
                sink.error(e).await;
                return;
            }
        };

        if !payload.error.is_empty() {
            sink.error(ScrapeError::provider(format!(
                "{}, {}",
                payload.detail, payload.error
            )))
            .await;
            return;
        }

        for record in &payload.passive_dns {
            if !sink.subdomain(&record.hostname).await {
                return;
            }
        }
    }
}

impl Default for AlienVault {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for AlienVault {
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
