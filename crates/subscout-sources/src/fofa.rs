//! FOFA search engine
//!
//! Paginated: the page count is unknown up front and recomputed from the
//! `size` field of every page. Keys are `email:key` pairs.
//! API docs: <https://fofa.info/static_pages/api_help>

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use subscout_core::{
    parse_key_pairs, KeyPair, KeyRing, ResultSink, ScrapeError, ScrapeResult, Session, Source,
    Statistics, StatsRecorder, RESULT_BUFFER,
};

use crate::decode::read_json;

const NAME: &str = "fofa";
const DEFAULT_BASE_URL: &str = "https://fofa.info";
const DEFAULT_PAGE_SIZE: usize = 1000;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FofaResponse {
    error: bool,
    errmsg: String,
    size: usize,
    results: Vec<String>,
}

pub struct Fofa {
    keys: KeyRing<KeyPair>,
    stats: StatsRecorder,
    base_url: String,
    page_size: usize,
}

impl Fofa {
    pub fn new() -> Self {
        Self {
            keys: KeyRing::new(NAME),
            stats: StatsRecorder::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Point the source at another API host (tests, mirrors)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn page_url(&self, key: &KeyPair, query: &str, page: usize) -> String {
        format!(
            "{}/api/v1/search/all?full=true&fields=host&page={}&size={}&email={}&key={}&qbase64={}",
            self.base_url,
            page,
            self.page_size,
            urlencoding::encode(&key.username),
            urlencoding::encode(&key.secret),
            urlencoding::encode(query),
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

        let query = BASE64.encode(format!("domain=\"{}\"", domain));
        let mut pages = 1;
        let mut page = 1;

        while page <= pages {
            debug!(domain, page, pages, "[fofa] Querying page");

            let response = match session.simple_get(cancel, &self.page_url(&key, &query, page)).await {
                Ok(response) => response,
                // FOFA reports account and quota problems in the body of non-2xx responses
                Err(mut err) => match err.take_response() {
                    Some(partial) => partial,
                    None => {
                        sink.error(err).await;
                        return;
                    }
                },
            };

            let payload: FofaResponse = match read_json(response).await {
                Ok(payload) => payload,
                Err(e) => {
                    sink.error(e).await;
                    return;
                }
            };

            if payload.error {
                sink.error(ScrapeError::provider(payload.errmsg)).await;
                return;
            }

            if payload.size > 0 {
                for host in &payload.results {
                    if !sink.subdomain(host).await {
                        return;
                    }
                }
                pages = payload.size.div_ceil(self.page_size);
            }
            page += 1;
        }
    }
}

impl Default for Fofa {
    fn default() -> Self {
        Self::new()
    }
}

impl Source for Fofa {
    fn name(&self) -> &str {
        NAME
    }

    fn is_default(&self) -> bool {
        true
    }

    fn has_recursive_support(&self) -> bool {
        false
    }

    fn needs_key(&self) -> bool {
        true
    }

    fn add_api_keys(&self, keys: &[String]) {
        self.keys.replace(parse_key_pairs(keys));
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
