//! reqwest-backed `Session`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Proxy, Response};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use subscout_core::{Session, SessionError};

use super::rate_limit::{RateLimitConfig, RateLimiter};

pub const DEFAULT_USER_AGENT: &str = concat!("subscout/", env!("CARGO_PKG_VERSION"));

/// HTTP client settings for one enumeration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// Proxy URL applied to every request
    pub proxy: Option<String>,
    /// Maximum requests per second across all sources; `None` for unlimited
    pub rate_limit: Option<u32>,
    pub user_agent: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            proxy: None,
            rate_limit: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Shared HTTP session: one connection pool and one rate limiter for all sources
pub struct HttpSession {
    client: Client,
    limiter: Option<RateLimiter>,
}

impl HttpSession {
    pub fn new(config: &SessionConfig) -> Result<Self, SessionError> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone());

        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(Proxy::all(proxy)?);
        }

        let client = builder.build()?;
        let limiter = config
            .rate_limit
            .map(|per_second| RateLimiter::new(RateLimitConfig::per_second(per_second)));

        info!(
            timeout_secs = config.timeout.as_secs(),
            proxy = config.proxy.is_some(),
            rate_limit = ?config.rate_limit,
            "[HttpSession] Created"
        );

        Ok(Self { client, limiter })
    }
}

#[async_trait]
impl Session for HttpSession {
    async fn get(
        &self,
        cancel: &CancellationToken,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Response, SessionError> {
        if let Some(limiter) = &self.limiter {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(SessionError::Cancelled),
                _ = limiter.acquire() => {}
            }
        }

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SessionError::Cancelled),
            response = request.send() => response?,
        };

        let status = response.status();
        debug!(url, status = status.as_u16(), "[HttpSession] GET");

        if !status.is_success() {
            return Err(SessionError::Status {
                status,
                url: url.to_string(),
                response: Some(Box::new(response)),
            });
        }

        Ok(response)
    }
}
