//! Session - the HTTP capability sources consume
//!
//! A session is shared by every concurrently running source, so implementations
//! must be safe for concurrent use. Rate limiting, proxying and TLS live behind
//! this trait; sources only issue cancellable GETs.

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use tokio_util::sync::CancellationToken;

/// Failure of a single session call
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The caller's token was cancelled before the call completed
    #[error("request cancelled")]
    Cancelled,

    /// Network / protocol failure, no response available
    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    ///
    /// The response is kept so providers that embed error details in the body
    /// can still decode it; otherwise it should go through `Session::discard`.
    #[error("unexpected status {status} from {url}")]
    Status {
        status: StatusCode,
        url: String,
        response: Option<Box<Response>>,
    },
}

impl SessionError {
    /// Take the partial response out of a status error, if any
    pub fn take_response(&mut self) -> Option<Response> {
        match self {
            SessionError::Status { response, .. } => response.take().map(|r| *r),
            _ => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SessionError::Cancelled)
    }
}

/// Rate-limited, cancellable HTTP execution
#[async_trait]
pub trait Session: Send + Sync {
    /// GET `url` with extra request headers
    async fn get(
        &self,
        cancel: &CancellationToken,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<Response, SessionError>;

    /// GET `url` with no extra headers
    async fn simple_get(
        &self,
        cancel: &CancellationToken,
        url: &str,
    ) -> Result<Response, SessionError> {
        self.get(cancel, url, &[]).await
    }

    /// Drain and release a response the caller is abandoning
    async fn discard(&self, response: Response) {
        let _ = response.bytes().await;
    }
}

/// Release any partial response carried by `error` and hand the error back.
///
/// Used on every failure path that stops a source's run.
pub async fn discard_failed(session: &dyn Session, mut error: SessionError) -> SessionError {
    if let Some(partial) = error.take_response() {
        session.discard(partial).await;
    }
    error
}
