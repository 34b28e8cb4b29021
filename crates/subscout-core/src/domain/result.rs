//! Results emitted by sources onto the merged stream

use crate::session::SessionError;

/// Why a source ended its run early.
///
/// Every variant is terminal for the emitting source only; sibling sources
/// keep running.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// Transport failure with no usable response
    #[error("request failed: {0}")]
    Session(#[from] SessionError),

    /// Response body could not be decoded
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The provider reported an application-level error in its payload
    #[error("provider error: {0}")]
    Provider(String),
}

impl ScrapeError {
    /// Create a provider-reported error from the message in its payload
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }
}

/// Payload of a single result
#[derive(Debug)]
pub enum ResultKind {
    /// A discovered host name
    Subdomain(String),
    /// A terminal failure of the emitting source
    Error(ScrapeError),
}

/// One message on a source's (or the merged) result stream, tagged with its origin
#[derive(Debug)]
pub struct ScrapeResult {
    /// Name of the emitting source
    pub source: String,
    pub kind: ResultKind,
}

impl ScrapeResult {
    pub fn subdomain(source: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind: ResultKind::Subdomain(value.into()),
        }
    }

    pub fn error(source: impl Into<String>, error: impl Into<ScrapeError>) -> Self {
        Self {
            source: source.into(),
            kind: ResultKind::Error(error.into()),
        }
    }

    /// Host name if this is a subdomain result
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            ResultKind::Subdomain(value) => Some(value),
            ResultKind::Error(_) => None,
        }
    }

    /// Error if this is an error result
    pub fn as_error(&self) -> Option<&ScrapeError> {
        match &self.kind {
            ResultKind::Error(e) => Some(e),
            ResultKind::Subdomain(_) => None,
        }
    }

    pub fn is_subdomain(&self) -> bool {
        matches!(self.kind, ResultKind::Subdomain(_))
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, ResultKind::Error(_))
    }
}
