//! Response body helpers shared by providers

use reqwest::Response;
use serde::de::DeserializeOwned;
use subscout_core::{ScrapeError, SessionError};

/// Read the whole body and decode it as JSON. The body is consumed on every path.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ScrapeError> {
    let body = response.bytes().await.map_err(SessionError::from)?;
    Ok(serde_json::from_slice(&body)?)
}

/// Read the whole body as text
pub(crate) async fn read_text(response: Response) -> Result<String, ScrapeError> {
    Ok(response.text().await.map_err(SessionError::from)?)
}
