pub mod chat;
pub mod stars;
pub mod transport;

use reqwest::Url;
use thiserror::Error;

use crate::data::DataError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("input must not be empty")]
    EmptyInput,
    #[error("invalid backend url: {0}")]
    Url(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("network response was not ok: {status} {reason}")]
    Status { status: u16, reason: String },
    #[error(transparent)]
    Data(#[from] DataError),
}

impl ClientError {
    /// Whether the error was raised before any request went out.
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::EmptyInput)
    }
}

/// Builds `{base}/{segments...}`, percent-encoding each segment.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<String, ClientError> {
    let mut url = Url::parse(base).map_err(|e| ClientError::Url(format!("{base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| ClientError::Url(format!("{base}: cannot be a base")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.into())
}
