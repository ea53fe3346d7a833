//! Error types for the stream relay and health prober

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    /// The origin refused the stream or could not be reached before headers
    /// arrived. `status` is what the relay endpoint answers with.
    #[error("Upstream error ({status}): {message}")]
    RelayUpstreamError { status: u16, message: String },

    /// The transfer broke after the response had started.
    #[error("Relay transfer interrupted: {0}")]
    RelayTransferInterrupted(String),

    #[error("Invalid stream URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, StreamError>;

impl StreamError {
    /// HTTP status to answer the client with.
    pub fn status_code(&self) -> u16 {
        match self {
            StreamError::RelayUpstreamError { status, .. } => *status,
            StreamError::RelayTransferInterrupted(_) => 502,
            StreamError::InvalidUrl(_) => 400,
        }
    }
}

impl From<StreamError> for bridge_traits::error::BridgeError {
    fn from(error: StreamError) -> Self {
        bridge_traits::error::BridgeError::OperationFailed(error.to_string())
    }
}

/// Accept only absolute http(s) URLs with a host.
pub(crate) fn validate_stream_url(url: &str) -> Result<()> {
    let rest = url
        .strip_prefix("http://")
        .or_else(|| url.strip_prefix("https://"))
        .ok_or_else(|| StreamError::InvalidUrl(format!("'{}' is not an http(s) URL", url)))?;

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return Err(StreamError::InvalidUrl(format!("'{}' has no host", url)));
    }
    Ok(())
}
