//! # Playback Error Types
//!
//! Errors surfaced by the playback engine.

use bridge_traits::error::BridgeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during playback operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    // ========================================================================
    // Source Errors
    // ========================================================================
    /// The station has neither a resolved nor an origin stream URL.
    #[error("No stream URL available for station {0}")]
    NoStreamUrl(String),

    /// The health probe found the origin unreachable or not serving audio.
    #[error("Stream unreachable: {0}")]
    StreamUnreachable(String),

    // ========================================================================
    // Playback Control Errors
    // ========================================================================
    /// Direct and relayed playback both failed, or a resume failed.
    #[error("Playback failed: {0}")]
    PlaybackFailed(String),

    /// Attempted operation when no station is loaded.
    #[error("No station loaded")]
    NoStationLoaded,

    /// A newer play, retry or stop took over while this call was in flight.
    #[error("Superseded by a newer playback request")]
    Superseded,

    // ========================================================================
    // Platform Errors
    // ========================================================================
    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Audio transport error: {0}")]
    Transport(String),
}

impl From<BridgeError> for PlaybackError {
    fn from(error: BridgeError) -> Self {
        PlaybackError::Transport(error.to_string())
    }
}

impl PlaybackError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PlaybackError::NoStreamUrl(_) => ErrorKind::NoStreamUrl,
            PlaybackError::StreamUnreachable(_) => ErrorKind::StreamUnreachable,
            PlaybackError::PlaybackFailed(_) => ErrorKind::PlaybackFailed,
            PlaybackError::NoStationLoaded => ErrorKind::NoStationLoaded,
            PlaybackError::Superseded => ErrorKind::Superseded,
            PlaybackError::InvalidConfig(_) => ErrorKind::InvalidConfig,
            PlaybackError::Transport(_) => ErrorKind::Transport,
        }
    }

    /// Returns `true` if retrying the same station may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PlaybackError::StreamUnreachable(_)
                | PlaybackError::PlaybackFailed(_)
                | PlaybackError::Transport(_)
        )
    }
}

/// Discriminant of [`PlaybackError`], kept in the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    NoStreamUrl,
    StreamUnreachable,
    PlaybackFailed,
    NoStationLoaded,
    Superseded,
    InvalidConfig,
    Transport,
}

/// Last error recorded on a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&PlaybackError> for ErrorInfo {
    fn from(error: &PlaybackError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Result type for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_errors_become_transport_errors() {
        let err: PlaybackError = BridgeError::NotAvailable("audio".into()).into();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert!(err.is_transient());
    }

    #[test]
    fn test_error_info_keeps_message() {
        let err = PlaybackError::NoStreamUrl("abc".into());
        let info = ErrorInfo::from(&err);
        assert_eq!(info.kind, ErrorKind::NoStreamUrl);
        assert_eq!(info.message, "No stream URL available for station abc");
        assert!(!err.is_transient());
    }
}
