//! Playback session state.

use bridge_traits::Station;
use serde::Serialize;
use tokio::runtime::Handle;
use uuid::Uuid;

use crate::error::ErrorInfo;
use crate::retry::RetryTimer;

/// Engine state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Paused,
    Error,
}

/// How the active source reaches the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    /// Origin URL handed to the transport as is.
    Direct,
    /// Through the relay backend.
    Proxied,
}

impl SourceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceMode::Direct => "direct",
            SourceMode::Proxied => "proxied",
        }
    }
}

/// The single live session owned by the engine.
///
/// Replaced wholesale on every new selection; volume and mute are carried
/// over by [`PlaybackSession::succeed`].
#[derive(Debug)]
pub struct PlaybackSession {
    pub session_id: Uuid,
    pub station: Option<Station>,
    pub state: PlaybackState,
    pub source_mode: SourceMode,
    pub active_url: Option<String>,
    pub last_direct_url: Option<String>,
    pub volume: u8,
    pub muted: bool,
    pub last_error: Option<ErrorInfo>,
    pub retry: RetryTimer,
    pub auto_retries_remaining: u32,
    pub attempt_in_flight: bool,
}

impl PlaybackSession {
    /// Empty session in `Idle`.
    pub fn idle(runtime: Handle, volume: u8, muted: bool) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            station: None,
            state: PlaybackState::Idle,
            source_mode: SourceMode::Direct,
            active_url: None,
            last_direct_url: None,
            volume,
            muted,
            last_error: None,
            retry: RetryTimer::new(runtime),
            auto_retries_remaining: 0,
            attempt_in_flight: false,
        }
    }

    /// Fresh session for `station`, keeping the user's volume and mute.
    pub fn succeed(previous: &PlaybackSession, runtime: Handle, station: Station) -> Self {
        Self {
            station: Some(station),
            ..Self::idle(runtime, previous.volume, previous.muted)
        }
    }

    pub fn retry_scheduled(&self) -> bool {
        self.retry.is_pending()
    }

    /// Volume actually applied to the transport.
    pub fn effective_volume(&self) -> u8 {
        if self.muted {
            0
        } else {
            self.volume
        }
    }

    /// Established means a stream got to `Playing` and has not been torn down.
    pub fn stream_established(&self) -> bool {
        !self.attempt_in_flight
            && matches!(
                self.state,
                PlaybackState::Playing | PlaybackState::Loading | PlaybackState::Paused
            )
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.session_id,
            station: self.station.clone(),
            state: self.state,
            source_mode: self.source_mode,
            active_url: self.active_url.clone(),
            last_direct_url: self.last_direct_url.clone(),
            volume: self.volume,
            muted: self.muted,
            effective_volume: self.effective_volume(),
            last_error: self.last_error.clone(),
            retry_scheduled: self.retry_scheduled(),
            auto_retries_remaining: self.auto_retries_remaining,
            attempt_in_flight: self.attempt_in_flight,
        }
    }
}

/// Cloneable view of a [`PlaybackSession`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub station: Option<Station>,
    pub state: PlaybackState,
    pub source_mode: SourceMode,
    pub active_url: Option<String>,
    pub last_direct_url: Option<String>,
    pub volume: u8,
    pub muted: bool,
    pub effective_volume: u8,
    pub last_error: Option<ErrorInfo>,
    pub retry_scheduled: bool,
    pub auto_retries_remaining: u32,
    pub attempt_in_flight: bool,
}
