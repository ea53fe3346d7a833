//! OS media-session integration (lock screen, media keys, now-playing widgets).

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Artwork entry shown by the OS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artwork {
    pub src: String,
    /// e.g. `"96x96"`
    pub sizes: String,
    pub mime_type: String,
}

/// Now-playing metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMetadata {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub artwork: Vec<Artwork>,
}

/// Actions a host may route to the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaAction {
    Play,
    Pause,
    Stop,
    SeekBackward,
    SeekForward,
    PreviousTrack,
    NextTrack,
}

impl MediaAction {
    pub const ALL: [MediaAction; 7] = [
        MediaAction::Play,
        MediaAction::Pause,
        MediaAction::Stop,
        MediaAction::SeekBackward,
        MediaAction::SeekForward,
        MediaAction::PreviousTrack,
        MediaAction::NextTrack,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaAction::Play => "play",
            MediaAction::Pause => "pause",
            MediaAction::Stop => "stop",
            MediaAction::SeekBackward => "seekbackward",
            MediaAction::SeekForward => "seekforward",
            MediaAction::PreviousTrack => "previoustrack",
            MediaAction::NextTrack => "nexttrack",
        }
    }
}

impl fmt::Display for MediaAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaPlaybackState {
    Playing,
    Paused,
    None,
}

pub type ActionHandler = Arc<dyn Fn() + Send + Sync>;

/// Host media session.
///
/// Hosts without a media session should not implement this trait at all;
/// hosts that support only part of it return
/// [`BridgeError::NotAvailable`](crate::BridgeError::NotAvailable) for the
/// rest.
pub trait MediaSessionHost: Send + Sync {
    /// `None` resets the metadata.
    fn set_metadata(&self, metadata: Option<MediaMetadata>) -> Result<()>;

    /// `None` unregisters the action.
    fn set_action_handler(&self, action: MediaAction, handler: Option<ActionHandler>)
        -> Result<()>;

    fn set_playback_state(&self, state: MediaPlaybackState) -> Result<()>;
}
