//! Audio transport bridge.
//!
//! The playback engine never decodes audio itself. It drives a host-provided
//! transport (an `<audio>` element, a native player, a test fake) that accepts
//! a stream URL and reports lifecycle events back through a listener.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;

/// Lifecycle notifications raised by a transport.
///
/// The names follow the media-element events most hosts already expose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A new source started loading.
    LoadStart,
    /// Enough data is buffered to start.
    CanPlay,
    /// Audio is audible (initial start or after buffering).
    Playing,
    /// Paused, either by the engine or by the host (headset button, OS).
    Paused,
    /// Playback halted waiting for data.
    Waiting,
    /// The source stopped delivering data.
    Stalled,
    /// The stream ended.
    Ended,
    /// The transport failed.
    Error { message: String },
}

impl TransportEvent {
    pub fn name(&self) -> &'static str {
        match self {
            TransportEvent::LoadStart => "loadstart",
            TransportEvent::CanPlay => "canplay",
            TransportEvent::Playing => "playing",
            TransportEvent::Paused => "pause",
            TransportEvent::Waiting => "waiting",
            TransportEvent::Stalled => "stalled",
            TransportEvent::Ended => "ended",
            TransportEvent::Error { .. } => "error",
        }
    }
}

impl fmt::Display for TransportEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportEvent::Error { message } => write!(f, "error: {}", message),
            other => f.write_str(other.name()),
        }
    }
}

/// Callback receiving transport events. May be invoked from any thread.
pub type TransportListener = Arc<dyn Fn(TransportEvent) + Send + Sync>;

/// Host audio output.
///
/// `load` + `play` together form one start attempt; `play` resolves once
/// audio actually starts or fails (autoplay blocked, unsupported codec,
/// network error).
#[async_trait]
pub trait AudioTransport: Send + Sync {
    /// Point the transport at a new source, discarding the previous one.
    async fn load(&self, url: &str) -> Result<()>;

    /// Start or resume playback of the loaded source.
    async fn play(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    /// Release the current source and its network connection.
    async fn unload(&self) -> Result<()>;

    /// Output gain in `0.0..=1.0`.
    fn set_volume(&self, volume: f32) -> Result<()>;

    /// Register the single event listener. Replaces any earlier listener.
    fn on_event(&self, listener: TransportListener);
}
