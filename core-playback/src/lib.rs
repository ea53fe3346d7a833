//! # Playback Module
//!
//! Headless playback engine for live radio streams.
//!
//! ## Overview
//!
//! This module handles:
//! - Direct playback with health-probe guided fallback to the stream relay
//! - A single bounded, cancellable auto-retry per user action
//! - Volume and mute overlay
//! - Mirroring playback into the host media session
//!
//! The engine never touches audio data; it drives a host
//! [`AudioTransport`](bridge_traits::AudioTransport).

pub mod config;
pub mod engine;
pub mod error;
pub mod media_session;
pub mod relay_client;
pub mod retry;
pub mod session;

pub use config::EngineConfig;
pub use engine::{PlaybackEngine, PlaybackEngineBuilder};
pub use error::{ErrorInfo, ErrorKind, PlaybackError, Result};
pub use media_session::{MediaHandlers, MediaSessionAdapter};
pub use relay_client::{RelayEndpoint, RelayHealthCheck};
pub use retry::RetryTimer;
pub use session::{PlaybackState, SessionSnapshot, SourceMode};
