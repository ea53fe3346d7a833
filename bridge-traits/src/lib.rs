//! # Host Bridge Traits
//!
//! Capability traits the radio core needs from its host, plus the small set of
//! data types every crate shares.
//!
//! ## Overview
//!
//! The core never talks to the network, the audio device or the OS media
//! controls directly. Each of those is a trait here, implemented once per host:
//! `bridge-desktop` ships the native HTTP client, a browser or mobile shell
//! brings its own audio transport and media session.
//!
//! ## Traits
//!
//! ### Networking
//! - [`HttpClient`](http::HttpClient) - Buffered and streaming HTTP with retry
//!
//! ### Playback
//! - [`AudioTransport`](audio::AudioTransport) - Load/play/pause a stream URL, report events
//! - [`MediaSessionHost`](media_session::MediaSessionHost) - Lock screen metadata and media keys
//!
//! ### Utilities
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! ## Fail-Fast Strategy
//!
//! The core fails fast with descriptive errors when a required capability is missing:
//!
//! ```ignore
//! use core_runtime::Error;
//!
//! let http_client = config.http_client
//!     .ok_or_else(|| Error::CapabilityMissing {
//!         capability: "HttpClient".to_string(),
//!         message: "No HTTP client implementation provided. \
//!                  Enable the desktop-shims feature or inject one.".to_string(),
//!     })?;
//! ```
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! convert platform errors into it and keep the message actionable.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so handles can be shared across
//! tokio tasks behind an `Arc`.

pub mod audio;
pub mod error;
pub mod http;
pub mod log;
pub mod media_session;
pub mod station;

pub use error::BridgeError;

// Re-export commonly used types
pub use audio::{AudioTransport, TransportEvent, TransportListener};
pub use http::{
    ByteStream, HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy,
    StreamingResponse,
};
pub use log::{LogEntry, LogLevel, LoggerSink};
pub use media_session::{
    ActionHandler, Artwork, MediaAction, MediaMetadata, MediaPlaybackState, MediaSessionHost,
};
pub use station::Station;
