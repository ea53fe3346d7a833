//! # Core Stream
//!
//! Origin-facing streaming for the radio backend.
//!
//! ## Overview
//!
//! - [`HealthProber`]: header-only reachability and content-type checks,
//!   bounded by a timeout and never failing
//! - [`StreamRelay`]: connects to an origin and relays its bytes through a
//!   bounded channel, so a slow client slows the origin read instead of
//!   growing memory
//!
//! Both go through the [`bridge_traits::HttpClient`] abstraction.

pub mod config;
pub mod error;
pub mod health;
pub mod relay;

pub use config::{ProbeConfig, RelayConfig};
pub use error::{Result, StreamError};
pub use health::{is_audio_like, HealthCheckResult, HealthProber, StreamHealthCheck};
pub use relay::{pump, PumpOutcome, PumpSummary, RelayBody, RelayStream, StreamRelay};
