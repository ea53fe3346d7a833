//! # Core Configuration Module
//!
//! Provides configuration management for the radio relay backend.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `CoreConfig`
//! instance that holds the settings and host bridges the backend needs. It
//! enforces fail-fast validation so a misconfigured server refuses to start
//! instead of failing on the first request.
//!
//! ## Dependencies
//!
//! - `HttpClient` - Directory lookups, health probes and the stream relay
//!   (desktop default: reqwest, via the `desktop-shims` feature)
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//! use std::time::Duration;
//!
//! let config = CoreConfig::builder()
//!     .bind_address("127.0.0.1:8080".parse()?)
//!     .probe_timeout(Duration::from_secs(5))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! Without the `desktop-shims` feature and without an injected client, the
//! builder returns [`Error::CapabilityMissing`] naming the missing bridge.

use crate::error::{Error, Result};
use bridge_traits::HttpClient;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Radio Browser mirrors tried in order.
pub const DEFAULT_MIRRORS: &[&str] = &[
    "https://de1.api.radio-browser.info",
    "https://nl1.api.radio-browser.info",
    "https://at1.api.radio-browser.info",
];

pub const DEFAULT_USER_AGENT: &str = "RadioStreamApp/1.0";

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:5000";

/// Core configuration for the relay backend.
///
/// Use [`CoreConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct CoreConfig {
    /// Socket the HTTP backend listens on
    pub bind_address: SocketAddr,

    /// Directory mirror base URLs, in failover order
    pub mirrors: Vec<String>,

    /// User agent sent to the directory and to stream origins
    pub user_agent: String,

    /// Per-mirror request timeout
    pub directory_timeout: Duration,

    /// Upper bound for a single stream health probe
    pub probe_timeout: Duration,

    /// Chunks buffered between origin and client per relayed stream
    pub relay_buffer_chunks: usize,

    /// Abort a relayed stream when the origin sends nothing for this long
    pub relay_stall_timeout: Duration,

    /// Capacity of the core event bus
    pub event_buffer_size: usize,

    /// HTTP client shared by all components
    pub http_client: Arc<dyn HttpClient>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("bind_address", &self.bind_address)
            .field("mirrors", &self.mirrors)
            .field("user_agent", &self.user_agent)
            .field("directory_timeout", &self.directory_timeout)
            .field("probe_timeout", &self.probe_timeout)
            .field("relay_buffer_chunks", &self.relay_buffer_chunks)
            .field("relay_stall_timeout", &self.relay_stall_timeout)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("http_client", &"HttpClient { ... }")
            .finish()
    }
}

impl CoreConfig {
    /// Creates a new builder for constructing a `CoreConfig`.
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - At least one mirror is configured and every mirror is an http(s) URL
    /// - The user agent is not empty
    /// - Timeouts are non-zero and below one hour
    /// - Buffer sizes are within sane bounds
    pub fn validate(&self) -> Result<()> {
        if self.mirrors.is_empty() {
            return Err(Error::Config(
                "At least one directory mirror is required".to_string(),
            ));
        }

        for mirror in &self.mirrors {
            if !(mirror.starts_with("http://") || mirror.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "Mirror '{}' must be an http:// or https:// URL",
                    mirror
                )));
            }
        }

        if self.user_agent.trim().is_empty() {
            return Err(Error::Config("User agent cannot be empty".to_string()));
        }

        for (name, value) in [
            ("Directory timeout", self.directory_timeout),
            ("Probe timeout", self.probe_timeout),
            ("Relay stall timeout", self.relay_stall_timeout),
        ] {
            if value.is_zero() {
                return Err(Error::Config(format!("{} must be greater than 0", name)));
            }
            if value > Duration::from_secs(3600) {
                return Err(Error::Config(format!(
                    "{} exceeds maximum of 1 hour",
                    name
                )));
            }
        }

        if self.relay_buffer_chunks == 0 || self.relay_buffer_chunks > 1024 {
            return Err(Error::Config(
                "Relay buffer must hold between 1 and 1024 chunks".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(
    user_agent: &str,
    timeout: Duration,
) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client: Arc<dyn HttpClient> =
        Arc::new(ReqwestHttpClient::with_options(timeout, user_agent)?);
    Ok(client)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(
    _user_agent: &str,
    _timeout: Duration,
) -> Result<Arc<dyn HttpClient>> {
    Err(Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "HttpClient implementation is required for directory lookups and stream relay. \
                 Desktop: enable the 'desktop-shims' feature to use the default ReqwestHttpClient. \
                 Other hosts: inject a platform-native client with .http_client()."
            .to_string(),
    })
}

/// Builder for constructing [`CoreConfig`] instances.
///
/// Every setting has a default; only the HTTP client may be missing, and only
/// when the `desktop-shims` feature is disabled.
#[derive(Default)]
pub struct CoreConfigBuilder {
    bind_address: Option<SocketAddr>,
    mirrors: Option<Vec<String>>,
    user_agent: Option<String>,
    directory_timeout: Option<Duration>,
    probe_timeout: Option<Duration>,
    relay_buffer_chunks: Option<usize>,
    relay_stall_timeout: Option<Duration>,
    event_buffer_size: Option<usize>,
    http_client: Option<Arc<dyn HttpClient>>,
}

impl CoreConfigBuilder {
    /// Sets the listen address. Default: `0.0.0.0:5000`
    pub fn bind_address(mut self, address: SocketAddr) -> Self {
        self.bind_address = Some(address);
        self
    }

    /// Replaces the directory mirror list. Trailing slashes are trimmed.
    ///
    /// ```
    /// use core_runtime::config::CoreConfig;
    ///
    /// let builder = CoreConfig::builder()
    ///     .mirrors(["https://de1.api.radio-browser.info/"]);
    /// ```
    pub fn mirrors<I, S>(mut self, mirrors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.mirrors = Some(
            mirrors
                .into_iter()
                .map(|m| m.into().trim().trim_end_matches('/').to_string())
                .filter(|m| !m.is_empty())
                .collect(),
        );
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Default: 15 seconds
    pub fn directory_timeout(mut self, timeout: Duration) -> Self {
        self.directory_timeout = Some(timeout);
        self
    }

    /// Default: 10 seconds
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    /// Default: 8 chunks
    pub fn relay_buffer_chunks(mut self, chunks: usize) -> Self {
        self.relay_buffer_chunks = Some(chunks);
        self
    }

    /// Default: 30 seconds
    pub fn relay_stall_timeout(mut self, timeout: Duration) -> Self {
        self.relay_stall_timeout = Some(timeout);
        self
    }

    /// Default: 100 events
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Sets the HTTP client implementation.
    ///
    /// If not provided, the desktop default (reqwest-based) will be used when
    /// the `desktop-shims` feature is enabled.
    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Builds the final `CoreConfig` instance.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when no HTTP client is available
    /// - [`Error::Config`] when a value fails validation
    pub fn build(self) -> Result<CoreConfig> {
        let bind_address = match self.bind_address {
            Some(address) => address,
            None => DEFAULT_BIND_ADDRESS.parse().map_err(|e| {
                Error::Internal(format!("Invalid default bind address: {}", e))
            })?,
        };

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let directory_timeout = self.directory_timeout.unwrap_or(Duration::from_secs(15));

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(&user_agent, directory_timeout)?,
        };

        let config = CoreConfig {
            bind_address,
            mirrors: self
                .mirrors
                .unwrap_or_else(|| DEFAULT_MIRRORS.iter().map(|m| m.to_string()).collect()),
            user_agent,
            directory_timeout,
            probe_timeout: self.probe_timeout.unwrap_or(Duration::from_secs(10)),
            relay_buffer_chunks: self.relay_buffer_chunks.unwrap_or(8),
            relay_stall_timeout: self.relay_stall_timeout.unwrap_or(Duration::from_secs(30)),
            event_buffer_size: self.event_buffer_size.unwrap_or(100),
            http_client,
        };

        config.validate()?;

        Ok(config)
    }
}
