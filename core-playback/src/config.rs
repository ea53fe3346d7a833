//! # Engine Configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Playback engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Upper bound for `load` + `play` of one source.
    ///
    /// Default: 15 seconds.
    #[serde(default = "default_start_timeout")]
    pub start_timeout: Duration,

    /// Delay before the automatic retry fires.
    ///
    /// Default: 2 seconds.
    #[serde(default = "default_retry_delay")]
    pub retry_delay: Duration,

    /// Automatic retries allowed per user action.
    ///
    /// Default: 1.
    #[serde(default = "default_max_auto_retries")]
    pub max_auto_retries: u32,

    /// Base URL of the relay backend, e.g. `http://127.0.0.1:5000`.
    #[serde(default = "default_relay_base")]
    pub relay_base: String,

    /// Initial volume, 0-100.
    #[serde(default = "default_volume")]
    pub default_volume: u8,

    /// Album line shown by the media session when a station has no tags.
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Artwork used when a station has no favicon, smallest first
    /// (96, 192, 512 px).
    #[serde(default = "default_fallback_artwork")]
    pub fallback_artwork: [String; 3],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            start_timeout: default_start_timeout(),
            retry_delay: default_retry_delay(),
            max_auto_retries: default_max_auto_retries(),
            relay_base: default_relay_base(),
            default_volume: default_volume(),
            app_name: default_app_name(),
            fallback_artwork: default_fallback_artwork(),
        }
    }
}

impl EngineConfig {
    pub fn with_relay_base(mut self, relay_base: impl Into<String>) -> Self {
        self.relay_base = relay_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.start_timeout.is_zero() {
            return Err("start_timeout must be > 0".to_string());
        }

        if !(self.relay_base.starts_with("http://") || self.relay_base.starts_with("https://")) {
            return Err(format!(
                "relay_base must be an http(s) URL, got '{}'",
                self.relay_base
            ));
        }

        if self.default_volume > 100 {
            return Err("default_volume cannot exceed 100".to_string());
        }

        if self.app_name.trim().is_empty() {
            return Err("app_name cannot be empty".to_string());
        }

        Ok(())
    }
}

// ============================================================================
// Default Functions (for serde)
// ============================================================================

fn default_start_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_max_auto_retries() -> u32 {
    1
}

fn default_relay_base() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_volume() -> u8 {
    75
}

fn default_app_name() -> String {
    "Radio Stream".to_string()
}

fn default_fallback_artwork() -> [String; 3] {
    [
        "/radio-logo.png".to_string(),
        "/icons/icon-192.png".to_string(),
        "/icons/icon-512.png".to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.start_timeout, Duration::from_secs(15));
        assert_eq!(config.retry_delay, Duration::from_secs(2));
        assert_eq!(config.max_auto_retries, 1);
        assert_eq!(config.default_volume, 75);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_relay_base_is_normalized() {
        let config = EngineConfig::default().with_relay_base("http://relay.local:5000/");
        assert_eq!(config.relay_base, "http://relay.local:5000");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let config = EngineConfig {
            relay_base: "relay.local".to_string(),
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            default_volume: 101,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = EngineConfig {
            start_timeout: Duration::ZERO,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
