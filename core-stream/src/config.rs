//! Relay and prober configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use core_runtime::config::CoreConfig;

// ============================================================================
// Health Probe
// ============================================================================

/// Health prober settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeConfig {
    /// Upper bound for one probe, headers included.
    #[serde(default = "default_probe_timeout")]
    pub timeout: Duration,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_probe_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_user_agent() -> String {
    core_runtime::config::DEFAULT_USER_AGENT.to_string()
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout: default_probe_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl ProbeConfig {
    pub fn from_core(config: &CoreConfig) -> Self {
        Self {
            timeout: config.probe_timeout,
            user_agent: config.user_agent.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.timeout.is_zero() {
            return Err("probe timeout must be greater than 0".to_string());
        }
        Ok(())
    }
}

// ============================================================================
// Relay
// ============================================================================

/// Stream relay settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Chunks buffered between origin and client.
    #[serde(default = "default_buffer_chunks")]
    pub buffer_chunks: usize,

    /// Abort when the origin sends nothing for this long. Also bounds the
    /// wait for the origin's response headers.
    #[serde(default = "default_stall_timeout")]
    pub stall_timeout: Duration,

    /// Used when the origin does not send a content type.
    #[serde(default = "default_content_type")]
    pub default_content_type: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_buffer_chunks() -> usize {
    8
}

fn default_stall_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_content_type() -> String {
    "audio/mpeg".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            buffer_chunks: default_buffer_chunks(),
            stall_timeout: default_stall_timeout(),
            default_content_type: default_content_type(),
            user_agent: default_user_agent(),
        }
    }
}

impl RelayConfig {
    pub fn from_core(config: &CoreConfig) -> Self {
        Self {
            buffer_chunks: config.relay_buffer_chunks,
            stall_timeout: config.relay_stall_timeout,
            user_agent: config.user_agent.clone(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.buffer_chunks == 0 {
            return Err("relay buffer must hold at least one chunk".to_string());
        }
        if self.stall_timeout.is_zero() {
            return Err("stall timeout must be greater than 0".to_string());
        }
        if self.default_content_type.trim().is_empty() {
            return Err("default content type cannot be empty".to_string());
        }
        Ok(())
    }
}
