//! Session configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Fixed spacing between successful calls in milliseconds
    #[serde(default = "default_request_spacing_ms")]
    pub request_spacing_ms: u64,

    /// Base unit for exponential backoff after rate-limit errors, in milliseconds
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,

    /// Consecutive rate-limit errors before the circuit breaker pauses the session
    #[serde(default = "default_pause_threshold")]
    pub pause_threshold: u32,

    /// Channel buffer size for session requests
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer: usize,
}

fn default_request_spacing_ms() -> u64 {
    10_000
}

fn default_backoff_base_ms() -> u64 {
    30_000
}

fn default_pause_threshold() -> u32 {
    3
}

fn default_channel_buffer() -> usize {
    64
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            request_spacing_ms: 10_000,
            backoff_base_ms: 30_000,
            pause_threshold: 3,
            channel_buffer: 64,
        }
    }
}

impl SessionConfig {
    /// Get the inter-request spacing as a Duration
    pub fn request_spacing(&self) -> Duration {
        Duration::from_millis(self.request_spacing_ms)
    }

    /// Get the backoff base unit as a Duration
    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }
}
