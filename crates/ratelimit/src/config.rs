use serde::Deserialize;

/// Tuning parameters for one limiter instance.
///
/// `window_ms` and `max_requests` must both be greater than zero.
#[derive(Debug, Clone, Deserialize)]
pub struct RateLimiterConfig {
    /// Window length in milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,

    /// Maximum requests allowed per window. The boundary is inclusive:
    /// the request that brings the count to exactly `max_requests` is
    /// still allowed.
    #[serde(default = "default_max_requests")]
    pub max_requests: u64,

    /// Human-readable rejection text returned to the caller.
    #[serde(default = "default_message")]
    pub message: String,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            window_ms: default_window_ms(),
            max_requests: default_max_requests(),
            message: default_message(),
        }
    }
}

fn default_window_ms() -> u64 {
    60_000
}

fn default_max_requests() -> u64 {
    20
}

fn default_message() -> String {
    "Too many requests, please slow down.".to_owned()
}
