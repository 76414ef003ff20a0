use serde::Deserialize;

use tribune_ratelimit::RateLimiterConfig;

/// Top-level configuration for the Tribune server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct TribuneConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Webhook gate configuration.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Rate limiting configuration.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
}

/// HTTP bind configuration.
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8080
}

/// Webhook gate configuration.
///
/// The secret may also be supplied via the `TRIBUNE_WEBHOOK_SECRET`
/// environment variable, which takes precedence over the file value and
/// is read once at startup. When neither is set, signature verification
/// is disabled: acceptable for development, a deployer responsibility to
/// avoid in production.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookConfig {
    /// Shared HMAC secret for signature verification.
    pub secret: Option<String>,

    /// The bot's own forum username, used to drop self-authored posts.
    pub bot_username: Option<String>,
}

/// Rate limiting configuration: a keyed per-client limiter plus a global
/// limiter shared across all clients.
///
/// # Example
///
/// ```toml
/// [rate_limit]
/// enabled = true
/// sweep_interval_seconds = 300
/// window_ms = 60000
/// max_requests = 20
///
/// [rate_limit.global]
/// window_ms = 60000
/// max_requests = 120
/// ```
#[derive(Debug, Deserialize)]
pub struct RateLimitConfig {
    /// Whether rate limiting is enabled at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// How often the keyed limiter's expired entries are swept.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,

    /// Per-client (per-IP) limiter tuning.
    #[serde(flatten)]
    pub per_client: RateLimiterConfig,

    /// Global limiter tuning, shared across all clients.
    #[serde(default = "default_global")]
    pub global: RateLimiterConfig,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            sweep_interval_seconds: default_sweep_interval(),
            per_client: RateLimiterConfig::default(),
            global: default_global(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_global() -> RateLimiterConfig {
    RateLimiterConfig {
        window_ms: 60_000,
        max_requests: 120,
        message: "Service is receiving too many requests, please retry later.".to_owned(),
    }
}
