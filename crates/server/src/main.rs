use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};

use tribune_gate::{GateConfig, WebhookGate};
use tribune_ratelimit::{GlobalRateLimiter, RateLimiter};
use tribune_server::api::{AppState, GateCounters, router};
use tribune_server::config::TribuneConfig;
use tribune_server::error::ServerError;
use tribune_server::runtime::LogRuntime;

/// Webhook admission gateway for forum-driven agents.
#[derive(Debug, Parser)]
#[command(name = "tribune-server", version, about)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "tribune.toml")]
    config: PathBuf,

    /// Override the configured bind host.
    #[arg(long)]
    host: Option<String>,

    /// Override the configured bind port.
    #[arg(long)]
    port: Option<u16>,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(cli: &Cli) -> Result<TribuneConfig, ServerError> {
    let mut config: TribuneConfig = if cli.config.exists() {
        let raw = std::fs::read_to_string(&cli.config)?;
        toml::from_str(&raw).map_err(|e| {
            ServerError::Config(format!("failed to parse {}: {e}", cli.config.display()))
        })?
    } else {
        info!(path = %cli.config.display(), "config file not found, using defaults");
        TribuneConfig::default()
    };

    if let Some(host) = &cli.host {
        config.server.host.clone_from(host);
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    // Environment overrides are read once, here, never at request time.
    if let Ok(secret) = std::env::var("TRIBUNE_WEBHOOK_SECRET") {
        if !secret.is_empty() {
            config.webhook.secret = Some(secret);
        }
    }

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let mut gate_config = GateConfig::new();
    if let Some(secret) = config.webhook.secret.clone() {
        gate_config = gate_config.with_secret(secret);
    } else {
        warn!("no webhook secret configured, signature verification is DISABLED");
    }
    if let Some(bot) = config.webhook.bot_username.clone() {
        gate_config = gate_config.with_bot_username(bot);
    }
    let gate = Arc::new(WebhookGate::new(gate_config));

    let (keyed_limiter, global_limiter) = if config.rate_limit.enabled {
        let keyed = Arc::new(RateLimiter::new(config.rate_limit.per_client.clone()));
        // Detached; the task exits on its own once the limiter is dropped.
        let _ = keyed.spawn_sweeper(Duration::from_secs(config.rate_limit.sweep_interval_seconds));
        let global = Arc::new(GlobalRateLimiter::new(config.rate_limit.global.clone()));
        (Some(keyed), Some(global))
    } else {
        warn!("rate limiting is disabled");
        (None, None)
    };

    let state = AppState {
        gate,
        runtime: Arc::new(LogRuntime),
        counters: Arc::new(GateCounters::default()),
    };
    let app = router(state, keyed_limiter, global_limiter);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "tribune server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to install ctrl-c handler");
        return;
    }
    info!("shutdown signal received");
}
