//! HTTP surface of the gateway.

mod health;
mod webhook;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};

use tribune_gate::WebhookGate;
use tribune_ratelimit::{GlobalRateLimiter, RateLimiter};

use crate::middleware::{GlobalRateLimitLayer, RateLimitLayer};
use crate::runtime::AgentRuntime;

pub use health::GateCounters;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<WebhookGate>,
    pub runtime: Arc<dyn AgentRuntime>,
    pub counters: Arc<GateCounters>,
}

/// Build the application router.
///
/// The webhook route runs behind both rate limit layers, global
/// outermost so a saturated service rejects before any per-client
/// bookkeeping. `/health` bypasses both.
pub fn router(
    state: AppState,
    keyed_limiter: Option<Arc<RateLimiter>>,
    global_limiter: Option<Arc<GlobalRateLimiter>>,
) -> Router {
    let hooks = Router::new()
        .route("/hooks/discourse", post(webhook::receive_webhook))
        // Layers added later wrap the ones added earlier.
        .layer(RateLimitLayer::new(keyed_limiter))
        .layer(GlobalRateLimitLayer::new(global_limiter));

    Router::new()
        .route("/health", get(health::health))
        .merge(hooks)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}
