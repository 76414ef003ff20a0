use std::sync::atomic::{AtomicU64, Ordering};

use axum::Json;
use axum::extract::State;

use super::AppState;

/// Gate outcome counters, exposed through `/health`.
#[derive(Debug, Default)]
pub struct GateCounters {
    admitted: AtomicU64,
    ignored: AtomicU64,
    rejected: AtomicU64,
}

impl GateCounters {
    pub fn record_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn admitted(&self) -> u64 {
        self.admitted.load(Ordering::Relaxed)
    }

    pub fn ignored(&self) -> u64 {
        self.ignored.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }
}

/// Liveness endpoint. Deliberately mounted outside the rate limit layers
/// so orchestrator probes can never be throttled.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "webhook_verification": state.gate.verifies_signatures(),
        "events": {
            "admitted": state.counters.admitted(),
            "ignored": state.counters.ignored(),
            "rejected": state.counters.rejected(),
        },
    }))
}
