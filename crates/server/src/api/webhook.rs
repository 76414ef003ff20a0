use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use tracing::{debug, info, warn};

use crate::error::ServerError;
use crate::runtime::AdmittedPost;

use super::AppState;

/// Receive a forum webhook, gate it, and hand admitted posts to the
/// agent runtime.
///
/// Events that fail validation are rejected with the matching status
/// code; events that validate but are not addressed to the agent (wrong
/// type, deleted, hidden, self-authored) are acknowledged with 200 so the
/// provider does not retry them.
pub async fn receive_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, ServerError> {
    let event = match state.gate.validate(&headers, &body) {
        Ok(event) => event,
        Err(err) => {
            state.counters.record_rejected();
            return Err(err.into());
        }
    };

    if let Some(reason) = state.gate.rejection_reason(&event) {
        state.counters.record_ignored();
        debug!(
            event_type = %event.event_type,
            event_id = %event.event_id,
            reason,
            "webhook event ignored"
        );
        return Ok(Json(
            serde_json::json!({ "status": "ignored", "reason": reason }),
        ));
    }

    let post = match AdmittedPost::from_event(&event) {
        Ok(post) => post,
        Err(err) => {
            state.counters.record_rejected();
            return Err(err.into());
        }
    };

    info!(
        conversation = %post.conversation_id,
        participant = %post.participant_id,
        event_id = %post.event_id,
        "webhook event admitted"
    );

    if let Err(err) = state.runtime.handle_post(post).await {
        warn!(error = %err, "agent runtime failed to take the event");
        state.counters.record_rejected();
        return Err(ServerError::Runtime(err.0));
    }

    state.counters.record_admitted();
    Ok(Json(serde_json::json!({ "status": "queued" })))
}
