use serde_json::Value;

use crate::error::GateError;
use crate::post::Post;

/// A fully validated webhook event.
///
/// Constructed only by the webhook gate after header parsing and
/// signature verification have both succeeded; a partially validated
/// event never escapes the gate. The payload is kept untyped so that
/// admission checks stay tolerant of provider schema drift; the typed
/// [`Post`] view is derived lazily via [`WebhookEvent::post`].
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Provider-defined event name, e.g. `post_created`.
    pub event_type: String,

    /// Origin URL of the forum instance that sent the event.
    pub instance_url: String,

    /// Provider-assigned event identifier. Opaque; not deduplicated.
    pub event_id: String,

    /// Raw `sha256=<hex>` signature header as received.
    pub signature_header: String,

    /// Untyped provider payload.
    pub payload: Value,
}

impl WebhookEvent {
    /// Deserialize the `post` envelope into its typed form.
    ///
    /// Fails with [`GateError::MalformedPayloadField`] when the envelope
    /// is absent or does not match the expected shape.
    pub fn post(&self) -> Result<Post, GateError> {
        let envelope = self
            .payload
            .get("post")
            .ok_or_else(|| GateError::field("post"))?;
        serde_json::from_value(envelope.clone()).map_err(|_| GateError::field("post"))
    }
}
