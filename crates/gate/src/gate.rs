use hmac::{Hmac, Mac};
use http::HeaderMap;
use serde_json::Value;
use sha2::Sha256;
use tracing::{debug, warn};

use tribune_core::{GateError, WebhookEvent};

use crate::config::GateConfig;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the origin forum instance URL.
pub const HEADER_INSTANCE: &str = "x-discourse-instance";
/// Header carrying the provider-assigned event id.
pub const HEADER_EVENT_ID: &str = "x-discourse-event-id";
/// Header carrying the event type name.
pub const HEADER_EVENT_TYPE: &str = "x-discourse-event-type";
/// Header carrying the `sha256=<hex>` HMAC signature.
pub const HEADER_SIGNATURE: &str = "x-discourse-event-signature";

/// The only event type this gate admits.
const SUPPORTED_EVENT_TYPE: &str = "post_created";

/// Required signature scheme prefix.
const SIGNATURE_PREFIX: &str = "sha256=";

/// The four raw header values of a webhook request, all non-empty.
#[derive(Debug, Clone)]
pub struct RawWebhookFields {
    pub instance_url: String,
    pub event_id: String,
    pub event_type: String,
    pub signature_header: String,
}

/// Validates inbound webhook requests and decides event admission.
///
/// Stateless apart from its configuration; one instance is shared across
/// all requests. See [`GateConfig`] for the open-by-default verification
/// fallback.
#[derive(Debug)]
pub struct WebhookGate {
    config: GateConfig,
}

impl WebhookGate {
    pub fn new(config: GateConfig) -> Self {
        Self { config }
    }

    /// Whether signature verification is active (a secret is configured).
    pub fn verifies_signatures(&self) -> bool {
        self.config.secret.is_some()
    }

    /// Extract the four required webhook headers.
    ///
    /// Header lookup is case-insensitive per HTTP convention. A header
    /// that is absent, empty, or not valid UTF-8 fails the whole request
    /// with [`GateError::MissingHeaders`]; no partial result is returned.
    pub fn parse_headers(headers: &HeaderMap) -> Result<RawWebhookFields, GateError> {
        let required = |name: &'static str| -> Result<String, GateError> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
                .ok_or_else(|| GateError::MissingHeaders(name.to_owned()))
        };

        Ok(RawWebhookFields {
            instance_url: required(HEADER_INSTANCE)?,
            event_id: required(HEADER_EVENT_ID)?,
            event_type: required(HEADER_EVENT_TYPE)?,
            signature_header: required(HEADER_SIGNATURE)?,
        })
    }

    /// Verify the HMAC-SHA256 signature of the raw request body.
    ///
    /// The signature header must carry a literal `sha256=` prefix; any
    /// other prefix is an immediate rejection. Verification is performed
    /// over the body bytes exactly as received, never over a reserialized
    /// payload, so key order and number formatting cannot cause
    /// mismatches. The comparison is constant-time via
    /// [`Mac::verify_slice`].
    ///
    /// Malformed hex or a wrong-length digest is indistinguishable from an
    /// invalid signature and yields `false` rather than an error. When no
    /// secret is configured, verification is skipped entirely.
    pub fn verify_signature(&self, body: &[u8], signature_header: &str) -> bool {
        let Some(secret) = self.config.secret.as_deref() else {
            return true;
        };
        let Some(hex_digest) = signature_header.strip_prefix(SIGNATURE_PREFIX) else {
            return false;
        };
        let Ok(claimed) = hex::decode(hex_digest) else {
            return false;
        };
        let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
            return false;
        };
        mac.update(body);
        mac.verify_slice(&claimed).is_ok()
    }

    /// Validate a webhook request end to end.
    ///
    /// This is the single entry point: header parsing, signature
    /// verification, and body parsing either all succeed and yield a
    /// fully constructed [`WebhookEvent`], or fail with exactly one
    /// [`GateError`]. No partial validation state is exposed.
    pub fn validate(&self, headers: &HeaderMap, body: &[u8]) -> Result<WebhookEvent, GateError> {
        let fields = Self::parse_headers(headers)?;

        if !self.verify_signature(body, &fields.signature_header) {
            warn!(
                instance = %fields.instance_url,
                event_id = %fields.event_id,
                "webhook signature verification failed"
            );
            return Err(GateError::InvalidSignature);
        }

        let payload: Value = serde_json::from_slice(body)
            .map_err(|e| GateError::MalformedPayload(e.to_string()))?;

        Ok(WebhookEvent {
            event_type: fields.event_type,
            instance_url: fields.instance_url,
            event_id: fields.event_id,
            signature_header: fields.signature_header,
            payload,
        })
    }

    /// Explain why a validated event is not admissible, or `None` when it
    /// is.
    ///
    /// The filter is conservative and cheap: it only removes events that
    /// can never be legitimately answered (wrong type, deleted, hidden,
    /// self-authored). Nuanced judgment, such as skipping staff posts or
    /// short posts, is deferred to the downstream consumer.
    pub fn rejection_reason(&self, event: &WebhookEvent) -> Option<&'static str> {
        if event.event_type != SUPPORTED_EVENT_TYPE {
            debug!(event_type = %event.event_type, "ignoring unsupported event type");
            return Some("unsupported_event_type");
        }

        let post = event.payload.get("post");

        let deleted = post
            .and_then(|p| p.get("deleted_at"))
            .is_some_and(|v| !v.is_null());
        let user_deleted = post
            .and_then(|p| p.get("user_deleted"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if deleted || user_deleted {
            debug!(event_id = %event.event_id, "ignoring deleted post");
            return Some("post_deleted");
        }

        let hidden = post
            .and_then(|p| p.get("hidden"))
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if hidden {
            debug!(event_id = %event.event_id, "ignoring hidden post");
            return Some("post_hidden");
        }

        // Best-effort self-authorship check: never block an otherwise
        // valid event just because the author could not be resolved.
        if let Some(bot) = self.config.bot_username.as_deref() {
            match post.and_then(|p| p.get("username")).and_then(Value::as_str) {
                Some(author) if author.eq_ignore_ascii_case(bot) => {
                    debug!(event_id = %event.event_id, "ignoring bot's own post");
                    return Some("self_authored");
                }
                Some(_) => {}
                None => {
                    debug!(
                        event_id = %event.event_id,
                        "post author missing from payload, skipping self-authorship check"
                    );
                }
            }
        }

        None
    }

    /// Decide whether a validated event is admissible for processing.
    pub fn should_admit(&self, event: &WebhookEvent) -> bool {
        self.rejection_reason(event).is_none()
    }
}
