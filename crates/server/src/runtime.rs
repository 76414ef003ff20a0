//! The downstream agent-runtime collaborator.
//!
//! Everything behind [`AgentRuntime`] is out of scope for this service:
//! message composition, LLM calls, and memory all live elsewhere. The
//! gateway's only obligation is to hand over a validated, admitted post
//! together with deterministically derived identities.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use tribune_core::{GateError, WebhookEvent, conversation_id, participant_id};

/// A validated, admitted forum post, flattened for the runtime.
#[derive(Debug, Clone)]
pub struct AdmittedPost {
    /// Stable conversation id derived from the topic id.
    pub conversation_id: String,
    /// Stable participant id derived from the author's username.
    pub participant_id: String,
    /// Origin forum instance URL.
    pub instance_url: String,
    /// Provider-assigned event id, carried for traceability only.
    pub event_id: String,
    /// Forum topic id.
    pub topic_id: i64,
    /// Position of the post within its topic.
    pub post_number: i64,
    /// Author username.
    pub username: String,
    /// Raw post body.
    pub raw: String,
    /// Topic title, when present.
    pub topic_title: Option<String>,
}

impl AdmittedPost {
    /// Build the runtime-facing view from a validated event.
    ///
    /// Raises [`GateError::MalformedPayloadField`] for any field the
    /// runtime cannot do without; this is the lazy accessor point of the
    /// error taxonomy.
    pub fn from_event(event: &WebhookEvent) -> Result<Self, GateError> {
        let post = event.post()?;
        let topic_id = post.topic_id()?;
        let username = post.username()?.to_owned();

        Ok(Self {
            conversation_id: conversation_id(topic_id),
            participant_id: participant_id(&username),
            instance_url: event.instance_url.clone(),
            event_id: event.event_id.clone(),
            topic_id,
            post_number: post.post_number()?,
            raw: post.raw()?.to_owned(),
            topic_title: post.topic_title.clone(),
            username,
        })
    }
}

/// Error returned by the agent runtime.
#[derive(Debug, Error)]
#[error("agent runtime error: {0}")]
pub struct RuntimeError(pub String);

/// Downstream consumer of admitted webhook events.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    /// Hand an admitted post over for processing.
    async fn handle_post(&self, post: AdmittedPost) -> Result<(), RuntimeError>;
}

/// Runtime that logs admitted posts and succeeds. Default wiring for
/// deployments that have not connected a real runtime yet, and handy in
/// tests.
#[derive(Debug, Default)]
pub struct LogRuntime;

#[async_trait]
impl AgentRuntime for LogRuntime {
    async fn handle_post(&self, post: AdmittedPost) -> Result<(), RuntimeError> {
        info!(
            conversation = %post.conversation_id,
            participant = %post.participant_id,
            topic_id = post.topic_id,
            post_number = post.post_number,
            "admitted post handed to runtime"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(payload: serde_json::Value) -> WebhookEvent {
        WebhookEvent {
            event_type: "post_created".to_owned(),
            instance_url: "https://community.example.com".to_owned(),
            event_id: "12345".to_owned(),
            signature_header: "sha256=00".to_owned(),
            payload,
        }
    }

    #[test]
    fn from_event_derives_stable_identities() {
        let event = event(serde_json::json!({
            "post": {
                "username": "alice",
                "raw": "hello",
                "post_number": 2,
                "topic_id": 99,
                "topic_title": "Greetings"
            }
        }));

        let a = AdmittedPost::from_event(&event).unwrap();
        let b = AdmittedPost::from_event(&event).unwrap();
        assert_eq!(a.conversation_id, b.conversation_id);
        assert_eq!(a.participant_id, b.participant_id);
        assert_eq!(a.topic_id, 99);
        assert_eq!(a.post_number, 2);
        assert_eq!(a.topic_title.as_deref(), Some("Greetings"));
    }

    #[test]
    fn from_event_requires_routing_fields() {
        let event = event(serde_json::json!({
            "post": { "username": "alice", "raw": "hello" }
        }));

        assert!(matches!(
            AdmittedPost::from_event(&event).unwrap_err(),
            GateError::MalformedPayloadField { ref field } if field == "post.topic_id"
        ));
    }
}
