use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::GateError;

/// The `post` envelope of a forum post-creation webhook payload.
///
/// Every field is optional at the wire level: the provider omits fields
/// freely and initial validation never inspects them. The accessor
/// methods raise [`GateError::MalformedPayloadField`] for fields that
/// downstream processing cannot do without.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Post {
    /// Provider-assigned post id.
    pub id: Option<i64>,

    /// Author's username.
    pub username: Option<String>,

    /// Author's numeric user id.
    pub user_id: Option<i64>,

    /// When the post was created.
    pub created_at: Option<DateTime<Utc>>,

    /// Raw (unrendered) post body.
    pub raw: Option<String>,

    /// Position of the post within its topic (1 = topic starter).
    pub post_number: Option<i64>,

    /// Topic this post belongs to.
    pub topic_id: Option<i64>,

    pub topic_slug: Option<String>,
    pub topic_title: Option<String>,

    pub category_id: Option<i64>,
    pub category_slug: Option<String>,

    /// Whether the author is a moderator / admin / staff member.
    #[serde(default)]
    pub moderator: bool,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub staff: bool,

    /// Whether the post has been hidden by moderation.
    #[serde(default)]
    pub hidden: bool,

    /// Deletion timestamp; non-null means the post was deleted.
    pub deleted_at: Option<DateTime<Utc>>,

    /// Whether the author's account has been deleted.
    #[serde(default)]
    pub user_deleted: bool,
}

impl Post {
    /// Topic id, required for routing the post to a conversation.
    pub fn topic_id(&self) -> Result<i64, GateError> {
        self.topic_id.ok_or_else(|| GateError::field("post.topic_id"))
    }

    /// Post number, required for reply anchoring.
    pub fn post_number(&self) -> Result<i64, GateError> {
        self.post_number
            .ok_or_else(|| GateError::field("post.post_number"))
    }

    /// Author username, required for participant identity.
    pub fn username(&self) -> Result<&str, GateError> {
        self.username
            .as_deref()
            .ok_or_else(|| GateError::field("post.username"))
    }

    /// Raw post body, required for composing a reply.
    pub fn raw(&self) -> Result<&str, GateError> {
        self.raw.as_deref().ok_or_else(|| GateError::field("post.raw"))
    }
}
