//! Deterministic identity derivation for downstream routing.
//!
//! The agent runtime addresses conversations and participants by opaque
//! stable ids. These are derived from webhook event fields via SHA-256
//! over length-prefixed inputs, so the same topic or user always maps to
//! the same id regardless of which event carried it.

use sha2::{Digest, Sha256};

/// Hex length of a derived id (truncated SHA-256 digest).
const ID_LEN: usize = 32;

fn derive(kind: &str, value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(kind.as_bytes());
    hasher.update(b":");
    // Length prefix prevents collisions between concatenated inputs.
    hasher.update(value.len().to_string().as_bytes());
    hasher.update(b":");
    hasher.update(value.as_bytes());
    let mut hex = hex::encode(hasher.finalize());
    hex.truncate(ID_LEN);
    hex
}

/// Stable conversation id for a forum topic.
#[must_use]
pub fn conversation_id(topic_id: i64) -> String {
    derive("topic", &topic_id.to_string())
}

/// Stable participant id for a forum username.
#[must_use]
pub fn participant_id(username: &str) -> String {
    derive("user", username)
}

/// Stable agent id for a forum instance URL.
#[must_use]
pub fn agent_id(instance_url: &str) -> String {
    derive("instance", instance_url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_stable() {
        assert_eq!(conversation_id(123), conversation_id(123));
        assert_eq!(participant_id("alice"), participant_id("alice"));
        assert_eq!(
            agent_id("https://community.example.com"),
            agent_id("https://community.example.com")
        );
    }

    #[test]
    fn ids_differ_by_input() {
        assert_ne!(conversation_id(1), conversation_id(2));
        assert_ne!(participant_id("alice"), participant_id("bob"));
    }

    #[test]
    fn kinds_partition_the_id_space() {
        // A topic id and a username with the same string form must not collide.
        assert_ne!(conversation_id(42), participant_id("42"));
    }

    #[test]
    fn ids_are_fixed_length_hex() {
        let id = participant_id("alice");
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
