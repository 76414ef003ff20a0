use thiserror::Error;

/// Errors produced while validating an inbound webhook request.
///
/// Every failure is classified into exactly one variant and returned
/// synchronously; nothing here is retried. HTTP status mapping is the
/// caller's responsibility.
#[derive(Debug, Error)]
pub enum GateError {
    /// One or more required webhook headers are absent or empty.
    #[error("missing required webhook header: {0}")]
    MissingHeaders(String),

    /// The signature header is present but does not match the computed HMAC.
    #[error("webhook signature verification failed")]
    InvalidSignature,

    /// The request body is not valid JSON.
    #[error("malformed webhook payload: {0}")]
    MalformedPayload(String),

    /// A required payload field is absent or not the expected type.
    ///
    /// Raised lazily by payload accessors when the field is actually
    /// needed, not during initial validation.
    #[error("payload field `{field}` is missing or has the wrong type")]
    MalformedPayloadField {
        /// Dotted path of the offending field, e.g. `post.topic_id`.
        field: String,
    },
}

impl GateError {
    /// Shorthand for [`GateError::MalformedPayloadField`].
    pub fn field(field: impl Into<String>) -> Self {
        Self::MalformedPayloadField {
            field: field.into(),
        }
    }
}
