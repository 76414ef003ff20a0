use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use tribune_core::GateError;

/// Errors surfaced through the Tribune HTTP API.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A required webhook header is absent: the provider is misconfigured.
    #[error("missing webhook header: {0}")]
    MissingHeaders(String),

    /// Signature verification failed.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// The request body could not be understood.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The downstream agent runtime rejected or failed the event.
    #[error("agent runtime error: {0}")]
    Runtime(String),
}

impl From<GateError> for ServerError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::MissingHeaders(name) => Self::MissingHeaders(name),
            GateError::InvalidSignature => Self::InvalidSignature,
            GateError::MalformedPayload(msg) => Self::BadRequest(msg),
            GateError::MalformedPayloadField { field } => {
                Self::BadRequest(format!("payload field `{field}` is missing or malformed"))
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            // A missing header means the webhook sender itself is set up
            // wrong; surfaced as a server-side failure by convention.
            Self::MissingHeaders(name) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("missing webhook header: {name}"),
            ),
            Self::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                "invalid webhook signature".to_owned(),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            Self::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::Runtime(msg) => (StatusCode::BAD_GATEWAY, msg.clone()),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
