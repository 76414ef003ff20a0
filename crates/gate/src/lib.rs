//! Webhook authentication and admission gate.
//!
//! Decides, from an HTTP request's headers and raw body bytes, whether a
//! forum webhook event is structurally valid, authentically signed, and
//! admissible for downstream processing. Performs no I/O and touches no
//! business logic; the agent runtime behind it is an external collaborator.

pub mod config;
pub mod gate;

pub use config::GateConfig;
pub use gate::{RawWebhookFields, WebhookGate};
