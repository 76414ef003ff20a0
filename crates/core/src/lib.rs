pub mod clock;
pub mod error;
pub mod event;
pub mod identity;
pub mod post;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::GateError;
pub use event::WebhookEvent;
pub use identity::{agent_id, conversation_id, participant_id};
pub use post::Post;
