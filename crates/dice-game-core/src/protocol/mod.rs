//! Protocol types, messages, and the per-round state machine.

mod messages;
mod round;
mod types;

pub use messages::{Envelope, Message, MessageKind};
pub use round::{ProtocolError, RoundProtocol, RoundState};
pub use types::{Role, RoundOutcome, RoundRecord};
