//! Message transport between the two players.

mod http;
mod mailbox;
mod memory;
mod traits;

pub use http::{HttpTransport, PEER_TOKEN_HEADER};
pub use mailbox::Mailbox;
pub use memory::MemoryTransport;
pub use traits::{Transport, TransportError};
