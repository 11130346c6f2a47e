pub mod events;
pub mod identity;
pub mod validation;

pub use events::{AuctionEvent, EventKind, LogEntry, PeerIdentity, Proposal};
pub use identity::LocalIdentity;
pub use validation::evaluate;
