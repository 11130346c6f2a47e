pub mod broadcast;
pub mod ingest;
pub mod registry;
pub mod wire;

pub use broadcast::{BroadcastReport, BroadcastRouter};
pub use ingest::MessageIngest;
pub use registry::{ConnectionSet, Outbound, PeerRegistry};
