pub mod client;
pub mod connection;
pub mod identity;
pub mod payload;
pub mod presence;
pub mod protocol;
pub mod registry;
pub mod transport;

pub use client::PresenceClient;
pub use connection::{ConnectionEvent, ConnectionState, ConnectionStatus, RealtimeConfig};
pub use herald_common::RealtimeError;
pub use identity::ClientIdentity;
pub use payload::Payload;
pub use presence::PresenceState;
pub use protocol::{destinations, Command, Frame, LocationUpdate, Registration};
pub use registry::{Delivery, DispatchOutcome, Listener, SubscriptionHandle, SubscriptionRegistry};
pub use transport::{
    MemoryPeer, MemoryServer, MemoryTransport, Transport, TransportEvent, TransportLink,
    WebSocketTransport,
};
