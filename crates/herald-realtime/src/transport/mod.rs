//! Transport Socket abstraction.
//!
//! A transport opens one full-duplex text stream to the server. The
//! connection manager owns the returned link exclusively; dropping the
//! outbound sender closes the underlying socket.

pub mod memory;
mod websocket;

use async_trait::async_trait;
use herald_common::RealtimeError;
use tokio::sync::mpsc;

pub use memory::{MemoryPeer, MemoryServer, MemoryTransport};
pub use websocket::WebSocketTransport;

/// Something that happened on the inbound half of a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// One inbound text frame.
    Frame(String),
    /// The peer closed the stream, with an optional reason.
    Closed(Option<String>),
    /// The stream failed.
    Error(String),
}

/// An open link: text frames out, transport events in.
#[derive(Debug)]
pub struct TransportLink {
    pub outbound: mpsc::Sender<String>,
    pub inbound: mpsc::Receiver<TransportEvent>,
}

/// Opens links to one server endpoint.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self) -> Result<TransportLink, RealtimeError>;
}
