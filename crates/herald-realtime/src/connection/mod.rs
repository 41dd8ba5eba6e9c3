//! Connection manager.
//!
//! Owns one transport link at a time, runs the registration handshake,
//! sends heartbeats, watches inbound liveness, and reconnects after a fixed
//! delay. Each `connect` call starts one background session; `disconnect`
//! invalidates it.

mod session;
pub(crate) mod state;
mod types;

pub(crate) use session::Session;
pub use types::{ConnectionEvent, ConnectionState, ConnectionStatus, RealtimeConfig};
