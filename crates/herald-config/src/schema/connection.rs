//! Realtime connection configuration.

use serde::{Deserialize, Serialize};

/// Connection manager settings: endpoint, handshake, heartbeats, reconnects.
///
/// Durations are plain milliseconds so the TOML stays readable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// WebSocket endpoint of the presence broker.
    pub url: String,
    /// Upper bound on a single transport open (valid range: 1000-60000).
    pub connect_timeout_ms: u64,
    /// How long to wait for a registration ack before assuming success
    /// (valid range: 50-5000).
    pub settle_ms: u64,
    /// Outbound heartbeat period, also the expected inbound period
    /// (valid range: 1000-60000).
    pub heartbeat_interval_ms: u64,
    /// Consecutive silent intervals tolerated before the transport is
    /// declared dead (valid range: 1-10).
    pub missed_heartbeats: u32,
    /// Fixed delay before each reconnect attempt (valid range: 100-300000).
    pub reconnect_delay_ms: u64,
    /// Give up after this many consecutive failed attempts. 0 retries forever.
    pub max_reconnect_attempts: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: "ws://localhost:8080/ws".into(),
            connect_timeout_ms: 15_000,
            settle_ms: 150,
            heartbeat_interval_ms: 4_000,
            missed_heartbeats: 3,
            reconnect_delay_ms: 5_000,
            max_reconnect_attempts: 0,
        }
    }
}
