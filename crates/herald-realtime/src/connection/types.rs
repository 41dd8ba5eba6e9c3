//! Configuration, state, and event types for the connection manager.

use std::time::{Duration, Instant};

use herald_common::RealtimeError;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Timing policy for one connection manager.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// Upper bound on a single transport open.
    pub connect_timeout: Duration,
    /// Wait for a registration ack before assuming the server took it.
    pub settle: Duration,
    /// Outbound heartbeat period, also the expected inbound period.
    pub heartbeat_interval: Duration,
    /// Silent intervals tolerated before the link is declared dead.
    pub missed_heartbeats: u32,
    /// Fixed delay before each reconnect attempt.
    pub reconnect_delay: Duration,
    /// Consecutive failed reconnect attempts before giving up. 0 = never.
    pub max_reconnect_attempts: u32,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(15),
            settle: Duration::from_millis(150),
            heartbeat_interval: Duration::from_secs(4),
            missed_heartbeats: 3,
            reconnect_delay: Duration::from_secs(5),
            max_reconnect_attempts: 0,
        }
    }
}

/// Shortest heartbeat period the session will run with.
const MIN_HEARTBEAT: Duration = Duration::from_millis(1);
/// Longest single wait the session schedules; keeps deadlines representable.
const MAX_WAIT: Duration = Duration::from_secs(24 * 60 * 60);

impl RealtimeConfig {
    /// Heartbeat period, clamped to `[1 ms, 24 h]`.
    pub(crate) fn heartbeat_period(&self) -> Duration {
        self.heartbeat_interval.clamp(MIN_HEARTBEAT, MAX_WAIT)
    }

    /// How long the link may stay silent before it counts as failed.
    pub(crate) fn liveness_window(&self) -> Duration {
        self.heartbeat_period()
            .saturating_mul(self.missed_heartbeats.max(1))
    }

    /// Registration settle window, capped at 24 h.
    pub(crate) fn settle_window(&self) -> Duration {
        self.settle.min(MAX_WAIT)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Failed,
}

/// Point-in-time view of the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    pub generation: u64,
    pub client_id: Option<String>,
    /// Location last confirmed by a presence publication.
    pub location: Option<String>,
    pub last_heartbeat_in: Option<Instant>,
    pub last_heartbeat_out: Option<Instant>,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events emitted by the connection manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Registration done; `generation` identifies this connection lifetime.
    /// Subscriptions from earlier generations are gone, so subscribe again here.
    Connected { generation: u64 },
    /// Link lost or attempt failed; next attempt after `delay`.
    Reconnecting { attempt: u32, delay: Duration },
    /// `disconnect()` was called.
    Disconnected,
    Error(RealtimeError),
}
