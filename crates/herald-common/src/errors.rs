use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("config parse error: {0}")]
    ParseError(String),

    #[error("config validation error: {0}")]
    ValidationError(String),

    #[error("config write error: {0}")]
    WriteError(String),
}

/// Failures of the realtime connection and its handshake.
///
/// Cloneable so the same value can resolve a pending `connect` call and be
/// published on the connection event stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RealtimeError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("transport open timed out after {0} ms")]
    Timeout(u64),

    #[error("registration rejected: {0}")]
    RegistrationRejected(String),

    #[error("malformed registration ack: {0}")]
    MalformedAck(String),

    #[error("connection closed: {0}")]
    Closed(String),

    #[error("no heartbeat received for {0} intervals")]
    HeartbeatTimeout(u32),

    #[error("connect attempt cancelled")]
    Cancelled,
}

impl RealtimeError {
    /// Registration failures end the attempt; the caller picks the next identity.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RealtimeError::RegistrationRejected(_)
                | RealtimeError::MalformedAck(_)
                | RealtimeError::Cancelled
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("notification permission denied")]
    PermissionDenied,

    #[error("channel unavailable: {0}")]
    Unavailable(String),

    #[error("audio asset missing: {0}")]
    AssetMissing(String),

    #[error("playback blocked: {0}")]
    PlaybackBlocked(String),

    #[error("host error: {0}")]
    Host(String),

    #[error("all strategies failed for {0}")]
    Exhausted(String),
}

#[derive(Debug, thiserror::Error)]
pub enum HeraldError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Realtime(#[from] RealtimeError),

    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}
