//! Configuration schema types for Herald.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with the defaults the realtime client and the
//! notification pipeline were tuned against.

mod connection;
mod logging;
mod notifications;
mod presence;

pub use connection::*;
pub use logging::*;
pub use notifications::*;
pub use presence::*;

use serde::{Deserialize, Serialize};

/// Root configuration for Herald.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeraldConfig {
    pub connection: ConnectionConfig,
    pub presence: PresenceConfig,
    pub notifications: NotificationsConfig,
    pub logging: LoggingConfig,
}
