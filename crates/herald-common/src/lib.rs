pub mod errors;
pub mod id;

pub use errors::{ConfigError, DeliveryError, HeraldError, RealtimeError};
pub use id::{new_id, new_short_id, EventId};

pub type Result<T> = std::result::Result<T, HeraldError>;
