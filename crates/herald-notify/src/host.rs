//! Capabilities the pipeline needs from the platform.

use async_trait::async_trait;
use herald_common::DeliveryError;

use crate::intent::NotificationIntent;

/// Notification permission as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
    /// The user has not been asked yet.
    Undetermined,
}

/// Visual notification surfaces.
#[async_trait]
pub trait NotificationHost: Send + Sync {
    async fn permission(&self) -> Permission;

    /// Ask the user. Only called while the permission is undetermined.
    async fn request_permission(&self) -> Permission;

    /// Whether a background surface (one that works while the app is not
    /// focused) is registered.
    fn has_background_surface(&self) -> bool;

    async fn show_background(&self, intent: &NotificationIntent) -> Result<(), DeliveryError>;

    async fn show_foreground(&self, intent: &NotificationIntent) -> Result<(), DeliveryError>;

    /// Blocking in-app prompt; the last resort.
    async fn prompt(&self, intent: &NotificationIntent) -> Result<(), DeliveryError>;
}

/// Audible feedback.
#[async_trait]
pub trait AudioHost: Send + Sync {
    /// Play a bundled sound asset.
    async fn play_asset(&self, asset: &str) -> Result<(), DeliveryError>;

    /// Play mono `f32` samples in `[-1.0, 1.0]`.
    async fn play_samples(&self, samples: &[f32], sample_rate: u32) -> Result<(), DeliveryError>;
}

/// Vibration.
#[async_trait]
pub trait HapticHost: Send + Sync {
    fn supports_vibration(&self) -> bool;

    /// Alternating on/off durations in milliseconds, starting with on.
    async fn vibrate(&self, pattern: &[u32]) -> Result<(), DeliveryError>;
}
