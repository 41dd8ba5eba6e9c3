//! Notification pipeline configuration.

use serde::{Deserialize, Serialize};

/// Fallback tone synthesized when the alert sound cannot be played.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneConfig {
    /// Oscillator frequency in Hz (valid range: 20.0-20000.0).
    pub frequency_hz: f64,
    /// Tone length in milliseconds (valid range: 20-2000).
    pub duration_ms: u32,
    /// Peak amplitude (valid range: 0.0-1.0).
    pub gain: f64,
    /// Output sample rate in Hz (valid range: 8000-192000).
    pub sample_rate: u32,
}

impl Default for ToneConfig {
    fn default() -> Self {
        Self {
            frequency_hz: 880.0,
            duration_ms: 300,
            gain: 0.3,
            sample_rate: 44_100,
        }
    }
}

/// Notification delivery settings.
///
/// Whether notifications are enabled at all is a user preference persisted
/// separately (see `preference`), not part of this file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    /// Alert sound asset handed to the audio host.
    pub sound_asset: String,
    pub tone: ToneConfig,
    /// Vibration on/off pattern in milliseconds.
    pub vibration_pattern_ms: Vec<u32>,
    /// Upper bound on sound + haptic feedback for one event
    /// (valid range: 100-10000).
    pub feedback_timeout_ms: u64,
    /// Link attached to intents whose payload carries no `url`.
    pub default_target_url: String,
    /// Maximum notifications tracked as visible (valid range: 1-100).
    pub display_capacity: u32,
    /// Seconds a visible notification is tracked (valid range: 1-3600).
    pub display_ttl_secs: u32,
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            sound_asset: "sounds/notification.mp3".into(),
            tone: ToneConfig::default(),
            vibration_pattern_ms: vec![200, 100, 200],
            feedback_timeout_ms: 2_000,
            default_target_url: "/admin".into(),
            display_capacity: 16,
            display_ttl_secs: 10,
        }
    }
}
