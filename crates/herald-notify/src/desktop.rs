//! Host implementation for a desktop process.
//!
//! - macOS: `osascript` for notifications and prompts, `afplay` for the
//!   alert sound and for synthesized tones, which go through a temporary
//!   WAV file.
//! - Other platforms: notifications and prompts are logged; audio is
//!   unavailable.
//!
//! No desktop has a vibration motor.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use herald_common::DeliveryError;
use tracing::info;

use crate::host::{AudioHost, HapticHost, NotificationHost, Permission};
use crate::intent::NotificationIntent;

#[derive(Debug, Clone, Default)]
pub struct DesktopHost {
    /// Directory that relative sound asset paths are resolved against.
    asset_root: Option<PathBuf>,
}

impl DesktopHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_asset_root(root: impl Into<PathBuf>) -> Self {
        Self {
            asset_root: Some(root.into()),
        }
    }

    fn resolve_asset(&self, asset: &str) -> PathBuf {
        let path = Path::new(asset);
        match &self.asset_root {
            Some(root) if path.is_relative() => root.join(path),
            _ => path.to_path_buf(),
        }
    }
}

/// Escape text for an AppleScript string literal.
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[async_trait]
impl NotificationHost for DesktopHost {
    async fn permission(&self) -> Permission {
        Permission::Granted
    }

    async fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    fn has_background_surface(&self) -> bool {
        false
    }

    async fn show_background(&self, _intent: &NotificationIntent) -> Result<(), DeliveryError> {
        Err(DeliveryError::Unavailable(
            "no background surface on desktop".into(),
        ))
    }

    async fn show_foreground(&self, intent: &NotificationIntent) -> Result<(), DeliveryError> {
        platform_notify(intent).await
    }

    async fn prompt(&self, intent: &NotificationIntent) -> Result<(), DeliveryError> {
        platform_prompt(intent).await
    }
}

#[cfg(target_os = "macos")]
async fn run_osascript(script: &str) -> Result<(), DeliveryError> {
    let output = tokio::process::Command::new("osascript")
        .arg("-e")
        .arg(script)
        .output()
        .await
        .map_err(|e| DeliveryError::Host(format!("failed to run osascript: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DeliveryError::Host(format!("osascript failed: {stderr}")));
    }
    Ok(())
}

#[cfg(target_os = "macos")]
async fn platform_notify(intent: &NotificationIntent) -> Result<(), DeliveryError> {
    let script = format!(
        "display notification \"{}\" with title \"{}\"",
        escape_applescript(&intent.body),
        escape_applescript(&intent.title)
    );
    run_osascript(&script).await?;
    info!(tag = %intent.tag, "Native notification sent");
    Ok(())
}

#[cfg(target_os = "macos")]
async fn platform_prompt(intent: &NotificationIntent) -> Result<(), DeliveryError> {
    let script = format!(
        "display dialog \"{}\" with title \"{}\" buttons {{\"OK\"}} default button \"OK\"",
        escape_applescript(&intent.body),
        escape_applescript(&intent.title)
    );
    run_osascript(&script).await?;
    info!(tag = %intent.tag, "Prompt acknowledged");
    Ok(())
}

#[cfg(not(target_os = "macos"))]
async fn platform_notify(intent: &NotificationIntent) -> Result<(), DeliveryError> {
    info!(
        tag = %intent.tag,
        title = %intent.title,
        body = %intent.body,
        target_url = %intent.target_url,
        "Notification"
    );
    Ok(())
}

#[cfg(not(target_os = "macos"))]
async fn platform_prompt(intent: &NotificationIntent) -> Result<(), DeliveryError> {
    tracing::warn!(
        tag = %intent.tag,
        title = %intent.title,
        body = %intent.body,
        "Notification (prompt)"
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

#[async_trait]
impl AudioHost for DesktopHost {
    async fn play_asset(&self, asset: &str) -> Result<(), DeliveryError> {
        let path = self.resolve_asset(asset);
        if !path.is_file() {
            return Err(DeliveryError::AssetMissing(path.display().to_string()));
        }
        platform_play(&path).await
    }

    async fn play_samples(&self, samples: &[f32], sample_rate: u32) -> Result<(), DeliveryError> {
        if !cfg!(target_os = "macos") {
            return Err(DeliveryError::Unavailable("no raw audio output".into()));
        }
        let file = tempfile::Builder::new()
            .prefix("herald-tone-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| DeliveryError::Host(format!("failed to create tone file: {e}")))?;
        tokio::fs::write(file.path(), encode_wav(samples, sample_rate))
            .await
            .map_err(|e| DeliveryError::Host(format!("failed to write tone file: {e}")))?;
        // `file` is removed on drop, after playback finishes.
        platform_play(file.path()).await
    }
}

const WAV_HEADER_LEN: usize = 44;

/// Mono 16-bit PCM WAV. Samples are clamped to `[-1.0, 1.0]`.
fn encode_wav(samples: &[f32], sample_rate: u32) -> Vec<u8> {
    let data_len = u32::try_from(samples.len() * 2).unwrap_or(u32::MAX);
    let mut out = Vec::with_capacity(WAV_HEADER_LEN + samples.len() * 2);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&data_len.saturating_add(36).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&sample_rate.saturating_mul(2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        let value = (sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16;
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

#[cfg(target_os = "macos")]
async fn platform_play(path: &Path) -> Result<(), DeliveryError> {
    let status = tokio::process::Command::new("afplay")
        .arg(path)
        .status()
        .await
        .map_err(|e| DeliveryError::Host(format!("failed to run afplay: {e}")))?;
    if !status.success() {
        return Err(DeliveryError::PlaybackBlocked(format!("afplay exited with {status}")));
    }
    Ok(())
}

#[cfg(not(target_os = "macos"))]
async fn platform_play(_path: &Path) -> Result<(), DeliveryError> {
    Err(DeliveryError::Unavailable("no audio player on this platform".into()))
}

// ---------------------------------------------------------------------------
// Haptics
// ---------------------------------------------------------------------------

#[async_trait]
impl HapticHost for DesktopHost {
    fn supports_vibration(&self) -> bool {
        false
    }

    async fn vibrate(&self, _pattern: &[u32]) -> Result<(), DeliveryError> {
        Err(DeliveryError::Unavailable("no vibration on desktop".into()))
    }
}
