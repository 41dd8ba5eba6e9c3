//! Auxiliary feedback: sound with tone and silence fallbacks, plus haptics.
//!
//! Sound and vibration run concurrently under one deadline. Neither can
//! fail the delivery; every problem ends up as an outcome value.

use std::time::Duration;

use herald_config::schema::NotificationsConfig;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::fallback::FallbackChain;
use crate::host::{AudioHost, HapticHost};
use crate::tone::Tone;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundOutcome {
    /// The alert sound asset played.
    Asset,
    /// The asset failed; the synthesized tone played.
    Tone,
    Silent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticOutcome {
    Vibrated,
    Unsupported,
    /// Empty vibration pattern.
    Disabled,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feedback {
    pub sound: SoundOutcome,
    pub haptic: HapticOutcome,
    /// Something was still running when the deadline passed.
    pub timed_out: bool,
}

impl Feedback {
    /// Whether the user got at least one audible or tactile cue.
    pub fn is_perceptible(&self) -> bool {
        self.sound != SoundOutcome::Silent || self.haptic == HapticOutcome::Vibrated
    }
}

/// What to play for one event.
#[derive(Debug, Clone)]
pub struct FeedbackPlan {
    pub sound_asset: String,
    pub tone: Tone,
    pub vibration_pattern: Vec<u32>,
    pub timeout: Duration,
}

impl FeedbackPlan {
    pub fn from_config(config: &NotificationsConfig) -> Self {
        Self {
            sound_asset: config.sound_asset.clone(),
            tone: Tone::from(&config.tone),
            vibration_pattern: config.vibration_pattern_ms.clone(),
            timeout: Duration::from_millis(config.feedback_timeout_ms),
        }
    }
}

impl Default for FeedbackPlan {
    fn default() -> Self {
        Self::from_config(&NotificationsConfig::default())
    }
}

/// Play sound and vibration for one event.
pub async fn play(audio: &dyn AudioHost, haptics: &dyn HapticHost, plan: &FeedbackPlan) -> Feedback {
    let deadline = Instant::now() + plan.timeout;

    let (sound, haptic) = tokio::join!(
        tokio::time::timeout_at(deadline, play_sound(audio, plan)),
        tokio::time::timeout_at(deadline, vibrate(haptics, &plan.vibration_pattern)),
    );

    let timed_out = sound.is_err() || haptic.is_err();
    if timed_out {
        warn!(timeout_ms = plan.timeout.as_millis() as u64, "Feedback did not finish in time");
    }

    Feedback {
        sound: sound.unwrap_or(SoundOutcome::Silent),
        haptic: haptic.unwrap_or(HapticOutcome::Failed),
        timed_out,
    }
}

async fn play_sound(audio: &dyn AudioHost, plan: &FeedbackPlan) -> SoundOutcome {
    let chain = FallbackChain::new("sound")
        .then("asset", async {
            audio.play_asset(&plan.sound_asset).await?;
            Ok(SoundOutcome::Asset)
        })
        .then("tone", async {
            let samples = plan.tone.samples();
            audio.play_samples(&samples, plan.tone.sample_rate).await?;
            Ok(SoundOutcome::Tone)
        })
        .then("silence", async { Ok(SoundOutcome::Silent) });

    match chain.run().await {
        Ok(fallback) => {
            for (strategy, error) in &fallback.failures {
                debug!(strategy, error = %error, "Sound strategy failed");
            }
            fallback.value
        }
        Err(e) => {
            warn!(error = %e, "Sound fallback exhausted");
            SoundOutcome::Silent
        }
    }
}

async fn vibrate(haptics: &dyn HapticHost, pattern: &[u32]) -> HapticOutcome {
    if pattern.is_empty() {
        return HapticOutcome::Disabled;
    }
    if !haptics.supports_vibration() {
        return HapticOutcome::Unsupported;
    }
    match haptics.vibrate(pattern).await {
        Ok(()) => HapticOutcome::Vibrated,
        Err(e) => {
            warn!(error = %e, "Vibration failed");
            HapticOutcome::Failed
        }
    }
}
