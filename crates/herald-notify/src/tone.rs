//! In-process tone synthesis for when the alert sound cannot be played.

use std::f64::consts::TAU;
use std::time::Duration;

use herald_config::schema::ToneConfig;

/// Attack ramp that keeps the tone from starting with a click.
const ATTACK: Duration = Duration::from_millis(5);
/// The envelope decays to this fraction of `gain` by the last sample.
const DECAY_FLOOR: f64 = 0.001;

/// A fixed-frequency sine beep with an exponential decay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tone {
    pub frequency_hz: f64,
    pub duration: Duration,
    pub gain: f64,
    pub sample_rate: u32,
}

impl Default for Tone {
    fn default() -> Self {
        Self::from(&ToneConfig::default())
    }
}

impl From<&ToneConfig> for Tone {
    fn from(config: &ToneConfig) -> Self {
        Self {
            frequency_hz: config.frequency_hz,
            duration: Duration::from_millis(u64::from(config.duration_ms)),
            gain: config.gain,
            sample_rate: config.sample_rate,
        }
    }
}

impl Tone {
    pub fn sample_count(&self) -> usize {
        (self.duration.as_secs_f64() * f64::from(self.sample_rate)).round() as usize
    }

    /// Mono samples in `[-gain, gain]`.
    pub fn samples(&self) -> Vec<f32> {
        let count = self.sample_count();
        if count == 0 || self.sample_rate == 0 {
            return Vec::new();
        }

        let rate = f64::from(self.sample_rate);
        let gain = self.gain.clamp(0.0, 1.0);
        let attack = (ATTACK.as_secs_f64() * rate).max(1.0);
        // Exponential decay reaching DECAY_FLOOR at the final sample.
        let decay = DECAY_FLOOR.ln() / count as f64;

        (0..count)
            .map(|n| {
                let t = n as f64;
                let ramp = (t / attack).min(1.0);
                let envelope = ramp * (decay * t).exp();
                let value = gain * envelope * (TAU * self.frequency_hz * t / rate).sin();
                value as f32
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tone_matches_config() {
        let tone = Tone::default();
        assert_eq!(tone.frequency_hz, 880.0);
        assert_eq!(tone.duration, Duration::from_millis(300));
        assert_eq!(tone.sample_count(), 13_230);
    }

    #[test]
    fn samples_stay_within_gain() {
        let tone = Tone::default();
        let samples = tone.samples();
        assert_eq!(samples.len(), tone.sample_count());
        let peak = samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        assert!(peak > 0.1, "tone is audible, peak {peak}");
        assert!(peak <= tone.gain as f32 + f32::EPSILON);
    }

    #[test]
    fn starts_silent_and_fades_out() {
        let samples = Tone::default().samples();
        assert_eq!(samples[0], 0.0);
        let tail = &samples[samples.len() - 100..];
        assert!(tail.iter().all(|s| s.abs() < 0.01));
    }

    #[test]
    fn oscillates_at_requested_frequency() {
        let tone = Tone {
            frequency_hz: 1_000.0,
            duration: Duration::from_secs(1),
            gain: 1.0,
            sample_rate: 48_000,
        };
        let samples = tone.samples();
        let crossings = samples
            .windows(2)
            .filter(|w| w[0] < 0.0 && w[1] >= 0.0)
            .count();
        assert!((995..=1_000).contains(&crossings), "{crossings} upward crossings");
    }

    #[test]
    fn zero_duration_is_empty() {
        let tone = Tone {
            duration: Duration::ZERO,
            ..Tone::default()
        };
        assert!(tone.samples().is_empty());
    }
}
