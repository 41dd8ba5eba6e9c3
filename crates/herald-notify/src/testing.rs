//! Recording host fakes shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use herald_common::DeliveryError;

use crate::channel::Channel;
use crate::host::{AudioHost, HapticHost, NotificationHost, Permission};
use crate::intent::NotificationIntent;

pub(crate) fn intent(tag: &str) -> NotificationIntent {
    NotificationIntent {
        title: "Notification".into(),
        body: "body".into(),
        tag: tag.into(),
        require_interaction: false,
        target_url: "/admin".into(),
    }
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

pub(crate) struct RecordingNotifier {
    permission: Mutex<Permission>,
    answer: Permission,
    background: bool,
    failing: Vec<Channel>,
    requests: AtomicUsize,
    shown: Mutex<Vec<(Channel, NotificationIntent)>>,
}

impl RecordingNotifier {
    fn with_permission(permission: Permission, answer: Permission) -> Self {
        Self {
            permission: Mutex::new(permission),
            answer,
            background: false,
            failing: Vec::new(),
            requests: AtomicUsize::new(0),
            shown: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn granted() -> Self {
        Self::with_permission(Permission::Granted, Permission::Granted)
    }

    pub(crate) fn denied() -> Self {
        Self::with_permission(Permission::Denied, Permission::Denied)
    }

    /// Undetermined until asked; the user then answers `answer`.
    pub(crate) fn undetermined(answer: Permission) -> Self {
        Self::with_permission(Permission::Undetermined, answer)
    }

    pub(crate) fn with_background_surface(mut self) -> Self {
        self.background = true;
        self
    }

    pub(crate) fn failing(mut self, channel: Channel) -> Self {
        self.failing.push(channel);
        self
    }

    /// `(channel, tag)` for every successful show.
    pub(crate) fn shown(&self) -> Vec<(Channel, String)> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .map(|(channel, intent)| (*channel, intent.tag.clone()))
            .collect()
    }

    pub(crate) fn intents(&self) -> Vec<NotificationIntent> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .map(|(_, intent)| intent.clone())
            .collect()
    }

    pub(crate) fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    fn show(&self, channel: Channel, intent: &NotificationIntent) -> Result<(), DeliveryError> {
        if self.failing.contains(&channel) {
            return Err(DeliveryError::Host(format!("{channel:?} broken")));
        }
        self.shown.lock().unwrap().push((channel, intent.clone()));
        Ok(())
    }
}

#[async_trait]
impl NotificationHost for RecordingNotifier {
    async fn permission(&self) -> Permission {
        *self.permission.lock().unwrap()
    }

    async fn request_permission(&self) -> Permission {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let mut permission = self.permission.lock().unwrap();
        *permission = self.answer;
        *permission
    }

    fn has_background_surface(&self) -> bool {
        self.background
    }

    async fn show_background(&self, intent: &NotificationIntent) -> Result<(), DeliveryError> {
        self.show(Channel::Background, intent)
    }

    async fn show_foreground(&self, intent: &NotificationIntent) -> Result<(), DeliveryError> {
        self.show(Channel::Foreground, intent)
    }

    async fn prompt(&self, intent: &NotificationIntent) -> Result<(), DeliveryError> {
        self.show(Channel::Prompt, intent)
    }
}

// ---------------------------------------------------------------------------
// Audio
// ---------------------------------------------------------------------------

#[derive(Default)]
pub(crate) struct RecordingAudio {
    asset_error: Option<DeliveryError>,
    tone_error: Option<DeliveryError>,
    delay: Option<Duration>,
    assets: Mutex<Vec<String>>,
    tones: AtomicUsize,
}

impl RecordingAudio {
    pub(crate) fn failing_asset(error: DeliveryError) -> Self {
        Self {
            asset_error: Some(error),
            ..Self::default()
        }
    }

    pub(crate) fn with_failing_tone(mut self, error: DeliveryError) -> Self {
        self.tone_error = Some(error);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn assets(&self) -> Vec<String> {
        self.assets.lock().unwrap().clone()
    }

    pub(crate) fn tones(&self) -> usize {
        self.tones.load(Ordering::SeqCst)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl AudioHost for RecordingAudio {
    async fn play_asset(&self, asset: &str) -> Result<(), DeliveryError> {
        self.pause().await;
        if let Some(error) = &self.asset_error {
            return Err(error.clone());
        }
        self.assets.lock().unwrap().push(asset.to_string());
        Ok(())
    }

    async fn play_samples(&self, samples: &[f32], _sample_rate: u32) -> Result<(), DeliveryError> {
        self.pause().await;
        if let Some(error) = &self.tone_error {
            return Err(error.clone());
        }
        assert!(!samples.is_empty());
        self.tones.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Haptics
// ---------------------------------------------------------------------------

pub(crate) struct RecordingHaptics {
    supported: bool,
    error: Option<DeliveryError>,
    patterns: Mutex<Vec<Vec<u32>>>,
}

impl RecordingHaptics {
    pub(crate) fn supported() -> Self {
        Self {
            supported: true,
            error: None,
            patterns: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn unsupported() -> Self {
        Self {
            supported: false,
            ..Self::supported()
        }
    }

    pub(crate) fn failing(error: DeliveryError) -> Self {
        Self {
            error: Some(error),
            ..Self::supported()
        }
    }

    pub(crate) fn patterns(&self) -> Vec<Vec<u32>> {
        self.patterns.lock().unwrap().clone()
    }
}

#[async_trait]
impl HapticHost for RecordingHaptics {
    fn supports_vibration(&self) -> bool {
        self.supported
    }

    async fn vibrate(&self, pattern: &[u32]) -> Result<(), DeliveryError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        self.patterns.lock().unwrap().push(pattern.to_vec());
        Ok(())
    }
}
