//! The notification delivery pipeline.
//!
//! For each domain event: build an intent, settle the notification
//! permission (asking the user at most once), then run channel selection and
//! auxiliary feedback concurrently. Failures are logged and reported in the
//! returned `DeliveryReport`, never propagated.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use herald_common::{ConfigError, EventId};
use herald_config::schema::NotificationsConfig;
use herald_config::PreferenceStore;
use tracing::{debug, info, warn};

use crate::channel::{self, Channel};
use crate::event::{DomainEvent, EventKind};
use crate::feedback::{self, Feedback, FeedbackPlan};
use crate::host::{AudioHost, HapticHost, NotificationHost, Permission};
use crate::intent::{tag_for, NotificationIntent};
use crate::queue::{DisplayedNotification, DisplayedNotifications};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub feedback: FeedbackPlan,
    pub default_target_url: String,
    pub display_capacity: usize,
    pub display_ttl: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &NotificationsConfig) -> Self {
        Self {
            feedback: FeedbackPlan::from_config(config),
            default_target_url: config.default_target_url.clone(),
            display_capacity: config.display_capacity as usize,
            display_ttl: Duration::from_secs(u64::from(config.display_ttl_secs)),
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from_config(&NotificationsConfig::default())
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// What happened to one event.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryReport {
    pub event_id: EventId,
    pub kind: EventKind,
    pub tag: String,
    /// The user turned realtime notifications off; nothing was shown or played.
    pub suppressed: bool,
    pub permission: Option<Permission>,
    /// `None` when every channel failed.
    pub channel: Option<Channel>,
    /// A visible notification with the same tag was replaced.
    pub replaced: bool,
    pub feedback: Option<Feedback>,
}

impl DeliveryReport {
    fn suppressed(event: &DomainEvent) -> Self {
        Self {
            event_id: event.id.clone(),
            kind: event.kind,
            tag: tag_for(event),
            suppressed: true,
            permission: None,
            channel: None,
            replaced: false,
            feedback: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct NotificationPipeline {
    notifier: Arc<dyn NotificationHost>,
    audio: Arc<dyn AudioHost>,
    haptics: Arc<dyn HapticHost>,
    settings: PipelineSettings,
    enabled: AtomicBool,
    preferences: Option<PreferenceStore>,
    permission_requested: AtomicBool,
    displayed: Mutex<DisplayedNotifications>,
}

impl NotificationPipeline {
    pub fn new(
        notifier: Arc<dyn NotificationHost>,
        audio: Arc<dyn AudioHost>,
        haptics: Arc<dyn HapticHost>,
        settings: PipelineSettings,
    ) -> Self {
        let displayed = DisplayedNotifications::new(settings.display_capacity);
        Self {
            notifier,
            audio,
            haptics,
            settings,
            enabled: AtomicBool::new(true),
            preferences: None,
            permission_requested: AtomicBool::new(false),
            displayed: Mutex::new(displayed),
        }
    }

    /// Read the on/off preference from `store` now and write it back on every change.
    pub fn with_preferences(mut self, store: PreferenceStore) -> Self {
        let enabled = store.load();
        debug!(enabled, path = %store.path().display(), "Loaded notification preference");
        self.enabled = AtomicBool::new(enabled);
        self.preferences = Some(store);
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    // -----------------------------------------------------------------------
    // Preference
    // -----------------------------------------------------------------------

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Turn realtime notifications on or off and persist the choice.
    ///
    /// The in-memory switch changes even when persisting fails.
    pub fn set_enabled(&self, enabled: bool) -> Result<(), ConfigError> {
        self.enabled.store(enabled, Ordering::SeqCst);
        info!(enabled, "Realtime notifications toggled");
        match &self.preferences {
            Some(store) => store.save(enabled),
            None => Ok(()),
        }
    }

    /// Flip the preference and return the new value.
    pub fn toggle(&self) -> Result<bool, ConfigError> {
        let enabled = !self.is_enabled();
        self.set_enabled(enabled)?;
        Ok(enabled)
    }

    // -----------------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------------

    /// Deliver one event. Never fails; see the report for what happened.
    pub async fn handle(&self, event: DomainEvent) -> DeliveryReport {
        if !self.is_enabled() {
            debug!(event_id = %event.id, "Realtime notifications off, event suppressed");
            return DeliveryReport::suppressed(&event);
        }

        let intent = NotificationIntent::from_event(&event, &self.settings.default_target_url);
        let permission = self.permission().await;

        let (shown, feedback) = tokio::join!(
            channel::deliver(self.notifier.as_ref(), permission, &intent),
            feedback::play(
                self.audio.as_ref(),
                self.haptics.as_ref(),
                &self.settings.feedback
            ),
        );

        let channel = match shown {
            Ok(fallback) => Some(fallback.value),
            Err(e) => {
                warn!(event_id = %event.id, error = %e, "Notification could not be shown");
                None
            }
        };

        let replaced = match channel {
            Some(channel) if channel.is_notification() => self.displayed().push(
                DisplayedNotification::new(event.kind, intent.clone(), self.settings.display_ttl),
            ),
            _ => false,
        };

        info!(
            event_id = %event.id,
            kind = %event.kind,
            topic = %event.source_topic,
            channel = ?channel,
            sound = ?feedback.sound,
            haptic = ?feedback.haptic,
            replaced,
            "Event delivered"
        );

        DeliveryReport {
            event_id: event.id,
            kind: event.kind,
            tag: intent.tag,
            suppressed: false,
            permission: Some(permission),
            channel,
            replaced,
            feedback: Some(feedback),
        }
    }

    /// Current permission, asking the user the first time it is undetermined.
    async fn permission(&self) -> Permission {
        let permission = self.notifier.permission().await;
        if permission != Permission::Undetermined
            || self.permission_requested.swap(true, Ordering::SeqCst)
        {
            return permission;
        }
        let answer = self.notifier.request_permission().await;
        info!(permission = ?answer, "Notification permission requested");
        answer
    }

    // -----------------------------------------------------------------------
    // Displayed notifications
    // -----------------------------------------------------------------------

    fn displayed(&self) -> MutexGuard<'_, DisplayedNotifications> {
        self.displayed.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Notifications currently on screen, oldest first.
    pub fn visible(&self) -> Vec<DisplayedNotification> {
        self.displayed().visible().into_iter().cloned().collect()
    }

    /// The user dismissed the notification with `tag`.
    pub fn dismiss(&self, tag: &str) -> bool {
        self.displayed().dismiss(tag)
    }
}
