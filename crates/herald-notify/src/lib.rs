//! Notification delivery pipeline.
//!
//! Classifies domain events received on subscribed topics, picks the best
//! notification channel the host allows, and plays auxiliary feedback. The
//! platform is reached only through the traits in `host`.

pub mod channel;
pub mod desktop;
pub mod event;
pub mod fallback;
pub mod feedback;
pub mod host;
pub mod intent;
pub mod pipeline;
pub mod queue;
pub mod tone;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use channel::Channel;
pub use desktop::DesktopHost;
pub use event::{classify, DomainEvent, EventKind};
pub use fallback::{Fallback, FallbackChain};
pub use feedback::{Feedback, FeedbackPlan, HapticOutcome, SoundOutcome};
pub use host::{AudioHost, HapticHost, NotificationHost, Permission};
pub use intent::NotificationIntent;
pub use pipeline::{DeliveryReport, NotificationPipeline, PipelineSettings};
pub use queue::{DisplayedNotification, DisplayedNotifications};
pub use tone::Tone;
pub use worker::PipelineHandle;
