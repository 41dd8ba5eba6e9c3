//! Delivery channel selection.

use herald_common::DeliveryError;

use crate::fallback::{Fallback, FallbackChain};
use crate::host::{NotificationHost, Permission};
use crate::intent::NotificationIntent;

/// Where a notification ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// Background surface; works while the app is not focused.
    Background,
    /// Foreground notification API.
    Foreground,
    /// Blocking in-app prompt.
    Prompt,
}

impl Channel {
    /// Whether the channel leaves a notification on screen that later ones
    /// with the same tag replace.
    pub fn is_notification(&self) -> bool {
        matches!(self, Channel::Background | Channel::Foreground)
    }
}

/// Show `intent` on the best channel `permission` allows.
///
/// Background surface, then foreground notification, then the prompt.
pub async fn deliver(
    host: &dyn NotificationHost,
    permission: Permission,
    intent: &NotificationIntent,
) -> Result<Fallback<Channel>, DeliveryError> {
    let granted = permission == Permission::Granted;
    let has_surface = host.has_background_surface();
    let no_background = if granted {
        DeliveryError::Unavailable("no background surface".into())
    } else {
        DeliveryError::PermissionDenied
    };

    FallbackChain::new("notification channel")
        .then_if(granted && has_surface, no_background, "background", async {
            host.show_background(intent).await?;
            Ok(Channel::Background)
        })
        .then_if(granted, DeliveryError::PermissionDenied, "foreground", async {
            host.show_foreground(intent).await?;
            Ok(Channel::Foreground)
        })
        .then("prompt", async {
            host.prompt(intent).await?;
            Ok(Channel::Prompt)
        })
        .run()
        .await
}
