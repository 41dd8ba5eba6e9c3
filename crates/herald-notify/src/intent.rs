//! What to show for a domain event.

use crate::event::{event_text, DomainEvent, EventKind};

/// A request to show one notification.
///
/// Notifications sharing a `tag` replace each other instead of stacking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationIntent {
    pub title: String,
    pub body: String,
    pub tag: String,
    /// Stays on screen until the user dismisses it.
    pub require_interaction: bool,
    /// Where activating the notification leads.
    pub target_url: String,
}

impl NotificationIntent {
    pub fn from_event(event: &DomainEvent, default_target_url: &str) -> Self {
        let title = event
            .field("title")
            .map(str::to_string)
            .unwrap_or_else(|| default_title(event.kind).to_string());
        let body = event
            .field("message")
            .or_else(|| event.field("body"))
            .map(str::to_string)
            .unwrap_or_else(|| event_text(&event.payload));
        let target_url = event
            .field("url")
            .filter(|url| !url.is_empty())
            .unwrap_or(default_target_url)
            .to_string();

        Self {
            title,
            body,
            tag: tag_for(event),
            require_interaction: event.kind == EventKind::Error,
            target_url,
        }
    }
}

/// De-duplication tag for an event.
pub fn tag_for(event: &DomainEvent) -> String {
    format!("event-{}", event.id)
}

fn default_title(kind: EventKind) -> &'static str {
    match kind {
        EventKind::Success => "Operation completed",
        EventKind::Error => "Operation failed",
        EventKind::Info => "Notification",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_realtime::Payload;

    fn event(body: &str) -> DomainEvent {
        DomainEvent::new(Payload::decode(body), "topic-backups")
    }

    #[test]
    fn raw_success_message() {
        let event = event("Backup completado exitosamente");
        let intent = NotificationIntent::from_event(&event, "/admin");

        assert_eq!(intent.title, "Operation completed");
        assert_eq!(intent.body, "Backup completado exitosamente");
        assert_eq!(intent.tag, format!("event-{}", event.id));
        assert!(!intent.require_interaction);
        assert_eq!(intent.target_url, "/admin");
    }

    #[test]
    fn structured_fields_are_used() {
        let event = event(
            r#"{"id":"bk-3","title":"Backup","message":"Backup failed","url":"/admin/backups"}"#,
        );
        let intent = NotificationIntent::from_event(&event, "/admin");

        assert_eq!(intent.title, "Backup");
        assert_eq!(intent.body, "Backup failed");
        assert_eq!(intent.tag, "event-bk-3");
        assert!(intent.require_interaction);
        assert_eq!(intent.target_url, "/admin/backups");
    }

    #[test]
    fn empty_url_uses_default() {
        let event = event(r#"{"message":"hi","url":""}"#);
        let intent = NotificationIntent::from_event(&event, "/admin");
        assert_eq!(intent.target_url, "/admin");
    }

    #[test]
    fn same_event_id_same_tag() {
        let a = event(r#"{"id":"7","message":"Backup running"}"#);
        let b = event(r#"{"id":"7","message":"Backup completed"}"#);
        assert_eq!(tag_for(&a), tag_for(&b));
    }
}
