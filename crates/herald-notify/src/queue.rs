use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::event::EventKind;
use crate::intent::NotificationIntent;

/// A notification currently on screen.
#[derive(Debug, Clone)]
pub struct DisplayedNotification {
    pub kind: EventKind,
    pub intent: NotificationIntent,
    pub shown_at: Instant,
    pub ttl: Duration,
}

impl DisplayedNotification {
    pub fn new(kind: EventKind, intent: NotificationIntent, ttl: Duration) -> Self {
        Self {
            kind,
            intent,
            shown_at: Instant::now(),
            ttl,
        }
    }

    pub fn tag(&self) -> &str {
        &self.intent.tag
    }

    /// Returns `true` once the notification has outlived its TTL.
    /// Notifications that require interaction never expire on their own.
    pub fn is_expired(&self) -> bool {
        !self.intent.require_interaction && self.shown_at.elapsed() >= self.ttl
    }
}

/// Bounded set of visible notifications, keyed by tag.
///
/// Pushing a notification whose tag is already visible replaces it in
/// place. Expired entries are evicted first; at capacity the oldest goes.
#[derive(Debug)]
pub struct DisplayedNotifications {
    items: VecDeque<DisplayedNotification>,
    capacity: usize,
}

impl DisplayedNotifications {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Show a notification. Returns `true` if it replaced one with the same tag.
    pub fn push(&mut self, notification: DisplayedNotification) -> bool {
        self.evict_expired();
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|n| n.tag() == notification.tag())
        {
            *existing = notification;
            return true;
        }
        if self.items.len() >= self.capacity {
            self.items.pop_front();
        }
        self.items.push_back(notification);
        false
    }

    /// Visible notifications, oldest first.
    pub fn visible(&mut self) -> Vec<&DisplayedNotification> {
        self.evict_expired();
        self.items.iter().collect()
    }

    pub fn get(&self, tag: &str) -> Option<&DisplayedNotification> {
        self.items.iter().find(|n| n.tag() == tag && !n.is_expired())
    }

    /// The user dismissed the notification with `tag`.
    pub fn dismiss(&mut self, tag: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|n| n.tag() != tag);
        self.items.len() != before
    }

    /// Number of entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn evict_expired(&mut self) {
        self.items.retain(|n| !n.is_expired());
    }
}

impl Default for DisplayedNotifications {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::intent;

    fn shown(tag: &str, body: &str, ttl: Duration) -> DisplayedNotification {
        let mut intent = intent(tag);
        intent.body = body.to_string();
        DisplayedNotification::new(EventKind::Info, intent, ttl)
    }

    #[test]
    fn same_tag_replaces() {
        let mut queue = DisplayedNotifications::new(4);
        assert!(!queue.push(shown("event-1", "first", Duration::from_secs(10))));
        assert!(queue.push(shown("event-1", "second", Duration::from_secs(10))));

        let visible = queue.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].intent.body, "second");
    }

    #[test]
    fn different_tags_stack() {
        let mut queue = DisplayedNotifications::new(4);
        queue.push(shown("event-1", "a", Duration::from_secs(10)));
        queue.push(shown("event-2", "b", Duration::from_secs(10)));
        assert_eq!(queue.visible().len(), 2);
    }

    #[test]
    fn capacity_drops_oldest() {
        let mut queue = DisplayedNotifications::new(2);
        queue.push(shown("event-1", "a", Duration::from_secs(10)));
        queue.push(shown("event-2", "b", Duration::from_secs(10)));
        queue.push(shown("event-3", "c", Duration::from_secs(10)));

        let tags: Vec<&str> = queue.visible().iter().map(|n| n.tag()).collect();
        assert_eq!(tags, vec!["event-2", "event-3"]);
    }

    #[test]
    fn expired_entries_are_evicted() {
        let mut queue = DisplayedNotifications::new(4);
        queue.push(shown("event-1", "a", Duration::ZERO));
        queue.push(shown("event-2", "b", Duration::from_secs(10)));

        assert_eq!(queue.visible().len(), 1);
        assert!(queue.get("event-1").is_none());
        assert!(queue.get("event-2").is_some());
    }

    #[test]
    fn sticky_notifications_do_not_expire() {
        let mut queue = DisplayedNotifications::new(4);
        let mut sticky = shown("event-1", "a", Duration::ZERO);
        sticky.intent.require_interaction = true;
        queue.push(sticky);
        assert_eq!(queue.visible().len(), 1);
    }

    #[test]
    fn dismiss_removes_by_tag() {
        let mut queue = DisplayedNotifications::default();
        queue.push(shown("event-1", "a", Duration::from_secs(10)));
        assert!(queue.dismiss("event-1"));
        assert!(!queue.dismiss("event-1"));
        assert!(queue.is_empty());
    }
}
