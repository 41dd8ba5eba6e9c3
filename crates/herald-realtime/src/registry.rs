//! Topic → listener registry.
//!
//! Holds at most one listener per topic. Every entry is tagged with the
//! connection generation it was registered under; dispatch drops frames
//! whose generation, or whose listener's generation, is not current.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, trace};

use crate::payload::Payload;

/// Callback invoked for every frame delivered on a subscribed topic.
///
/// Runs on the connection's receive loop; hand long work off to another task.
pub type Listener = Arc<dyn Fn(Delivery) + Send + Sync>;

/// One decoded frame handed to a listener.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub topic: String,
    pub payload: Payload,
    pub generation: u64,
}

/// Proof of a successful subscription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    topic: String,
    generation: u64,
}

impl SubscriptionHandle {
    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Result of routing one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    /// No local listener for the topic.
    NoListener,
    /// Frame or listener belongs to an earlier connection generation.
    Stale,
}

struct Entry {
    listener: Listener,
    generation: u64,
}

#[derive(Default)]
pub struct SubscriptionRegistry {
    entries: Mutex<HashMap<String, Entry>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store `listener` for `topic`, replacing any previous one.
    ///
    /// Returns the handle and the generation of the replaced listener, if any.
    pub fn insert(
        &self,
        topic: &str,
        listener: Listener,
        generation: u64,
    ) -> (SubscriptionHandle, Option<u64>) {
        let replaced = self
            .entries()
            .insert(
                topic.to_string(),
                Entry {
                    listener,
                    generation,
                },
            )
            .map(|previous| previous.generation);
        if let Some(previous) = replaced {
            debug!(topic = %topic, previous, generation, "Replaced existing listener");
        }
        (
            SubscriptionHandle {
                topic: topic.to_string(),
                generation,
            },
            replaced,
        )
    }

    /// Remove the listener for `topic`. Returns whether one existed.
    pub fn remove(&self, topic: &str) -> bool {
        self.entries().remove(topic).is_some()
    }

    /// Route one frame body to the listener registered for `topic`.
    ///
    /// The listener is called after the registry lock is released, so it
    /// may subscribe or unsubscribe from inside the callback.
    pub fn dispatch(
        &self,
        topic: &str,
        body: &str,
        frame_generation: u64,
        current_generation: u64,
    ) -> DispatchOutcome {
        let listener = {
            let entries = self.entries();
            let Some(entry) = entries.get(topic) else {
                trace!(topic = %topic, "No listener, frame dropped");
                return DispatchOutcome::NoListener;
            };
            if entry.generation != current_generation || frame_generation != current_generation {
                debug!(
                    topic = %topic,
                    listener_generation = entry.generation,
                    frame_generation,
                    current_generation,
                    "Stale frame dropped"
                );
                return DispatchOutcome::Stale;
            }
            Arc::clone(&entry.listener)
        };

        listener(Delivery {
            topic: topic.to_string(),
            payload: Payload::decode(body),
            generation: current_generation,
        });
        DispatchOutcome::Delivered
    }

    /// Drop every entry. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries();
        let count = entries.len();
        entries.clear();
        count
    }

    /// Drop entries registered under any generation other than `current`.
    pub fn purge_stale(&self, current: u64) -> usize {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|_, entry| entry.generation == current);
        before - entries.len()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.entries().contains_key(topic)
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    /// Subscribed topic names, sorted.
    pub fn topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.entries().keys().cloned().collect();
        topics.sort();
        topics
    }
}
