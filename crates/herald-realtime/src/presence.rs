//! Aggregate presence counts published by the server.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::payload::Payload;

/// Server-authored snapshot of who is online, by location.
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceState {
    pub total: u64,
    pub by_location: BTreeMap<String, u64>,
    pub received_at: DateTime<Utc>,
    pub source_topic: String,
}

impl PresenceState {
    /// Interpret a presence publication.
    ///
    /// Accepts `{"total": n, "byLocation": {..}}` or a bare non-negative
    /// number. A missing `total` is the sum of the per-location counts.
    /// Entries that are not non-negative integers are skipped.
    pub fn from_payload(payload: &Payload, topic: &str) -> Option<Self> {
        let (total, by_location) = match payload {
            Payload::Structured(Value::Object(map)) => {
                let by_location: BTreeMap<String, u64> = map
                    .get("byLocation")
                    .and_then(Value::as_object)
                    .map(|locations| {
                        locations
                            .iter()
                            .filter_map(|(name, count)| Some((name.clone(), count.as_u64()?)))
                            .collect()
                    })
                    .unwrap_or_default();
                let total = match map.get("total") {
                    Some(value) => value.as_u64()?,
                    None if by_location.is_empty() => return None,
                    None => by_location.values().sum(),
                };
                (total, by_location)
            }
            Payload::Numeric(number) if *number >= 0.0 && number.fract() == 0.0 => {
                (*number as u64, BTreeMap::new())
            }
            _ => return None,
        };

        Some(Self {
            total,
            by_location,
            received_at: Utc::now(),
            source_topic: topic.to_string(),
        })
    }

    /// Clients currently at `location`; zero when the server did not list it.
    pub fn count_for(&self, location: &str) -> u64 {
        self.by_location.get(location).copied().unwrap_or(0)
    }
}
