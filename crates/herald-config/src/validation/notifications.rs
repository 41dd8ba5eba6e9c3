//! Validation for the notifications section.

use crate::schema::HeraldConfig;

use super::helpers::{validate_range, validate_range_f64};

/// Validate notification constraints.
pub(crate) fn validate_notifications(errors: &mut Vec<String>, config: &HeraldConfig) {
    let n = &config.notifications;

    validate_range_f64(
        errors,
        "notifications.tone.frequency_hz",
        n.tone.frequency_hz,
        20.0,
        20_000.0,
    );
    validate_range(
        errors,
        "notifications.tone.duration_ms",
        u64::from(n.tone.duration_ms),
        20,
        2_000,
    );
    validate_range_f64(errors, "notifications.tone.gain", n.tone.gain, 0.0, 1.0);
    validate_range(
        errors,
        "notifications.tone.sample_rate",
        u64::from(n.tone.sample_rate),
        8_000,
        192_000,
    );
    validate_range(
        errors,
        "notifications.feedback_timeout_ms",
        n.feedback_timeout_ms,
        100,
        10_000,
    );
    validate_range(
        errors,
        "notifications.display_capacity",
        u64::from(n.display_capacity),
        1,
        100,
    );
    validate_range(
        errors,
        "notifications.display_ttl_secs",
        u64::from(n.display_ttl_secs),
        1,
        3_600,
    );
}
