//! Timestamp helpers shared by the session tracker and checkpoint model.

use chrono::{DateTime, Utc};

/// Represents a timestamp that can be serialized/deserialized.
pub type Timestamp = DateTime<Utc>;

/// Returns the current UTC timestamp.
#[must_use]
pub fn now_utc() -> Timestamp {
    Utc::now()
}

/// Returns the current UTC time as an ISO 8601 formatted string.
#[must_use]
pub fn iso_timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f+00:00").to_string()
}

/// Returns the whole milliseconds elapsed since `start`, clamped at zero.
///
/// Sessions record their start once; the finisher computes the duration
/// from it, so clock steps backwards must not produce negative durations.
#[must_use]
pub fn elapsed_ms(start: Timestamp) -> u64 {
    let delta = Utc::now().signed_duration_since(start).num_milliseconds();
    u64::try_from(delta).unwrap_or(0)
}
