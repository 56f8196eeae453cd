//! Utility functions for id generation and timestamp handling.

mod ids;
pub mod timestamps;

pub use ids::{generate_id, generate_uuid};
pub use timestamps::{elapsed_ms, iso_timestamp, now_utc, Timestamp};
