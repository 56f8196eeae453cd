//! Identifier generation for sessions, threads, and retry requests.

use uuid::Uuid;

/// Generates a new UUID v4.
#[must_use]
pub fn generate_uuid() -> Uuid {
    Uuid::new_v4()
}

/// Generates a new opaque string identifier.
///
/// Session, thread, and branch ids are opaque strings at every boundary of
/// this crate; UUID v4 is just the default source of uniqueness.
#[must_use]
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_id_unique() {
        assert_ne!(generate_id(), generate_id());
    }

    #[test]
    fn test_generate_id_parses_as_uuid() {
        let id = generate_id();
        assert!(Uuid::parse_str(&id).is_ok());
    }
}
