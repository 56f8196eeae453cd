//! Reserved names for internal control entries.
//!
//! Properties and headers whose name starts with [`INTERNAL_PREFIX`] carry
//! runtime control state. They are excluded from checkpoints and from
//! branch propagation, and they never reach user-visible output.

/// Name prefix marking internal control entries.
pub const INTERNAL_PREFIX: &str = "internal.";

/// Property holding the branch id of a split branch.
pub const BRANCH_ID: &str = "internal.branch.id";

/// Property holding the chain-scoped split id the branch belongs to.
pub const SPLIT_ID: &str = "internal.branch.split_id";

/// Property marking the branch as the main branch of its split.
pub const BRANCH_MAIN: &str = "internal.branch.main";

/// Property enabling header propagation for the branch.
pub const PROPAGATE_HEADERS: &str = "internal.branch.propagate_headers";

/// Property enabling property propagation for the branch.
pub const PROPAGATE_PROPERTIES: &str = "internal.branch.propagate_properties";

/// Property on the pre-split context marking header synchronization done.
pub const HEADERS_SYNCED: &str = "internal.split.headers_synced";

/// Property on the pre-split context marking property synchronization done.
pub const PROPERTIES_SYNCED: &str = "internal.split.properties_synced";

/// Property marking an aggregated result as a processed split.
pub const SPLIT_PROCESSED: &str = "internal.split.processed";

/// Properties that survive the aggregator's bulk reset.
pub const CARRY_OVER_PROPERTIES: [&str; 6] = [
    BRANCH_ID,
    SPLIT_ID,
    PROPAGATE_HEADERS,
    PROPAGATE_PROPERTIES,
    HEADERS_SYNCED,
    PROPERTIES_SYNCED,
];

/// Returns true if the name denotes an internal control entry.
#[must_use]
pub fn is_internal(name: &str) -> bool {
    name.starts_with(INTERNAL_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_internal() {
        assert!(is_internal(BRANCH_ID));
        assert!(is_internal("internal.custom"));
        assert!(!is_internal("order_id"));
        assert!(!is_internal("internals"));
    }

    #[test]
    fn test_carry_over_names_are_internal() {
        for name in CARRY_OVER_PROPERTIES {
            assert!(is_internal(name), "{name} must be internal");
        }
    }
}
