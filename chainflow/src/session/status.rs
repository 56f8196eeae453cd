//! The ordered execution outcome lattice.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The outcome of a thread or of a whole session.
///
/// Statuses form a total order `Normal < Warning < Error`; merging many
/// partial outcomes into one takes the maximum, so a single errored thread
/// makes the whole session errored and a warning survives any number of
/// normal completions.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Completed without incident.
    #[default]
    Normal,
    /// Completed with a non-fatal warning.
    Warning,
    /// Failed.
    Error,
}

impl fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl ExecutionStatus {
    /// Merges two statuses, keeping the more severe one.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        self.max(other)
    }

    /// Merges any number of statuses; no statuses merge to `Normal`.
    #[must_use]
    pub fn merge_all(statuses: impl IntoIterator<Item = Self>) -> Self {
        statuses
            .into_iter()
            .fold(Self::Normal, Self::merge)
    }

    /// Returns true if the status represents a failure.
    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_order() {
        assert!(ExecutionStatus::Normal < ExecutionStatus::Warning);
        assert!(ExecutionStatus::Warning < ExecutionStatus::Error);
    }

    #[test]
    fn test_merge_is_max() {
        let merged = ExecutionStatus::merge_all([
            ExecutionStatus::Normal,
            ExecutionStatus::Warning,
            ExecutionStatus::Normal,
        ]);
        assert_eq!(merged, ExecutionStatus::Warning);

        let merged = ExecutionStatus::merge_all([
            ExecutionStatus::Normal,
            ExecutionStatus::Error,
            ExecutionStatus::Warning,
        ]);
        assert_eq!(merged, ExecutionStatus::Error);
    }

    #[test]
    fn test_merge_of_nothing_is_normal() {
        assert_eq!(ExecutionStatus::merge_all([]), ExecutionStatus::Normal);
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ExecutionStatus::Warning).unwrap();
        assert_eq!(json, r#""warning""#);

        let back: ExecutionStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ExecutionStatus::Warning);
    }
}
