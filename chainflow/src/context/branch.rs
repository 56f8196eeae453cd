//! Branch settings riding on a split branch's context.

use super::internal;
use super::ExecutionContext;

/// Settings for one concurrently executing branch of a split.
///
/// A split element creates one `BranchSettings` per branch and applies it to
/// the branch's forked context; the aggregator reads the settings back from
/// the branch result when the branch completes. At most one branch per split
/// is the main branch, and the main branch always propagates its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchSettings {
    /// Session-scoped split branch identifier.
    pub branch_id: String,
    /// Chain-scoped id of the split the branch belongs to.
    pub split_id: Option<String>,
    /// Whether this is the split's main branch.
    pub is_main: bool,
    /// Whether the branch propagates its headers into the aggregate.
    pub propagate_headers: bool,
    /// Whether the branch propagates its properties into the aggregate.
    pub propagate_properties: bool,
}

impl BranchSettings {
    /// Creates settings for a secondary branch with propagation disabled.
    #[must_use]
    pub fn new(branch_id: impl Into<String>) -> Self {
        Self {
            branch_id: branch_id.into(),
            split_id: None,
            is_main: false,
            propagate_headers: false,
            propagate_properties: false,
        }
    }

    /// Marks this branch as the split's main branch.
    #[must_use]
    pub fn main(mut self) -> Self {
        self.is_main = true;
        self
    }

    /// Sets the chain-scoped split id.
    #[must_use]
    pub fn with_split_id(mut self, split_id: impl Into<String>) -> Self {
        self.split_id = Some(split_id.into());
        self
    }

    /// Enables header propagation.
    #[must_use]
    pub fn with_propagate_headers(mut self, propagate: bool) -> Self {
        self.propagate_headers = propagate;
        self
    }

    /// Enables property propagation.
    #[must_use]
    pub fn with_propagate_properties(mut self, propagate: bool) -> Self {
        self.propagate_properties = propagate;
        self
    }

    /// True if the branch's headers flow into the aggregate.
    #[must_use]
    pub fn propagates_headers(&self) -> bool {
        self.propagate_headers || self.is_main
    }

    /// True if the branch's properties flow into the aggregate.
    #[must_use]
    pub fn propagates_properties(&self) -> bool {
        self.propagate_properties || self.is_main
    }

    /// Writes the settings onto a branch context as internal properties.
    pub fn apply_to(&self, ctx: &mut ExecutionContext) {
        ctx.set_property(internal::BRANCH_ID, serde_json::json!(self.branch_id));
        if let Some(ref split_id) = self.split_id {
            ctx.set_property(internal::SPLIT_ID, serde_json::json!(split_id));
        }
        ctx.set_property(internal::BRANCH_MAIN, serde_json::json!(self.is_main));
        ctx.set_property(
            internal::PROPAGATE_HEADERS,
            serde_json::json!(self.propagate_headers),
        );
        ctx.set_property(
            internal::PROPAGATE_PROPERTIES,
            serde_json::json!(self.propagate_properties),
        );
    }

    /// Reads settings back from a branch context.
    ///
    /// Returns `None` if the context carries no branch id, i.e. it never
    /// passed through a split.
    #[must_use]
    pub fn from_context(ctx: &ExecutionContext) -> Option<Self> {
        let branch_id = ctx.string_property(internal::BRANCH_ID)?.to_string();
        Some(Self {
            branch_id,
            split_id: ctx.string_property(internal::SPLIT_ID).map(String::from),
            is_main: ctx.bool_property(internal::BRANCH_MAIN),
            propagate_headers: ctx.bool_property(internal::PROPAGATE_HEADERS),
            propagate_properties: ctx.bool_property(internal::PROPAGATE_PROPERTIES),
        })
    }
}
