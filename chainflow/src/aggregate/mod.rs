//! Branch aggregation: merging completed split branches into one result.
//!
//! A split element forks one context per branch; as each branch completes,
//! the engine feeds its result through [`BranchAggregator::aggregate`]
//! together with the running accumulator and the shared pre-split context.
//! The first successful branch seeds the accumulator; every later
//! successful branch is merged into it under the propagation and naming
//! rules below; failed branches never contribute.

mod result;

pub use result::BranchResult;

use crate::context::internal;
use crate::context::{BranchSettings, ExecutionContext};
use std::collections::{HashMap, HashSet};

/// Header set on the aggregate to mark a successful split merge.
pub const RESPONSE_CODE_HEADER: &str = "response_code";

/// Synthetic response code tagged onto the aggregate.
pub const SUCCESS_RESPONSE_CODE: u16 = 200;

/// Combines branch results into one aggregate, one completed branch at a
/// time.
///
/// The aggregator is stateless; all merge state lives on the accumulator
/// and the shared pre-split context, guarded by idempotent processed flags
/// rather than a completion order. Which branch seeds the accumulator is
/// order-dependent: the first non-failed completer wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAggregator;

impl BranchAggregator {
    /// Creates a new aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Folds one completed branch into the running accumulator.
    ///
    /// With no accumulator yet, a successful branch becomes the seed and a
    /// failed branch is skipped (the next completer gets to seed). With an
    /// accumulator present, a failed branch leaves it untouched; a
    /// successful branch is merged: one-time synchronization with the
    /// pre-split context, selective propagation, property reset, body
    /// merge, and markers.
    #[must_use]
    pub fn aggregate(
        &self,
        accumulator: Option<BranchResult>,
        branch: BranchResult,
        pre_split: &mut ExecutionContext,
    ) -> Option<BranchResult> {
        if branch.failed {
            // A failing branch never contributes to the merged payload,
            // regardless of position: as the would-be seed it is skipped,
            // as a merge candidate it is ignored.
            tracing::debug!(
                branch_id = BranchSettings::from_context(&branch.context)
                    .map(|s| s.branch_id)
                    .as_deref(),
                "failed branch excluded from aggregation"
            );
            return accumulator;
        }

        let Some(mut acc) = accumulator else {
            return Some(branch);
        };

        let settings = BranchSettings::from_context(&branch.context);

        let reconciled_headers = sync_headers(pre_split, &branch.context);
        let reconciled_properties = sync_properties(pre_split, &branch.context);

        let mut merged_headers = HashMap::new();
        let mut merged_properties = HashMap::new();
        if let Some(ref settings) = settings {
            if settings.propagates_headers() {
                for (key, value) in branch.context.user_headers() {
                    merged_headers
                        .insert(propagated_key(&key, settings, reconciled_headers.as_ref()), value);
                }
            }
            if settings.propagates_properties() {
                for (key, value) in branch.context.user_properties() {
                    merged_properties.insert(
                        propagated_key(&key, settings, reconciled_properties.as_ref()),
                        value,
                    );
                }
            }
        }

        // Reset: only the carry-over control set survives, so a branch's
        // private properties never leak into the aggregate unless
        // explicitly propagated.
        acc.context
            .properties_mut()
            .retain(|key, _| internal::CARRY_OVER_PROPERTIES.contains(&key.as_str()));

        for (key, value) in merged_headers {
            acc.context.set_header(key, value);
        }
        for (key, value) in merged_properties {
            acc.context.set_property(key, value);
        }

        merge_body(&mut acc.context, &branch.context, settings.as_ref());

        acc.context
            .set_property(internal::SPLIT_PROCESSED, serde_json::json!(true));
        acc.context
            .set_header(RESPONSE_CODE_HEADER, serde_json::json!(SUCCESS_RESPONSE_CODE));

        // Stale branch identity on the aggregate would confuse a nested
        // split downstream.
        acc.context.remove_property(internal::BRANCH_ID);
        acc.context.remove_property(internal::SPLIT_ID);

        Some(acc)
    }
}

/// Runs the one-time header synchronization against the pre-split context.
///
/// For every non-internal pre-split key still present on the branch, the
/// branch's current value is copied back into the shared map; keys the
/// branch dropped are deleted. Returns the set of reconciled keys when this
/// call performed the synchronization, `None` when an earlier branch
/// already did.
fn sync_headers(
    pre_split: &mut ExecutionContext,
    branch: &ExecutionContext,
) -> Option<HashSet<String>> {
    if pre_split.bool_property(internal::HEADERS_SYNCED) {
        return None;
    }

    let mut reconciled = HashSet::new();
    let pre_keys: Vec<String> = pre_split
        .headers()
        .keys()
        .filter(|key| !internal::is_internal(key))
        .cloned()
        .collect();

    for key in pre_keys {
        if let Some(value) = branch.header(&key) {
            let value = value.clone();
            pre_split.set_header(key.clone(), value);
            reconciled.insert(key);
        } else {
            pre_split.remove_header(&key);
        }
    }

    pre_split.set_property(internal::HEADERS_SYNCED, serde_json::json!(true));
    Some(reconciled)
}

/// Runs the one-time property synchronization against the pre-split
/// context. Same contract as [`sync_headers`]; internal control entries are
/// not user state and are skipped.
fn sync_properties(
    pre_split: &mut ExecutionContext,
    branch: &ExecutionContext,
) -> Option<HashSet<String>> {
    if pre_split.bool_property(internal::PROPERTIES_SYNCED) {
        return None;
    }

    let mut reconciled = HashSet::new();
    let pre_keys: Vec<String> = pre_split
        .properties()
        .keys()
        .filter(|key| !internal::is_internal(key))
        .cloned()
        .collect();

    for key in pre_keys {
        if let Some(value) = branch.property(&key) {
            let value = value.clone();
            pre_split.set_property(key.clone(), value);
            reconciled.insert(key);
        } else {
            pre_split.remove_property(&key);
        }
    }

    pre_split.set_property(internal::PROPERTIES_SYNCED, serde_json::json!(true));
    Some(reconciled)
}

/// Computes the output key for a propagated entry.
///
/// Main-branch keys are copied unprefixed. Secondary-branch keys are
/// namespaced `"{branch_id}.{key}"`, except keys this branch just
/// reconciled into the pre-split map, which keep their plain name.
fn propagated_key(
    key: &str,
    settings: &BranchSettings,
    reconciled: Option<&HashSet<String>>,
) -> String {
    if settings.is_main || reconciled.is_some_and(|set| set.contains(key)) {
        key.to_string()
    } else {
        format!("{}.{}", settings.branch_id, key)
    }
}

/// Parses a body as structured data, else treats it as an opaque text leaf.
fn body_leaf(body: Option<&[u8]>) -> serde_json::Value {
    match body {
        None => serde_json::Value::Null,
        Some(bytes) => serde_json::from_slice(bytes).unwrap_or_else(|_| {
            serde_json::Value::String(String::from_utf8_lossy(bytes).into_owned())
        }),
    }
}

/// Inserts the branch's body into the accumulator's output structure under
/// the branch's id.
///
/// On the first merge the seed's own body is keyed under the seed's branch
/// id; on later merges the existing output object is extended.
fn merge_body(
    acc: &mut ExecutionContext,
    branch: &ExecutionContext,
    settings: Option<&BranchSettings>,
) {
    let mut merged = if acc.bool_property(internal::SPLIT_PROCESSED) {
        acc.body()
            .and_then(|bytes| serde_json::from_slice::<serde_json::Value>(bytes).ok())
            .and_then(|value| value.as_object().cloned())
            .unwrap_or_default()
    } else {
        let mut output = serde_json::Map::new();
        if let Some(seed_settings) = BranchSettings::from_context(acc) {
            output.insert(seed_settings.branch_id, body_leaf(acc.body()));
        }
        output
    };

    let branch_key = settings.map_or_else(
        || {
            tracing::warn!("merging a branch with no branch id");
            "branch".to_string()
        },
        |s| s.branch_id.clone(),
    );
    merged.insert(branch_key, body_leaf(branch.body()));

    let bytes = serde_json::to_vec(&serde_json::Value::Object(merged)).unwrap_or_default();
    acc.set_body(Some(bytes));
}
