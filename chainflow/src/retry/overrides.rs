//! Caller-supplied replacement data for a retry.

use crate::context::ExecutionContext;
use crate::errors::OverrideParseError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Replacement data applied on top of a restored checkpoint.
///
/// Every field is optional: present headers/properties replace the restored
/// entry of the same name, a present body replaces the restored body
/// wholesale, and absent fields leave the restored values untouched.
/// Overrides are parsed from the retry request and discarded after use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryOverrides {
    /// Replacement headers, keyed by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<HashMap<String, serde_json::Value>>,
    /// Replacement properties, keyed by name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<HashMap<String, serde_json::Value>>,
    /// Replacement body: a JSON string becomes its raw text bytes, any
    /// other JSON value is serialized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl RetryOverrides {
    /// Parses overrides from a retry request body.
    ///
    /// An empty (or whitespace-only) body means "no overrides".
    ///
    /// # Errors
    ///
    /// Returns `OverrideParseError` on any malformed input. Fatal to the
    /// retry request, before any state mutation.
    pub fn parse(bytes: &[u8]) -> Result<Self, OverrideParseError> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(bytes).map_err(|e| OverrideParseError::new(e.to_string()))
    }

    /// Returns true if nothing would be overridden.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_none() && self.properties.is_none() && self.body.is_none()
    }

    /// Adds a single replacement header (used by the control surface for
    /// authorization and trace-forcing headers).
    pub fn set_header(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value);
    }

    /// Returns the replacement body as raw bytes.
    #[must_use]
    pub fn body_bytes(&self) -> Option<Vec<u8>> {
        self.body.as_ref().map(|value| match value {
            serde_json::Value::String(text) => text.clone().into_bytes(),
            other => serde_json::to_vec(other).unwrap_or_default(),
        })
    }

    /// Applies the overrides to a restored context. Override wins per key.
    pub fn apply_to(&self, ctx: &mut ExecutionContext) {
        if let Some(ref headers) = self.headers {
            for (name, value) in headers {
                ctx.set_header(name.clone(), value.clone());
            }
        }
        if let Some(ref properties) = self.properties {
            for (name, value) in properties {
                ctx.set_property(name.clone(), value.clone());
            }
        }
        if let Some(bytes) = self.body_bytes() {
            ctx.set_body(Some(bytes));
        }
    }
}
