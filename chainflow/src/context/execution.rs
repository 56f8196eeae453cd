//! The mutable execution context carried through one thread of a session.

use super::internal;
use std::collections::HashMap;

/// The unit of data flowing through a chain invocation.
///
/// A context is owned exclusively by the thread currently processing it and
/// handed off at branch boundaries by copy, never by sharing; the maps here
/// are therefore plain `HashMap`s with no interior locking.
///
/// `headers` are last-write-wins string-keyed values. `properties` hold both
/// user variables and internal control entries distinguished by the reserved
/// [`internal::INTERNAL_PREFIX`] name prefix. `body` is an opaque byte
/// payload.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    headers: HashMap<String, serde_json::Value>,
    properties: HashMap<String, serde_json::Value>,
    body: Option<Vec<u8>>,
}

impl ExecutionContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a header, overwriting any previous value.
    pub fn set_header(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.headers.insert(name.into(), value);
    }

    /// Gets a header value.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&serde_json::Value> {
        self.headers.get(name)
    }

    /// Removes a header, returning the previous value.
    pub fn remove_header(&mut self, name: &str) -> Option<serde_json::Value> {
        self.headers.remove(name)
    }

    /// Returns all headers.
    #[must_use]
    pub fn headers(&self) -> &HashMap<String, serde_json::Value> {
        &self.headers
    }

    /// Returns a mutable view of all headers.
    pub fn headers_mut(&mut self) -> &mut HashMap<String, serde_json::Value> {
        &mut self.headers
    }

    /// Sets a property, overwriting any previous value.
    pub fn set_property(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.properties.insert(name.into(), value);
    }

    /// Gets a property value.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.get(name)
    }

    /// Removes a property, returning the previous value.
    pub fn remove_property(&mut self, name: &str) -> Option<serde_json::Value> {
        self.properties.remove(name)
    }

    /// Returns all properties, internal entries included.
    #[must_use]
    pub fn properties(&self) -> &HashMap<String, serde_json::Value> {
        &self.properties
    }

    /// Returns a mutable view of all properties.
    pub fn properties_mut(&mut self) -> &mut HashMap<String, serde_json::Value> {
        &mut self.properties
    }

    /// Reads a boolean property; absent or non-boolean values read as false.
    #[must_use]
    pub fn bool_property(&self, name: &str) -> bool {
        self.properties
            .get(name)
            .and_then(serde_json::Value::as_bool)
            .unwrap_or(false)
    }

    /// Reads a string property.
    #[must_use]
    pub fn string_property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).and_then(serde_json::Value::as_str)
    }

    /// Returns the body payload.
    #[must_use]
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Replaces the body payload.
    pub fn set_body(&mut self, body: Option<Vec<u8>>) {
        self.body = body;
    }

    /// Returns the headers without internal control entries.
    #[must_use]
    pub fn user_headers(&self) -> HashMap<String, serde_json::Value> {
        self.headers
            .iter()
            .filter(|(name, _)| !internal::is_internal(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Returns the properties without internal control entries.
    #[must_use]
    pub fn user_properties(&self) -> HashMap<String, serde_json::Value> {
        self.properties
            .iter()
            .filter(|(name, _)| !internal::is_internal(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Creates the context for a new split branch.
    ///
    /// Branches receive a full copy of the parent's state; the branch and
    /// the parent never share mutable data afterwards.
    #[must_use]
    pub fn fork_for_branch(&self) -> Self {
        self.clone()
    }
}
