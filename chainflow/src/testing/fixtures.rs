//! Test fixtures for session and checkpoint testing.

use crate::checkpoint::Checkpoint;
use crate::context::ExecutionContext;
use crate::utils::now_utc;
use std::collections::HashMap;

/// A builder for execution contexts in tests.
#[derive(Debug, Default)]
pub struct TestContextBuilder {
    headers: HashMap<String, serde_json::Value>,
    properties: HashMap<String, serde_json::Value>,
    body: Option<Vec<u8>>,
}

impl TestContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.headers.insert(name.into(), value);
        self
    }

    /// Adds a property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> ExecutionContext {
        let mut ctx = ExecutionContext::new();
        for (name, value) in self.headers {
            ctx.set_header(name, value);
        }
        for (name, value) in self.properties {
            ctx.set_property(name, value);
        }
        ctx.set_body(self.body);
        ctx
    }
}

/// Creates an empty checkpoint addressed at the given triple.
#[must_use]
pub fn checkpoint_fixture(session_id: &str, chain_id: &str, checkpoint_element_id: &str) -> Checkpoint {
    Checkpoint {
        session_id: session_id.to_string(),
        chain_id: chain_id.to_string(),
        checkpoint_element_id: checkpoint_element_id.to_string(),
        headers: HashMap::new(),
        body: None,
        properties: Vec::new(),
        ambient_context: None,
        created_at: now_utc(),
    }
}

/// Initializes tracing for test output; safe to call more than once.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}
