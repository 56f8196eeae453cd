//! Testing utilities for chainflow embedders.
//!
//! This module provides:
//! - A builder for execution contexts with preset headers/properties/body
//! - A checkpoint fixture for store and restore tests
//! - Tracing initialization for test output

mod fixtures;

pub use fixtures::{checkpoint_fixture, init_test_tracing, TestContextBuilder};
