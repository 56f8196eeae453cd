//! Best-effort reporting of session lifecycle events.
//!
//! Finalization side effects (metrics, downstream notifications) go through
//! an [`EventSink`]; a sink failure is logged and swallowed so that it can
//! never fail session finalization itself.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
