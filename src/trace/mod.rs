//! Trace sinks: the inspection side-channel of a store.
//!
//! A store built with a sink reports its initial state once, then every
//! transition. Sinks are fire-and-forget from the store's point of view: an
//! error or a panic inside a sink is logged and otherwise ignored.

pub mod history;
pub mod inspector;
pub mod tracing_sink;

use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use thiserror::Error;

use crate::mvi::StoreState;
use crate::store::Action;

pub use history::{HistorySink, TraceEntry};
pub use inspector::InspectorSink;
pub use tracing_sink::TracingSink;

/// Errors a sink may report. They never reach the dispatch caller.
#[derive(Debug, Error)]
pub enum TraceError {
    #[error("Failed to serialize trace record: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write trace record: {0}")]
    Io(#[from] std::io::Error),

    #[error("Trace record rejected: {0}")]
    Rejected(String),
}

/// One traced transition.
#[derive(Debug)]
pub struct Transition<'a, S> {
    /// Store name shown by inspectors.
    pub store: &'a str,
    /// Store version after this transition.
    pub sequence: u64,
    pub action: &'a Action,
    pub previous: &'a S,
    pub next: &'a S,
}

/// Receiver for store transitions.
///
/// Only [`transition`](Self::transition) is required. The default
/// [`untraced`](Self::untraced) suppresses markers for untraced dispatches.
pub trait TraceSink<S: StoreState> {
    /// Called once when the store is built.
    fn init(&self, _store: &str, _state: &S) -> Result<(), TraceError> {
        Ok(())
    }

    fn transition(&self, record: &Transition<'_, S>) -> Result<(), TraceError>;

    /// A transition happened but its content must not be recorded.
    fn untraced(&self, _store: &str, _sequence: u64) -> Result<(), TraceError> {
        Ok(())
    }
}

/// Store-side wrapper that isolates sink failures.
pub(crate) struct Tracer<S: StoreState> {
    sink: Rc<dyn TraceSink<S>>,
}

impl<S: StoreState> Tracer<S> {
    pub(crate) fn new(sink: Rc<dyn TraceSink<S>>) -> Self {
        Self { sink }
    }

    pub(crate) fn init(&self, store: &str, state: &S) {
        self.guard("init", || self.sink.init(store, state));
    }

    pub(crate) fn transition(&self, record: &Transition<'_, S>) {
        self.guard(record.action.name(), || self.sink.transition(record));
    }

    pub(crate) fn untraced(&self, store: &str, sequence: u64) {
        self.guard("untraced", || self.sink.untraced(store, sequence));
    }

    fn guard(&self, what: &str, emit: impl FnOnce() -> Result<(), TraceError>) {
        match panic::catch_unwind(AssertUnwindSafe(emit)) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(record = what, error = %e, "Trace sink failed"),
            Err(_) => tracing::warn!(record = what, "Trace sink panicked"),
        }
    }
}
