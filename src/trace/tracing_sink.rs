use crate::mvi::StoreState;

use super::{TraceError, TraceSink, Transition};

/// Forwards transitions to the `tracing` subscriber under the
/// `flowstore::trace` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl<S: StoreState> TraceSink<S> for TracingSink {
    fn init(&self, store: &str, state: &S) -> Result<(), TraceError> {
        tracing::debug!(target: "flowstore::trace", store, state = ?state, "Store initialized");
        Ok(())
    }

    fn transition(&self, record: &Transition<'_, S>) -> Result<(), TraceError> {
        tracing::debug!(
            target: "flowstore::trace",
            store = record.store,
            seq = record.sequence,
            action = record.action.name(),
            previous = ?record.previous,
            next = ?record.next,
            "State transition"
        );
        Ok(())
    }

    fn untraced(&self, store: &str, sequence: u64) -> Result<(), TraceError> {
        tracing::trace!(target: "flowstore::trace", store, seq = sequence, "Untraced transition");
        Ok(())
    }
}
