//! Bounded in-memory trace history.
//!
//! Keeps the most recent records so a UI or a test can inspect what the
//! store did. The handle is cheap to clone: give one clone to the store and
//! keep another for reading.

use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::DevtoolsConfig;
use crate::mvi::StoreState;
use crate::store::Action;

use super::{TraceError, TraceSink, Transition};

pub const DEFAULT_HISTORY_CAPACITY: usize = 256;

/// One recorded event.
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEntry<S> {
    Init {
        state: S,
    },
    Transition {
        sequence: u64,
        action: Action,
        previous: S,
        next: S,
    },
    /// Content withheld by the dispatcher.
    Untraced {
        sequence: u64,
    },
}

impl<S> TraceEntry<S> {
    /// Action name for transitions, `None` for init and untraced markers.
    pub fn label(&self) -> Option<&str> {
        match self {
            TraceEntry::Transition { action, .. } => Some(action.name()),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct HistorySink<S> {
    capacity: usize,
    entries: Arc<RwLock<VecDeque<TraceEntry<S>>>>,
}

impl<S: StoreState> HistorySink<S> {
    /// Creates a ring buffer holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
        }
    }

    /// Ring buffer sized by `devtools.history_capacity`.
    pub fn from_config(config: &DevtoolsConfig) -> Self {
        Self::new(config.history_capacity)
    }

    fn push(&self, entry: TraceEntry<S>) {
        let mut entries = self.entries.write();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    pub fn entries(&self) -> Vec<TraceEntry<S>> {
        self.entries.read().iter().cloned().collect()
    }

    /// Labels of recorded transitions, oldest first.
    pub fn labels(&self) -> Vec<String> {
        self.entries
            .read()
            .iter()
            .filter_map(|entry| entry.label().map(str::to_string))
            .collect()
    }

    pub fn last(&self) -> Option<TraceEntry<S>> {
        self.entries.read().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

impl<S: StoreState> Default for HistorySink<S> {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl<S: StoreState> TraceSink<S> for HistorySink<S> {
    fn init(&self, _store: &str, state: &S) -> Result<(), TraceError> {
        self.push(TraceEntry::Init {
            state: state.clone(),
        });
        Ok(())
    }

    fn transition(&self, record: &Transition<'_, S>) -> Result<(), TraceError> {
        self.push(TraceEntry::Transition {
            sequence: record.sequence,
            action: record.action.clone(),
            previous: record.previous.clone(),
            next: record.next.clone(),
        });
        Ok(())
    }

    fn untraced(&self, _store: &str, sequence: u64) -> Result<(), TraceError> {
        self.push(TraceEntry::Untraced { sequence });
        Ok(())
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for HistorySink<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistorySink")
            .field("capacity", &self.capacity)
            .field("len", &self.entries.read().len())
            .finish()
    }
}
