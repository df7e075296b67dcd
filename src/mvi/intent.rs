//! Base trait for intents (typed actions) in MVI architecture.

use crate::store::Action;

/// Typed description of an intended state change.
///
/// Intents are processed by reducers to produce new states. The
/// [`Action`] returned by [`Intent::action`] is what trace sinks see.
pub trait Intent: 'static {
    /// Trace label (and optional payload) for this intent.
    fn action(&self) -> Action;
}
