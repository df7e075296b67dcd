//! Typed reducers, dispatched with [`Store::apply`](crate::store::Store::apply).

use super::intent::Intent;
use super::state::StoreState;

/// Maps an intent enum onto state transitions.
///
/// A named, reusable alternative to passing a closure to `dispatch`. The
/// store labels the transition with the intent's [`Intent::action`], and
/// `reduce` must stay pure: (State, Intent) -> State.
pub trait Reducer {
    /// The state type this reducer operates on.
    type State: StoreState;

    /// The intent type this reducer handles.
    type Intent: Intent;

    /// Process an intent and return the new state.
    ///
    /// This should be a pure function with no side effects.
    fn reduce(state: Self::State, intent: Self::Intent) -> Self::State;
}
