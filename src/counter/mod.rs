//! Counter store: the canonical example of a store.

mod intent;
mod reducer;
mod state;

pub use intent::{CounterIntent, DECREMENT_ACTION, INCREMENT_ACTION};
pub use reducer::CounterReducer;
pub use state::CounterState;

use crate::store::Store;

impl Store<CounterState> {
    /// Add 1 to `count`, traced as `counter/increment`.
    pub fn increment(&self) {
        self.apply::<CounterReducer>(CounterIntent::Increment);
    }

    /// Subtract 1 from `count`, traced as `counter/decrement`.
    pub fn decrement(&self) {
        self.apply::<CounterReducer>(CounterIntent::Decrement);
    }

    pub fn count(&self) -> i64 {
        self.snapshot().count
    }
}
