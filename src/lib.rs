//! flowstore: a single-threaded observable state store.
//!
//! ```
//! use flowstore::counter::CounterState;
//! use flowstore::store::Store;
//!
//! let store = Store::new(CounterState::new(0));
//! let sub = store.subscribe(|state| println!("count = {}", state.count));
//! store.increment();
//! assert_eq!(store.get_state(), CounterState::new(1));
//! sub.unsubscribe();
//! ```

pub mod config;
pub mod counter;
pub mod logging;
pub mod mvi;
pub mod store;
pub mod trace;

pub use store::{Action, ReducerFailure, Store, StoreBuilder, Subscription, WeakStore};
