//! Shared test utilities.

#![allow(dead_code, unused_imports)]

use flowstore::counter::CounterState;
use flowstore::mvi::StoreState;
use flowstore::store::{Store, Subscription};
use flowstore::trace::HistorySink;
use std::cell::RefCell;
use std::rc::Rc;

pub type Log<T> = Rc<RefCell<Vec<T>>>;

/// Subscribe an observer that records every state it receives.
pub fn record_states<S: StoreState>(store: &Store<S>) -> (Log<S>, Subscription) {
    let log: Log<S> = Rc::new(RefCell::new(Vec::new()));
    let log_clone = Rc::clone(&log);
    let sub = store.subscribe(move |state| log_clone.borrow_mut().push(state.clone()));
    (log, sub)
}

/// Counter store with a history sink attached.
pub fn traced_counter(start: i64) -> (Store<CounterState>, HistorySink<CounterState>) {
    let history = HistorySink::new(64);
    let store = Store::builder(CounterState::new(start))
        .name("My Data Flow Store")
        .trace_sink(history.clone())
        .build();
    (store, history)
}

pub fn counts(log: &Log<CounterState>) -> Vec<i64> {
    log.borrow().iter().map(|state| state.count).collect()
}
