//! The observable state store.
//!
//! A [`Store`] owns one state value. The only way to change it is to
//! dispatch a reducer together with an [`Action`] label. After every
//! successful dispatch the store, in order:
//!
//! 1. replaces its state with the reducer's result,
//! 2. reports the transition to its trace sink, if one is attached,
//! 3. notifies observers registered when notification starts.
//!
//! # Invariants
//!
//! 1. Observers never see an intermediate value.
//! 2. A failing reducer leaves state, version, sink and observers untouched.
//! 3. Notification is unconditional on success, even when the reducer
//!    returns an equal value.
//! 4. `version()` increases by exactly one per successful dispatch.
//!
//! `Store` is single-threaded (`Rc` + `RefCell`). Clones are strong handles
//! to the same store. An observer that needs to reach back into its store
//! captures a [`WeakStore`] from [`Store::downgrade`]: a strong handle held by
//! an observer keeps the store, its observers and its sink alive forever.
//!
//! An observer may dispatch. The nested transition notifies every observer
//! with the newer state, and the interrupted cycle is abandoned so that
//! observers later in it never receive the older value.

mod action;
mod error;
mod subscription;

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::{Rc, Weak};

use crate::config::Config;
use crate::mvi::{Intent, Reducer, StoreState};
use crate::trace::{TraceSink, Tracer, Transition};

pub use action::Action;
pub use error::ReducerFailure;
pub use subscription::Subscription;

use subscription::ObserverRegistry;

const DEFAULT_STORE_NAME: &str = "flowstore";

pub struct Store<S: StoreState> {
    inner: Rc<StoreInner<S>>,
}

struct StoreInner<S: StoreState> {
    name: String,
    initial: Rc<S>,
    state: RefCell<Rc<S>>,
    version: Cell<u64>,
    observers: Rc<ObserverRegistry<S>>,
    tracer: Option<Tracer<S>>,
}

/// Non-owning handle to a [`Store`], for observers that dispatch or read.
pub struct WeakStore<S: StoreState> {
    inner: Weak<StoreInner<S>>,
}

impl<S: StoreState> WeakStore<S> {
    /// The store, if any strong handle is still alive.
    pub fn upgrade(&self) -> Option<Store<S>> {
        self.inner.upgrade().map(|inner| Store { inner })
    }
}

impl<S: StoreState> Clone for WeakStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S: StoreState> std::fmt::Debug for WeakStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakStore")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

impl<S: StoreState> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: StoreState> Store<S> {
    /// Create an untraced store named `flowstore`.
    pub fn new(initial: S) -> Self {
        StoreBuilder::new(initial).build()
    }

    pub fn builder(initial: S) -> StoreBuilder<S> {
        StoreBuilder::new(initial)
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Handle that does not keep the store alive.
    pub fn downgrade(&self) -> WeakStore<S> {
        WeakStore {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Clone of the current state.
    #[must_use]
    pub fn get_state(&self) -> S {
        (**self.inner.state.borrow()).clone()
    }

    /// Shared handle to the current state, without cloning the value.
    #[must_use]
    pub fn snapshot(&self) -> Rc<S> {
        Rc::clone(&self.inner.state.borrow())
    }

    /// The value the store was built with.
    #[must_use]
    pub fn initial_state(&self) -> S {
        (*self.inner.initial).clone()
    }

    /// Number of successful transitions so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Whether transitions are reported to a trace sink.
    pub fn is_traced(&self) -> bool {
        self.inner.tracer.is_some()
    }

    /// Register an observer called with the new state after each transition.
    pub fn subscribe(&self, observer: impl Fn(&S) + 'static) -> Subscription {
        self.inner.observers.register(move |next, _| observer(next))
    }

    /// Register an observer called with `(next, previous)`.
    pub fn subscribe_with_previous(&self, observer: impl Fn(&S, &S) + 'static) -> Subscription {
        self.inner.observers.register(observer)
    }

    /// Register an observer of a derived slice of the state.
    ///
    /// `on_change` runs only when `select(next) != select(previous)`.
    pub fn subscribe_selector<T>(
        &self,
        select: impl Fn(&S) -> T + 'static,
        on_change: impl Fn(&T) + 'static,
    ) -> Subscription
    where
        T: PartialEq + 'static,
    {
        self.inner.observers.register(move |next, previous| {
            let selected = select(next);
            if selected != select(previous) {
                on_change(&selected);
            }
        })
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }

    /// Apply `reducer` to the current state and publish the result.
    pub fn dispatch(&self, reducer: impl FnOnce(&S) -> S, action: impl Into<Action>) {
        self.dispatch_infallible(reducer, action.into(), true);
    }

    /// Like [`dispatch`](Self::dispatch), but the sink only learns that a
    /// transition happened, never its content.
    pub fn dispatch_untraced(&self, reducer: impl FnOnce(&S) -> S, action: impl Into<Action>) {
        self.dispatch_infallible(reducer, action.into(), false);
    }

    /// Dispatch a reducer that may fail. On failure nothing changes.
    pub fn try_dispatch<E>(
        &self,
        reducer: impl FnOnce(&S) -> Result<S, E>,
        action: impl Into<Action>,
    ) -> Result<(), ReducerFailure<E>>
    where
        E: std::error::Error + 'static,
    {
        self.try_dispatch_with(reducer, action, true)
    }

    /// General form of every dispatch operation.
    pub fn try_dispatch_with<E>(
        &self,
        reducer: impl FnOnce(&S) -> Result<S, E>,
        action: impl Into<Action>,
        traceable: bool,
    ) -> Result<(), ReducerFailure<E>>
    where
        E: std::error::Error + 'static,
    {
        let action = action.into();
        let previous = self.snapshot();

        let next = match reducer(&previous) {
            Ok(next) => Rc::new(next),
            Err(source) => {
                tracing::debug!(
                    store = %self.inner.name,
                    action = action.name(),
                    "Reducer failed; state unchanged"
                );
                return Err(ReducerFailure {
                    action: action.name,
                    source,
                });
            }
        };

        *self.inner.state.borrow_mut() = Rc::clone(&next);
        let sequence = self.inner.version.get() + 1;
        self.inner.version.set(sequence);

        tracing::trace!(
            store = %self.inner.name,
            action = action.name(),
            seq = sequence,
            traceable,
            "Dispatched"
        );

        if let Some(tracer) = &self.inner.tracer {
            if traceable {
                tracer.transition(&Transition {
                    store: &self.inner.name,
                    sequence,
                    action: &action,
                    previous: &*previous,
                    next: &*next,
                });
            } else {
                tracer.untraced(&self.inner.name, sequence);
            }
        }

        let version = &self.inner.version;
        self.inner
            .observers
            .notify(&next, &previous, || version.get() == sequence);
        Ok(())
    }

    /// Replace the state wholesale.
    pub fn replace_state(&self, state: S, action: impl Into<Action>) {
        self.dispatch(move |_| state, action);
    }

    /// Dispatch through a typed [`Reducer`], labelled by the intent.
    pub fn apply<R>(&self, intent: R::Intent)
    where
        R: Reducer<State = S>,
    {
        let action = Intent::action(&intent);
        self.dispatch(move |state| R::reduce(state.clone(), intent), action);
    }

    fn dispatch_infallible(&self, reducer: impl FnOnce(&S) -> S, action: Action, traceable: bool) {
        let result =
            self.try_dispatch_with(|state| Ok::<S, Infallible>(reducer(state)), action, traceable);
        match result {
            Ok(()) => {}
            Err(failure) => match failure.source {},
        }
    }
}

impl<S: StoreState> std::fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name)
            .field("version", &self.inner.version.get())
            .field("state", &**self.inner.state.borrow())
            .field("observers", &self.inner.observers.len())
            .field("traced", &self.is_traced())
            .finish()
    }
}

/// Explicit construction of a [`Store`] and its optional trace sink.
pub struct StoreBuilder<S: StoreState> {
    initial: S,
    name: String,
    devtools: bool,
    sink: Option<Rc<dyn TraceSink<S>>>,
}

impl<S: StoreState> StoreBuilder<S> {
    pub fn new(initial: S) -> Self {
        Self {
            initial,
            name: DEFAULT_STORE_NAME.to_string(),
            devtools: true,
            sink: None,
        }
    }

    /// Name and devtools switch taken from configuration.
    pub fn from_config(initial: S, config: &Config) -> Self {
        Self::new(initial)
            .name(config.store.name.clone())
            .devtools(config.devtools.enabled)
    }

    /// Label shown by trace inspectors.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// When false, an attached sink receives nothing.
    pub fn devtools(mut self, enabled: bool) -> Self {
        self.devtools = enabled;
        self
    }

    pub fn trace_sink(self, sink: impl TraceSink<S> + 'static) -> Self {
        self.shared_trace_sink(Rc::new(sink))
    }

    /// Attach a sink the caller keeps a handle to.
    pub fn shared_trace_sink(mut self, sink: Rc<dyn TraceSink<S>>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn build(self) -> Store<S> {
        let tracer = match self.sink {
            Some(sink) if self.devtools => Some(Tracer::new(sink)),
            _ => None,
        };

        let initial = Rc::new(self.initial);
        if let Some(tracer) = &tracer {
            tracer.init(&self.name, &initial);
        }

        tracing::debug!(store = %self.name, traced = tracer.is_some(), "Store created");

        Store {
            inner: Rc::new(StoreInner {
                name: self.name,
                state: RefCell::new(Rc::clone(&initial)),
                initial,
                version: Cell::new(0),
                observers: Rc::new(ObserverRegistry::new()),
                tracer,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::{HistorySink, TraceEntry};
    use std::fmt;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Todos {
        items: Vec<String>,
    }
    impl StoreState for Todos {}

    #[derive(Debug, PartialEq)]
    struct Duplicate(String);

    impl fmt::Display for Duplicate {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "'{}' already listed", self.0)
        }
    }

    impl std::error::Error for Duplicate {}

    fn add(item: &str) -> impl FnOnce(&Todos) -> Result<Todos, Duplicate> + '_ {
        move |state| {
            if state.items.iter().any(|i| i == item) {
                return Err(Duplicate(item.to_string()));
            }
            let mut next = state.clone();
            next.items.push(item.to_string());
            Ok(next)
        }
    }

    #[test]
    fn new_store_starts_at_version_zero() {
        let store = Store::new(Todos::default());
        assert_eq!(store.version(), 0);
        assert_eq!(store.name(), "flowstore");
        assert!(!store.is_traced());
        assert_eq!(store.get_state(), store.initial_state());
    }

    #[test]
    fn failed_reducer_changes_nothing() {
        let history = HistorySink::new(16);
        let store = Store::builder(Todos::default())
            .trace_sink(history.clone())
            .build();
        let calls = Rc::new(Cell::new(0));
        let calls_clone = Rc::clone(&calls);
        store.subscribe(move |_| calls_clone.set(calls_clone.get() + 1));

        store.try_dispatch(add("milk"), "todos/add").unwrap();
        let err = store.try_dispatch(add("milk"), "todos/add").unwrap_err();

        assert_eq!(err.action, "todos/add");
        assert_eq!(err.into_inner(), Duplicate("milk".to_string()));
        assert_eq!(store.get_state().items, vec!["milk"]);
        assert_eq!(store.version(), 1);
        assert_eq!(calls.get(), 1);
        // init + one transition
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn snapshot_is_shared_not_cloned() {
        let store = Store::new(Todos::default());
        let a = store.snapshot();
        let b = store.snapshot();
        assert!(Rc::ptr_eq(&a, &b));

        store.dispatch(|s| s.clone(), "todos/noop");
        assert!(!Rc::ptr_eq(&a, &store.snapshot()));
    }

    #[test]
    fn disabled_devtools_drops_sink() {
        let history = HistorySink::new(16);
        let store = Store::builder(Todos::default())
            .devtools(false)
            .trace_sink(history.clone())
            .build();

        store.dispatch(|s| s.clone(), "todos/noop");
        assert!(!store.is_traced());
        assert!(history.is_empty());
    }

    #[test]
    fn untraced_dispatch_reports_marker_only() {
        let history = HistorySink::new(16);
        let store = Store::builder(Todos::default())
            .name("todos")
            .trace_sink(history.clone())
            .build();

        store.dispatch_untraced(
            |s| Todos {
                items: [s.items.clone(), vec!["secret".to_string()]].concat(),
            },
            "todos/add",
        );

        assert_eq!(
            history.entries(),
            vec![
                TraceEntry::Init {
                    state: Todos::default()
                },
                TraceEntry::Untraced { sequence: 1 },
            ]
        );
    }

    #[test]
    fn clone_is_a_handle_to_the_same_store() {
        let store = Store::new(Todos::default());
        let handle = store.clone();
        handle.replace_state(
            Todos {
                items: vec!["a".into()],
            },
            "todos/replace",
        );
        assert_eq!(store.get_state().items, vec!["a"]);
        assert_eq!(store.version(), 1);
    }

    #[test]
    fn debug_output_includes_state() {
        let store = Store::builder(Todos::default()).name("todos").build();
        let dbg = format!("{:?}", store);
        assert!(dbg.contains("todos"));
        assert!(dbg.contains("items"));
    }

    #[test]
    fn weak_handle_does_not_keep_store_alive() {
        let store = Store::new(Todos::default());
        let weak = store.downgrade();
        assert!(weak.upgrade().is_some());

        drop(store);
        assert!(weak.upgrade().is_none());
    }

    enum TodoIntent {
        Add(Rc<str>),
    }

    impl Intent for TodoIntent {
        fn action(&self) -> Action {
            match self {
                TodoIntent::Add(item) => Action::new("todos/add")
                    .with_payload(serde_json::Value::String(item.to_string())),
            }
        }
    }

    struct TodoReducer;

    impl Reducer for TodoReducer {
        type State = Todos;
        type Intent = TodoIntent;

        fn reduce(mut state: Todos, intent: TodoIntent) -> Todos {
            match intent {
                TodoIntent::Add(item) => state.items.push(item.to_string()),
            }
            state
        }
    }

    #[test]
    fn apply_accepts_single_threaded_intents() {
        let history = HistorySink::new(4);
        let store = Store::builder(Todos::default())
            .trace_sink(history.clone())
            .build();

        store.apply::<TodoReducer>(TodoIntent::Add(Rc::from("milk")));

        assert_eq!(store.get_state().items, vec!["milk"]);
        assert_eq!(history.labels(), vec!["todos/add"]);
    }
}
