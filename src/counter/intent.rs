use crate::mvi::Intent;
use crate::store::Action;

pub const INCREMENT_ACTION: &str = "counter/increment";
pub const DECREMENT_ACTION: &str = "counter/decrement";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterIntent {
    Increment,
    Decrement,
}

impl Intent for CounterIntent {
    fn action(&self) -> Action {
        match self {
            CounterIntent::Increment => Action::new(INCREMENT_ACTION),
            CounterIntent::Decrement => Action::new(DECREMENT_ACTION),
        }
    }
}
