use thiserror::Error;

/// A reducer failed while computing the next state.
///
/// The store is left exactly as it was before the dispatch.
#[derive(Debug, Error)]
#[error("reducer for action '{action}' failed: {source}")]
pub struct ReducerFailure<E>
where
    E: std::error::Error + 'static,
{
    /// Name of the action whose reducer failed.
    pub action: String,
    #[source]
    pub source: E,
}

impl<E> ReducerFailure<E>
where
    E: std::error::Error + 'static,
{
    /// Returns the reducer's own error, unchanged.
    pub fn into_inner(self) -> E {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, Error, PartialEq)]
    #[error("balance would go negative")]
    struct Overdrawn;

    #[test]
    fn message_names_the_action() {
        let failure = ReducerFailure {
            action: "account/withdraw".to_string(),
            source: Overdrawn,
        };
        assert_eq!(
            failure.to_string(),
            "reducer for action 'account/withdraw' failed: balance would go negative"
        );
    }

    #[test]
    fn source_chain_and_into_inner() {
        let failure = ReducerFailure {
            action: "account/withdraw".to_string(),
            source: Overdrawn,
        };
        assert!(failure.source().is_some());
        assert_eq!(failure.into_inner(), Overdrawn);
    }
}
