//! Error types for filter compilation.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Parentheses mismatch in '{0}'")]
    ParenthesesMismatch(String),

    #[error("Expression starts with separator '{0}'")]
    LeadingSeparator(char),

    #[error("Expression ends with separator '{0}'")]
    TrailingSeparator(char),

    #[error("Empty expression at byte {0}")]
    EmptyExpression(usize),

    #[error("Unexpected text around group in '{0}'")]
    StrayText(String),

    #[error("Incomplete operation '{0}'")]
    IncompleteOperation(String),

    #[error("Unknown operator '{operator}' in '{operation}'")]
    UnknownOperator { operator: String, operation: String },

    #[error("Given key '{0}' is not allowed")]
    KeyNotAllowed(String),

    #[error("Reserved character at byte {0}")]
    ReservedCharacter(usize),

    #[error("Nesting deeper than {0} levels")]
    TooDeep(usize),

    #[error("AND-combinator is not defined")]
    MissingAndCombinator,

    #[error("OR-combinator is not defined")]
    MissingOrCombinator,

    #[error("Invalid operator '{0}'")]
    InvalidOperator(String),
}

impl Error {
    /// Whether this error was caused by the query text or the key policy,
    /// as opposed to parser construction or configuration loading.
    ///
    /// Request handlers map these to an "invalid query parameter" response.
    pub fn is_invalid_query(&self) -> bool {
        matches!(
            self,
            Error::ParenthesesMismatch(_)
                | Error::LeadingSeparator(_)
                | Error::TrailingSeparator(_)
                | Error::EmptyExpression(_)
                | Error::StrayText(_)
                | Error::IncompleteOperation(_)
                | Error::UnknownOperator { .. }
                | Error::KeyNotAllowed(_)
                | Error::ReservedCharacter(_)
                | Error::TooDeep(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
