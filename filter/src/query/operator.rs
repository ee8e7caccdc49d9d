//! Operators, formatters and combinators.

use std::fmt;
use std::sync::{Arc, LazyLock};

use regex::Regex;

/// Renders `(key, value)` into a predicate with the value inline.
pub type Formatter = Arc<dyn Fn(&str, &str) -> String + Send + Sync>;

/// Renders a key into a predicate holding placeholder(s) for the value.
pub type PreFormatter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Joins already formatted fragments with a boolean connective.
pub type Combinator = Arc<dyn Fn(&[String]) -> String + Send + Sync>;

/// Rewrites a parsed key before policy checks and formatting.
pub type KeyTransformer = Arc<dyn Fn(&str) -> String + Send + Sync>;

static TOKEN_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[!=][^=()]*=|[<>]=?)$").expect("valid token pattern"));

/// Whether `token` has a shape the operation scanner can recognize:
/// `[!=][^=()]*=` (e.g. `==`, `!=`, `=in=`) or `[<>]=?`.
pub fn is_valid_token(token: &str) -> bool {
    TOKEN_SHAPE.is_match(token)
}

/// An operator for inline rendering.
#[derive(Clone)]
pub struct Operator {
    pub token: String,
    pub formatter: Formatter,
}

impl Operator {
    pub fn new(
        token: impl Into<String>,
        formatter: impl Fn(&str, &str) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            token: token.into(),
            formatter: Arc::new(formatter),
        }
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator").field("token", &self.token).finish_non_exhaustive()
    }
}

/// An operator for parameterized rendering.
#[derive(Clone)]
pub struct PreOperator {
    pub token: String,
    pub formatter: PreFormatter,
}

impl PreOperator {
    pub fn new(
        token: impl Into<String>,
        formatter: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        Self {
            token: token.into(),
            formatter: Arc::new(formatter),
        }
    }
}

impl fmt::Debug for PreOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreOperator").field("token", &self.token).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_tokens() {
        for token in ["==", "!=", "=gt=", "=ge=", "=lt=", "=le=", "=in=", "=out=", "=like=", ">", ">=", "<", "<="] {
            assert!(is_valid_token(token), "{token} should be valid");
        }
    }

    #[test]
    fn test_invalid_tokens() {
        for token in ["", "=", "eq", "=in", "=(=", "~=", "<>", ">>", "=a=b="] {
            assert!(!is_valid_token(token), "{token} should be invalid");
        }
    }

    #[test]
    fn test_operator_debug_shows_token() {
        let op = Operator::new("==", |k, v| format!("{k}={v}"));
        assert!(format!("{op:?}").contains("=="));
        assert_eq!((op.formatter)("a", "1"), "a=1");
    }
}
