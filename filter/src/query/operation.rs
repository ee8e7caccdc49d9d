//! Atomic `key<op>value` operations.

use std::sync::LazyLock;

use super::escape;
use super::options::ProcessOptions;
use super::operator::KeyTransformer;
use crate::{Error, Result};

static RE_OPERATOR: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"[!=][^=()]*=").expect("valid operator pattern"));
static RE_RELATIONAL: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"[<>]=?").expect("valid relational pattern"));
static RE_KEY: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[^=!<>]+").expect("valid key pattern"));
static RE_VALUE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"[^=<>]+$").expect("valid value pattern"));

/// A single comparison, still in escaped form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Operation<'a> {
    pub key: &'a str,
    pub operator: &'a str,
    pub value: &'a str,
}

impl<'a> Operation<'a> {
    /// Split `content` into key, operator and value.
    ///
    /// Equality-family operators (`==`, `=in=`, ...) are tried first; with
    /// `relational` set, bare `<`, `<=`, `>`, `>=` are accepted as well.
    pub fn parse(content: &'a str, relational: bool) -> Result<Self> {
        let operator = RE_OPERATOR
            .find(content)
            .or_else(|| relational.then(|| RE_RELATIONAL.find(content)).flatten())
            .map_or("", |m| m.as_str());
        let key = RE_KEY.find(content).map_or("", |m| m.as_str());
        let value = RE_VALUE.find(content).map_or("", |m| m.as_str());

        if operator.is_empty() || key.is_empty() || value.is_empty() {
            return Err(Error::IncompleteOperation(escape::decode(content)));
        }

        Ok(Self { key, operator, value })
    }

    /// The key after running `transformers` in order, checked against the
    /// allow/deny lists of `options`.
    pub fn resolve_key(
        &self,
        transformers: &[KeyTransformer],
        options: &ProcessOptions,
    ) -> Result<String> {
        let key = transformers
            .iter()
            .fold(escape::decode(self.key), |key, transform| transform(&key));
        options.check(&key)?;
        Ok(key)
    }

    /// An error for an operator token missing from the operator table.
    pub fn unknown_operator(&self, content: &str) -> Error {
        Error::UnknownOperator {
            operator: self.operator.to_string(),
            operation: escape::decode(content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_equality() {
        let op = Operation::parse("name==bob", false).unwrap();
        assert_eq!(op, Operation { key: "name", operator: "==", value: "bob" });
    }

    #[test]
    fn test_parse_named_operators() {
        let op = Operation::parse("age=ge=18", false).unwrap();
        assert_eq!((op.key, op.operator, op.value), ("age", "=ge=", "18"));

        let op = Operation::parse("id=in=(1,2)", false).unwrap();
        assert_eq!((op.key, op.operator, op.value), ("id", "=in=", "(1,2)"));
    }

    #[test]
    fn test_parse_not_equal_keeps_bang_in_value() {
        let op = Operation::parse("a!=x!", false).unwrap();
        assert_eq!((op.key, op.operator, op.value), ("a", "!=", "x!"));
    }

    #[test]
    fn test_relational_needs_fallback() {
        assert!(matches!(
            Operation::parse("a>1", false),
            Err(Error::IncompleteOperation(_))
        ));
        let op = Operation::parse("a>1", true).unwrap();
        assert_eq!((op.key, op.operator, op.value), ("a", ">", "1"));

        let op = Operation::parse("a<=1", true).unwrap();
        assert_eq!(op.operator, "<=");
    }

    #[test]
    fn test_parse_incomplete() {
        for content in ["a==", "==1", "a", "a=1"] {
            assert!(
                matches!(Operation::parse(content, true), Err(Error::IncompleteOperation(_))),
                "{content} should be incomplete"
            );
        }
    }

    #[test]
    fn test_resolve_key_runs_transformers_in_order() {
        let op = Operation::parse("Name==x", false).unwrap();
        let transformers: Vec<KeyTransformer> = vec![
            std::sync::Arc::new(|k: &str| k.to_lowercase()),
            std::sync::Arc::new(|k: &str| format!("t.{k}")),
        ];
        let key = op.resolve_key(&transformers, &ProcessOptions::default()).unwrap();
        assert_eq!(key, "t.name");
    }

    #[test]
    fn test_resolve_key_checks_policy_after_transform() {
        let op = Operation::parse("Name==x", false).unwrap();
        let transformers: Vec<KeyTransformer> = vec![std::sync::Arc::new(|k: &str| k.to_lowercase())];
        let options = ProcessOptions::new().forbidden_keys(["name"]);
        assert!(matches!(
            op.resolve_key(&transformers, &options),
            Err(Error::KeyNotAllowed(k)) if k == "name"
        ));
    }
}
