//! Parameterized compilation: `?` placeholders plus ordered arguments.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::compile::Walker;
use super::escape;
use super::operation::Operation;
use super::operator::{is_valid_token, Combinator, KeyTransformer, PreOperator};
use super::options::ProcessOptions;
use super::DEFAULT_MAX_DEPTH;
use crate::{Error, Result};

/// Key that, combined with `=in=`, renders as a set of regexp matches.
const DEPARTMENT_KEY: &str = "department";
const DEPARTMENT_OPERATOR: &str = "=in=";

/// A bound argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Arg {
    Scalar(String),
    /// Values of a membership operator, bound to a single placeholder.
    List(Vec<String>),
}

impl Arg {
    /// Build an argument from an escape-encoded value: `(a,b)` becomes a
    /// list, anything else a scalar.
    fn from_value(value: &str) -> Self {
        match value.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
            Some(inner) => Arg::List(inner.split(',').map(escape::decode).collect()),
            None => Arg::Scalar(escape::decode(value)),
        }
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Scalar(s.to_string())
    }
}

impl From<Vec<&str>> for Arg {
    fn from(values: Vec<&str>) -> Self {
        Arg::List(values.into_iter().map(str::to_string).collect())
    }
}

/// A compiled filter: SQL with `?` placeholders and one argument per
/// placeholder, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub sql: String,
    pub args: Vec<Arg>,
}

/// A statement whose list arguments were expanded to one placeholder each.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpandedStatement {
    pub sql: String,
    pub args: Vec<String>,
}

impl Statement {
    /// Rewrite every placeholder bound to a list as `(?, ?, ...)` and flatten
    /// the arguments, for drivers that can only bind scalars.
    ///
    /// Placeholders inside quoted identifiers or string literals are left
    /// alone. An empty list expands to `(NULL)`.
    pub fn expand(&self) -> ExpandedStatement {
        let mut sql = String::with_capacity(self.sql.len());
        let mut args = Vec::new();
        let mut pending = self.args.iter();
        let mut quote: Option<char> = None;

        for c in self.sql.chars() {
            match (quote, c) {
                (Some(q), c) if c == q => quote = None,
                (Some(_), _) => {}
                (None, '`' | '"' | '\'') => quote = Some(c),
                (None, '?') => match pending.next() {
                    Some(Arg::Scalar(v)) => {
                        sql.push('?');
                        args.push(v.clone());
                    }
                    Some(Arg::List(values)) if values.is_empty() => {
                        sql.push_str("(NULL)");
                    }
                    Some(Arg::List(values)) => {
                        sql.push('(');
                        sql.push_str(&vec!["?"; values.len()].join(", "));
                        sql.push(')');
                        args.extend(values.iter().cloned());
                    }
                    None => sql.push('?'),
                },
                _ => {}
            }
            if c != '?' || quote.is_some() {
                sql.push(c);
            }
        }

        ExpandedStatement { sql, args }
    }
}

/// An RSQL parser producing prepared-statement fragments.
#[derive(Clone)]
pub struct PreParser {
    operators: Vec<PreOperator>,
    and: Combinator,
    or: Combinator,
    key_transformers: Vec<KeyTransformer>,
    max_depth: usize,
}

/// Builder for [`PreParser`].
#[derive(Clone, Default)]
pub struct PreParserBuilder {
    operators: Vec<PreOperator>,
    and: Option<Combinator>,
    or: Option<Combinator>,
    key_transformers: Vec<KeyTransformer>,
    max_depth: Option<usize>,
}

impl PreParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn operator(mut self, operator: PreOperator) -> Self {
        self.operators.push(operator);
        self
    }

    pub fn operators(mut self, operators: impl IntoIterator<Item = PreOperator>) -> Self {
        self.operators.extend(operators);
        self
    }

    pub fn and_combinator(
        mut self,
        combinator: impl Fn(&[String]) -> String + Send + Sync + 'static,
    ) -> Self {
        self.and = Some(Arc::new(combinator));
        self
    }

    pub fn or_combinator(
        mut self,
        combinator: impl Fn(&[String]) -> String + Send + Sync + 'static,
    ) -> Self {
        self.or = Some(Arc::new(combinator));
        self
    }

    pub fn key_transformer(
        mut self,
        transformer: impl Fn(&str) -> String + Send + Sync + 'static,
    ) -> Self {
        self.key_transformers.push(Arc::new(transformer));
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn build(self) -> Result<PreParser> {
        let and = self.and.ok_or(Error::MissingAndCombinator)?;
        let or = self.or.ok_or(Error::MissingOrCombinator)?;

        if let Some(bad) = self.operators.iter().find(|o| !is_valid_token(&o.token)) {
            return Err(Error::InvalidOperator(bad.token.clone()));
        }

        Ok(PreParser {
            operators: self.operators,
            and,
            or,
            key_transformers: self.key_transformers,
            max_depth: self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
        })
    }
}

impl PreParser {
    pub fn builder() -> PreParserBuilder {
        PreParserBuilder::new()
    }

    pub fn operators(&self) -> &[PreOperator] {
        &self.operators
    }

    /// Compile `query` into a statement with positional arguments.
    pub fn process_pre(&self, query: &str, options: &ProcessOptions) -> Result<Statement> {
        let encoded = escape::encode(query)?;
        let walker = Walker {
            and: &self.and,
            or: &self.or,
            max_depth: self.max_depth,
        };

        let mut args = Vec::new();
        let sql = walker.walk(&encoded, 0, &mut |content: &str| {
            self.compile_operation(content, options, &mut args)
        })?;

        debug!(query_len = query.len(), args = args.len(), "compiled filter statement");
        Ok(Statement { sql, args })
    }

    fn compile_operation(
        &self,
        content: &str,
        options: &ProcessOptions,
        args: &mut Vec<Arg>,
    ) -> Result<String> {
        let mut operation = Operation::parse(content, true)?;
        if operation.value == "''" || operation.value == "\"\"" {
            operation.value = "";
        }
        let key = operation.resolve_key(&self.key_transformers, options)?;

        if key.eq_ignore_ascii_case(DEPARTMENT_KEY) && operation.operator == DEPARTMENT_OPERATOR {
            return Ok(department_clause(operation.value, args));
        }

        let operator = self
            .operators
            .iter()
            .find(|o| o.token == operation.operator)
            .ok_or_else(|| operation.unknown_operator(content))?;

        trace!(key = %key, operator = %operator.token, "operation");
        args.push(Arg::from_value(operation.value));
        Ok((operator.formatter)(&key))
    }
}

/// `department=in=(a,b)` matches rows whose comma-separated `department`
/// column contains any of the listed values.
fn department_clause(value: &str, args: &mut Vec<Arg>) -> String {
    warn!(
        "department=in= rendered as regexp matches with one bound pattern per value; \
         behavior pending product clarification"
    );

    let values = match Arg::from_value(value) {
        Arg::List(values) => values,
        Arg::Scalar(value) => vec![value],
    };

    let clauses: Vec<&str> = values
        .iter()
        .map(|v| {
            args.push(Arg::Scalar(format!(",{{0,1}}{v},{{0,1}}")));
            "`department` regexp ?"
        })
        .collect();

    format!("({})", clauses.join(" or "))
}

impl fmt::Debug for PreParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreParser")
            .field("operators", &self.operators)
            .field("key_transformers", &self.key_transformers.len())
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_from_value() {
        assert_eq!(Arg::from_value("1"), Arg::from("1"));
        assert_eq!(Arg::from_value("(1,2)"), Arg::from(vec!["1", "2"]));
        assert_eq!(Arg::from_value("()"), Arg::from(vec![""]));
    }

    #[test]
    fn test_arg_serializes_untagged() {
        let args = vec![Arg::from("a"), Arg::from(vec!["1", "2"])];
        assert_eq!(serde_json::to_string(&args).unwrap(), r#"["a",["1","2"]]"#);
    }

    #[test]
    fn test_expand_lists() {
        let stmt = Statement {
            sql: "(`a` in ? and `b` = ?)".to_string(),
            args: vec![Arg::from(vec!["1", "2", "3"]), Arg::from("x")],
        };
        let expanded = stmt.expand();
        assert_eq!(expanded.sql, "(`a` in (?, ?, ?) and `b` = ?)");
        assert_eq!(expanded.args, vec!["1", "2", "3", "x"]);
    }

    #[test]
    fn test_expand_empty_list() {
        let stmt = Statement {
            sql: "`a` not in ?".to_string(),
            args: vec![Arg::List(Vec::new())],
        };
        assert_eq!(stmt.expand().sql, "`a` not in (NULL)");
    }

    #[test]
    fn test_expand_skips_quoted_question_marks() {
        let stmt = Statement {
            sql: "(`a?` = ? or \"b?\" in ?)".to_string(),
            args: vec![Arg::from("1"), Arg::from(vec!["2", "3"])],
        };
        let expanded = stmt.expand();
        assert_eq!(expanded.sql, "(`a?` = ? or \"b?\" in (?, ?))");
        assert_eq!(expanded.args, vec!["1", "2", "3"]);
    }

    #[test]
    fn test_department_clause() {
        let mut args = Vec::new();
        let sql = department_clause("(ops,dev)", &mut args);
        assert_eq!(sql, "(`department` regexp ? or `department` regexp ?)");
        assert_eq!(args, vec![Arg::from(",{0,1}ops,{0,1}"), Arg::from(",{0,1}dev,{0,1}")]);
    }
}
