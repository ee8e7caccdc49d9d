//! Inline rendering: values are written straight into the output.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use super::compile::Walker;
use super::escape;
use super::operation::Operation;
use super::operator::{is_valid_token, Combinator, KeyTransformer, Operator};
use super::options::ProcessOptions;
use super::DEFAULT_MAX_DEPTH;
use crate::{Error, Result};

/// An RSQL parser rendering values inline.
///
/// Built once (see [`crate::dialect::mysql`], [`crate::dialect::mongo`]) and
/// reused; processing never mutates it.
#[derive(Clone)]
pub struct Parser {
    operators: Vec<Operator>,
    and: Combinator,
    or: Combinator,
    key_transformers: Vec<KeyTransformer>,
    max_depth: usize,
}

/// Builder for [`Parser`].
#[derive(Clone, Default)]
pub struct ParserBuilder {
    operators: Vec<Operator>,
    and: Option<Combinator>,
    or: Option<Combinator>,
    key_transformers: Vec<KeyTransformer>,
    max_depth: Option<usize>,
}

impl ParserBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an operator. Earlier registrations win on duplicate tokens.
    pub fn operator(mut self, operator: Operator) -> Self {
        self.operators.push(operator);
        self
    }

    pub fn operators(mut self, operators: impl IntoIterator<Item = Operator>) -> Self {
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

    /// Add a function altering key names. Transformers run in the order they
    /// were added.
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

    pub fn build(self) -> Result<Parser> {
        let and = self.and.ok_or(Error::MissingAndCombinator)?;
        let or = self.or.ok_or(Error::MissingOrCombinator)?;

        if let Some(bad) = self.operators.iter().find(|o| !is_valid_token(&o.token)) {
            return Err(Error::InvalidOperator(bad.token.clone()));
        }

        Ok(Parser {
            operators: self.operators,
            and,
            or,
            key_transformers: self.key_transformers,
            max_depth: self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
        })
    }
}

impl Parser {
    pub fn builder() -> ParserBuilder {
        ParserBuilder::new()
    }

    pub fn operators(&self) -> &[Operator] {
        &self.operators
    }

    /// Render `query` using the parser's operators.
    pub fn process(&self, query: &str, options: &ProcessOptions) -> Result<String> {
        let encoded = escape::encode(query)?;
        let walker = Walker {
            and: &self.and,
            or: &self.or,
            max_depth: self.max_depth,
        };

        let rendered = walker.walk(&encoded, 0, &mut |content: &str| {
            self.render_operation(content, options)
        })?;

        debug!(query_len = query.len(), "rendered inline filter");
        Ok(rendered)
    }

    fn render_operation(&self, content: &str, options: &ProcessOptions) -> Result<String> {
        let operation = Operation::parse(content, false)?;
        let key = operation.resolve_key(&self.key_transformers, options)?;
        let value = escape::decode(operation.value);

        let operator = self
            .operators
            .iter()
            .find(|o| o.token == operation.operator)
            .ok_or_else(|| operation.unknown_operator(content))?;

        trace!(key = %key, operator = %operator.token, "operation");
        Ok((operator.formatter)(&key, &value))
    }
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("operators", &self.operators)
            .field("key_transformers", &self.key_transformers.len())
            .field("max_depth", &self.max_depth)
            .finish_non_exhaustive()
    }
}
