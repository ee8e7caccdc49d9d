//! RSQL filter expressions.
//!
//! # Syntax Overview
//!
//! - **Comparison**: `key<op>value`, e.g. `age=ge=18`, `name==bob`
//! - **AND**: `;` binds tighter than OR, e.g. `a==1;b==2`
//! - **OR**: `,` e.g. `a==1,b==2`
//! - **Grouping**: `(a==1,b==2);c==3`
//! - **Lists**: `status=in=(open,closed)`, `status=out=(draft)`
//! - **Escapes**: `\(`, `\)`, `\,`, `\;`, `\=`, `\\` are literal characters
//!
//! Operators: `==`, `!=`, `>`, `>=`, `<`, `<=`, `=gt=`, `=ge=`, `=lt=`,
//! `=le=`, `=in=`, `=out=`.

mod compile;
pub mod dialect;
mod escape;
mod operation;
mod operator;
mod options;
mod parser;
mod pre;
mod split;

pub use dialect::Dialect;
pub use operator::{is_valid_token, Combinator, Formatter, KeyTransformer, Operator, PreFormatter, PreOperator};
pub use options::ProcessOptions;
pub use parser::{Parser, ParserBuilder};
pub use pre::{Arg, ExpandedStatement, PreParser, PreParserBuilder, Statement};

/// Default limit on parenthesis nesting.
pub const DEFAULT_MAX_DEPTH: usize = 32;
