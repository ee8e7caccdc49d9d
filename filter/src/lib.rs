//! RSQL filter compiler
//!
//! Translates compact filter expressions such as `a==1;b=in=(2,3),c!=foo`
//! into SQL boolean fragments, either with values rendered inline or as a
//! `?`-placeholder statement plus an ordered argument list.

pub mod config;
pub mod error;
pub mod query;
pub mod schema;

pub use config::{Config, EntityConfig};
pub use error::{Error, Result};
pub use query::{
    dialect, Arg, Combinator, Dialect, ExpandedStatement, KeyTransformer, Operator, Parser,
    ParserBuilder, PreOperator, PreParser, PreParserBuilder, ProcessOptions, Statement,
};
pub use schema::{snake_case, ColumnMap};
