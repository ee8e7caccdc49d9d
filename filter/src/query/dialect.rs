//! Operator sets for the supported targets.
//!
//! Each function returns a builder preloaded with the target's operators and
//! combinators; callers may add key transformers or operators before
//! building.

use serde::{Deserialize, Serialize};

use super::operator::{Operator, PreOperator};
use super::parser::ParserBuilder;
use super::pre::PreParserBuilder;

/// Returned for an empty SQL expression: no filter, match everything.
pub const SQL_MATCH_ALL: &str = "1 = 1";

/// Returned for an empty MongoDB expression.
pub const MONGO_MATCH_ALL: &str = "{ }";

/// Built-in operator tokens and their SQL comparison, in registration order.
const SQL_OPERATORS: [(&str, &str); 12] = [
    ("==", "="),
    ("!=", "!="),
    (">", ">"),
    (">=", ">="),
    ("<", "<"),
    ("<=", "<="),
    ("=gt=", ">"),
    ("=ge=", ">="),
    ("=lt=", "<"),
    ("=le=", "<="),
    ("=in=", "in"),
    ("=out=", "not in"),
];

const MONGO_OPERATORS: [(&str, &str); 8] = [
    ("==", "$eq"),
    ("!=", "$ne"),
    ("=gt=", "$gt"),
    ("=ge=", "$gte"),
    ("=lt=", "$lt"),
    ("=le=", "$lte"),
    ("=in=", "$in"),
    ("=out=", "$nin"),
];

/// Parameterized SQL targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Mysql,
    Duckdb,
}

impl Dialect {
    /// A preloaded builder for this dialect.
    pub fn pre_builder<F>(self, name_transfer: F) -> PreParserBuilder
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        match self {
            Dialect::Mysql => mysql_pre(name_transfer),
            Dialect::Duckdb => duckdb_pre(name_transfer),
        }
    }
}

impl std::str::FromStr for Dialect {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(Dialect::Mysql),
            "duckdb" => Ok(Dialect::Duckdb),
            other => Err(crate::Error::Config(format!("Unknown dialect: {}", other))),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::Mysql => write!(f, "mysql"),
            Dialect::Duckdb => write!(f, "duckdb"),
        }
    }
}

fn is_membership(token: &str) -> bool {
    token == "=in=" || token == "=out="
}

/// `<`, `<=`, `>`, `>=` are only recognized by parameterized parsers.
fn is_bare_relational(token: &str) -> bool {
    token.starts_with(['<', '>'])
}

/// Strip one pair of surrounding parentheses, if present.
fn list_body(value: &str) -> &str {
    value
        .strip_prefix('(')
        .and_then(|v| v.strip_suffix(')'))
        .unwrap_or(value)
}

/// Quote a MySQL identifier with backticks.
pub fn mysql_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Quote a standard SQL identifier with double quotes.
pub fn ansi_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn sql_and(ss: &[String]) -> String {
    match ss {
        [] => String::new(),
        [single] => single.clone(),
        _ => format!("({})", ss.join(" and ")),
    }
}

fn sql_or(ss: &[String]) -> String {
    match ss {
        [] => SQL_MATCH_ALL.to_string(),
        [single] => single.clone(),
        _ => format!("({})", ss.join(" or ")),
    }
}

/// MySQL with values rendered inline.
///
/// Values are written verbatim; only use this for trusted input or for
/// display. [`mysql_pre`] binds values instead. Like [`mongo`], only the
/// named relational tokens (`=gt=`, ...) are registered.
pub fn mysql() -> ParserBuilder {
    let operators = SQL_OPERATORS
        .iter()
        .filter(|(token, _)| !is_bare_relational(token))
        .map(|&(token, label)| {
            if is_membership(token) {
                Operator::new(token, move |key, value| {
                    format!("{} {} ({})", mysql_ident(key), label, list_body(value))
                })
            } else {
                Operator::new(token, move |key, value| {
                    format!("{} {} {}", mysql_ident(key), label, value)
                })
            }
        });

    ParserBuilder::new()
        .operators(operators)
        .and_combinator(sql_and)
        .or_combinator(sql_or)
}

/// MySQL prepared statements. `name_transfer` maps each key to its column
/// name when the predicate is rendered.
pub fn mysql_pre<F>(name_transfer: F) -> PreParserBuilder
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    sql_pre(name_transfer, mysql_ident)
}

/// DuckDB prepared statements, with double-quoted identifiers.
pub fn duckdb_pre<F>(name_transfer: F) -> PreParserBuilder
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    sql_pre(name_transfer, ansi_ident)
}

fn sql_pre<F>(name_transfer: F, quote: fn(&str) -> String) -> PreParserBuilder
where
    F: Fn(&str) -> String + Send + Sync + 'static,
{
    let name_transfer = std::sync::Arc::new(name_transfer);
    let operators = SQL_OPERATORS.iter().map(|&(token, label)| {
        let name_transfer = name_transfer.clone();
        PreOperator::new(token, move |key| {
            format!("{} {} ?", quote(&name_transfer(key)), label)
        })
    });

    PreParserBuilder::new()
        .operators(operators.collect::<Vec<_>>())
        .and_combinator(sql_and)
        .or_combinator(sql_or)
}

/// MongoDB filter documents with values rendered inline.
///
/// Only the named tokens are registered; bare `<`, `>` and friends are not.
pub fn mongo() -> ParserBuilder {
    let operators = MONGO_OPERATORS.iter().map(|&(token, label)| {
        if is_membership(token) {
            Operator::new(token, move |key, value| {
                format!(r#"{{ "{}": {{ "{}": [ {} ] }} }}"#, key, label, list_body(value))
            })
        } else {
            Operator::new(token, move |key, value| {
                format!(r#"{{ "{}": {{ "{}": {} }} }}"#, key, label, value)
            })
        }
    });

    ParserBuilder::new()
        .operators(operators.collect::<Vec<_>>())
        .and_combinator(|ss: &[String]| match ss {
            [] => String::new(),
            [single] => single.clone(),
            _ => format!(r#"{{ "$and": [ {} ] }}"#, ss.join(", ")),
        })
        .or_combinator(|ss: &[String]| match ss {
            [] => MONGO_MATCH_ALL.to_string(),
            [single] => single.clone(),
            _ => format!(r#"{{ "$or": [ {} ] }}"#, ss.join(", ")),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_combinators() {
        assert_eq!(sql_and(&[]), "");
        assert_eq!(sql_or(&[]), SQL_MATCH_ALL);
        assert_eq!(sql_and(&["a".to_string()]), "a");
        assert_eq!(sql_or(&["a".to_string(), "b".to_string()]), "(a or b)");
        assert_eq!(
            sql_and(&["a".to_string(), "b".to_string(), "c".to_string()]),
            "(a and b and c)"
        );
    }

    #[test]
    fn test_identifier_quoting() {
        assert_eq!(mysql_ident("a"), "`a`");
        assert_eq!(mysql_ident("a`b"), "`a``b`");
        assert_eq!(ansi_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_dialect_from_str() {
        assert_eq!("MySQL".parse::<Dialect>().unwrap(), Dialect::Mysql);
        assert_eq!("duckdb".parse::<Dialect>().unwrap(), Dialect::Duckdb);
        assert!("oracle".parse::<Dialect>().is_err());
    }

    #[test]
    fn test_inline_mysql_skips_bare_relational_tokens() {
        let parser = mysql().build().unwrap();
        assert!(parser.operators().iter().all(|o| !is_bare_relational(&o.token)));
        assert!(parser.operators().iter().any(|o| o.token == "=ge="));
    }

    #[test]
    fn test_builders_register_all_operators() {
        assert_eq!(mysql().build().unwrap().operators().len(), 8);
        assert_eq!(mysql_pre(str::to_string).build().unwrap().operators().len(), 12);
        assert_eq!(mongo().build().unwrap().operators().len(), 8);
    }
}
