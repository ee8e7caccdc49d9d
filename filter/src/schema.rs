//! Column mapping between filter keys and storage columns.
//!
//! Each entity registers its mapping once; keys without an explicit entry
//! fall back to snake_case, the naming convention used by the tables.

use std::collections::BTreeMap;

use crate::ProcessOptions;

/// Explicit logical-name to column-name mapping for one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnMap {
    columns: BTreeMap<String, String>,
    strict: bool,
}

impl ColumnMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from `(logical, column)` pairs.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        pairs
            .into_iter()
            .fold(Self::new(), |map, (logical, column)| map.with_column(logical, column))
    }

    pub fn with_column(mut self, logical: impl Into<String>, column: impl Into<String>) -> Self {
        self.columns.insert(logical.into(), column.into());
        self
    }

    /// When strict, only mapped names may be queried.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Column for a logical name.
    pub fn column(&self, name: &str) -> String {
        self.columns
            .get(name)
            .cloned()
            .unwrap_or_else(|| snake_case(name))
    }

    /// Logical names with an explicit mapping.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    /// Process options restricting queries to mapped names when strict.
    pub fn options(&self) -> ProcessOptions {
        if self.strict {
            ProcessOptions::new().allowed_keys(self.keys())
        } else {
            ProcessOptions::new()
        }
    }

    /// A `'static` closure mapping names through this table, suitable as a
    /// dialect's name transfer.
    pub fn transfer(&self) -> impl Fn(&str) -> String + Send + Sync + 'static {
        let map = self.clone();
        move |name: &str| map.column(name)
    }
}

/// Convert a camelCase or PascalCase name to snake_case.
///
/// Acronyms stay together: `UserID` becomes `user_id`, `HTTPServer` becomes
/// `http_server`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                None | Some('_') => false,
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                Some(_) => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    out
}
