//! Per-call key policy.

use crate::{Error, Result};

/// Keys a single `process`/`process_pre` call may use.
///
/// Entries are exact key names, or prefixes ending in `*` (e.g. `meta.*`).
/// A key matching the forbidden list, or missing from a non-empty allowed
/// list, aborts the whole call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOptions {
    allowed_keys: Vec<String>,
    forbidden_keys: Vec<String>,
}

impl ProcessOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the keys which can be used for querying.
    pub fn allowed_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    /// Set the keys which must not be used for querying.
    pub fn forbidden_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.forbidden_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed_keys
    }

    pub fn forbidden(&self) -> &[String] {
        &self.forbidden_keys
    }

    /// Check `key` against both lists.
    pub fn check(&self, key: &str) -> Result<()> {
        if self.forbidden_keys.iter().any(|p| key_matches(p, key)) {
            return Err(Error::KeyNotAllowed(key.to_string()));
        }

        if !self.allowed_keys.is_empty() && !self.allowed_keys.iter().any(|p| key_matches(p, key)) {
            return Err(Error::KeyNotAllowed(key.to_string()));
        }

        Ok(())
    }
}

fn key_matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => pattern == key,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allows_everything() {
        assert!(ProcessOptions::default().check("anything").is_ok());
    }

    #[test]
    fn test_allowed_list() {
        let opts = ProcessOptions::new().allowed_keys(["a", "b"]);
        assert!(opts.check("a").is_ok());
        assert!(matches!(opts.check("c"), Err(Error::KeyNotAllowed(k)) if k == "c"));
    }

    #[test]
    fn test_forbidden_wins_over_allowed() {
        let opts = ProcessOptions::new()
            .allowed_keys(["a", "b"])
            .forbidden_keys(["b"]);
        assert!(opts.check("a").is_ok());
        assert!(opts.check("b").is_err());
    }

    #[test]
    fn test_prefix_patterns() {
        let opts = ProcessOptions::new()
            .allowed_keys(["meta.*", "id"])
            .forbidden_keys(["meta.secret"]);
        assert!(opts.check("meta.owner").is_ok());
        assert!(opts.check("id").is_ok());
        assert!(opts.check("meta.secret").is_err());
        assert!(opts.check("metadata").is_err());
    }
}
