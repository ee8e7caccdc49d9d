//! Configuration for filter compilation.
//!
//! Config file resolution order:
//! 1. Explicit path passed to Config::load_from()
//! 2. RSQL_CONFIG environment variable
//! 3. Default: <platform config dir>/rsql/config.toml
//!
//! A missing file yields the built-in defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::query::{dialect, Dialect, PreParser, ProcessOptions, DEFAULT_MAX_DEPTH};
use crate::schema::ColumnMap;
use crate::{Error, Result};

/// Filter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Maximum parenthesis nesting accepted in a query.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Target dialect for parameterized statements.
    #[serde(default)]
    pub dialect: Dialect,

    /// Per-entity column mappings and key policies.
    #[serde(default)]
    pub entities: BTreeMap<String, EntityConfig>,
}

/// Column mapping and key policy for one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Only keys listed in `columns` may be queried.
    #[serde(default)]
    pub strict: bool,

    /// Additional allowed keys (exact names or `prefix*`).
    #[serde(default)]
    pub allowed: Vec<String>,

    /// Keys which must never be queried.
    #[serde(default)]
    pub forbidden: Vec<String>,

    /// Logical key to column name.
    #[serde(default)]
    pub columns: BTreeMap<String, String>,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            dialect: Dialect::default(),
            entities: BTreeMap::new(),
        }
    }
}

impl EntityConfig {
    pub fn column_map(&self) -> ColumnMap {
        self.columns
            .iter()
            .fold(ColumnMap::new(), |map, (logical, column)| {
                map.with_column(logical.as_str(), column.as_str())
            })
            .strict(self.strict)
    }

    /// Key policy: mapped names when strict, plus `allowed`, minus `forbidden`.
    pub fn options(&self) -> ProcessOptions {
        let mut allowed: Vec<String> = self.allowed.clone();
        if self.strict {
            allowed.extend(self.columns.keys().cloned());
        }
        ProcessOptions::new()
            .allowed_keys(allowed)
            .forbidden_keys(self.forbidden.iter().cloned())
    }
}

impl Config {
    /// Load config using the standard resolution order.
    pub fn load() -> Result<Self> {
        match resolve_config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load config from a specific file, or defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Save config to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Look up an entity by name.
    pub fn entity(&self, name: &str) -> Result<&EntityConfig> {
        self.entities
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("entity '{}'", name)))
    }

    /// Build a parameterized parser for the configured dialect, and the
    /// process options for `entity` (or permissive options without one).
    pub fn pre_parser(&self, entity: Option<&str>) -> Result<(PreParser, ProcessOptions)> {
        self.pre_parser_for(self.dialect, entity)
    }

    /// Like [`Config::pre_parser`], overriding the dialect.
    pub fn pre_parser_for(
        &self,
        dialect: Dialect,
        entity: Option<&str>,
    ) -> Result<(PreParser, ProcessOptions)> {
        let (columns, options) = match entity {
            Some(name) => {
                let entity = self.entity(name)?;
                (entity.column_map(), entity.options())
            }
            None => (ColumnMap::new(), ProcessOptions::new()),
        };

        let parser = dialect
            .pre_builder(columns.transfer())
            .max_depth(self.max_depth)
            .build()?;
        Ok((parser, options))
    }

    /// Build an inline MySQL parser honoring `max_depth`.
    pub fn inline_parser(&self) -> Result<crate::Parser> {
        dialect::mysql().max_depth(self.max_depth).build()
    }
}

/// Resolve the config file path using the standard resolution order.
fn resolve_config_path() -> Option<PathBuf> {
    // 1. Environment variable
    if let Ok(path) = std::env::var("RSQL_CONFIG") {
        return Some(PathBuf::from(path));
    }

    // 2. Platform config directory (via directories crate)
    ProjectDirs::from("", "", "rsql").map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
max_depth = 4
dialect = "duckdb"

[entities.user]
strict = true
forbidden = ["password"]
allowed = ["meta.*"]

[entities.user.columns]
userName = "user_name"
password = "password_hash"
"#;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(config.dialect, Dialect::Mysql);
        assert!(config.entities.is_empty());
    }

    #[test]
    fn test_config_parse() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.dialect, Dialect::Duckdb);

        let user = config.entity("user").unwrap();
        assert!(user.strict);
        assert_eq!(user.column_map().column("userName"), "user_name");
    }

    #[test]
    fn test_entity_options() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let opts = config.entity("user").unwrap().options();
        assert!(opts.check("userName").is_ok());
        assert!(opts.check("meta.owner").is_ok());
        assert!(opts.check("password").is_err());
        assert!(opts.check("email").is_err());
    }

    #[test]
    fn test_unknown_entity() {
        let config = Config::default();
        assert!(matches!(config.entity("nope"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_config_missing_file_is_default() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load_from(&tmp.path().join("missing.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_config_invalid_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "max_depth = \"deep\"").unwrap();
        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/config.toml");

        let config: Config = toml::from_str(SAMPLE).unwrap();
        config.save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_pre_parser_uses_entity_columns() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let (parser, opts) = config.pre_parser(Some("user")).unwrap();

        let stmt = parser.process_pre("userName==bob", &opts).unwrap();
        assert_eq!(stmt.sql, "\"user_name\" = ?");

        assert!(parser.process_pre("password==x", &opts).is_err());
    }

    #[test]
    fn test_pre_parser_honors_max_depth() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        let (parser, opts) = config.pre_parser(None).unwrap();
        assert!(parser.process_pre("((((a==1))))", &opts).is_ok());
        assert!(matches!(
            parser.process_pre("(((((a==1)))))", &opts),
            Err(Error::TooDeep(4))
        ));
    }
}
