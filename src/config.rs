//! Run configuration
//!
//! A run uploads one or more destinations, each fed from an NDJSON file of
//! row operations. The configuration is loaded from YAML.
//!
//! ```yaml
//! connection: duckdb://hunt.duckdb
//! destinations:
//!   - name: Effectiveness
//!     input: effectiveness.jsonl
//! ```

use crate::error::{Error, Result};
use crate::store::{validate_table_name, CONNECTION_ENV_VAR};
use crate::types::OptionStringExt;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Top-Level Run Config
// ============================================================================

/// Complete run configuration loaded from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Store connection descriptor
    #[serde(default)]
    pub connection: Option<String>,

    /// Destinations to upload, in order
    #[serde(default)]
    pub destinations: Vec<DestinationConfig>,
}

/// One destination table and where its operations come from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestinationConfig {
    /// Destination table name
    pub name: String,

    /// NDJSON file of row operations
    pub input: PathBuf,
}

impl RunConfig {
    /// Load a config file; relative input paths resolve against its directory
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::FileNotFound {
                path: path.display().to_string(),
            },
            _ => Error::Io(e),
        })?;

        let mut config = Self::from_yaml(&contents)?;
        if let Some(base) = path.parent() {
            for destination in &mut config.destinations {
                if destination.input.is_relative() {
                    destination.input = base.join(&destination.input);
                }
            }
        }
        Ok(config)
    }

    /// Parse and validate a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check destination names are valid and unique
    pub fn validate(&self) -> Result<()> {
        if self.destinations.is_empty() {
            return Err(Error::config("No destinations configured"));
        }

        let mut seen = HashSet::new();
        for destination in &self.destinations {
            validate_table_name(&destination.name)?;
            if !seen.insert(destination.name.to_ascii_lowercase()) {
                return Err(Error::config(format!(
                    "Destination '{}' is configured more than once",
                    destination.name
                )));
            }
        }
        Ok(())
    }
}

/// Pick the store connection: explicit flag, then config, then environment
pub fn resolve_connection(explicit: Option<&str>, configured: Option<&str>) -> Result<String> {
    explicit
        .map(String::from)
        .none_if_empty()
        .or_else(|| configured.map(String::from).none_if_empty())
        .or_else(|| std::env::var(CONNECTION_ENV_VAR).ok().none_if_empty())
        .ok_or_else(|| Error::missing_field(format!("connection (or {CONNECTION_ENV_VAR})")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_config() {
        let config = RunConfig::from_yaml(
            r"
connection: duckdb://hunt.duckdb
destinations:
  - name: Effectiveness
    input: data/effectiveness.jsonl
  - name: Submissions
    input: /abs/submissions.jsonl
",
        )
        .unwrap();

        assert_eq!(config.connection.as_deref(), Some("duckdb://hunt.duckdb"));
        assert_eq!(config.destinations.len(), 2);
        assert_eq!(config.destinations[1].name, "Submissions");
    }

    #[test]
    fn test_duplicate_destination() {
        let err = RunConfig::from_yaml(
            r"
destinations:
  - name: Effectiveness
    input: a.jsonl
  - name: effectiveness
    input: b.jsonl
",
        )
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_invalid_destination_name() {
        let err = RunConfig::from_yaml(
            r"
destinations:
  - name: not_valid
    input: a.jsonl
",
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidTableName { .. }));
    }

    #[test]
    fn test_empty_destinations() {
        assert!(matches!(
            RunConfig::from_yaml("connection: memory://"),
            Err(Error::Config { .. })
        ));
    }

    #[test]
    fn test_load_resolves_relative_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.yaml");
        fs::write(
            &path,
            "destinations:\n  - name: Effectiveness\n    input: effectiveness.jsonl\n",
        )
        .unwrap();

        let config = RunConfig::load(&path).unwrap();
        assert_eq!(
            config.destinations[0].input,
            dir.path().join("effectiveness.jsonl")
        );
    }

    #[test]
    fn test_resolve_connection_precedence() {
        assert_eq!(
            resolve_connection(Some("memory://"), Some("duckdb://a.duckdb")).unwrap(),
            "memory://"
        );
        assert_eq!(
            resolve_connection(Some(""), Some("duckdb://a.duckdb")).unwrap(),
            "duckdb://a.duckdb"
        );
    }
}
