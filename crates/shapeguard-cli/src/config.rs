//! # CLI Configuration
//!
//! Optional YAML file passed with `--config`:
//!
//! ```yaml
//! schema_dir: schemas
//! circular_dependency_limit: 0
//! format: text
//! ```
//!
//! Every field has a default, unknown fields are rejected, and a relative
//! `schema_dir` is resolved against the config file's directory.
//! Subcommand flags override whatever the file sets.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use shapeguard_schema::DEFAULT_CIRCULAR_DEPENDENCY_LIMIT;

/// Report format for `shapeguard validate`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One PASS/FAIL line per document, errors indented below.
    #[default]
    Text,
    /// A JSON array with one report object per document.
    Json,
}

/// Resolved CLI settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory scanned for `*.shape.{json,yaml,yml}` files.
    pub schema_dir: PathBuf,
    /// Circular dependency limit passed to the engine (`0` = unbounded).
    pub circular_dependency_limit: usize,
    /// Report format.
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_dir: PathBuf::from("schemas"),
            circular_dependency_limit: DEFAULT_CIRCULAR_DEPENDENCY_LIMIT,
            format: OutputFormat::Text,
        }
    }
}

impl Config {
    /// Load `path`, or return the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        if config.schema_dir.is_relative() {
            if let Some(base) = path.parent() {
                config.schema_dir = base.join(&config.schema_dir);
            }
        }
        tracing::debug!(config = %path.display(), ?config, "loaded configuration");
        Ok(config)
    }

    /// Parse a YAML document. An empty document yields the defaults.
    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Schema directory, unless `flag` overrides it.
    pub fn schema_dir(&self, flag: Option<&Path>) -> PathBuf {
        flag.map_or_else(|| self.schema_dir.clone(), Path::to_path_buf)
    }

    /// Circular dependency limit, unless `flag` overrides it.
    pub fn limit(&self, flag: Option<usize>) -> usize {
        flag.unwrap_or(self.circular_dependency_limit)
    }

    /// Output format, unless `flag` overrides it.
    pub fn format(&self, flag: Option<OutputFormat>) -> OutputFormat {
        flag.unwrap_or(self.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let config = Config::load(None).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.schema_dir, PathBuf::from("schemas"));
        assert_eq!(config.circular_dependency_limit, 0);
        assert_eq!(config.format, OutputFormat::Text);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config = Config::from_yaml("circular_dependency_limit: 20\n").unwrap();
        assert_eq!(config.circular_dependency_limit, 20);
        assert_eq!(config.format, OutputFormat::Text);
        assert_eq!(config.schema_dir, PathBuf::from("schemas"));
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(Config::from_yaml("\n").unwrap(), Config::default());
    }

    #[test]
    fn unknown_fields_rejected() {
        assert!(Config::from_yaml("schema_directory: x\n").is_err());
    }

    #[test]
    fn format_parses_lowercase() {
        let config = Config::from_yaml("format: json\n").unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert!(Config::from_yaml("format: xml\n").is_err());
    }

    #[test]
    fn relative_schema_dir_resolves_against_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shapeguard.yaml");
        std::fs::write(&path, "schema_dir: shapes\nformat: json\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.schema_dir, dir.path().join("shapes"));
        assert_eq!(config.format, OutputFormat::Json);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(&dir.path().join("absent.yaml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read config file"));
    }

    #[test]
    fn flags_override_file_values() {
        let config = Config::from_yaml("circular_dependency_limit: 3\nformat: json\n").unwrap();
        assert_eq!(config.limit(None), 3);
        assert_eq!(config.limit(Some(20)), 20);
        assert_eq!(config.format(Some(OutputFormat::Text)), OutputFormat::Text);
        assert_eq!(
            config.schema_dir(Some(Path::new("elsewhere"))),
            PathBuf::from("elsewhere")
        );
        assert_eq!(config.schema_dir(None), PathBuf::from("schemas"));
    }
}
