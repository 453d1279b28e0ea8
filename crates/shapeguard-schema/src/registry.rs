//! # Schema Registry
//!
//! Owns the mapping from schema id to schema graph and to its compiled
//! validator. Compilation happens once, on registration; lookups hand out
//! `Arc<CompiledValidator>` so callers can validate concurrently.
//!
//! ## Schema files
//!
//! [`SchemaRegistry::load_dir`] walks a directory tree and registers every
//! `*.shape.json`, `*.shape.yaml` and `*.shape.yml` file. The id is the
//! file name without that suffix, so `schemas/list/Node.shape.json` is
//! registered as `Node`. Files are loaded in sorted path order; a later
//! file with the same id replaces an earlier one (and logs a warning).
//! Symlinked files are read; symlinked directories are not descended into.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use shapeguard_core::{Schema, SchemaId};

use crate::compile::{compile, CompiledValidator};
use crate::engine::ROOT_SEGMENT;
use crate::error::{RegistryError, ValidationError};

/// File suffixes recognized as schema documents.
pub const SCHEMA_SUFFIXES: [&str; 3] = [".shape.json", ".shape.yaml", ".shape.yml"];

/// Registered schemas and their compiled validators.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<SchemaId, Schema>,
    validators: HashMap<SchemaId, Arc<CompiledValidator>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every schema file under `dir`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        registry.load_dir(dir)?;
        Ok(registry)
    }

    /// Compile `schema` and register it under `id`.
    ///
    /// Re-registering an id replaces both the schema and its validator.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Build`] if the schema does not compile; the
    /// registry is left unchanged in that case.
    pub fn register(
        &mut self,
        id: SchemaId,
        schema: Schema,
    ) -> Result<Arc<CompiledValidator>, RegistryError> {
        let validator = compile(&schema).map_err(|source| RegistryError::Build {
            id: id.to_string(),
            source,
        })?;
        let validator = Arc::new(validator);
        if self.schemas.contains_key(&id) {
            tracing::warn!(schema = %id, "replacing registered schema");
        }
        self.schemas.insert(id.clone(), schema);
        self.validators.insert(id, Arc::clone(&validator));
        Ok(validator)
    }

    /// Register every schema file found under `dir`, recursively.
    ///
    /// Returns the number of files loaded.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::SchemaLoad`] if `dir` is not a readable directory,
    ///   or a file cannot be parsed or has an invalid id.
    /// - [`RegistryError::Build`] if a parsed schema does not compile.
    pub fn load_dir(&mut self, dir: impl AsRef<Path>) -> Result<usize, RegistryError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(RegistryError::SchemaLoad {
                path: dir.display().to_string(),
                reason: "not a directory".to_string(),
            });
        }
        let mut files = Vec::new();
        collect_schema_files(dir, &mut files)?;
        files.sort();
        for path in &files {
            self.load_file(path)?;
        }
        tracing::debug!(dir = %dir.display(), schemas = files.len(), "loaded schema directory");
        Ok(files.len())
    }

    /// Parse and register a single schema file.
    pub fn load_file(&mut self, path: impl AsRef<Path>) -> Result<SchemaId, RegistryError> {
        let path = path.as_ref();
        let load_error = |reason: String| RegistryError::SchemaLoad {
            path: path.display().to_string(),
            reason,
        };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| load_error("file name is not valid UTF-8".to_string()))?;
        let (stem, suffix) = SCHEMA_SUFFIXES
            .iter()
            .find_map(|suffix| name.strip_suffix(*suffix).map(|stem| (stem, *suffix)))
            .ok_or_else(|| load_error(format!("expected one of {SCHEMA_SUFFIXES:?}")))?;
        let id = SchemaId::new(stem).map_err(|e| load_error(e.to_string()))?;

        let content = std::fs::read_to_string(path)?;
        let schema: Schema = if suffix == ".shape.json" {
            serde_json::from_str(&content).map_err(|e| load_error(format!("invalid JSON: {e}")))?
        } else {
            serde_yaml::from_str(&content).map_err(|e| load_error(format!("invalid YAML: {e}")))?
        };

        self.register(id.clone(), schema)?;
        Ok(id)
    }

    /// The schema registered under `id`.
    pub fn lookup_schema(&self, id: &str) -> Result<&Schema, RegistryError> {
        self.schemas
            .get(id)
            .ok_or_else(|| RegistryError::MissingSchema(id.to_string()))
    }

    /// The compiled validator registered under `id`.
    pub fn validator(&self, id: &str) -> Result<Arc<CompiledValidator>, RegistryError> {
        self.validators
            .get(id)
            .cloned()
            .ok_or_else(|| RegistryError::MissingValidator(id.to_string()))
    }

    /// Validate `value` against the schema registered under `id`.
    pub fn validate(
        &self,
        id: &str,
        value: &Value,
        limit: usize,
    ) -> Result<Vec<ValidationError>, RegistryError> {
        Ok(self.validator(id)?.validate_with_limit(value, limit)?)
    }

    /// Assert `value` against the schema registered under `id`.
    pub fn assert(&self, id: &str, value: &Value, limit: usize) -> Result<(), RegistryError> {
        Ok(self.validator(id)?.assert(value, limit)?)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.schemas.keys().map(SchemaId::as_str).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

fn collect_schema_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), RegistryError> {
    let entries = std::fs::read_dir(dir).map_err(|e| RegistryError::SchemaLoad {
        path: dir.display().to_string(),
        reason: format!("cannot read schema directory: {e}"),
    })?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        // `DirEntry::file_type` does not follow symlinks.
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            collect_schema_files(&path, files)?;
        } else if file_type.is_symlink() && path.is_dir() {
            tracing::debug!(path = %path.display(), "skipping symlinked directory");
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| SCHEMA_SUFFIXES.iter().any(|s| name.ends_with(*s)))
        {
            files.push(path);
        }
    }
    Ok(())
}

/// Read a document to validate. `.yaml`/`.yml` files are parsed as YAML,
/// everything else as JSON.
pub fn load_document(path: impl AsRef<Path>) -> Result<Value, RegistryError> {
    let path = path.as_ref();
    let load_error = |reason: String| RegistryError::DocumentLoad {
        path: path.display().to_string(),
        reason,
    };
    let content = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    );
    if is_yaml {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(&content).map_err(|e| load_error(format!("invalid YAML: {e}")))?;
        yaml_to_json_value(&yaml).map_err(load_error)
    } else {
        serde_json::from_str(&content).map_err(|e| load_error(format!("invalid JSON: {e}")))
    }
}

/// Convert a YAML document into the JSON value tree the engine validates.
///
/// Scalar keys are stringified because objects only carry string keys.
/// Two keys that stringify to the same text (`1` and `'1'`) are rejected
/// instead of merged, so neither escapes the unknown-key check. Mapping
/// order is kept, which fixes the order unknown keys are reported in.
/// Tags are dropped. A failure names its location as a dotted path rooted
/// at `Base`, the same form validation errors use.
fn yaml_to_json_value(yaml: &serde_yaml::Value) -> Result<Value, String> {
    convert_yaml(yaml, ROOT_SEGMENT)
}

fn convert_yaml(yaml: &serde_yaml::Value, at: &str) -> Result<Value, String> {
    use serde_yaml::Value as Yaml;

    match yaml {
        Yaml::Null => Ok(Value::Null),
        Yaml::Bool(b) => Ok(Value::Bool(*b)),
        Yaml::Number(n) => {
            yaml_number(n).ok_or_else(|| format!("{at}: {n} has no JSON representation"))
        }
        Yaml::String(s) => Ok(Value::String(s.clone())),
        Yaml::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| convert_yaml(item, &format!("{at}.[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Yaml::Mapping(map) => {
            let mut object = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                let key = match k {
                    Yaml::String(s) => s.clone(),
                    Yaml::Number(n) => n.to_string(),
                    Yaml::Bool(b) => b.to_string(),
                    other => return Err(format!("{at}: unsupported key {other:?}")),
                };
                let value = convert_yaml(v, &format!("{at}.{key}"))?;
                if object.insert(key.clone(), value).is_some() {
                    return Err(format!("{at}: key '{key}' appears more than once"));
                }
            }
            Ok(Value::Object(object))
        }
        Yaml::Tagged(tagged) => convert_yaml(&tagged.value, at),
    }
}

fn yaml_number(n: &serde_yaml::Number) -> Option<Value> {
    if let Some(i) = n.as_i64() {
        Some(Value::from(i))
    } else if let Some(u) = n.as_u64() {
        Some(Value::from(u))
    } else {
        n.as_f64()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
    }
}
