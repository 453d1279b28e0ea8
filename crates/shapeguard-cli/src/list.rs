//! # List Subcommand
//!
//! Prints every schema id found in the schema directory, with the
//! rendering of its root node.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use shapeguard_schema::SchemaRegistry;

use crate::config::Config;

/// Arguments for the `shapeguard list` subcommand.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Schema directory. Overrides `schema_dir` from the config file.
    #[arg(long, value_name = "DIR")]
    pub schemas: Option<PathBuf>,
}

/// Execute the list subcommand.
pub fn run_list(args: &ListArgs, config: &Config) -> Result<u8> {
    let schema_dir = config.schema_dir(args.schemas.as_deref());
    let registry = SchemaRegistry::from_dir(&schema_dir)
        .with_context(|| format!("failed to load schemas from {}", schema_dir.display()))?;
    print!("{}", list_schemas(&registry)?);
    Ok(0)
}

/// One `id<TAB>root type` line per registered schema, sorted by id.
pub fn list_schemas(registry: &SchemaRegistry) -> Result<String> {
    let mut out = String::new();
    for id in registry.ids() {
        let validator = registry.validator(id)?;
        out.push_str(&format!("{id}\t{}\n", validator.root_type()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_sorted_ids_with_root_types() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("Name.shape.yaml"),
            "root: 0\nnodes:\n  - kind: value_type\n    type: string\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("Flag.shape.json"),
            r#"{"root": 2, "nodes": [
                {"kind": "literal", "value": "on"},
                {"kind": "literal", "value": "off"},
                {"kind": "union", "members": [0, 1]}
            ]}"#,
        )
        .unwrap();

        let registry = SchemaRegistry::from_dir(dir.path()).unwrap();
        assert_eq!(
            list_schemas(&registry).unwrap(),
            "Flag\t('on' | 'off')\nName\tstring\n"
        );
    }

    #[test]
    fn empty_directory_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let registry = SchemaRegistry::from_dir(dir.path()).unwrap();
        assert_eq!(list_schemas(&registry).unwrap(), "");
        let args = ListArgs {
            schemas: Some(dir.path().to_path_buf()),
        };
        assert_eq!(run_list(&args, &Config::default()).unwrap(), 0);
    }
}
