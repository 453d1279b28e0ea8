//! # Validate Subcommand
//!
//! Validates one or more JSON/YAML documents against a registered schema.
//!
//! Exit codes: 0 when every document is valid, 1 when any document has
//! errors or hits the circular dependency limit, 2 on operational errors
//! (missing schema directory, unknown schema id, unreadable document).

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use shapeguard_schema::{load_document, CompiledValidator, SchemaRegistry, ValidationError};

use crate::config::{Config, OutputFormat};

/// Arguments for the `shapeguard validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Id of the schema to validate against (file name without `.shape.*`).
    #[arg(long, value_name = "ID")]
    pub schema: String,

    /// Schema directory. Overrides `schema_dir` from the config file.
    #[arg(long, value_name = "DIR")]
    pub schemas: Option<PathBuf>,

    /// Circular dependency limit (0 = unbounded).
    #[arg(long, value_name = "N")]
    pub circular_limit: Option<usize>,

    /// Report format.
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Documents to validate (`.json`, `.yaml` or `.yml`).
    #[arg(value_name = "DOCUMENT", required = true)]
    pub documents: Vec<PathBuf>,
}

/// Outcome for one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub document: String,
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    /// Repeat count at which the circular dependency limit aborted validation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub circular_limit_reached: Option<usize>,
}

/// Execute the validate subcommand.
pub fn run_validate(args: &ValidateArgs, config: &Config) -> Result<u8> {
    let schema_dir = config.schema_dir(args.schemas.as_deref());
    let registry = SchemaRegistry::from_dir(&schema_dir)
        .with_context(|| format!("failed to load schemas from {}", schema_dir.display()))?;
    tracing::info!(schemas = registry.len(), dir = %schema_dir.display(), "loaded schema registry");

    let validator = registry.validator(&args.schema)?;
    let limit = config.limit(args.circular_limit);
    let reports = validate_documents(&validator, &args.documents, limit)?;

    match config.format(args.format) {
        OutputFormat::Text => print!("{}", render_text(&reports)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    if reports.iter().all(|r| r.valid) {
        Ok(0)
    } else {
        Ok(1)
    }
}

/// Validate each document in order.
///
/// Hitting the circular dependency limit is reported per document; failing
/// to read a document aborts the run.
pub fn validate_documents(
    validator: &CompiledValidator,
    documents: &[PathBuf],
    limit: usize,
) -> Result<Vec<DocumentReport>> {
    documents
        .iter()
        .map(|path| validate_document(validator, path, limit))
        .collect()
}

fn validate_document(
    validator: &CompiledValidator,
    path: &Path,
    limit: usize,
) -> Result<DocumentReport> {
    let value = load_document(path)?;
    let document = path.display().to_string();
    let report = match validator.validate_with_limit(&value, limit) {
        Ok(errors) => DocumentReport {
            document,
            valid: errors.is_empty(),
            errors,
            circular_limit_reached: None,
        },
        Err(reached) => DocumentReport {
            document,
            valid: false,
            errors: Vec::new(),
            circular_limit_reached: Some(reached.count),
        },
    };
    tracing::debug!(document = %report.document, valid = report.valid, "validated document");
    Ok(report)
}

/// Human-readable report.
pub fn render_text(reports: &[DocumentReport]) -> String {
    let mut out = String::new();
    for report in reports {
        if let Some(count) = report.circular_limit_reached {
            out.push_str(&format!(
                "FAIL: {} (circular dependency limit reached after {count} repeated object entries)\n",
                report.document
            ));
        } else if report.valid {
            out.push_str(&format!("PASS: {}\n", report.document));
        } else {
            out.push_str(&format!(
                "FAIL: {} ({} error(s))\n",
                report.document,
                report.errors.len()
            ));
            for error in &report.errors {
                out.push_str(&format!("  [{}] {}\n", error.kind, error.message));
            }
        }
    }
    let passed = reports.iter().filter(|r| r.valid).count();
    out.push_str(&format!("\n{passed}/{} document(s) valid\n", reports.len()));
    out
}
