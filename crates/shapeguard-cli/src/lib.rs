//! # shapeguard-cli — Command-Line Front End
//!
//! Provides the `shapeguard` binary on top of `shapeguard-schema`.
//!
//! ## Subcommands
//!
//! - `shapeguard validate`: Validate JSON/YAML documents against a schema.
//! - `shapeguard render`: Print a schema's type rendering.
//! - `shapeguard list`: List the schemas in a schema directory.
//!
//! ```bash
//! shapeguard validate --schema Node --schemas schemas/ chain.json
//! shapeguard validate --schema Node --circular-limit 20 --format json deep.yaml
//! shapeguard render --schema Animal --nodes
//! ```
//!
//! Every subcommand returns an exit code: 0 on success, 1 when a document
//! fails validation. Operational failures surface as `anyhow::Error` and
//! map to exit code 2 in the binary.

pub mod config;
pub mod list;
pub mod render;
pub mod validate;
