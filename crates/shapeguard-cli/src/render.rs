//! # Render Subcommand
//!
//! Prints the human-readable type of a registered schema, optionally with
//! every node of its graph.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use shapeguard_core::{NodeId, Schema};
use shapeguard_schema::SchemaRegistry;

use crate::config::Config;

/// Arguments for the `shapeguard render` subcommand.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Id of the schema to render.
    #[arg(long, value_name = "ID")]
    pub schema: String,

    /// Schema directory. Overrides `schema_dir` from the config file.
    #[arg(long, value_name = "DIR")]
    pub schemas: Option<PathBuf>,

    /// Also list every node of the graph with its kind and rendering.
    #[arg(long)]
    pub nodes: bool,
}

/// Execute the render subcommand.
pub fn run_render(args: &RenderArgs, config: &Config) -> Result<u8> {
    let schema_dir = config.schema_dir(args.schemas.as_deref());
    let registry = SchemaRegistry::from_dir(&schema_dir)
        .with_context(|| format!("failed to load schemas from {}", schema_dir.display()))?;
    let schema = registry.lookup_schema(&args.schema)?;
    print!("{}", render_schema(schema, args.nodes));
    Ok(0)
}

/// Root rendering, followed by one `#i kind rendering` line per node when
/// `nodes` is set.
pub fn render_schema(schema: &Schema, nodes: bool) -> String {
    let mut out = format!("{}\n", schema.render(schema.root()));
    if nodes {
        for (i, node) in schema.nodes().iter().enumerate() {
            let id = NodeId(i);
            out.push_str(&format!(
                "  {id} {} {}\n",
                node.kind_name(),
                schema.render(id)
            ));
        }
    }
    out
}
