//! # tabularium-cli — Operator Command-Line Interface
//!
//! Provides the `tabularium` binary for inspecting and replaying entity
//! reconciliation outside the ingestion services.
//!
//! ## Subcommands
//!
//! - `tabularium normalize` — Run the hook pipeline over an envelope.
//! - `tabularium key` — Print the canonical key of an envelope.
//! - `tabularium merge` — Apply an authoritative update to an entity.
//! - `tabularium visit` — Apply a passive observation to an entity.
//! - `tabularium decode` — Decode stored JSON, key-value, or binary payloads.
//! - `tabularium kinds` — List registered discriminators.
//!
//! ```bash
//! tabularium key asset.json
//! tabularium merge existing.json update.json --emit kv --partition tenant-42
//! tabularium decode --format binary batch.bin
//! ```
//!
//! ## Crate Policy
//!
//! - Argument parsing lives here; entity semantics live in the model crate.
//! - Every input path accepts `-` for standard input.

pub mod config;
pub mod decode;
pub mod entity;
pub mod kinds;

use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use tabularium_codec::{json, KvItem};
use tabularium_model::AnyModel;

/// Output shape for commands that print entities.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Emit {
    /// `{"type": ..., ...}` envelope.
    #[default]
    Json,
    /// `{partition, key, attributes}` store item.
    Kv,
}

/// Read a whole input as bytes. `-` reads standard input.
pub fn read_bytes(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("reading standard input")?;
        return Ok(buf);
    }
    std::fs::read(path).with_context(|| format!("reading {}", path.display()))
}

/// Read a whole input as UTF-8 text. `-` reads standard input.
pub fn read_text(path: &Path) -> Result<String> {
    let bytes = read_bytes(path)?;
    String::from_utf8(bytes).with_context(|| format!("{} is not UTF-8", path.display()))
}

/// Render one entity in the requested shape.
pub fn render(model: &AnyModel, emit: Emit, partition: &str) -> Result<Value> {
    match emit {
        Emit::Json => Ok(json::to_value(model)?),
        Emit::Kv => Ok(serde_json::to_value(KvItem::from_model(partition, model)?)?),
    }
}

/// Print a JSON value to standard output, pretty-printed.
pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
