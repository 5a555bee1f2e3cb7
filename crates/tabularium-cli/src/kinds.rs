//! # Kinds Subcommand
//!
//! Lists every discriminator the built-in registry resolves, with the
//! class it constructs and whether that class is a reconciliation target.

use anyhow::{Context, Result};
use clap::Args;

use tabularium_core::Registry;
use tabularium_model::{registry, AnyModel, ModelKind};

/// Arguments for `kinds`.
#[derive(Args, Debug)]
pub struct KindsArgs {
    /// Only list target classes.
    #[arg(long)]
    pub targets: bool,
}

/// One registry row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindRow {
    /// Registered discriminator.
    pub discriminator: String,
    /// Class it constructs.
    pub kind: ModelKind,
}

/// Every registered discriminator, in registry order (sorted).
pub fn rows(registry: &Registry<AnyModel>) -> Result<Vec<KindRow>> {
    registry
        .discriminators()
        .map(|d| -> Result<KindRow> {
            let zero = registry
                .make_type(d)
                .with_context(|| format!("registry lists {d:?} but cannot construct it"))?;
            Ok(KindRow {
                discriminator: d.to_string(),
                kind: zero.kind(),
            })
        })
        .collect()
}

/// Execute `kinds`.
pub fn run_kinds(args: &KindsArgs) -> Result<u8> {
    let rows = rows(registry())?;
    let shown: Vec<&KindRow> = rows
        .iter()
        .filter(|r| !args.targets || r.kind.is_target())
        .collect();
    for row in &shown {
        let marker = if row.kind.is_target() { "target" } else { "" };
        println!("  {:<18} {:<16} {marker}", row.discriminator, row.kind.to_string());
    }
    println!();
    println!("Total: {} discriminators", shown.len());
    Ok(0)
}
