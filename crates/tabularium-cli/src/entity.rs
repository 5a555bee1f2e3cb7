//! # Entity Subcommands
//!
//! `normalize`, `key`, `merge`, and `visit`. Each reads JSON envelopes
//! (typed by `"type"` or by key prefix), runs them through the hook
//! pipeline, and prints the result. A merge update skips `defaulted()`, so
//! the fields it leaves out stay unspecified.
//!
//! ```bash
//! tabularium normalize raw-asset.json
//! tabularium merge stored.json update.json
//! echo '{"type":"asset","dns":"Example.COM"}' | tabularium key -
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;

use tabularium_codec::json;
use tabularium_core::{GraphModel, Model};
use tabularium_model::{registry, AnyModel};

use crate::config::Config;
use crate::{print_json, read_text, render, Emit};

/// Arguments for `normalize`.
#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// JSON envelope, or `-` for standard input.
    pub input: PathBuf,

    /// Output shape.
    #[arg(long, value_enum, default_value_t)]
    pub emit: Emit,
}

/// Arguments for `key`.
#[derive(Args, Debug)]
pub struct KeyArgs {
    /// JSON envelope, or `-` for standard input.
    pub input: PathBuf,
}

/// Arguments for `merge` and `visit`.
#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// The stored entity.
    pub existing: PathBuf,

    /// The update (merge) or observation (visit).
    pub incoming: PathBuf,

    /// Output shape.
    #[arg(long, value_enum, default_value_t)]
    pub emit: Emit,
}

/// Which reconciliation to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// Authoritative update.
    Merge,
    /// Passive observation.
    Visit,
}

/// Decode one envelope and run its hook pipeline.
pub fn load_normalized(path: &Path) -> Result<AnyModel> {
    let text = read_text(path)?;
    normalize_text(&text).with_context(|| format!("loading {}", path.display()))
}

/// Decode and normalize envelope text.
pub fn normalize_text(text: &str) -> Result<AnyModel> {
    let model = json::decode(registry(), text)?;
    Ok(model.normalized()?)
}

/// Decode one merge update and run its hooks without defaults.
pub fn load_update(path: &Path) -> Result<AnyModel> {
    let text = read_text(path)?;
    update_text(&text).with_context(|| format!("loading {}", path.display()))
}

/// Decode update text and run its hooks without defaults.
pub fn update_text(text: &str) -> Result<AnyModel> {
    let model = json::decode(registry(), text)?;
    Ok(model.canonicalized()?)
}

/// Reconcile `incoming` into `existing`.
///
/// Both sides must be the same class and carry the same key.
pub fn reconcile(
    mut existing: AnyModel,
    incoming: &AnyModel,
    how: Reconciliation,
) -> Result<AnyModel> {
    if existing.kind() != incoming.kind() {
        bail!(
            "cannot reconcile {} with {}",
            existing.discriminator(),
            incoming.discriminator()
        );
    }
    if existing.key() != incoming.key() {
        bail!(
            "keys differ: {} vs {}",
            existing.key().as_str(),
            incoming.key().as_str()
        );
    }
    let applied = match how {
        Reconciliation::Merge => existing.merge(incoming),
        Reconciliation::Visit => existing.visit(incoming),
    };
    if !applied {
        bail!("{how:?} was not applied to {}", existing.key().as_str());
    }
    tracing::debug!(key = %existing.key().as_str(), ?how, "reconciled");
    Ok(existing)
}

/// Execute `normalize`.
pub fn run_normalize(args: &NormalizeArgs, config: &Config) -> Result<u8> {
    let model = load_normalized(&args.input)?;
    print_json(&render(&model, args.emit, &config.partition)?)?;
    Ok(0)
}

/// Execute `key`.
pub fn run_key(args: &KeyArgs) -> Result<u8> {
    let model = load_normalized(&args.input)?;
    println!("{}", model.key().as_str());
    if !model.valid() {
        tracing::warn!(key = %model.key().as_str(), "key does not satisfy its class pattern");
        return Ok(2);
    }
    Ok(0)
}

/// Execute `merge` or `visit`.
pub fn run_reconcile(args: &ReconcileArgs, how: Reconciliation, config: &Config) -> Result<u8> {
    let existing = load_normalized(&args.existing)?;
    let incoming = match how {
        Reconciliation::Merge => load_update(&args.incoming)?,
        Reconciliation::Visit => load_normalized(&args.incoming)?,
    };
    let result = reconcile(existing, &incoming, how)?;
    print_json(&render(&result, args.emit, &config.partition)?)?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tabularium_model::{Asset, Risk};

    fn risk(status: &str) -> AnyModel {
        let asset = Asset::new("example.com", "www.example.com").unwrap();
        Risk::new(&asset, "CVE-2023-12345", status).unwrap().into()
    }

    #[test]
    fn normalize_text_folds_case() {
        let model = normalize_text(r#"{"type":"asset","dns":"Example.COM","name":"WWW.Example.com"}"#)
            .unwrap();
        assert_eq!(model.key().as_str(), "#asset#example.com#www.example.com");
    }

    #[test]
    fn normalize_text_types_by_key_prefix() {
        let model = normalize_text(
            r##"{"key":"#asset#example.com#example.com","dns":"example.com","name":"example.com"}"##,
        )
        .unwrap();
        assert_eq!(model.discriminator(), "asset");
    }

    #[test]
    fn normalize_text_surfaces_hook_errors() {
        let err = normalize_text(r#"{"type":"port","protocol":"icmp","port":1}"#).unwrap_err();
        assert!(format!("{err:#}").contains("validate protocol"));
    }

    #[test]
    fn normalize_text_rejects_unknown_type() {
        assert!(normalize_text(r#"{"type":"widget"}"#).is_err());
    }

    #[test]
    fn merge_advances_risk() {
        let merged = reconcile(risk("TI"), &risk("OH"), Reconciliation::Merge).unwrap();
        let AnyModel::Risk(merged) = merged else {
            panic!("expected a risk");
        };
        assert_eq!(merged.status.map(|s| s.code()).as_deref(), Some("OH"));
    }

    #[test]
    fn partial_update_keeps_open_risk_open() {
        let stored = normalize_text(
            r#"{"type":"risk","dns":"example.com","name":"CVE-2023-12345","status":"OH"}"#,
        )
        .unwrap();
        let update =
            update_text(r#"{"type":"risk","dns":"example.com","name":"CVE-2023-12345","comment":"confirmed"}"#)
                .unwrap();
        let AnyModel::Risk(merged) = reconcile(stored, &update, Reconciliation::Merge).unwrap() else {
            panic!("expected a risk");
        };
        assert_eq!(merged.status.map(|s| s.code()).as_deref(), Some("OH"));
        assert_eq!(merged.comment, "confirmed");
        assert!(merged.history.is_empty());
    }

    #[test]
    fn partial_update_keeps_frozen_asset_frozen() {
        let stored = normalize_text(r#"{"type":"asset","dns":"example.com","status":"F"}"#).unwrap();
        let update = update_text(r#"{"type":"asset","dns":"example.com","comment":"note"}"#).unwrap();
        let AnyModel::Asset(merged) = reconcile(stored, &update, Reconciliation::Merge).unwrap() else {
            panic!("expected an asset");
        };
        assert_eq!(merged.status, "F");
        assert_eq!(merged.comment, "note");
    }

    #[test]
    fn merge_file_update_without_status() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("update.json");
        std::fs::write(&path, r#"{"type":"asset","dns":"example.com"}"#).unwrap();
        let AnyModel::Asset(update) = load_update(&path).unwrap() else {
            panic!("expected an asset");
        };
        assert!(update.status.is_empty());
        assert_eq!(update.key.as_str(), "#asset#example.com#example.com");
    }

    #[test]
    fn visit_unions_origins() {
        let mut stored = Asset::new("example.com", "").unwrap();
        stored.origins = ["a", "b"].map(String::from).into();
        let mut seen = stored.clone();
        seen.origins = ["b", "c"].map(String::from).into();
        let visited = reconcile(stored.into(), &seen.into(), Reconciliation::Visit).unwrap();
        let AnyModel::Asset(visited) = visited else {
            panic!("expected an asset");
        };
        assert_eq!(visited.origins, BTreeSet::from(["a", "b", "c"].map(String::from)));
    }

    #[test]
    fn mismatched_classes_are_rejected() {
        let asset: AnyModel = Asset::new("example.com", "").unwrap().into();
        let err = reconcile(asset, &risk("TH"), Reconciliation::Merge).unwrap_err();
        assert!(err.to_string().contains("cannot reconcile"));
    }

    #[test]
    fn mismatched_keys_are_rejected() {
        let a: AnyModel = Asset::new("example.com", "").unwrap().into();
        let b: AnyModel = Asset::new("example.org", "").unwrap().into();
        let err = reconcile(a, &b, Reconciliation::Visit).unwrap_err();
        assert!(err.to_string().contains("keys differ"));
    }

    #[test]
    fn load_normalized_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("asset.json");
        std::fs::write(&path, r#"{"type":"asset","dns":"example.com"}"#).unwrap();
        let model = load_normalized(&path).unwrap();
        assert_eq!(model.key().as_str(), "#asset#example.com#example.com");
    }
}
