//! # Decode Subcommand
//!
//! Turns stored payloads back into typed entities and prints them as JSON
//! envelopes. Accepts a single object or an array for the JSON and
//! key-value formats, and a bincode envelope list for the binary format.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use tabularium_codec::{json, BinaryRegistry, KvItem};
use tabularium_model::{registry, AnyModel};

use crate::{print_json, read_bytes};

/// Stored payload format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    /// `{"type": ..., ...}` envelopes.
    #[default]
    Json,
    /// `{partition, key, attributes}` store items.
    Kv,
    /// bincode envelope list.
    Binary,
}

/// Arguments for `decode`.
#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Payload file, or `-` for standard input.
    pub input: PathBuf,

    /// Format of the payload.
    #[arg(long, value_enum, default_value_t)]
    pub format: Format,
}

/// Decode every entity in `bytes`.
pub fn decode_all(bytes: &[u8], format: Format) -> Result<Vec<AnyModel>> {
    match format {
        Format::Json => {
            let value: Value = serde_json::from_slice(bytes).context("parsing JSON payload")?;
            one_or_many(value)
                .into_iter()
                .map(|v| Ok(json::from_value(registry(), v)?))
                .collect()
        }
        Format::Kv => {
            let value: Value = serde_json::from_slice(bytes).context("parsing key-value payload")?;
            one_or_many(value)
                .into_iter()
                .map(|v| {
                    let item: KvItem = serde_json::from_value(v).context("parsing store item")?;
                    Ok(item.to_model(registry())?)
                })
                .collect()
        }
        Format::Binary => Ok(BinaryRegistry::builtin().decode_slice(registry(), bytes)?),
    }
}

fn one_or_many(value: Value) -> Vec<Value> {
    match value {
        Value::Array(values) => values,
        other => vec![other],
    }
}

/// Execute `decode`.
pub fn run_decode(args: &DecodeArgs) -> Result<u8> {
    let bytes = read_bytes(&args.input)?;
    let models = decode_all(&bytes, args.format)
        .with_context(|| format!("decoding {}", args.input.display()))?;
    tracing::info!(count = models.len(), format = ?args.format, "decoded");
    let envelopes = models
        .iter()
        .map(json::to_value)
        .collect::<Result<Vec<_>, _>>()?;
    print_json(&Value::Array(envelopes))?;
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabularium_core::{GraphModel, Model};
    use tabularium_model::{AdObject, AdObjectClass, Asset};

    fn models() -> Vec<AnyModel> {
        vec![
            Asset::new("example.com", "").unwrap().into(),
            AdObject::new("corp.example.com", "S-1-5-21-7", AdObjectClass::User)
                .unwrap()
                .into(),
        ]
    }

    #[test]
    fn json_single_and_array() {
        let single = json::encode(&models()[0]).unwrap();
        assert_eq!(decode_all(single.as_bytes(), Format::Json).unwrap().len(), 1);

        let values: Vec<Value> = models().iter().map(|m| json::to_value(m).unwrap()).collect();
        let array = serde_json::to_vec(&values).unwrap();
        let decoded = decode_all(&array, Format::Json).unwrap();
        assert_eq!(decoded, models());
    }

    #[test]
    fn kv_items_are_typed_by_key() {
        let items: Vec<KvItem> = models()
            .iter()
            .map(|m| KvItem::from_model("tenant", m).unwrap())
            .collect();
        let bytes = serde_json::to_vec(&items).unwrap();
        let decoded = decode_all(&bytes, Format::Kv).unwrap();
        assert_eq!(decoded[1].discriminator(), "aduser");
        assert_eq!(decoded, models());
    }

    #[test]
    fn binary_slice() {
        let bytes = BinaryRegistry::builtin().encode_slice(&models()).unwrap();
        let decoded = decode_all(&bytes, Format::Binary).unwrap();
        assert_eq!(decoded.len(), 2);
        assert_eq!(decoded[0].key(), models()[0].key());
    }

    #[test]
    fn bad_payloads_fail() {
        assert!(decode_all(b"not json", Format::Json).is_err());
        assert!(decode_all(br#"{"type":"widget"}"#, Format::Json).is_err());
        assert!(decode_all(br#"[{"partition":"p"}]"#, Format::Kv).is_err());
        assert!(decode_all(&[0xff], Format::Binary).is_err());
    }
}
