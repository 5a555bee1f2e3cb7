//! # Binary Envelopes
//!
//! Compact `bincode` encoding for heterogeneous collections. Each entity is
//! stored as a [`BinaryEnvelope`] `{discriminator, payload}` where the
//! payload is the bincode form of the concrete class.
//!
//! Binary codecs are registered separately from the model registry, per
//! class, through [`BinaryRegistry::register`]. The model registry still
//! resolves discriminators to classes; a class without a binary codec
//! fails to encode or decode rather than falling back to JSON.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use tabularium_core::{DecodeError, Model, Registry};
use tabularium_model::{
    AdObject, AnyModel, Asset, Attribute, ModelKind, Port, Risk, Variant, WebApplication,
};

use crate::error::EncodeError;

/// One encoded entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryEnvelope {
    /// Discriminator the entity was encoded under.
    pub discriminator: String,
    /// bincode form of the concrete class.
    pub payload: Vec<u8>,
}

type EncodeFn = fn(&AnyModel) -> Option<bincode::Result<Vec<u8>>>;
type DecodeFn = fn(&[u8]) -> bincode::Result<AnyModel>;

#[derive(Clone, Copy)]
struct Codec {
    encode: EncodeFn,
    decode: DecodeFn,
}

fn encode_variant<T: Variant + Serialize>(model: &AnyModel) -> Option<bincode::Result<Vec<u8>>> {
    T::peek(model).map(bincode::serialize)
}

fn decode_variant<T: Variant + DeserializeOwned>(bytes: &[u8]) -> bincode::Result<AnyModel> {
    bincode::deserialize::<T>(bytes).map(Into::into)
}

/// Class → binary codec table.
#[derive(Default)]
pub struct BinaryRegistry {
    codecs: BTreeMap<ModelKind, Codec>,
}

impl BinaryRegistry {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table with every built-in class registered.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry
            .register::<Asset>()
            .register::<Risk>()
            .register::<Port>()
            .register::<Attribute>()
            .register::<WebApplication>()
            .register::<AdObject>();
        registry
    }

    /// Register the binary codec for class `T`. Re-registering is a no-op.
    pub fn register<T: Variant + Serialize + DeserializeOwned>(&mut self) -> &mut Self {
        self.codecs.entry(T::KIND).or_insert_with(|| {
            tracing::debug!(kind = %T::KIND, "registered binary codec");
            Codec {
                encode: encode_variant::<T>,
                decode: decode_variant::<T>,
            }
        });
        self
    }

    /// Whether class `kind` has a binary codec.
    pub fn contains(&self, kind: ModelKind) -> bool {
        self.codecs.contains_key(&kind)
    }

    /// Wrap one entity in a [`BinaryEnvelope`].
    pub fn envelope(&self, model: &AnyModel) -> Result<BinaryEnvelope, EncodeError> {
        let discriminator = model.discriminator().to_string();
        let codec = self
            .codecs
            .get(&model.kind())
            .ok_or_else(|| EncodeError::NotRegisteredForBinary(discriminator.clone()))?;
        let payload = match (codec.encode)(model) {
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => {
                return Err(EncodeError::Binary {
                    discriminator,
                    reason: e.to_string(),
                })
            }
            None => return Err(EncodeError::NotRegisteredForBinary(discriminator)),
        };
        Ok(BinaryEnvelope {
            discriminator,
            payload,
        })
    }

    /// Unwrap one [`BinaryEnvelope`].
    pub fn open(
        &self,
        registry: &Registry<AnyModel>,
        envelope: &BinaryEnvelope,
    ) -> Result<AnyModel, DecodeError> {
        let discriminator = envelope.discriminator.as_str();
        let zero = registry
            .make_type(discriminator)
            .ok_or_else(|| DecodeError::UnknownType(discriminator.to_string()))?;
        let codec = self
            .codecs
            .get(&zero.kind())
            .ok_or_else(|| DecodeError::NotRegisteredForBinary(discriminator.to_string()))?;
        let mut model = (codec.decode)(&envelope.payload).map_err(|e| DecodeError::Binary {
            discriminator: discriminator.to_string(),
            reason: e.to_string(),
        })?;
        model.specialize(discriminator);
        Ok(model)
    }

    /// Encode one entity.
    pub fn encode(&self, model: &AnyModel) -> Result<Vec<u8>, EncodeError> {
        let envelope = self.envelope(model)?;
        bincode::serialize(&envelope).map_err(|e| EncodeError::Binary {
            discriminator: envelope.discriminator.clone(),
            reason: e.to_string(),
        })
    }

    /// Decode one entity.
    pub fn decode(
        &self,
        registry: &Registry<AnyModel>,
        bytes: &[u8],
    ) -> Result<AnyModel, DecodeError> {
        let envelope: BinaryEnvelope = bincode::deserialize(bytes)
            .map_err(|e| DecodeError::Malformed(format!("binary envelope: {e}")))?;
        self.open(registry, &envelope)
    }

    /// Encode a heterogeneous slice, preserving order.
    pub fn encode_slice(&self, models: &[AnyModel]) -> Result<Vec<u8>, EncodeError> {
        let envelopes = models
            .iter()
            .map(|m| self.envelope(m))
            .collect::<Result<Vec<_>, _>>()?;
        bincode::serialize(&envelopes).map_err(|e| EncodeError::Binary {
            discriminator: "slice".to_string(),
            reason: e.to_string(),
        })
    }

    /// Decode a heterogeneous slice, preserving order.
    pub fn decode_slice(
        &self,
        registry: &Registry<AnyModel>,
        bytes: &[u8],
    ) -> Result<Vec<AnyModel>, DecodeError> {
        let envelopes: Vec<BinaryEnvelope> = bincode::deserialize(bytes)
            .map_err(|e| DecodeError::Malformed(format!("binary envelope list: {e}")))?;
        tracing::trace!(count = envelopes.len(), "decoding binary slice");
        envelopes.iter().map(|e| self.open(registry, e)).collect()
    }
}
