//! # Key-Value Items
//!
//! The document store holds each entity as an item addressed by
//! `(partition, key)` with the remaining fields as attributes. Items carry
//! no type field: the class is recovered from the key prefix.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use tabularium_core::{DecodeError, GraphModel, Key, Registry};
use tabularium_model::AnyModel;

use crate::error::EncodeError;
use crate::json::{self, KEY_FIELD};

/// A stored item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvItem {
    /// Store partition, e.g. a tenant or account identifier.
    pub partition: String,
    /// Canonical entity key.
    pub key: Key,
    /// Every other field of the entity.
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl KvItem {
    /// Store `model` in `partition`.
    pub fn from_model(partition: &str, model: &AnyModel) -> Result<Self, EncodeError> {
        let mut attributes = json::payload(model)?;
        attributes.remove(KEY_FIELD);
        Ok(Self {
            partition: partition.to_string(),
            key: model.key().clone(),
            attributes,
        })
    }

    /// Recover the entity, typed by its key prefix.
    pub fn to_model(&self, registry: &Registry<AnyModel>) -> Result<AnyModel, DecodeError> {
        let mut map = self.attributes.clone();
        map.insert(
            KEY_FIELD.to_string(),
            Value::String(self.key.as_str().to_string()),
        );
        json::from_value(registry, Value::Object(map))
    }
}
