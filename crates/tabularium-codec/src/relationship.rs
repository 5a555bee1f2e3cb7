//! # Relationship Envelopes
//!
//! ```json
//! {
//!   "type": "has_port",
//!   "source": {"type": "asset", ...},
//!   "target": {"type": "port", ...},
//!   "key": "#has_port#asset#...#port#...",
//!   "created": "...", "visited": "...", "capability": "nmap"
//! }
//! ```
//!
//! Endpoints are full model envelopes, decoded through the same registry
//! lookup as standalone models.

use serde::de::Error as _;
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use tabularium_core::{DecodeError, Registry, RelationshipBase};
use tabularium_model::{registry, AnyModel, Relationship, RelationshipLabel};

use crate::error::EncodeError;
use crate::json::{self, TYPE_FIELD};

const SOURCE_FIELD: &str = "source";
const TARGET_FIELD: &str = "target";

/// Encode a relationship with its endpoints.
pub fn to_value(relationship: &Relationship) -> Result<Value, EncodeError> {
    let Value::Object(mut map) = serde_json::to_value(&relationship.base)? else {
        return Err(EncodeError::NotAnObject(
            relationship.label.discriminator().to_string(),
        ));
    };
    map.insert(
        TYPE_FIELD.to_string(),
        Value::String(relationship.label.discriminator().to_string()),
    );
    map.insert(SOURCE_FIELD.to_string(), json::to_value(&relationship.source)?);
    map.insert(TARGET_FIELD.to_string(), json::to_value(&relationship.target)?);
    Ok(Value::Object(map))
}

/// Decode a relationship envelope.
///
/// # Errors
///
/// [`DecodeError::UnknownRelationship`] for an unknown `"type"`, and any
/// error decoding either endpoint.
pub fn from_value(registry: &Registry<AnyModel>, value: Value) -> Result<Relationship, DecodeError> {
    let Value::Object(mut map) = value else {
        return Err(DecodeError::Malformed(
            "relationship envelope is not a JSON object".to_string(),
        ));
    };
    let label: RelationshipLabel = match map.remove(TYPE_FIELD) {
        Some(Value::String(d)) => d.parse()?,
        _ => return Err(DecodeError::MissingDiscriminator),
    };
    let source = endpoint(registry, &mut map, SOURCE_FIELD)?;
    let target = endpoint(registry, &mut map, TARGET_FIELD)?;
    let base: RelationshipBase =
        serde_json::from_value(Value::Object(map)).map_err(|source| DecodeError::Payload {
            discriminator: label.discriminator().to_string(),
            source,
        })?;
    Ok(Relationship {
        label,
        source: Box::new(source),
        target: Box::new(target),
        base,
    })
}

fn endpoint(
    registry: &Registry<AnyModel>,
    map: &mut Map<String, Value>,
    field: &str,
) -> Result<AnyModel, DecodeError> {
    let value = map
        .remove(field)
        .ok_or_else(|| DecodeError::Malformed(format!("relationship has no {field:?} endpoint")))?;
    json::from_value(registry, value)
}

/// Serde envelope for a [`Relationship`], using the built-in registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipWrapper(pub Relationship);

impl Serialize for RelationshipWrapper {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        to_value(&self.0)
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RelationshipWrapper {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        from_value(registry(), value)
            .map(Self)
            .map_err(D::Error::custom)
    }
}
