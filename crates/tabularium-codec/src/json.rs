//! # JSON Envelopes
//!
//! An encoded entity is its JSON object with a `"type"` field holding the
//! discriminator:
//!
//! ```json
//! {"type": "asset", "key": "#asset#example.com#example.com", "dns": "example.com", ...}
//! ```
//!
//! ## Decoding
//!
//! 1. The discriminator is the `"type"` field when present and non-empty,
//!    otherwise it is inferred from the first `#` segment of `"key"`.
//! 2. The registry supplies a zero value for the discriminator; its
//!    variant selects the concrete type the payload is read into.
//! 3. Classes registered under several discriminators are specialized to
//!    the one the payload was decoded under.
//!
//! An unregistered discriminator or an unknown key prefix is an error, never
//! a fallback.

use serde_json::{Map, Value};

use tabularium_core::key::prefix_of;
use tabularium_core::{DecodeError, Model, Registry};
use tabularium_model::{
    discriminator_for_prefix, AdObject, AnyModel, Asset, Attribute, Port, Risk, WebApplication,
};

use crate::error::EncodeError;

/// Envelope field carrying the discriminator.
pub const TYPE_FIELD: &str = "type";
/// Field carrying the canonical key.
pub const KEY_FIELD: &str = "key";

/// Serialize the wrapped entity's own fields, without a discriminator.
pub fn payload(model: &AnyModel) -> Result<Map<String, Value>, EncodeError> {
    let value = match model {
        AnyModel::Asset(m) => serde_json::to_value(m)?,
        AnyModel::Risk(m) => serde_json::to_value(m)?,
        AnyModel::Port(m) => serde_json::to_value(m)?,
        AnyModel::Attribute(m) => serde_json::to_value(m)?,
        AnyModel::WebApplication(m) => serde_json::to_value(m)?,
        AnyModel::AdObject(m) => serde_json::to_value(m)?,
    };
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(EncodeError::NotAnObject(model.discriminator().to_string())),
    }
}

/// Encode an entity as a typed JSON object.
pub fn to_value(model: &AnyModel) -> Result<Value, EncodeError> {
    let mut map = payload(model)?;
    map.insert(
        TYPE_FIELD.to_string(),
        Value::String(model.discriminator().to_string()),
    );
    Ok(Value::Object(map))
}

/// Encode an entity as a typed JSON string.
pub fn encode(model: &AnyModel) -> Result<String, EncodeError> {
    Ok(serde_json::to_string(&to_value(model)?)?)
}

/// The discriminator an envelope declares or implies.
///
/// # Errors
///
/// - [`DecodeError::UnknownKeyPrefix`] if only a key is present and its
///   prefix names no known class.
/// - [`DecodeError::MissingDiscriminator`] if there is neither.
pub fn discriminator_of(map: &Map<String, Value>) -> Result<String, DecodeError> {
    if let Some(Value::String(declared)) = map.get(TYPE_FIELD) {
        let declared = declared.trim();
        if !declared.is_empty() {
            return Ok(declared.to_lowercase());
        }
    }
    let key = match map.get(KEY_FIELD) {
        Some(Value::String(key)) if !key.is_empty() => key,
        _ => return Err(DecodeError::MissingDiscriminator),
    };
    let prefix = prefix_of(key).ok_or(DecodeError::MissingDiscriminator)?;
    discriminator_for_prefix(prefix)
        .map(str::to_string)
        .ok_or_else(|| DecodeError::UnknownKeyPrefix {
            prefix: prefix.to_string(),
            key: key.clone(),
        })
}

/// Decode a JSON envelope into the registered concrete type.
pub fn from_value(registry: &Registry<AnyModel>, value: Value) -> Result<AnyModel, DecodeError> {
    let mut map = match value {
        Value::Object(map) => map,
        other => {
            return Err(DecodeError::Malformed(format!(
                "expected a JSON object, found {}",
                kind_of(&other)
            )))
        }
    };
    let discriminator = discriminator_of(&map)?;
    let zero = registry
        .make_type(&discriminator)
        .ok_or_else(|| DecodeError::UnknownType(discriminator.clone()))?;
    map.remove(TYPE_FIELD);

    let mut model = fill(zero, Value::Object(map)).map_err(|source| DecodeError::Payload {
        discriminator: discriminator.clone(),
        source,
    })?;
    model.specialize(&discriminator);
    tracing::trace!(discriminator = %discriminator, kind = %model.kind(), "decoded envelope");
    Ok(model)
}

/// Decode a JSON string envelope.
pub fn decode(registry: &Registry<AnyModel>, json: &str) -> Result<AnyModel, DecodeError> {
    let value: Value =
        serde_json::from_str(json).map_err(|e| DecodeError::Malformed(e.to_string()))?;
    from_value(registry, value)
}

/// Read `payload` into the concrete type of `zero`.
fn fill(zero: AnyModel, payload: Value) -> Result<AnyModel, serde_json::Error> {
    Ok(match zero {
        AnyModel::Asset(_) => AnyModel::Asset(serde_json::from_value::<Asset>(payload)?),
        AnyModel::Risk(_) => AnyModel::Risk(serde_json::from_value::<Risk>(payload)?),
        AnyModel::Port(_) => AnyModel::Port(serde_json::from_value::<Port>(payload)?),
        AnyModel::Attribute(_) => {
            AnyModel::Attribute(serde_json::from_value::<Attribute>(payload)?)
        }
        AnyModel::WebApplication(_) => {
            AnyModel::WebApplication(serde_json::from_value::<WebApplication>(payload)?)
        }
        AnyModel::AdObject(_) => AnyModel::AdObject(serde_json::from_value::<AdObject>(payload)?),
    })
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use tabularium_core::GraphModel;
    use tabularium_model::registry;

    proptest! {
        /// Decoding an encoded asset reproduces its identity.
        #[test]
        fn asset_identity_survives_json(
            dns in "[a-zA-Z0-9-]{1,20}\\.[a-z]{2,6}",
            host in "[a-zA-Z0-9]{1,20}(\\.[a-z]{2,6})?",
        ) {
            let original: AnyModel = Asset::new(&dns, &host).unwrap().into();
            let decoded = decode(registry(), &encode(&original).unwrap()).unwrap();
            prop_assert_eq!(decoded.key(), original.key());
            prop_assert_eq!(decoded.discriminator(), original.discriminator());
            prop_assert_eq!(decoded.labels(), original.labels());
        }

        /// Key-prefix typing recovers a risk without its type field.
        #[test]
        fn risk_identity_survives_without_type(
            dns in "[a-z0-9]{1,20}\\.[a-z]{2,6}",
            name in "[A-Za-z0-9-]{1,40}",
            status in prop::sample::select(vec!["TI", "TH", "OM", "RC", "OLA"]),
        ) {
            let asset = Asset::new(&dns, "").unwrap();
            let original: AnyModel = Risk::new(&asset, &name, status).unwrap().into();
            let mut value = to_value(&original).unwrap();
            value.as_object_mut().unwrap().remove(TYPE_FIELD);
            let decoded = from_value(registry(), value).unwrap();
            prop_assert_eq!(decoded, original);
        }
    }
}
