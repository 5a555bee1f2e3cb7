//! # Wrappers
//!
//! Serde-facing envelopes:
//!
//! - [`Wrapper<T>`] for a statically known class: `{"type": ..., ...payload}`.
//! - [`GraphModelWrapper`] for any registered graph model.
//! - [`TargetWrapper`] for targets only; other classes are rejected with
//!   [`DecodeError::NotATarget`].
//!
//! The polymorphic wrappers resolve discriminators through the built-in
//! registry, since `Deserialize` cannot take one as a parameter. Callers
//! with their own registry use [`crate::json::from_value`] and
//! [`TargetWrapper::from_value`] directly.

use serde::de::{DeserializeOwned, Error as _};
use serde::ser::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use tabularium_core::{DecodeError, Model, Registry};
use tabularium_model::{registry, AnyModel};

use crate::json::{self, TYPE_FIELD};

/// A statically typed envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wrapper<T> {
    /// Discriminator carried on the wire.
    pub discriminator: String,
    /// The wrapped entity.
    pub payload: T,
}

impl<T: Model> Wrapper<T> {
    /// Wrap `payload` under its own discriminator.
    pub fn new(payload: T) -> Self {
        Self {
            discriminator: payload.discriminator().to_string(),
            payload,
        }
    }
}

impl<T: Serialize> Serialize for Wrapper<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut value = serde_json::to_value(&self.payload).map_err(S::Error::custom)?;
        let Value::Object(map) = &mut value else {
            return Err(S::Error::custom("wrapped payload is not an object"));
        };
        map.insert(
            TYPE_FIELD.to_string(),
            Value::String(self.discriminator.clone()),
        );
        value.serialize(serializer)
    }
}

impl<'de, T: DeserializeOwned> Deserialize<'de> for Wrapper<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let mut value = Value::deserialize(deserializer)?;
        let Value::Object(map) = &mut value else {
            return Err(D::Error::custom("expected a JSON object"));
        };
        let discriminator = match map.remove(TYPE_FIELD) {
            Some(Value::String(d)) if !d.is_empty() => d,
            _ => return Err(D::Error::custom(DecodeError::MissingDiscriminator)),
        };
        let payload = T::deserialize(value).map_err(D::Error::custom)?;
        Ok(Self {
            discriminator,
            payload,
        })
    }
}

/// Any registered graph model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphModelWrapper(pub AnyModel);

impl Serialize for GraphModelWrapper {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        json::to_value(&self.0)
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GraphModelWrapper {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        json::from_value(registry(), value)
            .map(Self)
            .map_err(D::Error::custom)
    }
}

/// A registered class that implements `Target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetWrapper(AnyModel);

impl TargetWrapper {
    /// Wrap `model` if it is a target.
    pub fn new(model: AnyModel) -> Result<Self, DecodeError> {
        if model.is_target() {
            Ok(Self(model))
        } else {
            Err(DecodeError::NotATarget(model.discriminator().to_string()))
        }
    }

    /// Decode an envelope, rejecting classes that are not targets.
    pub fn from_value(registry: &Registry<AnyModel>, value: Value) -> Result<Self, DecodeError> {
        Self::new(json::from_value(registry, value)?)
    }

    /// The wrapped target.
    pub fn get(&self) -> &AnyModel {
        &self.0
    }

    /// Unwrap.
    pub fn into_inner(self) -> AnyModel {
        self.0
    }
}

impl Serialize for TargetWrapper {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        json::to_value(&self.0)
            .map_err(S::Error::custom)?
            .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TargetWrapper {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(registry(), value).map_err(D::Error::custom)
    }
}
