//! # Error Types — Structured Error Hierarchy
//!
//! Defines the error types used throughout Tabularium. All errors use
//! `thiserror` for derive-based `Display` and `Error` implementations.
//!
//! ## Design
//!
//! - Registration errors are fatal: they describe a programmer error in the
//!   startup wiring and abort registry construction.
//! - Hook errors name the entity, the failing hook, and the reason. The
//!   entity that failed is consumed by the pipeline and never returned.
//! - Decode errors carry the discriminator (or key prefix) that was being
//!   decoded. A decode never substitutes a zero value for a failure.
//! - `valid()` returning false is a boolean contract, not an error.

use thiserror::Error;

/// Top-level error type for Tabularium.
#[derive(Error, Debug)]
pub enum TabulariumError {
    /// Conflicting type registration.
    #[error("registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// A normalization hook rejected the entity.
    #[error("hook error: {0}")]
    Hook(#[from] HookError),

    /// An envelope could not be decoded into a registered entity.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Text or host normalization failed.
    #[error("normalization error: {0}")]
    Normalize(#[from] NormalizeError),
}

/// Error raised while populating a type registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistrationError {
    /// Two different concrete types claimed the same discriminator.
    #[error("discriminator {name:?} is already registered to {existing}; refusing to register {attempted}")]
    Conflict {
        /// The contested discriminator.
        name: String,
        /// Type name of the current owner.
        existing: &'static str,
        /// Type name of the rejected registration.
        attempted: &'static str,
    },

    /// A registration call supplied no usable discriminator.
    #[error("registration of {type_name} supplied no discriminator")]
    NoDiscriminator {
        /// Type name of the rejected registration.
        type_name: &'static str,
    },
}

/// The reason a single hook rejected an entity.
///
/// Hooks return this bare reason; the pipeline attaches the entity and
/// hook names when wrapping it into a [`HookError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct HookFailure(pub String);

impl HookFailure {
    /// Build a failure from any displayable reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}

impl From<NormalizeError> for HookFailure {
    fn from(err: NormalizeError) -> Self {
        Self(err.to_string())
    }
}

/// A hook in an entity's pipeline failed; the remaining hooks did not run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{entity}: hook {hook:?} failed: {reason}")]
pub struct HookError {
    /// Discriminator of the entity being normalized.
    pub entity: String,
    /// Description of the hook that failed.
    pub hook: &'static str,
    /// Why the hook rejected the entity.
    pub reason: HookFailure,
}

/// Error decoding a polymorphic envelope.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The envelope is not a JSON object or is otherwise unreadable.
    #[error("malformed envelope: {0}")]
    Malformed(String),

    /// Neither a `type` field nor a usable `key` field was present.
    #[error("envelope carries neither a type discriminator nor a key")]
    MissingDiscriminator,

    /// The discriminator is not present in the type registry.
    #[error("unknown type {0:?}")]
    UnknownType(String),

    /// The key prefix matches no known entity class.
    #[error("unknown key prefix {prefix:?} in key {key:?}")]
    UnknownKeyPrefix {
        /// The first `#`-delimited segment of the key.
        prefix: String,
        /// The full key that was inspected.
        key: String,
    },

    /// The payload did not unmarshal into the registered concrete type.
    #[error("payload for {discriminator:?} failed to decode: {source}")]
    Payload {
        /// Discriminator that selected the concrete type.
        discriminator: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// The binary payload did not decode into the registered concrete type.
    #[error("binary payload for {discriminator:?} failed to decode: {reason}")]
    Binary {
        /// Discriminator that selected the concrete type.
        discriminator: String,
        /// Underlying binary codec message.
        reason: String,
    },

    /// The discriminator is known but has no binary codec registration.
    #[error("type {0:?} is not registered for binary encoding")]
    NotRegisteredForBinary(String),

    /// A target-only wrapper received a model that is not a target.
    #[error("type {0:?} is not a target")]
    NotATarget(String),

    /// A relationship wrapper carried an unknown relationship type.
    #[error("unknown relationship type {0:?}")]
    UnknownRelationship(String),
}

/// Error normalizing user-supplied text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NormalizeError {
    /// A hostname could not be converted to its ASCII (punycode) form.
    #[error("invalid hostname {0:?}")]
    InvalidHostname(String),

    /// A URL could not be parsed.
    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
        /// Parser message.
        reason: String,
    },
}
