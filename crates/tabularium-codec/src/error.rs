//! Encoding errors. Decoding errors are [`tabularium_core::DecodeError`].

use thiserror::Error;

/// Error encoding an entity.
#[derive(Error, Debug)]
pub enum EncodeError {
    /// The entity did not serialize to JSON.
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The entity serialized to something other than a JSON object.
    #[error("{0:?} did not encode to a JSON object")]
    NotAnObject(String),

    /// The binary encoder failed.
    #[error("binary encoding of {discriminator:?} failed: {reason}")]
    Binary {
        /// Discriminator of the entity being encoded.
        discriminator: String,
        /// Underlying binary codec message.
        reason: String,
    },

    /// The entity's class has no binary codec registration.
    #[error("type {0:?} is not registered for binary encoding")]
    NotRegisteredForBinary(String),
}
