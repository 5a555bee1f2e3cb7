//! # tabularium-codec — Discriminated Encodings
//!
//! Round-trips heterogeneous entities through three encodings, all of which
//! resolve the concrete class through the model registry:
//!
//! - **JSON** (`json.rs`, `wrapper.rs`, `relationship.rs`): objects carrying
//!   a `"type"` discriminator, falling back to the key prefix.
//! - **Key-value** (`kv.rs`): `(partition, key, attributes)` items typed by
//!   key prefix alone.
//! - **Binary** (`binary.rs`): bincode envelopes for slices, with a
//!   per-class codec table.
//!
//! `decode(encode(x))` reproduces the key, discriminator, labels, and
//! concrete class of every registered entity. An unknown discriminator is
//! always an error.

pub mod binary;
pub mod error;
pub mod json;
pub mod kv;
pub mod relationship;
pub mod wrapper;

pub use binary::{BinaryEnvelope, BinaryRegistry};
pub use error::EncodeError;
pub use kv::KvItem;
pub use relationship::RelationshipWrapper;
pub use wrapper::{GraphModelWrapper, TargetWrapper, Wrapper};
