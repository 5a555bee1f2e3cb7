//! # tabularium-core — Identity Foundations
//!
//! The leaf crate of the Tabularium workspace. It defines the machinery
//! every entity class is built from, without knowing any concrete class:
//!
//! 1. **Capability traits.** `Model`, `GraphModel`, `Target`, `Assetlike`,
//!    and `GraphRelationship` are separate traits; a class implements the
//!    subset it supports.
//!
//! 2. **Hook pipeline.** `call_hooks()` runs `defaulted()` then the class's
//!    ordered hooks as pure `T -> Result<T, HookFailure>` steps, fail-fast.
//!
//! 3. **Key canonicalization.** `KeySchema::build()` is the only way keys
//!    are assembled: normalized components, per-class ceiling, truncation of
//!    the variable component only.
//!
//! 4. **Type registry.** `Registry<E>` maps discriminators (and aliases) to
//!    zero-value constructors, rejects conflicting registrations, and is
//!    frozen by being shared immutably after startup.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `tabularium-*` crates.
//! - No I/O, no threads, no `unsafe`.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod hook;
pub mod key;
pub mod model;
pub mod normalize;
pub mod registry;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use error::{
    DecodeError, HookError, HookFailure, NormalizeError, RegistrationError, TabulariumError,
};
pub use hook::{call_hooks, run_hooks, Hook, HookResult};
pub use key::{Fold, Key, KeyPattern, KeySchema, CEILING_1024, CEILING_2048};
pub use model::{Assetlike, GraphModel, GraphRelationship, Model, RelationshipBase, Target};
pub use registry::Registry;
pub use temporal::Timestamp;
