//! # tabularium-model — Entity Classes and Reconciliation
//!
//! The concrete entity classes of Tabularium, built on the traits and
//! pipelines of `tabularium-core`:
//!
//! - **Asset** (`asset.rs`): hosts, addresses, and ranges. `#asset#<dns>#<name>`.
//! - **Risk** (`risk.rs`): findings on a target, with the status state
//!   machine in `risk_status.rs`. `#risk#<dns>#<name>`.
//! - **Port** (`port.rs`): open ports on an asset.
//! - **Attribute** (`attribute.rs`): name/value facts about another model.
//! - **WebApplication** (`webapp.rs`): applications keyed by primary URL.
//! - **AdObject** (`adobject.rs`): the Active Directory object family,
//!   one struct under seven discriminators.
//! - **Relationship** (`relationship.rs`): labeled edges.
//!
//! ## Reconciliation
//!
//! Two observations with one key are folded with `merge` (authoritative;
//! zero values mean "unspecified") or `visit` (passive; collections union
//! and status only advances). Shared field rules live in `reconcile.rs`,
//! the asset lifecycle status codes in `lifecycle.rs`, and the append-only
//! transition log in `history.rs`.
//!
//! ## Dispatch
//!
//! [`AnyModel`] is the closed sum of every class; [`registry()`] maps
//! discriminators to zero values of it.

pub mod adobject;
pub mod any;
pub mod asset;
pub mod attribute;
pub mod history;
pub mod lifecycle;
pub mod port;
pub mod reconcile;
pub mod registry;
pub mod relationship;
pub mod risk;
pub mod risk_status;
pub mod webapp;

// ─── Entity re-exports ──────────────────────────────────────────────

pub use adobject::{AdObject, AdObjectClass};
pub use asset::{Asset, AssetClass};
pub use attribute::Attribute;
pub use port::Port;
pub use relationship::{Relationship, RelationshipLabel};
pub use risk::{Risk, RiskError};
pub use webapp::WebApplication;

// ─── Status re-exports ──────────────────────────────────────────────

pub use history::{History, HistoryRecord};
pub use lifecycle::Phase;
pub use risk_status::{RiskState, RiskStatus, RiskStatusError, Severity, Substate};

// ─── Dispatch re-exports ────────────────────────────────────────────

pub use any::{AnyModel, ModelKind, Variant};
pub use registry::{builtin, discriminator_for_key, discriminator_for_prefix, registry};
