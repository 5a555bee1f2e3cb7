//! # Asset Lifecycle Status
//!
//! Status codes shared by every asset-like class (assets, ports, web
//! applications, AD objects, attributes).
//!
//! ## States
//!
//! ```text
//! Pending (P) ──▶ Active (A, AL, AH, AP)
//!                   │            ▲
//!          merge    ▼            │ visit (revival)
//!               Deleted (D) ─────┘
//!
//!          merge: any ──▶ Frozen (F)      visit never leaves Frozen
//! ```
//!
//! The second character of an active code is a scan intensity
//! (`L` low, `H` high, `P` passive). Intensity is chosen by whoever owns the
//! record, so `visit` does not flip between active variants.

use serde::{Deserialize, Serialize};

/// Pending: known but not yet confirmed.
pub const PENDING: &str = "P";
/// Active.
pub const ACTIVE: &str = "A";
/// Active, low scan intensity.
pub const ACTIVE_LOW: &str = "AL";
/// Active, high scan intensity.
pub const ACTIVE_HIGH: &str = "AH";
/// Active, passive observation only.
pub const ACTIVE_PASSIVE: &str = "AP";
/// Frozen by a user: no scanning, no passive changes.
pub const FROZEN: &str = "F";
/// Deleted.
pub const DELETED: &str = "D";

/// The phase a status code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// `P`.
    Pending,
    /// `A`, `AL`, `AH`, `AP`.
    Active,
    /// `F`.
    Frozen,
    /// `D`.
    Deleted,
}

impl Phase {
    /// Classify a status code. Unknown or empty codes yield `None`.
    pub fn of(code: &str) -> Option<Phase> {
        match code {
            PENDING => Some(Self::Pending),
            ACTIVE | ACTIVE_LOW | ACTIVE_HIGH | ACTIVE_PASSIVE => Some(Self::Active),
            FROZEN => Some(Self::Frozen),
            DELETED => Some(Self::Deleted),
            _ => None,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Frozen => "FROZEN",
            Self::Deleted => "DELETED",
        };
        f.write_str(s)
    }
}

/// Whether `code` is a recognized lifecycle status.
pub fn is_known(code: &str) -> bool {
    Phase::of(code).is_some()
}

/// The status a passive observation moves `existing` to, if any.
///
/// - Pending advances to any active code.
/// - Deleted is revived by an active observation.
/// - Frozen never changes.
/// - Observations never move a record to Frozen, Deleted, or Pending.
pub fn visit_status(existing: &str, observed: &str) -> Option<String> {
    let observed_phase = Phase::of(observed)?;
    if observed_phase != Phase::Active {
        return None;
    }
    match Phase::of(existing) {
        None | Some(Phase::Pending) | Some(Phase::Deleted) => Some(observed.to_string()),
        Some(Phase::Active) | Some(Phase::Frozen) => None,
    }
}
