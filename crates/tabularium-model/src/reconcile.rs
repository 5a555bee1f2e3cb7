//! # Reconciliation Helpers
//!
//! Field-level building blocks shared by every class's `merge` and `visit`.
//!
//! ## Merge (authoritative)
//!
//! Non-zero fields on the update overwrite; zero-valued fields mean
//! "unspecified" and are ignored. `created` is kept unless missing. History
//! carried by the update is absorbed, never dropped. `updated` moves only
//! when a status transition is recorded.
//!
//! ## Visit (passive)
//!
//! Collections union; an empty incoming collection changes nothing. Status
//! only advances through the class's state machine. A self-discovered
//! record seen again from a seed is promoted to seed.

use std::collections::BTreeSet;

use tabularium_core::temporal::latest;
use tabularium_core::Timestamp;

use crate::history::{History, HistoryRecord};

/// Provenance of records discovered by the platform itself.
pub const SELF_SOURCE: &str = "self";
/// Provenance of records supplied as scan seeds.
pub const SEED_SOURCE: &str = "seed";
/// Provenance of records supplied directly by a user or integration.
pub const PROVIDED_SOURCE: &str = "provided";
/// Graph label added when a record is promoted to seed.
pub const SEED_LABEL: &str = "seed";

/// Status-bearing fields of a record, borrowed for a transition.
pub struct StatusLedger<'a> {
    /// The status code.
    pub status: &'a mut String,
    /// The transition log.
    pub history: &'a mut History,
    /// Last status-affecting change.
    pub updated: &'a mut Option<Timestamp>,
}

impl StatusLedger<'_> {
    /// Move to `to`, recording History and refreshing `updated`.
    ///
    /// Returns whether a transition was recorded. Empty or unchanged
    /// targets do nothing.
    pub fn transition(&mut self, to: &str, source: &str, comment: &str) -> bool {
        if to.is_empty() || !self.history.update(self.status, to, source, comment) {
            return false;
        }
        tracing::debug!(from = %self.status, to, source, "status transition");
        *self.status = to.to_string();
        *self.updated = Some(Timestamp::now());
        true
    }
}

/// Overwrite `into` with `from` unless `from` is empty.
pub fn take_string(into: &mut String, from: &str) {
    if !from.is_empty() {
        *into = from.to_string();
    }
}

/// Overwrite `into` with `from` unless `from` is zero.
pub fn take_nonzero(into: &mut i64, from: i64) {
    if from != 0 {
        *into = from;
    }
}

/// Keep `created` unless it is missing.
pub fn keep_created(into: &mut Option<Timestamp>, from: Option<Timestamp>) {
    if into.is_none() {
        *into = from;
    }
}

/// Advance `visited` to the later of the two.
pub fn advance_visited(into: &mut Option<Timestamp>, from: Option<Timestamp>) {
    *into = latest(*into, from);
}

/// Union `from` into `into`. Returns how many elements were new.
pub fn union<T: Ord + Clone>(into: &mut BTreeSet<T>, from: &BTreeSet<T>) -> usize {
    let before = into.len();
    into.extend(from.iter().cloned());
    into.len() - before
}

/// Replace `into` with `from` unless `from` is empty.
pub fn replace_nonempty<T: Clone>(into: &mut BTreeSet<T>, from: &BTreeSet<T>) {
    if !from.is_empty() {
        into.clone_from(from);
    }
}

/// Extend a TTL passively: a later expiry wins, zero ("never") is kept.
pub fn extend_ttl(into: &mut i64, from: i64) {
    if *into != 0 && from > *into {
        *into = from;
    }
}

/// Promote a self-discovered record that a seed has now observed.
///
/// When `source` is [`SELF_SOURCE`] and `observed_source` is
/// [`SEED_SOURCE`]: the source flips to seed, the pending-label marker is
/// set to [`SEED_LABEL`], and exactly one History record is appended. Any
/// other combination, including a seed observed by self, changes nothing.
///
/// Returns whether the record was promoted.
pub fn promote_seed(
    source: &mut String,
    pending_label: &mut Option<String>,
    history: &mut History,
    status: &str,
    observed_source: &str,
) -> bool {
    if source != SELF_SOURCE || observed_source != SEED_SOURCE {
        return false;
    }
    tracing::debug!(status, "promoting self-discovered record to seed");
    *source = SEED_SOURCE.to_string();
    *pending_label = Some(SEED_LABEL.to_string());
    history.record(HistoryRecord {
        from: status.to_string(),
        to: status.to_string(),
        source: SEED_SOURCE.to_string(),
        comment: "promoted to seed".to_string(),
        timestamp: Timestamp::now(),
    });
    true
}
