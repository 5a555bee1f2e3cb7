//! # Status History
//!
//! An append-only log of status transitions. Every class that carries a
//! status keeps one, and reconciliation appends to it rather than rewriting
//! it.

use serde::{Deserialize, Serialize};

use tabularium_core::Timestamp;

/// Record of a single status transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Status before the transition.
    pub from: String,
    /// Status after the transition.
    pub to: String,
    /// The source (user, capability, seed) that caused it.
    pub source: String,
    /// Free-form comment.
    pub comment: String,
    /// When the transition occurred.
    pub timestamp: Timestamp,
}

/// Ordered log of status transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Vec<HistoryRecord>);

impl History {
    /// An empty history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a transition record if `from` and `to` differ.
    ///
    /// Returns whether a record was appended.
    pub fn update(&mut self, from: &str, to: &str, source: &str, comment: &str) -> bool {
        if from == to {
            return false;
        }
        self.record(HistoryRecord {
            from: from.to_string(),
            to: to.to_string(),
            source: source.to_string(),
            comment: comment.to_string(),
            timestamp: Timestamp::now(),
        });
        true
    }

    /// Append a record unconditionally.
    pub fn record(&mut self, record: HistoryRecord) {
        self.0.push(record);
    }

    /// Append every record of `other` not already present, in `other`'s
    /// order. Returns how many were appended.
    pub fn absorb(&mut self, other: &History) -> usize {
        let mut added = 0;
        for record in &other.0 {
            if !self.0.contains(record) {
                self.0.push(record.clone());
                added += 1;
            }
        }
        added
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[HistoryRecord] {
        &self.0
    }

    /// The most recent record.
    pub fn last(&self) -> Option<&HistoryRecord> {
        self.0.last()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no transition has been recorded.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
