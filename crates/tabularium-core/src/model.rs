//! # Capability Traits
//!
//! Each capability an entity class can offer is a separate trait:
//!
//! - [`Model`] — registered discriminator, `defaulted()`, ordered hooks.
//! - [`GraphModel`] — canonical key, graph labels, validity.
//! - [`Target`] — something capabilities act on: status, group/identifier
//!   pair, class and privacy tests.
//! - [`Assetlike`] — a target that reconciles through `merge` / `visit`.
//! - [`GraphRelationship`] — a labeled edge between two graph models.
//!
//! Concrete classes implement the subset that applies to them.

use serde::{Deserialize, Serialize};

use crate::error::HookError;
use crate::hook::{call_hooks, run_hooks, Hook};
use crate::key::Key;
use crate::temporal::{latest, Timestamp};

/// An entity with a registered discriminator and a normalization pipeline.
pub trait Model: Sized + 'static {
    /// The discriminator this value is registered and labeled under.
    fn discriminator(&self) -> &'static str;

    /// Fill defaults (timestamps, status, TTL). Must only fill what is unset.
    fn defaulted(self) -> Self;

    /// The ordered hook list for this class.
    fn hooks() -> &'static [Hook<Self>];

    /// Run `defaulted()` and the hook pipeline.
    fn normalized(self) -> Result<Self, HookError> {
        call_hooks(self)
    }

    /// Run the hook pipeline without `defaulted()`.
    ///
    /// For authoritative updates: a field the update leaves unset stays
    /// zero, so `merge` reads it as unspecified.
    fn canonicalized(self) -> Result<Self, HookError> {
        run_hooks(self)
    }
}

/// A model persisted as a node in the graph store.
pub trait GraphModel: Model {
    /// The canonical key computed by the hook pipeline.
    fn key(&self) -> &Key;

    /// Node labels. Always includes [`Model::discriminator`].
    fn labels(&self) -> Vec<String>;

    /// Whether the entity may be persisted.
    fn valid(&self) -> bool;
}

/// Something capabilities act on.
pub trait Target: GraphModel {
    /// Current status code.
    fn status(&self) -> &str;

    /// A copy of this target carrying a different status.
    fn with_status(&self, status: &str) -> Self;

    /// The grouping attribute used for generic target matching.
    fn group(&self) -> &str;

    /// The identifying attribute within the group.
    fn identifier(&self) -> &str;

    /// Whether the status code starts with `prefix`.
    fn is_status(&self, prefix: &str) -> bool {
        !prefix.is_empty() && self.status().starts_with(prefix)
    }

    /// Whether the target belongs to the named class.
    fn is_class(&self, class: &str) -> bool;

    /// Whether the target sits in a private address range.
    fn is_private(&self) -> bool;
}

/// A target reconciled against later observations of itself.
pub trait Assetlike: Target {
    /// Authoritative update; zero-valued fields on `update` are ignored.
    fn merge(&mut self, update: &Self);

    /// Passive re-observation; collections union, status only advances.
    fn visit(&mut self, observation: &Self);

    /// Record which source produced this observation.
    fn set_source(&mut self, source: &str);
}

/// Metadata shared by every relationship.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipBase {
    /// Relationship key, derived from its label and endpoint keys.
    pub key: Key,
    /// When the relationship was first recorded.
    pub created: Option<Timestamp>,
    /// When the relationship was last observed.
    pub visited: Option<Timestamp>,
    /// The capability that last observed it.
    pub capability: String,
}

impl RelationshipBase {
    /// Fold a later observation of the same relationship into this one.
    ///
    /// `visited` never moves backwards; `created` is kept unless missing.
    pub fn visit(&mut self, other: &RelationshipBase) {
        if self.created.is_none() {
            self.created = other.created;
        }
        self.visited = latest(self.visited, other.visited);
        if !other.capability.is_empty() {
            self.capability.clone_from(&other.capability);
        }
    }
}

/// A labeled edge between two graph models.
pub trait GraphRelationship: Model {
    /// Node type at either end.
    type Node: GraphModel;

    /// The graph relationship label, e.g. `DISCOVERED`.
    fn label(&self) -> &'static str;

    /// `(source, target)` endpoints.
    fn nodes(&self) -> (&Self::Node, &Self::Node);

    /// Shared metadata.
    fn base(&self) -> &RelationshipBase;

    /// Mutable shared metadata.
    fn base_mut(&mut self) -> &mut RelationshipBase;

    /// Fold a later observation of the same relationship into this one.
    fn visit(&mut self, other: &Self) {
        let other = other.base().clone();
        self.base_mut().visit(&other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relationship_base_visit_never_moves_backwards() {
        let early = Timestamp::parse("2026-01-01T00:00:00Z").ok();
        let late = Timestamp::parse("2026-02-01T00:00:00Z").ok();
        let mut base = RelationshipBase {
            created: early,
            visited: late,
            capability: "nmap".into(),
            ..Default::default()
        };
        base.visit(&RelationshipBase {
            created: late,
            visited: early,
            capability: String::new(),
            ..Default::default()
        });
        assert_eq!(base.created, early);
        assert_eq!(base.visited, late);
        assert_eq!(base.capability, "nmap");
    }

    #[test]
    fn relationship_base_visit_takes_new_capability() {
        let mut base = RelationshipBase::default();
        base.visit(&RelationshipBase {
            capability: "whois".into(),
            visited: Timestamp::parse("2026-02-01T00:00:00Z").ok(),
            ..Default::default()
        });
        assert_eq!(base.capability, "whois");
        assert!(base.visited.is_some());
    }
}
