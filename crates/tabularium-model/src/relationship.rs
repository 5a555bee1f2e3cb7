//! # Relationships
//!
//! Labeled edges between two graph models. The set of labels is closed:
//! each label is a [`RelationshipLabel`] variant with a graph label
//! (`HAS_PORT`) and a lower-case discriminator (`has_port`).
//!
//! Key: `#<discriminator>` followed by the source key and the target key,
//! e.g. `#has_port#asset#example.com#example.com#port#tcp#443#asset#...`.

use serde::{Deserialize, Serialize};

use tabularium_core::{
    DecodeError, GraphModel, GraphRelationship, Hook, HookError, HookResult, Key, Model,
    RelationshipBase, Timestamp,
};

use crate::any::AnyModel;

/// A relationship label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipLabel {
    /// One model led to the discovery of another.
    Discovered,
    /// A target carries a risk.
    HasVulnerability,
    /// A model carries an attribute.
    HasAttribute,
    /// An asset has an open port.
    HasPort,
    /// An asset serves a web application.
    HasWebApplication,
}

impl RelationshipLabel {
    /// Every label.
    pub const ALL: [RelationshipLabel; 5] = [
        Self::Discovered,
        Self::HasVulnerability,
        Self::HasAttribute,
        Self::HasPort,
        Self::HasWebApplication,
    ];

    /// Graph relationship label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Discovered => "DISCOVERED",
            Self::HasVulnerability => "HAS_VULNERABILITY",
            Self::HasAttribute => "HAS_ATTRIBUTE",
            Self::HasPort => "HAS_PORT",
            Self::HasWebApplication => "HAS_WEBAPPLICATION",
        }
    }

    /// Discriminator used in keys and envelopes.
    pub fn discriminator(self) -> &'static str {
        match self {
            Self::Discovered => "discovered",
            Self::HasVulnerability => "has_vulnerability",
            Self::HasAttribute => "has_attribute",
            Self::HasPort => "has_port",
            Self::HasWebApplication => "has_webapplication",
        }
    }
}

impl std::fmt::Display for RelationshipLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for RelationshipLabel {
    type Err = DecodeError;

    /// Accepts the graph label or the discriminator, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|l| l.discriminator().eq_ignore_ascii_case(s) || l.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| DecodeError::UnknownRelationship(s.to_string()))
    }
}

/// An edge between two models.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    /// The edge label.
    pub label: RelationshipLabel,
    /// Source endpoint.
    pub source: Box<AnyModel>,
    /// Target endpoint.
    pub target: Box<AnyModel>,
    /// Shared metadata.
    pub base: RelationshipBase,
}

impl Relationship {
    /// A zero-value relationship with the given endpoints.
    pub fn unnormalized(
        label: RelationshipLabel,
        source: impl Into<AnyModel>,
        target: impl Into<AnyModel>,
    ) -> Self {
        Self {
            label,
            source: Box::new(source.into()),
            target: Box::new(target.into()),
            base: RelationshipBase::default(),
        }
    }

    /// Build and normalize a relationship.
    pub fn new(
        label: RelationshipLabel,
        source: impl Into<AnyModel>,
        target: impl Into<AnyModel>,
    ) -> Result<Self, HookError> {
        Self::unnormalized(label, source, target).normalized()
    }

    /// Record the capability that observed the relationship.
    pub fn with_capability(mut self, capability: &str) -> Self {
        self.base.capability = capability.to_string();
        self
    }

    /// The relationship key.
    pub fn key(&self) -> &Key {
        &self.base.key
    }

    /// Whether both endpoints are valid and the key has been computed.
    pub fn valid(&self) -> bool {
        !self.base.key.is_empty() && self.source.valid() && self.target.valid()
    }
}

static HOOKS: [Hook<Relationship>; 1] = [Hook::new("compute key", compute_key)];

fn compute_key(mut r: Relationship) -> HookResult<Relationship> {
    let key = format!(
        "#{}{}{}",
        r.label.discriminator(),
        r.source.key(),
        r.target.key()
    );
    r.base.key = Key::from_raw(key);
    Ok(r)
}

impl Model for Relationship {
    fn discriminator(&self) -> &'static str {
        self.label.discriminator()
    }

    fn defaulted(mut self) -> Self {
        let now = Timestamp::now();
        self.base.created.get_or_insert(now);
        self.base.visited.get_or_insert(now);
        self
    }

    fn hooks() -> &'static [Hook<Self>] {
        &HOOKS
    }
}

impl GraphRelationship for Relationship {
    type Node = AnyModel;

    fn label(&self) -> &'static str {
        self.label.label()
    }

    fn nodes(&self) -> (&AnyModel, &AnyModel) {
        (self.source.as_ref(), self.target.as_ref())
    }

    fn base(&self) -> &RelationshipBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RelationshipBase {
        &mut self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::Asset;
    use crate::port::Port;

    fn pair() -> (Asset, Port) {
        let asset = Asset::new("example.com", "").unwrap();
        let port = Port::new(&asset, "tcp", 443).unwrap();
        (asset, port)
    }

    #[test]
    fn key_concatenates_endpoints() {
        let (asset, port) = pair();
        let r = Relationship::new(RelationshipLabel::HasPort, asset, port).unwrap();
        assert_eq!(
            r.key().as_str(),
            "#has_port#asset#example.com#example.com#port#tcp#443#asset#example.com#example.com"
        );
        assert_eq!(GraphRelationship::label(&r), "HAS_PORT");
        assert_eq!(r.discriminator(), "has_port");
        assert!(r.valid());
    }

    #[test]
    fn parses_labels_and_discriminators() {
        for label in RelationshipLabel::ALL {
            assert_eq!(label.discriminator().parse::<RelationshipLabel>().unwrap(), label);
            assert_eq!(label.label().parse::<RelationshipLabel>().unwrap(), label);
        }
        assert!(matches!(
            "OWNS".parse::<RelationshipLabel>(),
            Err(DecodeError::UnknownRelationship(_))
        ));
    }

    #[test]
    fn visit_refreshes_metadata() {
        let (asset, port) = pair();
        let mut r = Relationship::new(RelationshipLabel::HasPort, asset.clone(), port.clone()).unwrap();
        let created = r.base.created;
        let mut later = Relationship::new(RelationshipLabel::HasPort, asset, port)
            .unwrap()
            .with_capability("nmap");
        later.base.visited = Timestamp::parse("2999-01-01T00:00:00Z").ok();
        later.base.created = Timestamp::parse("2999-01-01T00:00:00Z").ok();
        GraphRelationship::visit(&mut r, &later);
        assert_eq!(r.base.capability, "nmap");
        assert_eq!(r.base.visited, later.base.visited);
        assert_eq!(r.base.created, created);
    }
}
