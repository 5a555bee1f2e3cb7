//! # Port
//!
//! An open port on an asset.
//!
//! Key: `#port#<protocol>#<port>#<parent asset key without leading #>`.
//! The embedded parent key is the variable component.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use tabularium_core::normalize::{fold_case, is_private_host};
use tabularium_core::temporal::ttl_in_days;
use tabularium_core::{
    Assetlike, GraphModel, Hook, HookError, HookFailure, HookResult, Key, KeyPattern, KeySchema,
    Model, Target, Timestamp, CEILING_2048,
};

use crate::asset::Asset;
use crate::history::History;
use crate::lifecycle;
use crate::reconcile::{self, StatusLedger, SEED_LABEL, SEED_SOURCE, SELF_SOURCE};

/// Discriminator.
pub const PORT: &str = "port";

/// Days an unobserved port lives before the store may expire it.
pub const PORT_TTL_DAYS: i64 = 7;

const SCHEMA: KeySchema<3> = KeySchema::lowercase(PORT, 2, CEILING_2048);
static PATTERN: KeyPattern =
    KeyPattern::new(r"^#port#(tcp|udp)#[0-9]{1,5}#asset#[^#]+#[^#]+$");

/// An open port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Port {
    /// Canonical key.
    pub key: Key,
    /// Key of the asset the port is open on.
    pub parent: Key,
    /// `tcp` or `udp`.
    pub protocol: String,
    /// Port number.
    pub port: u16,
    /// Identified service, e.g. `https`.
    pub service: String,
    /// Parent asset's DNS group.
    pub group: String,
    /// `<host>:<port>`.
    pub identifier: String,
    /// Provenance.
    pub source: String,
    /// Lifecycle status code.
    pub status: String,
    /// Capabilities that have observed the port.
    pub origins: BTreeSet<String>,
    /// First recorded.
    pub created: Option<Timestamp>,
    /// Last status change.
    pub updated: Option<Timestamp>,
    /// Last observed.
    pub visited: Option<Timestamp>,
    /// Expiry, in epoch seconds.
    pub ttl: i64,
    /// Status transitions.
    pub history: History,
    /// User comment.
    pub comment: String,
    /// Graph label the store still has to apply to an existing node.
    pub pending_label_addition: Option<String>,
}

impl Port {
    /// Build and normalize a port on `parent`.
    pub fn new(parent: &Asset, protocol: &str, port: u16) -> Result<Self, HookError> {
        Self {
            parent: parent.key.clone(),
            protocol: protocol.to_string(),
            port,
            ..Default::default()
        }
        .normalized()
    }

    fn ledger(&mut self) -> StatusLedger<'_> {
        StatusLedger {
            status: &mut self.status,
            history: &mut self.history,
            updated: &mut self.updated,
        }
    }

    fn host(&self) -> Option<&str> {
        self.parent.segments().nth(2)
    }
}

// ─── Hooks ───────────────────────────────────────────────────────────

static HOOKS: [Hook<Port>; 4] = [
    Hook::new("validate protocol", validate_protocol),
    Hook::new("validate port number", validate_port),
    Hook::new("derive group and identifier", derive_group),
    Hook::new("compute key", compute_key),
];

fn validate_protocol(mut p: Port) -> HookResult<Port> {
    p.protocol = fold_case(&p.protocol);
    match p.protocol.as_str() {
        "tcp" | "udp" => Ok(p),
        other => Err(HookFailure::new(format!("unsupported protocol {other:?}"))),
    }
}

fn validate_port(p: Port) -> HookResult<Port> {
    if p.port == 0 {
        return Err(HookFailure::new("port must be in 1..=65535"));
    }
    Ok(p)
}

fn derive_group(mut p: Port) -> HookResult<Port> {
    let (group, host) = {
        let mut segments = p.parent.segments().skip(1);
        let group = segments.next().unwrap_or_default().to_string();
        let host = segments.next().unwrap_or_default().to_string();
        (group, host)
    };
    p.identifier = format!("{host}:{}", p.port);
    p.group = group;
    Ok(p)
}

fn compute_key(mut p: Port) -> HookResult<Port> {
    let number = p.port.to_string();
    p.key = SCHEMA.build([&p.protocol, &number, p.parent.embedded()]);
    Ok(p)
}

// ─── Capabilities ────────────────────────────────────────────────────

impl Model for Port {
    fn discriminator(&self) -> &'static str {
        PORT
    }

    fn defaulted(mut self) -> Self {
        let now = Timestamp::now();
        if self.status.is_empty() {
            self.status = lifecycle::ACTIVE.to_string();
        }
        if self.source.is_empty() {
            self.source = SELF_SOURCE.to_string();
        }
        self.created.get_or_insert(now);
        self.visited.get_or_insert(now);
        if self.ttl == 0 {
            self.ttl = ttl_in_days(PORT_TTL_DAYS);
        }
        self
    }

    fn hooks() -> &'static [Hook<Self>] {
        &HOOKS
    }
}

impl GraphModel for Port {
    fn key(&self) -> &Key {
        &self.key
    }

    fn labels(&self) -> Vec<String> {
        let mut labels = vec![PORT.to_string()];
        if self.source == SEED_SOURCE {
            labels.push(SEED_LABEL.to_string());
        }
        labels
    }

    fn valid(&self) -> bool {
        PATTERN.matches(&self.key) && lifecycle::is_known(&self.status)
    }
}

impl Target for Port {
    fn status(&self) -> &str {
        &self.status
    }

    fn with_status(&self, status: &str) -> Self {
        Self {
            status: status.to_string(),
            ..self.clone()
        }
    }

    fn group(&self) -> &str {
        &self.group
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn is_class(&self, class: &str) -> bool {
        class == PORT || class == self.protocol || (!class.is_empty() && class == self.service)
    }

    fn is_private(&self) -> bool {
        self.host().is_some_and(is_private_host)
    }
}

impl Assetlike for Port {
    fn merge(&mut self, update: &Self) {
        self.history.absorb(&update.history);
        self.ledger().transition(&update.status, &update.source, &update.comment);
        reconcile::take_string(&mut self.service, &update.service);
        reconcile::take_string(&mut self.comment, &update.comment);
        reconcile::take_nonzero(&mut self.ttl, update.ttl);
        reconcile::union(&mut self.origins, &update.origins);
        reconcile::keep_created(&mut self.created, update.created);
        reconcile::advance_visited(&mut self.visited, update.visited);
        if update.pending_label_addition.is_some() {
            self.pending_label_addition.clone_from(&update.pending_label_addition);
        }
    }

    fn visit(&mut self, observation: &Self) {
        if let Some(next) = lifecycle::visit_status(&self.status, &observation.status) {
            self.ledger().transition(&next, &observation.source, "observed");
        }
        if self.service.is_empty() {
            self.service.clone_from(&observation.service);
        }
        reconcile::union(&mut self.origins, &observation.origins);
        reconcile::keep_created(&mut self.created, observation.created);
        reconcile::advance_visited(&mut self.visited, observation.visited);
        reconcile::extend_ttl(&mut self.ttl, observation.ttl);
        reconcile::promote_seed(
            &mut self.source,
            &mut self.pending_label_addition,
            &mut self.history,
            &self.status,
            &observation.source,
        );
    }

    fn set_source(&mut self, source: &str) {
        self.source = source.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parent() -> Asset {
        Asset::new("example.com", "10.0.0.1").unwrap()
    }

    #[test]
    fn key_embeds_parent() {
        let p = Port::new(&parent(), "TCP", 443).unwrap();
        assert_eq!(p.key.as_str(), "#port#tcp#443#asset#example.com#10.0.0.1");
        assert_eq!(p.group(), "example.com");
        assert_eq!(p.identifier(), "10.0.0.1:443");
        assert!(p.valid());
        assert!(p.is_private());
        assert!(p.is_class("tcp"));
    }

    #[test]
    fn short_parent_key_leaves_group_empty() {
        let p = Port {
            parent: Key::from_raw("#asset"),
            protocol: "udp".into(),
            port: 53,
            ..Default::default()
        }
        .normalized()
        .unwrap();
        assert_eq!(p.group, "");
        assert_eq!(p.identifier, ":53");
        assert!(!p.valid());
    }

    #[test]
    fn rejects_bad_protocol() {
        let err = Port::new(&parent(), "sctp", 80).unwrap_err();
        assert_eq!(err.entity, PORT);
        assert_eq!(err.hook, "validate protocol");
    }

    #[test]
    fn rejects_port_zero() {
        let err = Port::new(&parent(), "udp", 0).unwrap_err();
        assert_eq!(err.hook, "validate port number");
    }

    #[test]
    fn visit_fills_service_once() {
        let mut p = Port::new(&parent(), "tcp", 443).unwrap();
        let mut obs = p.clone();
        obs.service = "https".into();
        p.visit(&obs);
        assert_eq!(p.service, "https");
        obs.service = "http".into();
        p.visit(&obs);
        assert_eq!(p.service, "https");

        let mut update = Port::default();
        update.service = "http-alt".into();
        p.merge(&update);
        assert_eq!(p.service, "http-alt");
        assert!(p.is_class("http-alt"));
    }

    #[test]
    fn pipeline_is_idempotent() {
        let p = Port::new(&parent(), "udp", 53).unwrap();
        assert_eq!(p.clone().normalized().unwrap(), p);
    }
}
