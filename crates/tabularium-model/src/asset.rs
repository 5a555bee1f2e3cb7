//! # Asset
//!
//! A host-level target: a domain, an IP address, or a CIDR range, grouped
//! under the DNS name it was discovered from.
//!
//! Key: `#asset#<dns>#<name>`. Both components are punycoded and
//! lowercased; `name` defaults to `dns` and absorbs truncation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use tabularium_core::normalize::{ascii_host, is_cidr, is_private_host, parse_ip};
use tabularium_core::temporal::ttl_in_days;
use tabularium_core::{
    Assetlike, GraphModel, Hook, HookError, HookResult, Key, KeyPattern, KeySchema, Model, Target,
    Timestamp, CEILING_2048,
};

use crate::history::History;
use crate::lifecycle;
use crate::reconcile::{self, StatusLedger, SEED_LABEL, SEED_SOURCE, SELF_SOURCE};

/// Discriminator.
pub const ASSET: &str = "asset";

/// Days an unobserved asset lives before the store may expire it.
pub const ASSET_TTL_DAYS: i64 = 7;

const SCHEMA: KeySchema<2> = KeySchema::lowercase(ASSET, 1, CEILING_2048);
static PATTERN: KeyPattern = KeyPattern::new(r"^#asset#[^#]+#[^#]+$");

/// Host suffixes that identify a cloud provider, and the tag each implies.
const CLOUD_SUFFIXES: &[(&str, &str)] = &[
    (".amazonaws.com", "aws"),
    (".cloudfront.net", "aws"),
    (".awsglobalaccelerator.com", "aws"),
    (".azurewebsites.net", "azure"),
    (".cloudapp.azure.com", "azure"),
    (".blob.core.windows.net", "azure"),
    (".azureedge.net", "azure"),
    (".appspot.com", "gcp"),
    (".googleusercontent.com", "gcp"),
    (".run.app", "gcp"),
    (".cloudfunctions.net", "gcp"),
];

/// What kind of host an asset names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    /// A DNS name.
    Domain,
    /// An IPv4 address.
    Ipv4,
    /// An IPv6 address.
    Ipv6,
    /// An address range.
    Cidr,
}

impl AssetClass {
    /// Classify a normalized host string.
    pub fn of(host: &str) -> Self {
        if is_cidr(host) {
            return Self::Cidr;
        }
        match parse_ip(host) {
            Some(ip) if ip.is_ipv4() => Self::Ipv4,
            Some(_) => Self::Ipv6,
            None => Self::Domain,
        }
    }

    /// Lowercase class name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Domain => "domain",
            Self::Ipv4 => "ipv4",
            Self::Ipv6 => "ipv6",
            Self::Cidr => "cidr",
        }
    }
}

/// A host-level asset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Asset {
    /// Canonical key.
    pub key: Key,
    /// DNS name the asset was discovered under.
    pub dns: String,
    /// Host name or address.
    pub name: String,
    /// Provenance: `self`, `seed`, or `provided`.
    pub source: String,
    /// Lifecycle status code.
    pub status: String,
    /// Derived host class.
    pub class: Option<AssetClass>,
    /// Whether the host sits in a private address range.
    pub private: bool,
    /// Free-form and derived tags.
    pub tags: BTreeSet<String>,
    /// Capabilities that have observed the asset.
    pub origins: BTreeSet<String>,
    /// First recorded.
    pub created: Option<Timestamp>,
    /// Last status change.
    pub updated: Option<Timestamp>,
    /// Last observed.
    pub visited: Option<Timestamp>,
    /// Expiry, in epoch seconds. Zero never expires.
    pub ttl: i64,
    /// Status transitions.
    pub history: History,
    /// User comment.
    pub comment: String,
    /// Graph label the store still has to apply to an existing node.
    pub pending_label_addition: Option<String>,
}

impl Asset {
    /// Build and normalize an asset.
    pub fn new(dns: &str, name: &str) -> Result<Self, HookError> {
        Self {
            dns: dns.to_string(),
            name: name.to_string(),
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
}

// ─── Hooks ───────────────────────────────────────────────────────────

static HOOKS: [Hook<Asset>; 5] = [
    Hook::new("normalize hosts", normalize_hosts),
    Hook::new("classify", classify),
    Hook::new("tag private ranges", tag_private),
    Hook::new("derive cloud tags", derive_cloud_tags),
    Hook::new("compute key", compute_key),
];

fn normalize_hosts(mut a: Asset) -> HookResult<Asset> {
    a.dns = ascii_host(&a.dns)?;
    let name = ascii_host(&a.name)?;
    a.name = if name.is_empty() { a.dns.clone() } else { name };
    Ok(a)
}

fn classify(mut a: Asset) -> HookResult<Asset> {
    if !a.name.is_empty() {
        a.class = Some(AssetClass::of(&a.name));
    }
    Ok(a)
}

fn tag_private(mut a: Asset) -> HookResult<Asset> {
    a.private = is_private_host(&a.name) || is_private_host(&a.dns);
    Ok(a)
}

fn derive_cloud_tags(mut a: Asset) -> HookResult<Asset> {
    for host in [&a.dns, &a.name] {
        for (suffix, tag) in CLOUD_SUFFIXES {
            if host.ends_with(suffix) {
                a.tags.insert((*tag).to_string());
            }
        }
    }
    Ok(a)
}

fn compute_key(mut a: Asset) -> HookResult<Asset> {
    a.key = SCHEMA.build([&a.dns, &a.name]);
    Ok(a)
}

// ─── Capabilities ────────────────────────────────────────────────────

impl Model for Asset {
    fn discriminator(&self) -> &'static str {
        ASSET
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
            self.ttl = ttl_in_days(ASSET_TTL_DAYS);
        }
        self
    }

    fn hooks() -> &'static [Hook<Self>] {
        &HOOKS
    }
}

impl GraphModel for Asset {
    fn key(&self) -> &Key {
        &self.key
    }

    fn labels(&self) -> Vec<String> {
        let mut labels = vec![ASSET.to_string()];
        if self.source == SEED_SOURCE {
            labels.push(SEED_LABEL.to_string());
        }
        labels
    }

    fn valid(&self) -> bool {
        PATTERN.matches(&self.key) && lifecycle::is_known(&self.status)
    }
}

impl Target for Asset {
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
        &self.dns
    }

    fn identifier(&self) -> &str {
        &self.name
    }

    fn is_class(&self, class: &str) -> bool {
        class == ASSET || self.class.is_some_and(|c| c.as_str() == class)
    }

    fn is_private(&self) -> bool {
        self.private
    }
}

impl Assetlike for Asset {
    fn merge(&mut self, update: &Self) {
        self.history.absorb(&update.history);
        self.ledger().transition(&update.status, &update.source, &update.comment);
        reconcile::take_string(&mut self.comment, &update.comment);
        reconcile::take_nonzero(&mut self.ttl, update.ttl);
        reconcile::replace_nonempty(&mut self.tags, &update.tags);
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
        reconcile::union(&mut self.tags, &observation.tags);
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

    fn asset(dns: &str, name: &str) -> Asset {
        Asset::new(dns, name).unwrap()
    }

    #[test]
    fn key_is_case_folded() {
        let a = asset("Example.COM", "WWW.Example.com");
        assert_eq!(a.key.as_str(), "#asset#example.com#www.example.com");
        assert_eq!(a.key, asset("example.com", "www.example.com").key);
        assert!(a.valid());
    }

    #[test]
    fn name_defaults_to_dns() {
        let a = asset("example.com", "");
        assert_eq!(a.name, "example.com");
        assert_eq!(a.key.as_str(), "#asset#example.com#example.com");
    }

    #[test]
    fn idn_hosts_are_punycoded() {
        let a = asset("Bücher.example", "");
        assert_eq!(a.dns, "xn--bcher-kva.example");
        assert!(a.valid());
    }

    #[test]
    fn classifies_and_tags_private_ranges() {
        let a = asset("example.com", "10.0.0.5");
        assert_eq!(a.class, Some(AssetClass::Ipv4));
        assert!(a.is_private());
        assert!(a.is_class("ipv4"));
        assert!(a.is_class("asset"));

        let b = asset("example.com", "2001:db8::1");
        assert_eq!(b.class, Some(AssetClass::Ipv6));
        assert!(!b.is_private());

        let c = asset("example.com", "192.168.0.0/16");
        assert_eq!(c.class, Some(AssetClass::Cidr));
        assert!(c.is_private());

        assert_eq!(asset("example.com", "").class, Some(AssetClass::Domain));
    }

    #[test]
    fn derives_cloud_tags() {
        let a = asset("example.com", "bucket.s3.amazonaws.com");
        assert!(a.tags.contains("aws"));
        let g = asset("app.appspot.com", "");
        assert!(g.tags.contains("gcp"));
    }

    #[test]
    fn missing_dns_is_invalid_not_an_error() {
        let a = asset("", "");
        assert_eq!(a.key.as_str(), "#asset##");
        assert!(!a.valid());
    }

    #[test]
    fn pipeline_is_idempotent() {
        let a = asset("Example.com", "1.2.3.4");
        let again = a.clone().normalized().unwrap();
        assert_eq!(a, again);
    }

    #[test]
    fn target_surface() {
        let a = asset("example.com", "www.example.com");
        assert_eq!(a.group(), "example.com");
        assert_eq!(a.identifier(), "www.example.com");
        assert!(a.is_status("A"));
        let frozen = a.with_status(lifecycle::FROZEN);
        assert!(frozen.is_status("F"));
        assert!(!frozen.is_status(""));
    }

    #[test]
    fn merge_overwrites_explicit_fields_only() {
        let mut a = asset("example.com", "www.example.com");
        let created = a.created;
        let update = Asset {
            status: lifecycle::FROZEN.to_string(),
            comment: "frozen by ops".into(),
            created: Timestamp::parse("2020-01-01T00:00:00Z").ok(),
            ..Default::default()
        };
        a.merge(&update);
        assert_eq!(a.status, "F");
        assert_eq!(a.comment, "frozen by ops");
        assert_eq!(a.created, created);
        assert_eq!(a.history.len(), 1);

        let before = a.clone();
        a.merge(&Asset::default());
        assert_eq!(a, before);
    }

    #[test]
    fn merge_absorbs_history() {
        let mut a = asset("example.com", "");
        let mut update = a.clone();
        update.history.update("A", "F", "alice", "");
        update.status = String::new();
        a.merge(&update);
        assert_eq!(a.history.len(), 1);
        assert_eq!(a.history.records()[0].source, "alice");
    }

    #[test]
    fn visit_unions_tags() {
        let mut a = asset("example.com", "");
        a.tags = ["a", "b"].iter().map(|s| s.to_string()).collect();
        let mut obs = a.clone();
        obs.tags = ["b", "c"].iter().map(|s| s.to_string()).collect();
        a.visit(&obs);
        assert_eq!(a.tags.len(), 3);

        obs.tags.clear();
        a.visit(&obs);
        assert_eq!(a.tags.len(), 3);
    }

    #[test]
    fn visit_advances_pending_and_revives_deleted() {
        let mut a = asset("example.com", "").with_status(lifecycle::PENDING);
        let obs = asset("example.com", "");
        a.visit(&obs);
        assert_eq!(a.status, "A");

        let mut d = obs.with_status(lifecycle::DELETED);
        d.visit(&obs);
        assert_eq!(d.status, "A");
        assert_eq!(d.history.last().map(|r| r.from.as_str()), Some("D"));
    }

    #[test]
    fn visit_keeps_frozen() {
        let obs = asset("example.com", "");
        let mut f = obs.with_status(lifecycle::FROZEN);
        f.visit(&obs);
        assert_eq!(f.status, "F");
        assert!(f.history.is_empty());
    }

    #[test]
    fn seed_promotion_on_visit() {
        let mut a = asset("example.com", "");
        assert_eq!(a.source, SELF_SOURCE);
        let mut seed = a.clone();
        seed.set_source(SEED_SOURCE);
        a.visit(&seed);
        assert_eq!(a.source, SEED_SOURCE);
        assert_eq!(a.pending_label_addition.as_deref(), Some(SEED_LABEL));
        assert_eq!(a.history.len(), 1);
        assert!(a.labels().contains(&SEED_LABEL.to_string()));

        // A seed observed again by discovery stays a seed.
        let mut s = seed.clone();
        s.visit(&asset("example.com", ""));
        assert_eq!(s.source, SEED_SOURCE);
        assert!(s.history.is_empty());
        assert!(s.pending_label_addition.is_none());
    }

    #[test]
    fn labels_include_discriminator() {
        assert_eq!(asset("example.com", "").labels(), vec![ASSET.to_string()]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Normalizing an already-normalized asset changes nothing.
        #[test]
        fn normalization_is_idempotent(dns in "[a-zA-Z0-9-]{1,20}\\.[a-zA-Z]{2,6}", host in "[a-zA-Z0-9.-]{0,30}") {
            if let Ok(a) = Asset::new(&dns, &host) {
                let again = a.clone().normalized().unwrap();
                prop_assert_eq!(a, again);
            }
        }

        /// Case variants collapse to one key.
        #[test]
        fn case_variants_share_a_key(dns in "[a-z0-9]{1,20}\\.[a-z]{2,6}") {
            let lower = Asset::new(&dns, "").unwrap();
            let upper = Asset::new(&dns.to_uppercase(), "").unwrap();
            prop_assert_eq!(lower.key, upper.key);
        }
    }
}
