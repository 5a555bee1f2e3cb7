//! # Active Directory Objects
//!
//! One struct covers the AD object family. The stored `object_class`
//! decides the discriminator the value labels itself with, so a user and a
//! computer share a key space but carry different graph labels.
//!
//! Key: `#adobject#<domain>#<object id>`. Object ids are canonicalized
//! first: GUIDs to upper-case hyphenated form, SIDs to upper case.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tabularium_core::normalize::{ascii_host, nfc};
use tabularium_core::temporal::ttl_in_days;
use tabularium_core::{
    Assetlike, GraphModel, Hook, HookError, HookResult, Key, KeyPattern, KeySchema, Model, Target,
    Timestamp, CEILING_2048,
};

use crate::history::History;
use crate::lifecycle;
use crate::reconcile::{self, StatusLedger, SEED_LABEL, SEED_SOURCE, SELF_SOURCE};

/// Discriminator of an unclassified AD object, and the key prefix.
pub const ADOBJECT: &str = "adobject";

/// Days an unobserved AD object lives before the store may expire it.
pub const ADOBJECT_TTL_DAYS: i64 = 7;

const SCHEMA: KeySchema<2> = KeySchema::lowercase(ADOBJECT, 1, CEILING_2048);
static PATTERN: KeyPattern = KeyPattern::new(r"^#adobject#[^#]+#[^#]+$");

/// The kind of AD object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdObjectClass {
    /// Not yet classified.
    #[default]
    Object,
    /// A user account.
    User,
    /// A computer account.
    Computer,
    /// A security or distribution group.
    Group,
    /// A group policy object.
    Gpo,
    /// An organizational unit.
    Ou,
    /// The domain object itself.
    Domain,
}

impl AdObjectClass {
    /// Every class, unclassified first.
    pub const ALL: [AdObjectClass; 7] = [
        Self::Object,
        Self::User,
        Self::Computer,
        Self::Group,
        Self::Gpo,
        Self::Ou,
        Self::Domain,
    ];

    /// The discriminator values of this class label themselves with.
    pub fn discriminator(self) -> &'static str {
        match self {
            Self::Object => ADOBJECT,
            Self::User => "aduser",
            Self::Computer => "adcomputer",
            Self::Group => "adgroup",
            Self::Gpo => "adgpo",
            Self::Ou => "adou",
            Self::Domain => "addomain",
        }
    }

    /// The class registered under `discriminator`, case-insensitively.
    pub fn from_discriminator(discriminator: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.discriminator().eq_ignore_ascii_case(discriminator.trim()))
    }

    /// Best-effort classification from a distinguished name.
    pub fn from_distinguished_name(dn: &str) -> Option<Self> {
        let dn = dn.trim().to_ascii_uppercase();
        if dn.is_empty() {
            return None;
        }
        if dn.starts_with("DC=") {
            Some(Self::Domain)
        } else if dn.starts_with("OU=") {
            Some(Self::Ou)
        } else if dn.contains(",CN=POLICIES,CN=SYSTEM,") {
            Some(Self::Gpo)
        } else if dn.contains(",CN=COMPUTERS,") || dn.contains(",OU=DOMAIN CONTROLLERS,") {
            Some(Self::Computer)
        } else {
            None
        }
    }
}

/// Canonical form of an AD object identifier.
pub fn canonical_object_id(raw: &str) -> String {
    let id = nfc(raw);
    if let Ok(guid) = Uuid::parse_str(&id) {
        return guid.hyphenated().to_string().to_uppercase();
    }
    if id.get(..2).is_some_and(|p| p.eq_ignore_ascii_case("s-")) {
        return id.to_uppercase();
    }
    id
}

/// An Active Directory object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdObject {
    /// Canonical key.
    pub key: Key,
    /// DNS name of the AD domain.
    pub domain: String,
    /// Object GUID or SID.
    pub object_id: String,
    /// Object kind.
    pub object_class: AdObjectClass,
    /// Account or display name.
    pub name: String,
    /// Distinguished name.
    pub distinguished_name: String,
    /// Provenance.
    pub source: String,
    /// Lifecycle status code.
    pub status: String,
    /// Capabilities that have observed the object.
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

impl AdObject {
    /// Build and normalize an AD object.
    pub fn new(
        domain: &str,
        object_id: &str,
        object_class: AdObjectClass,
    ) -> Result<Self, HookError> {
        Self {
            domain: domain.to_string(),
            object_id: object_id.to_string(),
            object_class,
            ..Default::default()
        }
        .normalized()
    }

    /// A zero value pre-classified for `class`.
    pub fn of_class(object_class: AdObjectClass) -> Self {
        Self {
            object_class,
            ..Default::default()
        }
    }

    /// Adopt the class named by `discriminator` if still unclassified.
    pub fn specialize(&mut self, discriminator: &str) {
        if self.object_class == AdObjectClass::Object {
            if let Some(class) = AdObjectClass::from_discriminator(discriminator) {
                self.object_class = class;
            }
        }
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

static HOOKS: [Hook<AdObject>; 4] = [
    Hook::new("normalize domain", normalize_domain),
    Hook::new("canonicalize object id", canonicalize_id),
    Hook::new("classify from distinguished name", classify),
    Hook::new("compute key", compute_key),
];

fn normalize_domain(mut o: AdObject) -> HookResult<AdObject> {
    o.domain = ascii_host(&o.domain)?;
    o.name = nfc(&o.name);
    o.distinguished_name = nfc(&o.distinguished_name);
    Ok(o)
}

fn canonicalize_id(mut o: AdObject) -> HookResult<AdObject> {
    o.object_id = canonical_object_id(&o.object_id);
    Ok(o)
}

fn classify(mut o: AdObject) -> HookResult<AdObject> {
    if o.object_class == AdObjectClass::Object {
        if let Some(class) = AdObjectClass::from_distinguished_name(&o.distinguished_name) {
            o.object_class = class;
        }
    }
    Ok(o)
}

fn compute_key(mut o: AdObject) -> HookResult<AdObject> {
    o.key = SCHEMA.build([&o.domain, &o.object_id]);
    Ok(o)
}

// ─── Capabilities ────────────────────────────────────────────────────

impl Model for AdObject {
    fn discriminator(&self) -> &'static str {
        self.object_class.discriminator()
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
            self.ttl = ttl_in_days(ADOBJECT_TTL_DAYS);
        }
        self
    }

    fn hooks() -> &'static [Hook<Self>] {
        &HOOKS
    }
}

impl GraphModel for AdObject {
    fn key(&self) -> &Key {
        &self.key
    }

    fn labels(&self) -> Vec<String> {
        let mut labels = vec![ADOBJECT.to_string()];
        if self.object_class != AdObjectClass::Object {
            labels.push(self.object_class.discriminator().to_string());
        }
        if self.source == SEED_SOURCE {
            labels.push(SEED_LABEL.to_string());
        }
        labels
    }

    fn valid(&self) -> bool {
        PATTERN.matches(&self.key) && lifecycle::is_known(&self.status)
    }
}

impl Target for AdObject {
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
        &self.domain
    }

    fn identifier(&self) -> &str {
        &self.object_id
    }

    fn is_class(&self, class: &str) -> bool {
        class.eq_ignore_ascii_case(ADOBJECT)
            || class.eq_ignore_ascii_case(self.object_class.discriminator())
    }

    fn is_private(&self) -> bool {
        false
    }
}

impl Assetlike for AdObject {
    fn merge(&mut self, update: &Self) {
        self.history.absorb(&update.history);
        self.ledger().transition(&update.status, &update.source, &update.comment);
        if update.object_class != AdObjectClass::Object {
            self.object_class = update.object_class;
        }
        reconcile::take_string(&mut self.name, &update.name);
        reconcile::take_string(&mut self.distinguished_name, &update.distinguished_name);
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
        if self.object_class == AdObjectClass::Object {
            self.object_class = observation.object_class;
        }
        if self.name.is_empty() {
            self.name.clone_from(&observation.name);
        }
        if self.distinguished_name.is_empty() {
            self.distinguished_name.clone_from(&observation.distinguished_name);
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
