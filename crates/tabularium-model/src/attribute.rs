//! # Attribute
//!
//! A name/value fact about another model, e.g. `port = 443` or
//! `technology = nginx` on an asset.
//!
//! Key: `#attribute#<name>#<value>#<source key without leading #>`, capped
//! at 1024 bytes. Values can be long (banners, headers), so `value` is the
//! component that absorbs truncation.

use serde::{Deserialize, Serialize};

use tabularium_core::normalize::{fold_case, nfc};
use tabularium_core::temporal::ttl_in_days;
use tabularium_core::{
    GraphModel, Hook, HookError, HookResult, Key, KeyPattern, KeySchema, Model, Timestamp,
    CEILING_1024,
};

use crate::history::History;
use crate::lifecycle;
use crate::reconcile::{self, StatusLedger};

/// Discriminator.
pub const ATTRIBUTE: &str = "attribute";

/// Days an attribute lives without being observed again.
pub const ATTRIBUTE_TTL_DAYS: i64 = 7;

const SCHEMA: KeySchema<3> = KeySchema::lowercase(ATTRIBUTE, 1, CEILING_1024);
static PATTERN: KeyPattern = KeyPattern::new(r"^#attribute#[^#]+#.+#[a-z]+#.+$");

/// A fact about another model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attribute {
    /// Canonical key.
    pub key: Key,
    /// Attribute name.
    pub name: String,
    /// Attribute value, display case preserved.
    pub value: String,
    /// Key of the model the attribute describes.
    pub source: Key,
    /// Capability that reported it.
    pub capability: String,
    /// Lifecycle status code.
    pub status: String,
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
}

impl Attribute {
    /// Build and normalize an attribute of `source`.
    pub fn new(source: &impl GraphModel, name: &str, value: &str) -> Result<Self, HookError> {
        Self {
            source: source.key().clone(),
            name: name.to_string(),
            value: value.to_string(),
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

    /// Authoritative update.
    pub fn merge(&mut self, update: &Attribute) {
        self.history.absorb(&update.history);
        self.ledger().transition(&update.status, &update.capability, "");
        reconcile::take_string(&mut self.capability, &update.capability);
        reconcile::take_nonzero(&mut self.ttl, update.ttl);
        reconcile::keep_created(&mut self.created, update.created);
        reconcile::advance_visited(&mut self.visited, update.visited);
    }

    /// Passive re-observation; refreshes the TTL.
    pub fn visit(&mut self, observation: &Attribute) {
        if let Some(next) = lifecycle::visit_status(&self.status, &observation.status) {
            self.ledger().transition(&next, &observation.capability, "observed");
        }
        reconcile::take_string(&mut self.capability, &observation.capability);
        reconcile::keep_created(&mut self.created, observation.created);
        reconcile::advance_visited(&mut self.visited, observation.visited);
        reconcile::extend_ttl(&mut self.ttl, observation.ttl);
    }
}

static HOOKS: [Hook<Attribute>; 2] = [
    Hook::new("normalize name and value", normalize),
    Hook::new("compute key", compute_key),
];

fn normalize(mut a: Attribute) -> HookResult<Attribute> {
    a.name = fold_case(&a.name);
    a.value = nfc(&a.value);
    Ok(a)
}

fn compute_key(mut a: Attribute) -> HookResult<Attribute> {
    a.key = SCHEMA.build([&a.name, &a.value, a.source.embedded()]);
    Ok(a)
}

impl Model for Attribute {
    fn discriminator(&self) -> &'static str {
        ATTRIBUTE
    }

    fn defaulted(mut self) -> Self {
        let now = Timestamp::now();
        if self.status.is_empty() {
            self.status = lifecycle::ACTIVE.to_string();
        }
        self.created.get_or_insert(now);
        self.visited.get_or_insert(now);
        if self.ttl == 0 {
            self.ttl = ttl_in_days(ATTRIBUTE_TTL_DAYS);
        }
        self
    }

    fn hooks() -> &'static [Hook<Self>] {
        &HOOKS
    }
}

impl GraphModel for Attribute {
    fn key(&self) -> &Key {
        &self.key
    }

    fn labels(&self) -> Vec<String> {
        vec![ATTRIBUTE.to_string()]
    }

    fn valid(&self) -> bool {
        PATTERN.matches(&self.key) && lifecycle::is_known(&self.status)
    }
}
