//! # Risk
//!
//! A finding attached to a target, identified by the target's group and the
//! finding name.
//!
//! Key: `#risk#<dns>#<name>`. The display name keeps its case; the key
//! component is case-folded. Status follows the state machine in
//! [`crate::risk_status`], and a risk only carries a TTL while it is in
//! Triage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use tabularium_core::normalize::{fold_case, nfc};
use tabularium_core::temporal::ttl_in_days;
use tabularium_core::{
    GraphModel, Hook, HookError, HookResult, Key, KeyPattern, KeySchema, Model, Target, Timestamp,
    CEILING_2048,
};

use crate::history::History;
use crate::reconcile;
use crate::risk_status::{self, RiskState, RiskStatus, RiskStatusError, Severity};

/// Discriminator.
pub const RISK: &str = "risk";

/// Days an untriaged risk lives before the store may expire it.
pub const TRIAGE_TTL_DAYS: i64 = 7;

const SCHEMA: KeySchema<2> = KeySchema::lowercase(RISK, 1, CEILING_2048);
static PATTERN: KeyPattern = KeyPattern::new(r"^#risk#[^#]+#[^#]+$");

/// Error building a risk.
#[derive(Error, Debug)]
pub enum RiskError {
    /// The status code did not parse.
    #[error(transparent)]
    Status(#[from] RiskStatusError),

    /// The hook pipeline rejected the risk.
    #[error(transparent)]
    Hook(#[from] HookError),
}

/// A risk (vulnerability or exposure) on a target.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Risk {
    /// Canonical key.
    pub key: Key,
    /// Group of the target the risk was found on.
    pub dns: String,
    /// Finding name, e.g. a CVE identifier.
    pub name: String,
    /// Status code; `""` on the wire when unspecified.
    #[serde(with = "risk_status::optional_code")]
    pub status: Option<RiskStatus>,
    /// Who or what last changed the risk.
    pub source: String,
    /// Derived from severity; lower is more urgent.
    pub priority: i32,
    /// Capability that reported the finding.
    pub capability: String,
    /// First recorded.
    pub created: Option<Timestamp>,
    /// Last state change.
    pub updated: Option<Timestamp>,
    /// Last observed.
    pub visited: Option<Timestamp>,
    /// Expiry, in epoch seconds. Zero never expires.
    pub ttl: i64,
    /// Status transitions.
    pub history: History,
    /// User comment.
    pub comment: String,
}

impl Risk {
    /// Build and normalize a risk on `target`.
    pub fn new(target: &impl Target, name: &str, status: &str) -> Result<Self, RiskError> {
        let status = RiskStatus::parse(status)?;
        let risk = Self {
            dns: target.group().to_string(),
            name: name.to_string(),
            status: Some(status),
            ..Default::default()
        }
        .normalized()?;
        Ok(risk)
    }

    /// Current workflow state.
    pub fn state(&self) -> Option<RiskState> {
        self.status.map(|s| s.state)
    }

    /// Current severity.
    pub fn severity(&self) -> Option<Severity> {
        self.status.and_then(|s| s.severity)
    }

    /// Whether the risk is awaiting triage.
    pub fn is_triage(&self) -> bool {
        self.status.is_some_and(|s| s.is_triage())
    }

    /// Authoritative update.
    ///
    /// The update's state wins, with its severity and substate when present.
    /// History is appended only when the state changes. Leaving Triage
    /// clears the TTL.
    pub fn merge(&mut self, update: &Risk) {
        self.history.absorb(&update.history);
        if let Some(incoming) = update.status {
            let next = match self.status {
                Some(current) => current.merged(&incoming),
                None => incoming,
            };
            self.apply_status(next, &update.source, &update.comment);
        }
        reconcile::take_string(&mut self.comment, &update.comment);
        reconcile::take_string(&mut self.capability, &update.capability);
        reconcile::keep_created(&mut self.created, update.created);
        reconcile::advance_visited(&mut self.visited, update.visited);
        if self.is_triage() {
            reconcile::take_nonzero(&mut self.ttl, update.ttl);
        }
    }

    /// Passive re-observation.
    ///
    /// State moves forward only, a remediated risk seen again is reopened,
    /// deleted risks are left alone, and severity is adopted only in Triage.
    pub fn visit(&mut self, observation: &Risk) {
        let next = match (self.status, observation.status) {
            (Some(current), Some(observed)) => current.visited(&observed),
            (None, observed) => observed,
            (Some(_), None) => None,
        };
        if let Some(next) = next {
            self.apply_status(next, &observation.source, "observed");
        }
        reconcile::take_string(&mut self.capability, &observation.capability);
        reconcile::keep_created(&mut self.created, observation.created);
        reconcile::advance_visited(&mut self.visited, observation.visited);
        if self.is_triage() {
            reconcile::extend_ttl(&mut self.ttl, observation.ttl);
        }
    }

    fn apply_status(&mut self, next: RiskStatus, source: &str, comment: &str) {
        let previous = self.status;
        if previous.map(|p| p.state) != Some(next.state) {
            let from = previous.map(|p| p.code()).unwrap_or_default();
            self.history.update(&from, &next.code(), source, comment);
            self.updated = Some(Timestamp::now());
            tracing::debug!(key = %self.key, from = %from, to = %next, "risk state change");
        }
        self.status = Some(next);
        self.priority = next.priority();
        if !next.is_triage() {
            self.ttl = 0;
        }
    }
}

// ─── Hooks ───────────────────────────────────────────────────────────

static HOOKS: [Hook<Risk>; 4] = [
    Hook::new("normalize identity", normalize_identity),
    Hook::new("compute priority", compute_priority),
    Hook::new("expire outside triage", expire_outside_triage),
    Hook::new("compute key", compute_key),
];

fn normalize_identity(mut r: Risk) -> HookResult<Risk> {
    r.dns = fold_case(&r.dns);
    r.name = nfc(&r.name);
    Ok(r)
}

fn compute_priority(mut r: Risk) -> HookResult<Risk> {
    r.priority = r.status.map_or(risk_status::UNSPECIFIED_PRIORITY, |s| s.priority());
    Ok(r)
}

fn expire_outside_triage(mut r: Risk) -> HookResult<Risk> {
    if !r.is_triage() {
        r.ttl = 0;
    }
    Ok(r)
}

fn compute_key(mut r: Risk) -> HookResult<Risk> {
    r.key = SCHEMA.build([&r.dns, &r.name]);
    Ok(r)
}

// ─── Capabilities ────────────────────────────────────────────────────

impl Model for Risk {
    fn discriminator(&self) -> &'static str {
        RISK
    }

    fn defaulted(mut self) -> Self {
        let now = Timestamp::now();
        self.status
            .get_or_insert(RiskStatus::new(RiskState::Triage).with_severity(Severity::Info));
        self.created.get_or_insert(now);
        self.visited.get_or_insert(now);
        if self.is_triage() && self.ttl == 0 {
            self.ttl = ttl_in_days(TRIAGE_TTL_DAYS);
        }
        self
    }

    fn hooks() -> &'static [Hook<Self>] {
        &HOOKS
    }
}

impl GraphModel for Risk {
    fn key(&self) -> &Key {
        &self.key
    }

    fn labels(&self) -> Vec<String> {
        vec![RISK.to_string()]
    }

    fn valid(&self) -> bool {
        PATTERN.matches(&self.key) && self.status.is_some()
    }
}
