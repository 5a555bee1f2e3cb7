//! # Web Application
//!
//! A web application reachable at a primary URL, plus any further URLs
//! observed for it.
//!
//! Key: `#webapplication#<primary url>`. URL paths are case-significant, so
//! the component is not case-folded; the `url` parser already lowercases
//! the scheme and host and drops default ports.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use url::Url;

use tabularium_core::key::Fold;
use tabularium_core::normalize::{is_private_host, nfc};
use tabularium_core::temporal::ttl_in_days;
use tabularium_core::{
    Assetlike, GraphModel, Hook, HookError, HookResult, Key, KeyPattern, KeySchema, Model,
    NormalizeError, Target, Timestamp, CEILING_2048,
};

use crate::history::History;
use crate::lifecycle;
use crate::reconcile::{self, StatusLedger, SEED_LABEL, SEED_SOURCE, SELF_SOURCE};

/// Discriminator.
pub const WEBAPPLICATION: &str = "webapplication";

/// Days an unobserved web application lives before the store may expire it.
pub const WEBAPP_TTL_DAYS: i64 = 7;

const SCHEMA: KeySchema<1> = KeySchema {
    prefix: WEBAPPLICATION,
    folds: [Fold::Preserve],
    variable: 0,
    ceiling: CEILING_2048,
};
static PATTERN: KeyPattern = KeyPattern::new(r"^#webapplication#https?://[^/#\s]+/\S*$");

/// Parse and canonicalize an http(s) URL.
///
/// Scheme and host are lowercased, default ports and fragments removed,
/// path case kept.
pub fn normalize_url(raw: &str) -> Result<Url, NormalizeError> {
    let raw = nfc(raw);
    let invalid = |reason: String| NormalizeError::InvalidUrl {
        url: raw.clone(),
        reason,
    };
    let mut url = Url::parse(&raw).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_string()));
    }
    url.set_fragment(None);
    Ok(url)
}

/// A web application.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebApplication {
    /// Canonical key.
    pub key: Key,
    /// The URL the application is identified by.
    pub primary_url: String,
    /// Display name.
    pub name: String,
    /// Host of the primary URL.
    pub host: String,
    /// All URLs observed for the application, primary included.
    pub urls: BTreeSet<String>,
    /// Provenance.
    pub source: String,
    /// Lifecycle status code.
    pub status: String,
    /// Capabilities that have observed the application.
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

impl WebApplication {
    /// Build and normalize a web application.
    pub fn new(primary_url: &str, name: &str) -> Result<Self, HookError> {
        Self {
            primary_url: primary_url.to_string(),
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

static HOOKS: [Hook<WebApplication>; 3] = [
    Hook::new("normalize urls", normalize_urls),
    Hook::new("derive host", derive_host),
    Hook::new("compute key", compute_key),
];

fn normalize_urls(mut w: WebApplication) -> HookResult<WebApplication> {
    let primary = normalize_url(&w.primary_url)?;
    w.primary_url = primary.to_string();
    let mut urls = BTreeSet::new();
    for raw in &w.urls {
        urls.insert(normalize_url(raw)?.to_string());
    }
    urls.insert(w.primary_url.clone());
    w.urls = urls;
    w.name = nfc(&w.name);
    Ok(w)
}

fn derive_host(mut w: WebApplication) -> HookResult<WebApplication> {
    let primary = normalize_url(&w.primary_url)?;
    w.host = primary.host_str().unwrap_or_default().to_string();
    if w.name.is_empty() {
        w.name.clone_from(&w.primary_url);
    }
    Ok(w)
}

fn compute_key(mut w: WebApplication) -> HookResult<WebApplication> {
    w.key = SCHEMA.build([&w.primary_url]);
    Ok(w)
}

// ─── Capabilities ────────────────────────────────────────────────────

impl Model for WebApplication {
    fn discriminator(&self) -> &'static str {
        WEBAPPLICATION
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
            self.ttl = ttl_in_days(WEBAPP_TTL_DAYS);
        }
        self
    }

    fn hooks() -> &'static [Hook<Self>] {
        &HOOKS
    }
}

impl GraphModel for WebApplication {
    fn key(&self) -> &Key {
        &self.key
    }

    fn labels(&self) -> Vec<String> {
        let mut labels = vec![WEBAPPLICATION.to_string()];
        if self.source == SEED_SOURCE {
            labels.push(SEED_LABEL.to_string());
        }
        labels
    }

    fn valid(&self) -> bool {
        PATTERN.matches(&self.key) && lifecycle::is_known(&self.status)
    }
}

impl Target for WebApplication {
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
        &self.host
    }

    fn identifier(&self) -> &str {
        &self.primary_url
    }

    fn is_class(&self, class: &str) -> bool {
        matches!(class, WEBAPPLICATION | "webapp")
    }

    fn is_private(&self) -> bool {
        is_private_host(&self.host)
    }
}

impl Assetlike for WebApplication {
    fn merge(&mut self, update: &Self) {
        self.history.absorb(&update.history);
        self.ledger().transition(&update.status, &update.source, &update.comment);
        reconcile::take_string(&mut self.name, &update.name);
        reconcile::take_string(&mut self.comment, &update.comment);
        reconcile::take_nonzero(&mut self.ttl, update.ttl);
        reconcile::union(&mut self.urls, &update.urls);
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
        reconcile::union(&mut self.urls, &observation.urls);
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
