//! End-to-end reconciliation scenarios across entity classes.

use tabularium_core::{Assetlike, GraphModel, Model, Target};
use tabularium_model::reconcile::{SEED_LABEL, SEED_SOURCE};
use tabularium_model::{
    AnyModel, Asset, Port, Relationship, RelationshipLabel, Risk, RiskState, Severity,
};

fn asset() -> Asset {
    Asset::new("example.com", "www.example.com").expect("valid asset")
}

#[test]
fn risk_lifecycle_triage_to_remediated() {
    let target = asset();
    let mut risk = Risk::new(&target, "CVE-2023-12345", "TI").expect("valid risk");
    assert!(risk.is_triage());
    assert_ne!(risk.ttl, 0);

    risk.merge(&Risk::new(&target, "CVE-2023-12345", "OH").expect("valid risk"));
    risk.merge(&Risk::new(&target, "CVE-2023-12345", "RH").expect("valid risk"));

    assert_eq!(risk.status.map(|s| s.code()).as_deref(), Some("RH"));
    assert_eq!(risk.state(), Some(RiskState::Remediated));
    assert_eq!(risk.severity(), Some(Severity::High));
    assert_eq!(risk.priority, 10);
    assert_eq!(risk.ttl, 0);
    let transitions: Vec<(&str, &str)> = risk
        .history
        .records()
        .iter()
        .map(|r| (r.from.as_str(), r.to.as_str()))
        .collect();
    assert_eq!(transitions, vec![("TI", "OH"), ("OH", "RH")]);
    assert!(risk.valid());
}

#[test]
fn seed_promotion_through_any_model() {
    let mut stored: AnyModel = asset().into();
    let mut seed = asset();
    seed.set_source(SEED_SOURCE);

    assert!(stored.visit(&seed.clone().into()));
    let AnyModel::Asset(promoted) = &stored else {
        panic!("expected an asset");
    };
    assert_eq!(promoted.source, SEED_SOURCE);
    assert_eq!(promoted.pending_label_addition.as_deref(), Some(SEED_LABEL));
    assert_eq!(promoted.history.len(), 1);

    // Seeing the seed again changes nothing further.
    assert!(stored.visit(&seed.into()));
    let AnyModel::Asset(again) = &stored else {
        panic!("expected an asset");
    };
    assert_eq!(again.history.len(), 1);
}

#[test]
fn merge_then_visit_never_unfreezes() {
    let mut stored = asset();
    stored.merge(&asset().with_status("F"));
    stored.visit(&asset());
    assert_eq!(stored.status(), "F");
    assert_eq!(stored.history.len(), 1);
}

#[test]
fn relationship_between_normalized_endpoints() {
    let a = asset();
    let port = Port::new(&a, "tcp", 8443).expect("valid port");
    let rel = Relationship::new(RelationshipLabel::HasPort, a.clone(), port.clone())
        .expect("valid relationship");
    assert!(rel.valid());
    assert!(rel.key().as_str().starts_with("#has_port#asset#"));
    assert!(rel.key().as_str().ends_with(port.key().as_str()));
    assert_eq!(rel.discriminator(), "has_port");
}

#[test]
fn rebuilding_from_identity_reproduces_key() {
    let a = asset();
    let rebuilt = Asset {
        dns: a.dns.clone(),
        name: a.name.clone(),
        ..Default::default()
    }
    .normalized()
    .expect("valid asset");
    assert_eq!(rebuilt.key(), a.key());
}

#[test]
fn keys_stay_under_ceiling_when_identity_parts_are_long() {
    use tabularium_core::{CEILING_1024, CEILING_2048};
    use tabularium_model::{Attribute, WebApplication};

    let long_name = Attribute::new(&asset(), &"n".repeat(1500), "v").expect("attribute");
    assert!(long_name.key().len() <= CEILING_1024);

    let url = format!("https://example.com/{}", "p".repeat(1500));
    let webapp = WebApplication::new(&url, "").expect("webapp");
    let on_webapp = Attribute::new(&webapp, "title", "v").expect("attribute");
    assert!(on_webapp.key().len() <= CEILING_1024);

    let long_dns = Asset::new(&format!("{}.com", "a".repeat(3000)), "x.com").expect("asset");
    assert!(long_dns.key().len() <= CEILING_2048);
    let risk = Risk::new(&long_dns, "CVE-2023-12345", "TH").expect("risk");
    assert!(risk.key().len() <= CEILING_2048);
}
