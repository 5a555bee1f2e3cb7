//! Round-trips for every registered class through every encoding, plus the
//! error paths an unknown discriminator must take.

use serde_json::json;

use tabularium_codec::{json as envelope, BinaryRegistry, GraphModelWrapper, KvItem};
use tabularium_core::{DecodeError, GraphModel, Model, CEILING_1024};
use tabularium_model::reconcile::SEED_SOURCE;
use tabularium_model::{
    registry, AdObject, AdObjectClass, AnyModel, Asset, Attribute, ModelKind, Port, Risk,
    WebApplication,
};

/// One normalized instance of every class, AD aliases included.
fn corpus() -> Vec<AnyModel> {
    let asset = Asset::new("Example.com", "WWW.Example.com").expect("asset");
    let mut seed = Asset::new("example.org", "10.0.0.7").expect("asset");
    seed.source = SEED_SOURCE.to_string();
    let port = Port::new(&asset, "tcp", 443).expect("port");
    let risk = Risk::new(&asset, "CVE-2023-12345", "OHA").expect("risk");
    let attribute = Attribute::new(&port, "banner", "nginx/1.25").expect("attribute");
    let webapp = WebApplication::new("https://example.com/Login", "Portal").expect("webapp");

    let mut models: Vec<AnyModel> = vec![
        asset.into(),
        seed.into(),
        port.into(),
        risk.into(),
        attribute.into(),
        webapp.into(),
    ];
    for (i, class) in AdObjectClass::ALL.into_iter().enumerate() {
        let id = format!("S-1-5-21-{}", 1000 + i);
        models.push(
            AdObject::new("corp.example.com", &id, class)
                .expect("ad object")
                .into(),
        );
    }
    models
}

fn assert_same_identity(decoded: &AnyModel, original: &AnyModel) {
    assert_eq!(decoded.kind(), original.kind());
    assert_eq!(decoded.key(), original.key());
    assert_eq!(decoded.discriminator(), original.discriminator());
    assert_eq!(decoded.labels(), original.labels());
    assert_eq!(decoded, original);
}

#[test]
fn json_round_trip_every_class() {
    for original in corpus() {
        let text = envelope::encode(&original).expect("encode");
        let decoded = envelope::decode(registry(), &text).expect("decode");
        assert_same_identity(&decoded, &original);
    }
}

#[test]
fn json_round_trip_without_type_field() {
    for original in corpus() {
        let mut value = envelope::to_value(&original).expect("encode");
        value.as_object_mut().expect("object").remove("type");
        let decoded = envelope::from_value(registry(), value).expect("decode");
        assert_eq!(decoded.key(), original.key());
        assert_eq!(decoded.discriminator(), original.discriminator());
    }
}

#[test]
fn wrapper_round_trip_every_class() {
    for original in corpus() {
        let text = serde_json::to_string(&GraphModelWrapper(original.clone())).expect("encode");
        let GraphModelWrapper(decoded) = serde_json::from_str(&text).expect("decode");
        assert_same_identity(&decoded, &original);
    }
}

#[test]
fn kv_round_trip_every_class() {
    for original in corpus() {
        let item = KvItem::from_model("tenant-1", &original).expect("encode");
        let stored = serde_json::to_string(&item).expect("store");
        let loaded: KvItem = serde_json::from_str(&stored).expect("load");
        let decoded = loaded.to_model(registry()).expect("decode");
        assert_same_identity(&decoded, &original);
    }
}

#[test]
fn binary_round_trip_heterogeneous_slice() {
    let codecs = BinaryRegistry::builtin();
    let originals = corpus();
    let bytes = codecs.encode_slice(&originals).expect("encode");
    let decoded = codecs.decode_slice(registry(), &bytes).expect("decode");
    assert_eq!(decoded.len(), originals.len());
    for (decoded, original) in decoded.iter().zip(&originals) {
        assert_same_identity(decoded, original);
    }
}

#[test]
fn every_kind_is_covered() {
    let kinds: Vec<ModelKind> = corpus().iter().map(AnyModel::kind).collect();
    for kind in ModelKind::ALL {
        assert!(kinds.contains(&kind), "{kind} missing from corpus");
    }
}

#[test]
fn unknown_type_always_errors() {
    for value in [
        json!({"type": "widget", "key": "#asset#a#a"}),
        json!({"type": "Widget"}),
    ] {
        assert!(matches!(
            envelope::from_value(registry(), value),
            Err(DecodeError::UnknownType(_))
        ));
    }
    assert!(matches!(
        envelope::from_value(registry(), json!({"key": "#widget#a#b"})),
        Err(DecodeError::UnknownKeyPrefix { .. })
    ));
}

#[test]
fn long_attribute_value_respects_ceiling_after_round_trip() {
    let asset = Asset::new("example.com", "").expect("asset");
    let value = "A".repeat(1500);
    let attribute: AnyModel = Attribute::new(&asset, "banner", &value)
        .expect("attribute")
        .into();
    assert!(attribute.key().len() <= CEILING_1024);
    assert!(attribute.valid());

    let text = envelope::encode(&attribute).expect("encode");
    let decoded = envelope::decode(registry(), &text).expect("decode");
    assert_eq!(decoded.key(), attribute.key());
    let AnyModel::Attribute(decoded) = decoded else {
        panic!("expected an attribute");
    };
    assert_eq!(decoded.value.len(), 1500);
}

#[test]
fn risk_lifecycle_survives_storage_between_updates() {
    let codecs = BinaryRegistry::builtin();
    let asset = Asset::new("example.com", "www.example.com").expect("asset");
    let mut stored = codecs
        .encode(&Risk::new(&asset, "CVE-2023-12345", "TI").expect("risk").into())
        .expect("encode");

    for update in ["OH", "RH"] {
        let mut current = codecs.decode(registry(), &stored).expect("decode");
        let update: AnyModel = Risk::new(&asset, "CVE-2023-12345", update)
            .expect("risk")
            .into();
        assert!(current.merge(&update));
        stored = codecs.encode(&current).expect("encode");
    }

    let AnyModel::Risk(risk) = codecs.decode(registry(), &stored).expect("decode") else {
        panic!("expected a risk");
    };
    assert_eq!(risk.status.map(|s| s.code()).as_deref(), Some("RH"));
    assert_eq!(risk.priority, 10);
    assert_eq!(risk.ttl, 0);
    assert_eq!(risk.history.len(), 2);
}
