//! # Built-in Model Registry
//!
//! Registers every entity class under its discriminator(s) and maps key
//! prefixes back to discriminators for envelopes that carry no type field.
//!
//! [`registry()`] is the frozen process-wide instance. [`builtin()`] builds
//! a fresh one for callers that want to pass a registry explicitly or
//! extend it before sharing.

use std::sync::OnceLock;

use tabularium_core::key::prefix_of;
use tabularium_core::{Registry, RegistrationError};

use crate::adobject::{AdObject, AdObjectClass, ADOBJECT};
use crate::any::AnyModel;
use crate::asset::{Asset, ASSET};
use crate::attribute::{Attribute, ATTRIBUTE};
use crate::port::{Port, PORT};
use crate::risk::{Risk, RISK};
use crate::webapp::{WebApplication, WEBAPPLICATION};

/// Key prefix → discriminator, for key-typed envelopes.
const KEY_PREFIXES: &[(&str, &str)] = &[
    (ASSET, ASSET),
    (RISK, RISK),
    (PORT, PORT),
    (ATTRIBUTE, ATTRIBUTE),
    (WEBAPPLICATION, WEBAPPLICATION),
    (ADOBJECT, ADOBJECT),
];

/// Build a registry holding every built-in class.
///
/// # Errors
///
/// [`RegistrationError`] if two classes claim one discriminator.
pub fn builtin() -> Result<Registry<AnyModel>, RegistrationError> {
    let mut registry = Registry::new();
    registry
        .register::<Asset>(|| AnyModel::Asset(Asset::default()), &[ASSET])?
        .register::<Risk>(|| AnyModel::Risk(Risk::default()), &[RISK])?
        .register::<Port>(|| AnyModel::Port(Port::default()), &[PORT])?
        .register::<Attribute>(|| AnyModel::Attribute(Attribute::default()), &[ATTRIBUTE])?
        .register::<WebApplication>(
            || AnyModel::WebApplication(WebApplication::default()),
            &[WEBAPPLICATION],
        )?
        .register::<AdObject>(|| ad(AdObjectClass::Object), &[ADOBJECT])?
        .register::<AdObject>(|| ad(AdObjectClass::User), &["aduser"])?
        .register::<AdObject>(|| ad(AdObjectClass::Computer), &["adcomputer"])?
        .register::<AdObject>(|| ad(AdObjectClass::Group), &["adgroup"])?
        .register::<AdObject>(|| ad(AdObjectClass::Gpo), &["adgpo"])?
        .register::<AdObject>(|| ad(AdObjectClass::Ou), &["adou"])?
        .register::<AdObject>(|| ad(AdObjectClass::Domain), &["addomain"])?;
    Ok(registry)
}

fn ad(class: AdObjectClass) -> AnyModel {
    AnyModel::AdObject(AdObject::of_class(class))
}

/// The process-wide built-in registry, built on first use.
///
/// # Panics
///
/// If the built-in registrations conflict. That is a programming error
/// caught by the first test that touches the registry.
pub fn registry() -> &'static Registry<AnyModel> {
    static REGISTRY: OnceLock<Registry<AnyModel>> = OnceLock::new();
    REGISTRY.get_or_init(|| match builtin() {
        Ok(registry) => registry,
        Err(e) => panic!("built-in model registry is inconsistent: {e}"),
    })
}

/// The discriminator implied by a key's type prefix.
pub fn discriminator_for_prefix(prefix: &str) -> Option<&'static str> {
    KEY_PREFIXES
        .iter()
        .find(|(p, _)| p.eq_ignore_ascii_case(prefix))
        .map(|(_, d)| *d)
}

/// The discriminator implied by a raw key string.
pub fn discriminator_for_key(key: &str) -> Option<&'static str> {
    prefix_of(key).and_then(discriminator_for_prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::any::ModelKind;
    use tabularium_core::Model;

    #[test]
    fn builtin_registers_every_discriminator() {
        let r = registry();
        for name in [
            "asset",
            "risk",
            "port",
            "attribute",
            "webapplication",
            "adobject",
            "aduser",
            "adcomputer",
            "adgroup",
            "adgpo",
            "adou",
            "addomain",
        ] {
            assert!(r.contains(name), "{name} missing");
        }
        assert_eq!(r.len(), 12);
    }

    #[test]
    fn every_kind_is_reachable() {
        let r = registry();
        let kinds: Vec<ModelKind> = r
            .discriminators()
            .filter_map(|d| r.make_type(d))
            .map(|m| m.kind())
            .collect();
        for kind in ModelKind::ALL {
            assert!(kinds.contains(&kind), "{kind} unreachable");
        }
    }

    #[test]
    fn aliases_yield_classified_zero_values() {
        let m = registry().make_type("ADUser").unwrap();
        assert_eq!(m.discriminator(), "aduser");
        assert_eq!(registry().make_type("adobject").unwrap().discriminator(), "adobject");
    }

    #[test]
    fn conflicting_registration_fails() {
        let mut r = builtin().unwrap();
        let err = r
            .register::<Risk>(|| AnyModel::Risk(Risk::default()), &["asset"])
            .err()
            .unwrap();
        assert!(matches!(err, RegistrationError::Conflict { .. }));
    }

    #[test]
    fn key_prefixes() {
        assert_eq!(discriminator_for_key("#port#tcp#443#asset#a#b"), Some("port"));
        assert_eq!(discriminator_for_key("#ADObject#corp#S-1"), Some("adobject"));
        assert_eq!(discriminator_for_key("#widget#x"), None);
        assert_eq!(discriminator_for_key("asset"), None);
    }

    #[test]
    fn unknown_type_has_no_zero_value() {
        assert!(registry().make_type("widget").is_none());
    }
}
