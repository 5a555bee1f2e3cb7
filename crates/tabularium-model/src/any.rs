//! # AnyModel — the closed set of entity classes
//!
//! Heterogeneous collections, registry lookups, and decoded envelopes all
//! produce an [`AnyModel`]. Callers match on the variant to recover the
//! concrete type, or use [`Variant::peek`] / [`Variant::take`] generically.

use tabularium_core::{
    Assetlike, GraphModel, Hook, HookError, HookFailure, HookResult, Key, Model, Target,
};

use crate::adobject::AdObject;
use crate::asset::Asset;
use crate::attribute::Attribute;
use crate::port::Port;
use crate::risk::Risk;
use crate::webapp::WebApplication;

/// Any registered entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyModel {
    /// [`Asset`].
    Asset(Asset),
    /// [`Risk`].
    Risk(Risk),
    /// [`Port`].
    Port(Port),
    /// [`Attribute`].
    Attribute(Attribute),
    /// [`WebApplication`].
    WebApplication(WebApplication),
    /// [`AdObject`].
    AdObject(AdObject),
}

/// The variant of an [`AnyModel`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModelKind {
    /// [`Asset`].
    Asset,
    /// [`Risk`].
    Risk,
    /// [`Port`].
    Port,
    /// [`Attribute`].
    Attribute,
    /// [`WebApplication`].
    WebApplication,
    /// [`AdObject`].
    AdObject,
}

impl ModelKind {
    /// Every kind.
    pub const ALL: [ModelKind; 6] = [
        Self::Asset,
        Self::Risk,
        Self::Port,
        Self::Attribute,
        Self::WebApplication,
        Self::AdObject,
    ];

    /// Whether values of this kind implement [`Target`].
    pub fn is_target(self) -> bool {
        !matches!(self, Self::Risk | Self::Attribute)
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Asset => "Asset",
            Self::Risk => "Risk",
            Self::Port => "Port",
            Self::Attribute => "Attribute",
            Self::WebApplication => "WebApplication",
            Self::AdObject => "AdObject",
        };
        f.write_str(s)
    }
}

/// Apply the same expression to whichever variant is present.
macro_rules! each_variant {
    ($value:expr, $inner:ident => $body:expr) => {
        match $value {
            AnyModel::Asset($inner) => $body,
            AnyModel::Risk($inner) => $body,
            AnyModel::Port($inner) => $body,
            AnyModel::Attribute($inner) => $body,
            AnyModel::WebApplication($inner) => $body,
            AnyModel::AdObject($inner) => $body,
        }
    };
}

impl AnyModel {
    /// The variant.
    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Asset(_) => ModelKind::Asset,
            Self::Risk(_) => ModelKind::Risk,
            Self::Port(_) => ModelKind::Port,
            Self::Attribute(_) => ModelKind::Attribute,
            Self::WebApplication(_) => ModelKind::WebApplication,
            Self::AdObject(_) => ModelKind::AdObject,
        }
    }

    /// Whether the wrapped value is a [`Target`].
    pub fn is_target(&self) -> bool {
        self.kind().is_target()
    }

    /// Target status, for kinds that have one.
    pub fn target_status(&self) -> Option<&str> {
        match self {
            Self::Asset(m) => Some(m.status()),
            Self::Port(m) => Some(m.status()),
            Self::WebApplication(m) => Some(m.status()),
            Self::AdObject(m) => Some(m.status()),
            Self::Risk(_) | Self::Attribute(_) => None,
        }
    }

    /// Target `(group, identifier)`, for kinds that have one.
    pub fn target_identity(&self) -> Option<(&str, &str)> {
        match self {
            Self::Asset(m) => Some((m.group(), m.identifier())),
            Self::Port(m) => Some((m.group(), m.identifier())),
            Self::WebApplication(m) => Some((m.group(), m.identifier())),
            Self::AdObject(m) => Some((m.group(), m.identifier())),
            Self::Risk(_) | Self::Attribute(_) => None,
        }
    }

    /// Narrow the value to the class named by `discriminator`, when the
    /// registry maps several discriminators onto one struct.
    pub fn specialize(&mut self, discriminator: &str) {
        if let Self::AdObject(o) = self {
            o.specialize(discriminator);
        }
    }

    /// Authoritative update with another observation of the same kind.
    ///
    /// Returns `false`, leaving `self` untouched, when the kinds differ.
    pub fn merge(&mut self, update: &AnyModel) -> bool {
        match (self, update) {
            (Self::Asset(a), Self::Asset(b)) => a.merge(b),
            (Self::Risk(a), Self::Risk(b)) => a.merge(b),
            (Self::Port(a), Self::Port(b)) => a.merge(b),
            (Self::Attribute(a), Self::Attribute(b)) => a.merge(b),
            (Self::WebApplication(a), Self::WebApplication(b)) => a.merge(b),
            (Self::AdObject(a), Self::AdObject(b)) => a.merge(b),
            (existing, update) => {
                tracing::warn!(
                    existing = %existing.kind(),
                    update = %update.kind(),
                    "refusing to merge models of different kinds"
                );
                return false;
            }
        }
        true
    }

    /// Passive re-observation by another value of the same kind.
    ///
    /// Returns `false`, leaving `self` untouched, when the kinds differ.
    pub fn visit(&mut self, observation: &AnyModel) -> bool {
        match (self, observation) {
            (Self::Asset(a), Self::Asset(b)) => a.visit(b),
            (Self::Risk(a), Self::Risk(b)) => a.visit(b),
            (Self::Port(a), Self::Port(b)) => a.visit(b),
            (Self::Attribute(a), Self::Attribute(b)) => a.visit(b),
            (Self::WebApplication(a), Self::WebApplication(b)) => a.visit(b),
            (Self::AdObject(a), Self::AdObject(b)) => a.visit(b),
            (existing, observation) => {
                tracing::warn!(
                    existing = %existing.kind(),
                    observation = %observation.kind(),
                    "refusing to visit models of different kinds"
                );
                return false;
            }
        }
        true
    }

    /// Record the provenance of an asset-like observation. No-op for
    /// risks and attributes.
    pub fn set_source(&mut self, source: &str) {
        match self {
            Self::Asset(m) => m.set_source(source),
            Self::Port(m) => m.set_source(source),
            Self::WebApplication(m) => m.set_source(source),
            Self::AdObject(m) => m.set_source(source),
            Self::Risk(_) | Self::Attribute(_) => {}
        }
    }
}

// ─── Capabilities ────────────────────────────────────────────────────

static HOOKS: [Hook<AnyModel>; 1] = [Hook::new("normalize variant", normalize_variant)];

fn normalize_variant(model: AnyModel) -> HookResult<AnyModel> {
    model
        .normalized()
        .map_err(|e| HookFailure::new(e.to_string()))
}

impl Model for AnyModel {
    fn discriminator(&self) -> &'static str {
        each_variant!(self, m => m.discriminator())
    }

    fn defaulted(self) -> Self {
        each_variant!(self, m => m.defaulted().into())
    }

    fn hooks() -> &'static [Hook<Self>] {
        &HOOKS
    }

    /// Runs the wrapped class's own pipeline, keeping its structured error.
    fn normalized(self) -> Result<Self, HookError> {
        each_variant!(self, m => m.normalized().map(Into::into))
    }

    fn canonicalized(self) -> Result<Self, HookError> {
        each_variant!(self, m => m.canonicalized().map(Into::into))
    }
}

impl GraphModel for AnyModel {
    fn key(&self) -> &Key {
        each_variant!(self, m => m.key())
    }

    fn labels(&self) -> Vec<String> {
        each_variant!(self, m => m.labels())
    }

    fn valid(&self) -> bool {
        each_variant!(self, m => m.valid())
    }
}

// ─── Variant access ──────────────────────────────────────────────────

/// A concrete class that is one variant of [`AnyModel`].
pub trait Variant: GraphModel + Clone + Into<AnyModel> {
    /// The variant this class occupies.
    const KIND: ModelKind;

    /// Borrow the value if `model` holds this class.
    fn peek(model: &AnyModel) -> Option<&Self>;

    /// Take the value if `model` holds this class.
    fn take(model: AnyModel) -> Option<Self>;
}

macro_rules! impl_variant {
    ($ty:ident) => {
        impl From<$ty> for AnyModel {
            fn from(value: $ty) -> Self {
                AnyModel::$ty(value)
            }
        }

        impl Variant for $ty {
            const KIND: ModelKind = ModelKind::$ty;

            fn peek(model: &AnyModel) -> Option<&Self> {
                match model {
                    AnyModel::$ty(value) => Some(value),
                    _ => None,
                }
            }

            fn take(model: AnyModel) -> Option<Self> {
                match model {
                    AnyModel::$ty(value) => Some(value),
                    _ => None,
                }
            }
        }
    };
}

impl_variant!(Asset);
impl_variant!(Risk);
impl_variant!(Port);
impl_variant!(Attribute);
impl_variant!(WebApplication);
impl_variant!(AdObject);
