//! # Type Registry
//!
//! Maps discriminator strings to zero-value constructors so heterogeneous
//! collections can be reconstructed from their encoded form.
//!
//! ## Lifecycle
//!
//! A `Registry` is populated once at startup through [`Registry::register`],
//! which takes `&mut self`, and is then shared behind `&` (typically a
//! `OnceLock`). Once shared, nothing can add to it: the freeze is enforced
//! by the borrow checker, and concurrent lookups need no locking.
//!
//! ## Aliases
//!
//! One concrete type may be registered under several discriminators. Every
//! alias yields the same zero value; the decoded payload (for example a
//! stored classification field) decides how the value labels itself.
//!
//! ## Conflicts
//!
//! Claiming a discriminator already owned by a *different* concrete type is
//! rejected with [`RegistrationError::Conflict`]. Re-registering a type under
//! a name it already owns is a no-op.

use std::any::TypeId;
use std::collections::BTreeMap;

use crate::error::RegistrationError;

struct Entry<E> {
    type_id: TypeId,
    type_name: &'static str,
    canonical: String,
    make: fn() -> E,
}

/// Discriminator → zero-value constructor table.
pub struct Registry<E> {
    entries: BTreeMap<String, Entry<E>>,
}

impl<E> Default for Registry<E> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<E> Registry<E> {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register concrete type `T` under one or more discriminators.
    ///
    /// The first name is the canonical discriminator; the rest are aliases.
    /// Names are matched case-insensitively. Either every name is
    /// registered or none is.
    ///
    /// # Errors
    ///
    /// [`RegistrationError::Conflict`] if any name belongs to a different
    /// type; [`RegistrationError::NoDiscriminator`] if `names` is empty.
    pub fn register<T: 'static>(
        &mut self,
        make: fn() -> E,
        names: &[&str],
    ) -> Result<&mut Self, RegistrationError> {
        let type_id = TypeId::of::<T>();
        let type_name = std::any::type_name::<T>();

        let names: Vec<String> = names
            .iter()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        let Some(canonical) = names.first().cloned() else {
            return Err(RegistrationError::NoDiscriminator { type_name });
        };

        for name in &names {
            if let Some(existing) = self.entries.get(name) {
                if existing.type_id != type_id {
                    return Err(RegistrationError::Conflict {
                        name: name.clone(),
                        existing: existing.type_name,
                        attempted: type_name,
                    });
                }
            }
        }

        for name in names {
            if self.entries.contains_key(&name) {
                continue;
            }
            tracing::debug!(discriminator = %name, canonical = %canonical, type_name, "registered type");
            self.entries.insert(
                name,
                Entry {
                    type_id,
                    type_name,
                    canonical: canonical.clone(),
                    make,
                },
            );
        }
        Ok(self)
    }

    /// Allocate a zero value for `name`, or `None` if it is unregistered.
    pub fn make_type(&self, name: &str) -> Option<E> {
        self.entry(name).map(|e| (e.make)())
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// The canonical discriminator that `name` resolves to.
    pub fn canonical(&self, name: &str) -> Option<&str> {
        self.entry(name).map(|e| e.canonical.as_str())
    }

    /// The Rust type name registered under `name`.
    pub fn type_name(&self, name: &str) -> Option<&'static str> {
        self.entry(name).map(|e| e.type_name)
    }

    /// Every registered discriminator, aliases included, in sorted order.
    pub fn discriminators(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Number of registered discriminators.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&self, name: &str) -> Option<&Entry<E>> {
        match self.entries.get(name) {
            Some(e) => Some(e),
            None => self.entries.get(&name.trim().to_lowercase()),
        }
    }
}
