//! # Key Canonicalization
//!
//! An entity's persistent identity is a `#`-delimited string assembled from
//! a fixed, per-class list of identity attributes:
//!
//! ```text
//! #<type>#<component 1>#<component 2>#...
//! ```
//!
//! ## Invariants
//!
//! - Each component is NFC-normalized, trimmed, and (unless the class marks
//!   it case-significant) lowercased before concatenation.
//! - A missing component is an empty segment (`##`), never an error.
//!   `valid()` on the entity rejects such keys through its [`KeyPattern`].
//! - When the assembled key exceeds the class ceiling, only the class's
//!   *variable* component is shortened, to whatever budget remains. Keys are
//!   never hashed, so they stay readable and prefix-stable.
//! - Ceilings are counted in UTF-8 bytes and truncation lands on a char
//!   boundary, so a key never exceeds its ceiling in bytes or characters.
//!
//! Two entities built from the same identity attributes therefore always
//! collide on key, which is what lets reconciliation work without an index.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::normalize;

/// Ceiling for classes whose variable component is a short value.
pub const CEILING_1024: usize = 1024;
/// Ceiling for classes that embed another key or a URL.
pub const CEILING_2048: usize = 2048;

/// A canonical entity key.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Key(String);

impl Key {
    /// Wrap an already-canonical key string.
    ///
    /// Used when reading keys back from storage; entity hooks build keys
    /// through [`KeySchema::build`].
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether no key has been computed yet.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The type prefix: the first `#`-delimited segment.
    ///
    /// Returns `None` for keys that do not start with `#`.
    pub fn prefix(&self) -> Option<&str> {
        prefix_of(&self.0)
    }

    /// Segments after the leading `#`, including empty ones.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.strip_prefix('#').unwrap_or("").split('#')
    }

    /// The key without its leading `#`, for embedding inside another key.
    pub fn embedded(&self) -> &str {
        self.0.strip_prefix('#').unwrap_or(&self.0)
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl std::fmt::Display for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Key {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// First `#`-delimited segment of a raw key string.
pub fn prefix_of(raw: &str) -> Option<&str> {
    let rest = raw.strip_prefix('#')?;
    let prefix = rest.split('#').next()?;
    (!prefix.is_empty()).then_some(prefix)
}

/// How a component's case is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fold {
    /// Lowercase after normalization.
    Lower,
    /// Keep natural case (case-significant values such as URL paths).
    Preserve,
}

/// A per-class key recipe with `N` identity components.
#[derive(Debug, Clone, Copy)]
pub struct KeySchema<const N: usize> {
    /// The type segment, e.g. `asset`.
    pub prefix: &'static str,
    /// Case rule per component.
    pub folds: [Fold; N],
    /// Index of the component that absorbs truncation.
    pub variable: usize,
    /// Maximum key length in bytes.
    pub ceiling: usize,
}

impl<const N: usize> KeySchema<N> {
    /// A schema that lowercases every component.
    pub const fn lowercase(prefix: &'static str, variable: usize, ceiling: usize) -> Self {
        Self {
            prefix,
            folds: [Fold::Lower; N],
            variable,
            ceiling,
        }
    }

    /// Override the case rule of one component.
    pub fn preserving(mut self, index: usize) -> Self {
        if let Some(fold) = self.folds.get_mut(index) {
            *fold = Fold::Preserve;
        }
        self
    }

    /// Assemble the canonical key from raw identity components.
    pub fn build(&self, components: [&str; N]) -> Key {
        let mut parts: Vec<String> = components
            .iter()
            .zip(self.folds.iter())
            .map(|(raw, fold)| match fold {
                Fold::Lower => normalize::fold_case(raw),
                Fold::Preserve => normalize::nfc(raw),
            })
            .collect();

        let fixed: usize = 1 + self.prefix.len()
            + parts
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != self.variable)
                .map(|(_, p)| p.len() + 1)
                .sum::<usize>()
            + usize::from(self.variable < N);

        if let Some(variable) = parts.get_mut(self.variable) {
            if fixed + variable.len() > self.ceiling {
                let budget = self.ceiling.saturating_sub(fixed);
                truncate_at_boundary(variable, budget);
            }
        }

        let mut key = String::with_capacity(self.ceiling.min(fixed + 64));
        key.push('#');
        key.push_str(self.prefix);
        for part in &parts {
            key.push('#');
            key.push_str(part);
        }
        // Fixed components alone can exceed the ceiling.
        truncate_at_boundary(&mut key, self.ceiling);
        Key(key)
    }
}

/// Shorten `s` to at most `max` bytes without splitting a character.
fn truncate_at_boundary(s: &mut String, max: usize) {
    if s.len() <= max {
        return;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}

/// A lazily compiled, class-specific key validation pattern.
///
/// Declared as a `static` next to each entity class. A pattern that fails
/// to compile matches nothing, so a broken pattern surfaces as every key of
/// that class being invalid rather than as a panic.
pub struct KeyPattern {
    source: &'static str,
    compiled: OnceLock<Option<Regex>>,
}

impl KeyPattern {
    /// Declare a pattern; compilation happens on first use.
    pub const fn new(source: &'static str) -> Self {
        Self {
            source,
            compiled: OnceLock::new(),
        }
    }

    /// Whether `key` matches the pattern.
    pub fn matches(&self, key: &Key) -> bool {
        self.compiled
            .get_or_init(|| Regex::new(self.source).ok())
            .as_ref()
            .is_some_and(|re| re.is_match(key.as_str()))
    }

    /// The pattern source.
    pub fn as_str(&self) -> &'static str {
        self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAIR: KeySchema<2> = KeySchema::lowercase("asset", 1, CEILING_2048);

    #[test]
    fn builds_lowercased_key() {
        assert_eq!(
            PAIR.build(["Example.COM", "WWW.Example.com"]).as_str(),
            "#asset#example.com#www.example.com"
        );
    }

    #[test]
    fn missing_component_is_empty_segment() {
        assert_eq!(PAIR.build(["example.com", ""]).as_str(), "#asset#example.com#");
        assert_eq!(PAIR.build(["", "x"]).as_str(), "#asset##x");
    }

    #[test]
    fn preserve_keeps_case() {
        let schema: KeySchema<1> = KeySchema::lowercase("webapplication", 0, CEILING_2048).preserving(0);
        assert_eq!(
            schema.build(["https://example.com/Admin"]).as_str(),
            "#webapplication#https://example.com/Admin"
        );
    }

    #[test]
    fn truncates_only_the_variable_component() {
        let schema: KeySchema<3> = KeySchema::lowercase("attribute", 1, CEILING_1024);
        let long = "v".repeat(1500);
        let key = schema.build(["port", &long, "asset#example.com#example.com"]);
        assert_eq!(key.len(), CEILING_1024);
        assert!(key.as_str().starts_with("#attribute#port#vvv"));
        assert!(key.as_str().ends_with("#asset#example.com#example.com"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let schema: KeySchema<1> = KeySchema::lowercase("x", 0, 10);
        // "#x#" is 3 bytes; 7 remain for a run of 2-byte characters.
        let key = schema.build(["ééééééé"]);
        assert!(key.len() <= 10);
        assert_eq!(key.as_str(), "#x#ééé");
    }

    #[test]
    fn long_fixed_component_is_cut_at_ceiling() {
        let schema: KeySchema<3> = KeySchema::lowercase("attribute", 1, CEILING_1024);
        let long = "n".repeat(1500);
        let key = schema.build([&long, "v", "asset#example.com#example.com"]);
        assert_eq!(key.len(), CEILING_1024);
        assert!(key.as_str().starts_with("#attribute#nnn"));
    }

    #[test]
    fn fixed_overflow_respects_char_boundaries() {
        let schema: KeySchema<2> = KeySchema::lowercase("x", 1, 10);
        let key = schema.build(["éééééééé", "v"]);
        assert!(key.len() <= 10);
        assert_eq!(key.as_str(), "#x#ééé");
    }

    #[test]
    fn prefix_and_segments() {
        let key = Key::from_raw("#port#tcp#443#asset#example.com#1.2.3.4");
        assert_eq!(key.prefix(), Some("port"));
        assert_eq!(key.segments().count(), 6);
        assert_eq!(key.embedded(), "port#tcp#443#asset#example.com#1.2.3.4");
        assert_eq!(Key::from_raw("asset").prefix(), None);
        assert_eq!(Key::from_raw("##x").prefix(), None);
    }

    #[test]
    fn pattern_matches() {
        static PATTERN: KeyPattern = KeyPattern::new(r"^#asset#[^#]+#[^#]+$");
        assert!(PATTERN.matches(&Key::from_raw("#asset#a.com#a.com")));
        assert!(!PATTERN.matches(&Key::from_raw("#asset#a.com#")));
        assert!(!PATTERN.matches(&Key::from_raw("#asset#a#b#c")));
    }

    #[test]
    fn broken_pattern_matches_nothing() {
        static BROKEN: KeyPattern = KeyPattern::new(r"^#asset#(");
        assert!(!BROKEN.matches(&Key::from_raw("#asset#(")));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const SCHEMA: KeySchema<3> = KeySchema::lowercase("attribute", 1, CEILING_1024);

    proptest! {
        /// No component, however long, pushes a key past its ceiling.
        #[test]
        fn key_never_exceeds_ceiling(
            name in "[a-zA-Z]{0,40}",
            value in "\\PC{0,2000}",
            source in "[a-z#.]{0,200}",
        ) {
            let key = SCHEMA.build([&name, &value, &source]);
            prop_assert!(key.len() <= CEILING_1024);
            prop_assert!(key.as_str().chars().count() <= CEILING_1024);
        }

        /// A long fixed component is cut too, so the ceiling holds either way.
        #[test]
        fn long_fixed_component_never_exceeds_ceiling(
            name in "\\PC{0,2000}",
            value in "[a-z]{0,40}",
            source in "[a-z#.]{0,2000}",
        ) {
            let key = SCHEMA.build([&name, &value, &source]);
            prop_assert!(key.len() <= CEILING_1024);
            prop_assert!(key.as_str().starts_with("#attribute#"));
        }

        /// Case variants of the same identity produce one key.
        #[test]
        fn key_is_case_insensitive(name in "[a-zA-Z0-9.]{1,40}", value in "[a-zA-Z0-9]{1,40}") {
            let lower = SCHEMA.build([&name.to_lowercase(), &value.to_lowercase(), "asset#x#y"]);
            let upper = SCHEMA.build([&name.to_uppercase(), &value.to_uppercase(), "ASSET#X#Y"]);
            prop_assert_eq!(lower, upper);
        }

        /// Building from a key's own components reproduces it.
        #[test]
        fn key_is_fixed_point(name in "[a-z]{1,20}", value in "[a-z0-9]{1,60}") {
            let key = SCHEMA.build([&name, &value, "asset#x#y"]);
            let again = SCHEMA.build([&name, &value, "asset#x#y"]);
            prop_assert_eq!(key, again);
        }
    }
}
