//! The capability lattice and the pattern accumulator built on top of it.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// How much an external attacker can influence an expanded context's value.
///
/// For example, `github.event.pull_request.title` is [`Capability::Arbitrary`]
/// because it can contain arbitrary attacker-controlled content, while
/// `github.event.pull_request.user.id` is [`Capability::Fixed`] because an
/// attacker can't choose their own user ID. [`Capability::Structured`] is the
/// middle ground: the attacker has some influence, but only within a
/// constrained shape.
///
/// Variants are declared from least to most permissive, so the derived
/// `Ord` is the lattice order and [`Capability::unify`] is its join.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    /// The value is drawn from a small set the attacker doesn't control:
    /// booleans, numbers, timestamps, enumerations.
    Fixed,
    /// The value has a constrained shape (URIs, emails) that can carry
    /// limited attacker-chosen content but not free text.
    Structured,
    /// The value can contain arbitrary attacker-controlled text.
    Arbitrary,
}

impl Capability {
    /// Unifies two capabilities in favor of the more permissive one.
    pub fn unify(self, other: Capability) -> Capability {
        self.max(other)
    }

    /// Returns the capability's name, as serialized in CSV output.
    pub fn as_str(self) -> &'static str {
        match self {
            Capability::Fixed => "fixed",
            Capability::Structured => "structured",
            Capability::Arbitrary => "arbitrary",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulates capability findings for context patterns across any number
/// of schemas.
///
/// The same textual pattern is routinely produced by multiple schemas
/// (different events share field names), so recording a finding for an
/// already-present pattern unifies it with the prior finding rather than
/// replacing it. Patterns iterate in lexicographic order, which keeps the
/// serialized output deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CapabilityMap {
    patterns: BTreeMap<String, Capability>,
}

impl CapabilityMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a capability finding for a pattern, unifying it with any
    /// finding already present for the same pattern.
    pub fn record(&mut self, pattern: String, capability: Capability) {
        self.patterns
            .entry(pattern)
            .and_modify(|prior| *prior = prior.unify(capability))
            .or_insert(capability);
    }

    /// Pins a pattern to [`Capability::Fixed`], overwriting anything the
    /// schemas contributed for it.
    ///
    /// Used for externally vetted contexts; pins always win.
    pub fn pin_fixed(&mut self, pattern: impl Into<String>) {
        self.patterns.insert(pattern.into(), Capability::Fixed);
    }

    /// Returns the unified capability for a pattern, if present.
    pub fn get(&self, pattern: &str) -> Option<Capability> {
        self.patterns.get(pattern).copied()
    }

    /// Returns the number of distinct patterns recorded.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Returns whether no patterns have been recorded.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Iterates over `(pattern, capability)` entries in lexicographic
    /// pattern order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Capability)> {
        self.patterns
            .iter()
            .map(|(pattern, capability)| (pattern.as_str(), *capability))
    }
}

impl Extend<(String, Capability)> for CapabilityMap {
    fn extend<I: IntoIterator<Item = (String, Capability)>>(&mut self, iter: I) {
        for (pattern, capability) in iter {
            self.record(pattern, capability);
        }
    }
}
