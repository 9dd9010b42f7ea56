//! Directive registry - the ordered catalog of built-in directives
//!
//! Built once per process from the static tier tables in
//! [`crate::directives`]. Tier order is part of the evaluation contract: all
//! variable mutations run before any read, and reads before flow control,
//! scripts and meta directives.

use std::fmt;
use std::sync::{Arc, LazyLock};
use tracing::debug;

use crate::directive::DirectiveRef;
use crate::directives;

/// Evaluation tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Tier {
    /// Caller-supplied directives, consulted ahead of every built-in
    Custom,
    /// Persistent-variable mutations and reads
    HighPrecedence,
    /// Pure reads of desktop, system and network state
    Informational,
    /// Flow control, readers, dialogs, scripts, meta directives
    LowPrecedence,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Custom => "custom",
            Self::HighPrecedence => "high-precedence",
            Self::Informational => "informational",
            Self::LowPrecedence => "low-precedence",
        };
        f.write_str(label)
    }
}

static BUILTIN: LazyLock<Arc<Registry>> = LazyLock::new(|| {
    Arc::new(Registry::from_tiers(
        directives::high_precedence(),
        directives::informational(),
        directives::low_precedence(),
    ))
});

/// Ordered, immutable directive catalog
pub struct Registry {
    entries: Vec<(Tier, DirectiveRef)>,
}

impl Registry {
    /// The process-wide built-in registry
    pub fn builtin() -> Arc<Registry> {
        BUILTIN.clone()
    }

    /// Build a registry from tier tables, keeping table order within each tier
    pub fn from_tiers(high: Vec<DirectiveRef>, informational: Vec<DirectiveRef>, low: Vec<DirectiveRef>) -> Self {
        debug!(
            high = high.len(),
            informational = informational.len(),
            low = low.len(),
            "Registry::from_tiers: called"
        );
        let entries = high
            .into_iter()
            .map(|d| (Tier::HighPrecedence, d))
            .chain(informational.into_iter().map(|d| (Tier::Informational, d)))
            .chain(low.into_iter().map(|d| (Tier::LowPrecedence, d)))
            .collect();
        Self { entries }
    }

    /// Directive by name
    pub fn get(&self, name: &str) -> Option<&DirectiveRef> {
        self.entries.iter().map(|(_, d)| d).find(|d| d.name() == name)
    }

    /// Every directive in evaluation order
    pub fn iter(&self) -> impl Iterator<Item = (Tier, &DirectiveRef)> {
        self.entries.iter().map(|(tier, d)| (*tier, d))
    }

    /// Directives of one tier, in order
    pub fn tier(&self, tier: Tier) -> impl Iterator<Item = &DirectiveRef> {
        self.entries.iter().filter(move |(t, _)| *t == tier).map(|(_, d)| d)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("directives", &self.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn position(registry: &Registry, name: &str) -> usize {
        registry
            .iter()
            .position(|(_, d)| d.name() == name)
            .unwrap_or_else(|| panic!("{name} not registered"))
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let registry = Registry::builtin();
        let mut seen = HashSet::new();
        for (_, directive) in registry.iter() {
            assert!(seen.insert(directive.name().to_string()), "duplicate {}", directive.name());
        }
    }

    #[test]
    fn test_tier_order() {
        let registry = Registry::builtin();
        let tiers: Vec<Tier> = registry.iter().map(|(t, _)| t).collect();
        let mut sorted = tiers.clone();
        sorted.sort();
        assert_eq!(tiers, sorted);

        assert!(position(&registry, "set") < position(&registry, "get"));
        assert!(position(&registry, "get") < position(&registry, "clipboardText"));
        assert!(position(&registry, "clipboardText") < position(&registry, "images"));
        assert!(position(&registry, "images") < position(&registry, "shell"));
        assert!(position(&registry, "shell") < position(&registry, "cutoff"));
    }

    #[test]
    fn test_tier_membership() {
        let registry = Registry::builtin();
        let high: Vec<&str> = registry.tier(Tier::HighPrecedence).map(|d| d.name()).collect();
        assert_eq!(high, vec!["set", "reset", "delete", "increment", "decrement", "get", "vars"]);
        assert!(registry.tier(Tier::Informational).any(|d| d.name() == "currentURL"));
        assert!(registry.tier(Tier::LowPrecedence).any(|d| d.name() == "pdf"));
        assert_eq!(registry.tier(Tier::Custom).count(), 0);
    }

    #[test]
    fn test_dependencies_are_registered() {
        let registry = Registry::builtin();
        for (_, directive) in registry.iter() {
            for dep in directive.dependencies() {
                assert!(registry.get(dep).is_some(), "{} depends on unknown {dep}", directive.name());
            }
        }
    }

    #[test]
    fn test_tier_display() {
        assert_eq!(Tier::LowPrecedence.to_string(), "low-precedence");
    }
}
