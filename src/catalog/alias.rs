use super::normalize::{NormalizedKey, normalize};
use std::collections::HashMap;

/// Built-in synonym table: variant → canonical display name
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("ecole croissance", "École de croissance"),
    ("ecole de croissance", "École de croissance"),
];

/// Maps known synonym series names to one canonical display name
#[derive(Debug, Clone)]
pub struct AliasResolver {
    aliases: HashMap<NormalizedKey, String>,
}

impl AliasResolver {
    /// Resolver with the built-in table only
    pub fn new() -> Self {
        let mut resolver = Self {
            aliases: HashMap::new(),
        };
        for &(variant, canonical) in DEFAULT_ALIASES {
            resolver.insert(variant, canonical);
        }
        resolver
    }

    /// Builder pattern: add extra aliases on top of the built-in table
    pub fn with_aliases<I, K, V>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (variant, canonical) in aliases {
            self.insert(variant.as_ref(), canonical);
        }
        self
    }

    fn insert(&mut self, variant: &str, canonical: impl Into<String>) {
        let key = normalize(variant);
        if !key.is_empty() {
            self.aliases.insert(key, canonical.into());
        }
    }

    /// Canonical display name for `name`, or `name` itself when unmapped
    pub fn resolve(&self, name: &str) -> String {
        self.aliases
            .get(&normalize(name))
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl Default for AliasResolver {
    fn default() -> Self {
        Self::new()
    }
}
