use super::alias::AliasResolver;
use super::normalize::{NormalizedKey, normalize, strip_series_prefix};

/// Composes prefix stripping, alias resolution and normalization into the
/// grouping key. Two names belong to the same series iff their keys are equal.
#[derive(Debug, Clone, Default)]
pub struct SeriesKeyBuilder {
    aliases: AliasResolver,
}

impl SeriesKeyBuilder {
    pub fn new(aliases: AliasResolver) -> Self {
        Self { aliases }
    }

    pub fn aliases(&self) -> &AliasResolver {
        &self.aliases
    }

    /// Alias-resolved display name of a fragment
    pub fn canonical_name(&self, raw_fragment: &str) -> String {
        self.aliases.resolve(strip_series_prefix(raw_fragment).trim())
    }

    /// Grouping key of a fragment
    pub fn build_key(&self, raw_fragment: &str) -> NormalizedKey {
        normalize(&self.canonical_name(raw_fragment))
    }
}
