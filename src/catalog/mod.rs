mod aggregator;
mod alias;
mod cache;
mod dedup;
mod home;
mod key;
mod manager;
mod navigation;
mod normalize;
pub mod parser;
pub mod provider;
mod siblings;
mod types;

#[cfg(test)]
pub(crate) mod testing;
#[cfg(test)]
mod tests;

pub use aggregator::SeriesAggregator;
pub use alias::AliasResolver;
pub use cache::{CacheConfig, CacheStats, CachedCms, ProviderCache};
pub use dedup::{DedupRegistry, RailDeduplicator, dedup};
pub use home::{CategoryRail, HomeCatalogBuilder, HomeConfig};
pub use key::SeriesKeyBuilder;
pub use manager::{CatalogService, SeriesCatalogConfig};
pub use navigation::{PrevNext, prev_next};
pub use normalize::{NormalizedKey, clean_title, normalize, slugify};
pub use parser::{ParsedTitle, TitleParser, parse_episode_number, parse_series_fragment};
pub use provider::{
    CmsProvider, Playlist, PostFilter, PostPage, SortOrder, TermQuery, VideoProvider,
    WordPressProvider, YouTubeProvider,
};
pub use siblings::{SiblingConfig, SiblingResolver, Siblings, StrategyKind};
pub use types::{
    ContentKind, GroupSource, Identified, RawContentItem, SeeAll, SeeAllKind, Section,
    SeriesCandidate, SeriesCatalog, SeriesEpisode, SeriesGroup, Term,
};

/// Catalog result type
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Catalog error types
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::DeError),
}

impl CatalogError {
    /// Transport or upstream failure, as opposed to a bad request
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Network(_) | Self::Api { .. } | Self::ProviderUnavailable(_) | Self::Xml(_)
        )
    }

    /// Wrap a provider failure as `ProviderUnavailable`
    pub fn unavailable(provider: &str, source: &CatalogError) -> Self {
        Self::ProviderUnavailable(format!("{provider}: {source}"))
    }
}
