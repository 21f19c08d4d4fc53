//! Sibling resolution: given one item, find the other episodes of its series.
//!
//! Strategies run strictly in [`StrategyKind`] order and the chain stops at
//! the first one that returns at least one item other than the focal item.
//! Provider errors are swallowed (logged, treated as empty) except in the
//! final strategy, where they surface as [`CatalogError::ProviderUnavailable`].

mod scoring;
mod strategies;

use crate::catalog::{
    CatalogError, Result,
    key::SeriesKeyBuilder,
    normalize::{NormalizedKey, clean_title, has_series_prefix, normalize, slugify},
    parser::TitleParser,
    provider::CmsProvider,
    types::{RawContentItem, Term},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use strategies::default_strategies;

/// Strategy identifiers, in chain order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    ExactSeriesTag,
    ScoredTag,
    FragmentTagSearch,
    ScoredCategory,
    FragmentSearch,
    TokenSearch,
    SameCategory,
    RecentFallback,
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::ExactSeriesTag => "exact_series_tag",
            Self::ScoredTag => "scored_tag",
            Self::FragmentTagSearch => "fragment_tag_search",
            Self::ScoredCategory => "scored_category",
            Self::FragmentSearch => "fragment_search",
            Self::TokenSearch => "token_search",
            Self::SameCategory => "same_category",
            Self::RecentFallback => "recent_fallback",
        };
        f.write_str(name)
    }
}

/// Sibling resolution thresholds and word lists
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiblingConfig {
    /// Page size for tag/category/search listings
    pub per_page: u32,
    /// Minimum score for a tag or category to be used
    pub min_term_score: i32,
    /// Containment matching needs this many chars...
    pub containment_min_chars: usize,
    /// ...or this many words on both sides
    pub containment_min_words: usize,
    pub token_min_len: usize,
    pub max_tokens: usize,
    pub token_match_ratio: f64,
    pub max_token_matches: usize,
    /// Page size for the same-category and recent fallbacks
    pub recent_limit: u32,
    pub tag_denylist: Vec<String>,
    pub category_denylist: Vec<String>,
    pub stop_words: Vec<String>,
}

impl Default for SiblingConfig {
    fn default() -> Self {
        let words = |list: &[&str]| -> Vec<String> { list.iter().map(|w| (*w).to_string()).collect() };
        Self {
            per_page: 100,
            min_term_score: 2,
            containment_min_chars: 6,
            containment_min_words: 2,
            token_min_len: 4,
            max_tokens: 2,
            token_match_ratio: 0.6,
            max_token_matches: 2,
            recent_limit: 12,
            tag_denylist: words(&[
                "audio", "video", "vidéo", "podcast", "mp3", "message", "messages", "prédication",
                "predications", "sermon", "sermons", "culte", "cultes", "enseignement",
                "enseignements", "replay", "live", "direct", "à la une", "nouveau",
            ]),
            category_denylist: words(&[
                "non classé", "uncategorized", "général", "divers", "actualités", "blog",
                "audio", "vidéo", "podcast", "messages", "cultes",
            ]),
            stop_words: words(&[
                "avec", "dans", "pour", "par", "sans", "sous", "vers", "chez", "entre", "leur",
                "leurs", "notre", "nos", "votre", "vos", "cette", "ces", "comme", "mais", "plus",
                "tout", "tous", "toute", "toutes", "être", "etre", "avoir", "faire", "quand",
                "dont", "elle", "elles", "nous", "vous", "ils", "serie", "série", "series",
                "episode", "épisode", "partie", "session", "the", "and", "with", "from",
            ]),
        }
    }
}

/// Resolved sibling list
#[derive(Debug, Clone, Serialize)]
pub struct Siblings {
    /// Ascending by publication date, always contains the focal item
    pub items: Vec<RawContentItem>,
    /// Strategy that produced the list, `None` when only the focal item remains
    pub matched_by: Option<StrategyKind>,
}

impl Siblings {
    pub fn focal_only(item: &RawContentItem) -> Self {
        Self {
            items: vec![item.clone()],
            matched_by: None,
        }
    }

    pub fn is_match(&self) -> bool {
        self.matched_by.is_some()
    }
}

/// The focal item with everything strategies derive from it
#[derive(Debug, Clone)]
pub struct Focal {
    pub item: RawContentItem,
    pub fragment: Option<String>,
    pub key: Option<NormalizedKey>,
    /// Slug of the canonical series name
    pub series_slug: Option<String>,
    pub title_key: NormalizedKey,
}

impl Focal {
    pub fn new(item: &RawContentItem, keys: &SeriesKeyBuilder) -> Self {
        let parsed = TitleParser::parse(&item.title);
        let key = parsed
            .fragment
            .as_deref()
            .map(|f| keys.build_key(f))
            .filter(|k| !k.is_empty());
        let series_slug = parsed
            .fragment
            .as_deref()
            .map(|f| slugify(&keys.canonical_name(f)));

        Self {
            item: item.clone(),
            fragment: parsed.fragment,
            key,
            series_slug,
            title_key: normalize(&parsed.cleaned),
        }
    }

    pub fn has_signal(&self) -> bool {
        self.key.is_some()
    }

    pub fn has_categories(&self) -> bool {
        self.item.has_categories()
    }

    /// Focal tag carrying a "Série:" prefix
    pub fn series_tag(&self) -> Option<&Term> {
        self.item
            .tags
            .iter()
            .find(|t| has_series_prefix(&clean_title(&t.name)))
    }
}

/// Everything a strategy may use besides the focal item
pub struct StrategyContext<'a> {
    pub cms: &'a dyn CmsProvider,
    pub config: &'a SiblingConfig,
    pub keys: &'a SeriesKeyBuilder,
    pub tag_denylist: &'a HashSet<NormalizedKey>,
    pub category_denylist: &'a HashSet<NormalizedKey>,
}

/// One step of the sibling chain
#[async_trait]
pub trait SiblingStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Whether the strategy runs at all for this focal item
    fn applies(&self, focal: &Focal) -> bool;

    /// Final strategies propagate provider errors instead of swallowing them
    fn is_final(&self) -> bool {
        false
    }

    async fn attempt(&self, focal: &Focal, ctx: &StrategyContext<'_>) -> Result<Vec<RawContentItem>>;
}

/// Runs the strategy chain against a CMS provider
pub struct SiblingResolver {
    cms: Arc<dyn CmsProvider>,
    strategies: Vec<Box<dyn SiblingStrategy>>,
    config: SiblingConfig,
    keys: SeriesKeyBuilder,
    tag_denylist: HashSet<NormalizedKey>,
    category_denylist: HashSet<NormalizedKey>,
}

impl SiblingResolver {
    pub fn new(cms: Arc<dyn CmsProvider>, keys: SeriesKeyBuilder, config: SiblingConfig) -> Self {
        Self::with_strategies(cms, keys, config, default_strategies())
    }

    pub fn with_strategies(
        cms: Arc<dyn CmsProvider>,
        keys: SeriesKeyBuilder,
        config: SiblingConfig,
        strategies: Vec<Box<dyn SiblingStrategy>>,
    ) -> Self {
        let to_keys =
            |list: &[String]| -> HashSet<NormalizedKey> { list.iter().map(|w| normalize(w)).collect() };
        Self {
            cms,
            strategies,
            tag_denylist: to_keys(&config.tag_denylist),
            category_denylist: to_keys(&config.category_denylist),
            config,
            keys,
        }
    }

    pub fn config(&self) -> &SiblingConfig {
        &self.config
    }

    /// Siblings of `item`, focal included, oldest first
    pub async fn resolve(&self, item: &RawContentItem) -> Result<Siblings> {
        let focal = Focal::new(item, &self.keys);
        let ctx = StrategyContext {
            cms: self.cms.as_ref(),
            config: &self.config,
            keys: &self.keys,
            tag_denylist: &self.tag_denylist,
            category_denylist: &self.category_denylist,
        };

        debug!(
            "Resolving siblings of {} (signal: {:?})",
            item.id,
            focal.key.as_ref().map(NormalizedKey::as_str)
        );

        for strategy in &self.strategies {
            if !strategy.applies(&focal) {
                continue;
            }

            let found = match strategy.attempt(&focal, &ctx).await {
                Ok(found) => found,
                Err(e) if strategy.is_final() => {
                    warn!("Final sibling strategy {} failed: {}", strategy.kind(), e);
                    return Err(match e {
                        CatalogError::ProviderUnavailable(_) => e,
                        other => CatalogError::unavailable(self.cms.id(), &other),
                    });
                }
                Err(e) => {
                    warn!("Sibling strategy {} failed, continuing: {}", strategy.kind(), e);
                    continue;
                }
            };

            if found.iter().any(|i| i.id != item.id) {
                info!(
                    "Siblings of {} matched by {} ({} items)",
                    item.id,
                    strategy.kind(),
                    found.len()
                );
                return Ok(Siblings {
                    items: finalize(item, found),
                    matched_by: Some(strategy.kind()),
                });
            }
        }

        debug!("No siblings found for {}", item.id);
        Ok(Siblings::focal_only(item))
    }
}

/// Union with the focal item, unique by id, oldest first
fn finalize(focal: &RawContentItem, found: Vec<RawContentItem>) -> Vec<RawContentItem> {
    let mut by_id: HashMap<String, RawContentItem> = HashMap::new();
    by_id.insert(focal.id.clone(), focal.clone());
    for item in found {
        by_id.entry(item.id.clone()).or_insert(item);
    }

    let mut items: Vec<RawContentItem> = by_id.into_values().collect();
    items.sort_by(|a, b| a.published_at.cmp(&b.published_at).then_with(|| a.id.cmp(&b.id)));
    items
}
