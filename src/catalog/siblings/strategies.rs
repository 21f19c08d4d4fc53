use super::scoring::{
    ScoreContext, best_term, item_key, item_signal, required_token_matches, signal_matches,
    significant_tokens, strip_slug_prefix, term_key, token_hits,
};
use super::{Focal, SiblingStrategy, StrategyContext, StrategyKind};
use crate::catalog::{
    Result,
    normalize::NormalizedKey,
    provider::{PostFilter, SortOrder, TermQuery},
    types::{RawContentItem, Term},
};
use async_trait::async_trait;
use futures::future::try_join_all;
use std::collections::HashSet;
use tracing::debug;

/// The full chain, in order
pub fn default_strategies() -> Vec<Box<dyn SiblingStrategy>> {
    vec![
        Box::new(ExactSeriesTag),
        Box::new(ScoredTag),
        Box::new(FragmentTagSearch),
        Box::new(ScoredCategory),
        Box::new(FragmentSearch),
        Box::new(TokenSearch),
        Box::new(SameCategory),
        Box::new(RecentFallback),
    ]
}

fn tag_listing(tag: u64, ctx: &StrategyContext<'_>) -> PostFilter {
    PostFilter::new()
        .with_tag(tag)
        .with_per_page(ctx.config.per_page)
        .with_order(SortOrder::Asc)
}

fn category_listing(categories: impl IntoIterator<Item = u64>, ctx: &StrategyContext<'_>) -> PostFilter {
    PostFilter::new()
        .with_categories(categories)
        .with_per_page(ctx.config.per_page)
        .with_order(SortOrder::Asc)
}

/// Keep items whose series signal matches the focal one; without a focal
/// signal everything is kept
fn keep_matching(focal: &Focal, items: Vec<RawContentItem>, ctx: &StrategyContext<'_>) -> Vec<RawContentItem> {
    let Some(focal_key) = focal.key.as_ref() else {
        return items;
    };

    items
        .into_iter()
        .filter(|item| {
            item.id == focal.item.id
                || signal_matches(focal_key, &item_signal(item, ctx.keys), ctx.config)
        })
        .collect()
}

fn keep_exact(focal: &Focal, items: Vec<RawContentItem>, ctx: &StrategyContext<'_>) -> Vec<RawContentItem> {
    let Some(focal_key) = focal.key.as_ref() else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter(|item| item_key(item, ctx.keys).as_ref() == Some(focal_key))
        .collect()
}

fn score_context<'a>(
    focal: &'a Focal,
    denylist: &'a HashSet<NormalizedKey>,
) -> ScoreContext<'a> {
    ScoreContext {
        item_slug: &focal.item.slug,
        title_key: &focal.title_key,
        series_slug: focal.series_slug.as_deref(),
        denylist,
    }
}

/// 1. A tag named "Série: ..." lists the whole series
pub struct ExactSeriesTag;

#[async_trait]
impl SiblingStrategy for ExactSeriesTag {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ExactSeriesTag
    }

    fn applies(&self, focal: &Focal) -> bool {
        focal.series_tag().is_some()
    }

    async fn attempt(&self, focal: &Focal, ctx: &StrategyContext<'_>) -> Result<Vec<RawContentItem>> {
        let Some(tag) = focal.series_tag() else {
            return Ok(Vec::new());
        };
        debug!("Listing series tag {} ({})", tag.name, tag.id);
        ctx.cms.list_posts(&tag_listing(tag.id, ctx)).await
    }
}

/// 2. Best-scoring focal tag, filtered on series signal
pub struct ScoredTag;

#[async_trait]
impl SiblingStrategy for ScoredTag {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ScoredTag
    }

    fn applies(&self, focal: &Focal) -> bool {
        !focal.item.tags.is_empty()
    }

    async fn attempt(&self, focal: &Focal, ctx: &StrategyContext<'_>) -> Result<Vec<RawContentItem>> {
        let score_ctx = score_context(focal, ctx.tag_denylist);
        let Some(tag) = best_term(&focal.item.tags, &score_ctx, ctx.config.min_term_score) else {
            return Ok(Vec::new());
        };

        debug!("Best tag for {}: {}", focal.item.id, tag.name);
        let items = ctx.cms.list_posts(&tag_listing(tag.id, ctx)).await?;
        Ok(keep_matching(focal, items, ctx))
    }
}

/// 3. Look the fragment up as a tag name
pub struct FragmentTagSearch;

impl FragmentTagSearch {
    fn tag_matches(tag: &Term, focal: &Focal) -> bool {
        let by_name = focal.key.as_ref() == Some(&term_key(tag));
        let by_slug = focal
            .series_slug
            .as_deref()
            .is_some_and(|slug| strip_slug_prefix(&tag.slug) == slug);
        by_name || by_slug
    }

    async fn find_tag(&self, query: &str, focal: &Focal, ctx: &StrategyContext<'_>) -> Result<Option<Term>> {
        let tags = ctx.cms.list_tags(&TermQuery::Search(query.to_string())).await?;
        Ok(tags.into_iter().find(|t| Self::tag_matches(t, focal)))
    }
}

#[async_trait]
impl SiblingStrategy for FragmentTagSearch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FragmentTagSearch
    }

    fn applies(&self, focal: &Focal) -> bool {
        focal.has_signal()
    }

    async fn attempt(&self, focal: &Focal, ctx: &StrategyContext<'_>) -> Result<Vec<RawContentItem>> {
        let Some(fragment) = focal.fragment.as_deref() else {
            return Ok(Vec::new());
        };

        let mut tag = self.find_tag(fragment, focal, ctx).await?;
        if tag.is_none()
            && let Some(slug) = focal.series_slug.as_deref()
        {
            tag = self.find_tag(slug, focal, ctx).await?;
        }
        let Some(tag) = tag else {
            return Ok(Vec::new());
        };
        debug!("Tag found by lookup for {}: {}", focal.item.id, tag.name);

        let items = ctx.cms.list_posts(&tag_listing(tag.id, ctx)).await?;
        Ok(keep_matching(focal, items, ctx))
    }
}

/// 4. Best-scoring focal category, filtered on series signal
pub struct ScoredCategory;

#[async_trait]
impl SiblingStrategy for ScoredCategory {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ScoredCategory
    }

    fn applies(&self, focal: &Focal) -> bool {
        focal.has_categories()
    }

    async fn attempt(&self, focal: &Focal, ctx: &StrategyContext<'_>) -> Result<Vec<RawContentItem>> {
        let score_ctx = score_context(focal, ctx.category_denylist);
        let Some(category) =
            best_term(&focal.item.categories, &score_ctx, ctx.config.min_term_score)
        else {
            return Ok(Vec::new());
        };

        debug!("Best category for {}: {}", focal.item.id, category.name);
        let items = ctx
            .cms
            .list_posts(&category_listing([category.id], ctx))
            .await?;
        Ok(keep_matching(focal, items, ctx))
    }
}

/// 5. Free-text search on the fragment, exact key only
pub struct FragmentSearch;

#[async_trait]
impl SiblingStrategy for FragmentSearch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FragmentSearch
    }

    fn applies(&self, focal: &Focal) -> bool {
        focal.has_signal()
    }

    async fn attempt(&self, focal: &Focal, ctx: &StrategyContext<'_>) -> Result<Vec<RawContentItem>> {
        let Some(fragment) = focal.fragment.as_deref() else {
            return Ok(Vec::new());
        };

        let filter = PostFilter::new()
            .with_search(fragment)
            .with_per_page(ctx.config.per_page);
        let items = ctx.cms.list_posts(&filter).await?;
        Ok(keep_exact(focal, items, ctx))
    }
}

/// 6. One search per significant token, loose token matching
pub struct TokenSearch;

#[async_trait]
impl SiblingStrategy for TokenSearch {
    fn kind(&self) -> StrategyKind {
        StrategyKind::TokenSearch
    }

    fn applies(&self, focal: &Focal) -> bool {
        focal.has_signal()
    }

    async fn attempt(&self, focal: &Focal, ctx: &StrategyContext<'_>) -> Result<Vec<RawContentItem>> {
        let (Some(fragment), Some(focal_key)) = (focal.fragment.as_deref(), focal.key.as_ref()) else {
            return Ok(Vec::new());
        };

        let tokens = significant_tokens(fragment, &focal.item.slug, ctx.config);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }
        debug!("Token search for {}: {:?}", focal.item.id, tokens);

        let searches = tokens.iter().map(|token| {
            let filter = PostFilter::new()
                .with_search(token.clone())
                .with_per_page(ctx.config.per_page);
            async move { ctx.cms.list_posts(&filter).await }
        });
        let pages = try_join_all(searches).await?;

        let required = required_token_matches(tokens.len(), ctx.config);
        let mut seen = HashSet::new();
        let items = pages
            .into_iter()
            .flatten()
            .filter(|item| seen.insert(item.id.clone()))
            .filter(|item| {
                item_key(item, ctx.keys).as_ref() == Some(focal_key)
                    || token_hits(item, &tokens) >= required
            })
            .collect();

        Ok(items)
    }
}

/// 7. Recent items sharing the focal categories, only without a series signal
pub struct SameCategory;

#[async_trait]
impl SiblingStrategy for SameCategory {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SameCategory
    }

    fn applies(&self, focal: &Focal) -> bool {
        !focal.has_signal() && focal.has_categories()
    }

    async fn attempt(&self, focal: &Focal, ctx: &StrategyContext<'_>) -> Result<Vec<RawContentItem>> {
        let filter = PostFilter::new()
            .with_categories(focal.item.category_ids())
            .with_per_page(ctx.config.recent_limit)
            .excluding(focal.item.id.clone());
        let items = ctx.cms.list_posts(&filter).await?;
        Ok(items.into_iter().filter(|i| i.id != focal.item.id).collect())
    }
}

/// 8. Most recent items, only without categories and series signal
pub struct RecentFallback;

#[async_trait]
impl SiblingStrategy for RecentFallback {
    fn kind(&self) -> StrategyKind {
        StrategyKind::RecentFallback
    }

    fn applies(&self, focal: &Focal) -> bool {
        !focal.has_signal() && !focal.has_categories()
    }

    fn is_final(&self) -> bool {
        true
    }

    async fn attempt(&self, focal: &Focal, ctx: &StrategyContext<'_>) -> Result<Vec<RawContentItem>> {
        let filter = PostFilter::new()
            .with_per_page(ctx.config.recent_limit)
            .excluding(focal.item.id.clone());
        let items = ctx.cms.list_posts(&filter).await?;
        Ok(items.into_iter().filter(|i| i.id != focal.item.id).collect())
    }
}
