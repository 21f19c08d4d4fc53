use super::{
    Result,
    provider::{CmsProvider, PostFilter, PostPage, TermQuery},
    types::{RawContentItem, Term},
};
use async_trait::async_trait;
use moka::future::Cache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Cache key for term lookups
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum TermKey {
    Tags(TermQuery),
    Categories(TermQuery),
}

/// Short-lived cache of raw provider responses
#[derive(Clone)]
pub struct ProviderCache {
    posts: Cache<PostFilter, Arc<PostPage>>,
    terms: Cache<TermKey, Arc<Vec<Term>>>,
    lookups: Cache<String, Arc<Option<RawContentItem>>>,
}

impl ProviderCache {
    /// Create a new cache with default settings
    pub fn new() -> Self {
        Self::with_config(&CacheConfig::default())
    }

    /// Create a new cache with custom configuration
    pub fn with_config(config: &CacheConfig) -> Self {
        let ttl = config.ttl();

        Self {
            posts: Cache::builder()
                .max_capacity(config.max_entries)
                .time_to_live(ttl)
                .build(),
            terms: Cache::builder()
                .max_capacity(config.max_entries)
                .time_to_live(ttl)
                .build(),
            lookups: Cache::builder()
                .max_capacity(config.max_entries)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Clear all caches
    pub fn clear(&self) {
        self.posts.invalidate_all();
        self.terms.invalidate_all();
        self.lookups.invalidate_all();
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            post_pages: self.posts.entry_count(),
            term_lists: self.terms.entry_count(),
            lookups: self.lookups.entry_count(),
        }
    }
}

impl Default for ProviderCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Maximum entries per response kind
    pub max_entries: u64,
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 1000,
            ttl_secs: 300, // 5 minutes
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub post_pages: u64,
    pub term_lists: u64,
    pub lookups: u64,
}

/// `CmsProvider` decorator serving repeated requests from a `ProviderCache`.
/// Errors are never cached.
pub struct CachedCms {
    inner: Arc<dyn CmsProvider>,
    cache: ProviderCache,
}

impl CachedCms {
    pub fn new(inner: Arc<dyn CmsProvider>, cache: ProviderCache) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &ProviderCache {
        &self.cache
    }

    async fn terms(&self, key: TermKey) -> Result<Vec<Term>> {
        if let Some(cached) = self.cache.terms.get(&key).await {
            debug!("Cache hit for {:?}", key);
            return Ok((*cached).clone());
        }

        let terms = match &key {
            TermKey::Tags(query) => self.inner.list_tags(query).await?,
            TermKey::Categories(query) => self.inner.list_categories(query).await?,
        };
        self.cache.terms.insert(key, Arc::new(terms.clone())).await;
        Ok(terms)
    }
}

#[async_trait]
impl CmsProvider for CachedCms {
    fn id(&self) -> &'static str {
        self.inner.id()
    }

    async fn list_posts_page(&self, filter: &PostFilter) -> Result<PostPage> {
        if let Some(cached) = self.cache.posts.get(filter).await {
            debug!("Cache hit for posts page {}", filter.page);
            return Ok((*cached).clone());
        }

        let page = self.inner.list_posts_page(filter).await?;
        self.cache
            .posts
            .insert(filter.clone(), Arc::new(page.clone()))
            .await;
        Ok(page)
    }

    async fn list_tags(&self, query: &TermQuery) -> Result<Vec<Term>> {
        self.terms(TermKey::Tags(query.clone())).await
    }

    async fn list_categories(&self, query: &TermQuery) -> Result<Vec<Term>> {
        self.terms(TermKey::Categories(query.clone())).await
    }

    async fn find_post(&self, slug_or_id: &str) -> Result<Option<RawContentItem>> {
        if let Some(cached) = self.cache.lookups.get(slug_or_id).await {
            return Ok((*cached).clone());
        }

        let found = self.inner.find_post(slug_or_id).await?;
        self.cache
            .lookups
            .insert(slug_or_id.to_string(), Arc::new(found.clone()))
            .await;
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::MockCms;
    use chrono::Utc;

    #[tokio::test]
    async fn test_cached_posts_served_once() {
        let mock = Arc::new(MockCms::new().with_posts(vec![RawContentItem::new(
            "wp:1",
            "La foi EP 1",
            Utc::now(),
            "wordpress",
        )]));
        let cached = CachedCms::new(mock.clone(), ProviderCache::new());

        let filter = PostFilter::new();
        let first = cached.list_posts(&filter).await.unwrap();
        let second = cached.list_posts(&filter).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(mock.post_calls(), 1);
    }

    #[tokio::test]
    async fn test_errors_not_cached() {
        let mock = Arc::new(MockCms::new().failing());
        let cached = CachedCms::new(mock.clone(), ProviderCache::new());

        assert!(cached.list_tags(&TermQuery::Search("foi".into())).await.is_err());
        assert!(cached.list_tags(&TermQuery::Search("foi".into())).await.is_err());
        assert_eq!(mock.calls().len(), 2);
    }
}
