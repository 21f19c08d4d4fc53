//! In-memory providers with call recording

use super::{
    CatalogError, Result,
    normalize::{normalize, slugify},
    provider::{CmsProvider, Playlist, PostFilter, PostPage, SortOrder, TermQuery, VideoProvider},
    types::{RawContentItem, Term},
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

/// A recorded CMS request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CmsCall {
    Posts(PostFilter),
    Tags(TermQuery),
    Categories(TermQuery),
    Find(String),
}

impl CmsCall {
    pub fn is_search(&self) -> bool {
        matches!(self, Self::Posts(f) if f.search.is_some())
    }
}

type FailWhen = Box<dyn Fn(&CmsCall) -> bool + Send + Sync>;

fn mock_failure() -> CatalogError {
    CatalogError::Api {
        status: 503,
        message: "mock provider down".to_string(),
    }
}

pub struct MockCms {
    posts: Vec<RawContentItem>,
    tags: Vec<Term>,
    categories: Vec<Term>,
    fail_when: Option<FailWhen>,
    calls: Mutex<Vec<CmsCall>>,
}

impl MockCms {
    pub fn new() -> Self {
        Self {
            posts: Vec::new(),
            tags: Vec::new(),
            categories: Vec::new(),
            fail_when: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_posts(mut self, posts: Vec<RawContentItem>) -> Self {
        self.posts = posts;
        self
    }

    pub fn with_tags(mut self, tags: Vec<Term>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_categories(mut self, categories: Vec<Term>) -> Self {
        self.categories = categories;
        self
    }

    /// Every call fails
    pub fn failing(self) -> Self {
        self.failing_when(|_| true)
    }

    /// Calls matching `predicate` fail
    pub fn failing_when(mut self, predicate: impl Fn(&CmsCall) -> bool + Send + Sync + 'static) -> Self {
        self.fail_when = Some(Box::new(predicate));
        self
    }

    pub fn calls(&self) -> Vec<CmsCall> {
        self.calls.lock().clone()
    }

    pub fn post_calls(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, CmsCall::Posts(_)))
            .count()
    }

    fn record(&self, call: CmsCall) -> Result<()> {
        let fails = self.fail_when.as_ref().is_some_and(|f| f(&call));
        self.calls.lock().push(call);
        if fails { Err(mock_failure()) } else { Ok(()) }
    }

    fn matches_filter(item: &RawContentItem, filter: &PostFilter) -> bool {
        let in_categories = filter.categories.is_empty()
            || item.categories.iter().any(|c| filter.categories.contains(&c.id));
        let in_tags = filter.tags.is_empty() || item.tags.iter().any(|t| filter.tags.contains(&t.id));
        let excluded = filter.exclude.contains(&item.id);
        let found = filter.search.as_deref().is_none_or(|search| {
            let slug = slugify(search);
            normalize(&item.title).contains(&normalize(search))
                || (!slug.is_empty() && item.slug.contains(&slug))
        });

        in_categories && in_tags && !excluded && found
    }

    fn search_terms(terms: &[Term], query: &TermQuery) -> Vec<Term> {
        terms
            .iter()
            .filter(|t| match query {
                TermQuery::Search(text) => {
                    let slug = slugify(text);
                    normalize(&t.name).contains(&normalize(text))
                        || (!slug.is_empty() && t.slug.contains(&slug))
                }
                TermQuery::Ids(ids) => ids.contains(&t.id),
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CmsProvider for MockCms {
    fn id(&self) -> &'static str {
        "mock-cms"
    }

    async fn list_posts_page(&self, filter: &PostFilter) -> Result<PostPage> {
        self.record(CmsCall::Posts(filter.clone()))?;

        let mut items: Vec<RawContentItem> = self
            .posts
            .iter()
            .filter(|item| Self::matches_filter(item, filter))
            .cloned()
            .collect();
        items.sort_by(|a, b| match filter.order {
            SortOrder::Desc => b.published_at.cmp(&a.published_at),
            SortOrder::Asc => a.published_at.cmp(&b.published_at),
        });

        let per_page = filter.per_page.max(1) as usize;
        let total_pages = items.len().div_ceil(per_page).max(1) as u32;
        let start = (filter.page.max(1) as usize - 1) * per_page;

        Ok(PostPage {
            items: items.into_iter().skip(start).take(per_page).collect(),
            total_pages,
        })
    }

    async fn list_tags(&self, query: &TermQuery) -> Result<Vec<Term>> {
        self.record(CmsCall::Tags(query.clone()))?;
        Ok(Self::search_terms(&self.tags, query))
    }

    async fn list_categories(&self, query: &TermQuery) -> Result<Vec<Term>> {
        self.record(CmsCall::Categories(query.clone()))?;
        Ok(Self::search_terms(&self.categories, query))
    }

    async fn find_post(&self, slug_or_id: &str) -> Result<Option<RawContentItem>> {
        self.record(CmsCall::Find(slug_or_id.to_string()))?;
        Ok(self
            .posts
            .iter()
            .find(|p| {
                p.id == slug_or_id
                    || p.slug == slug_or_id
                    || p.id.strip_prefix("wp:") == Some(slug_or_id)
            })
            .cloned())
    }
}

pub struct MockVideo {
    playlists: HashMap<String, Playlist>,
    channel: Vec<RawContentItem>,
    failing: bool,
    calls: Mutex<Vec<String>>,
}

impl MockVideo {
    pub fn new() -> Self {
        Self {
            playlists: HashMap::new(),
            channel: Vec::new(),
            failing: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_playlist(mut self, playlist: Playlist) -> Self {
        self.playlists.insert(playlist.id.clone(), playlist);
        self
    }

    pub fn with_channel_videos(mut self, videos: Vec<RawContentItem>) -> Self {
        self.channel = videos;
        self
    }

    pub fn failing(mut self) -> Self {
        self.failing = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    fn record(&self, call: String) -> Result<()> {
        self.calls.lock().push(call);
        if self.failing { Err(mock_failure()) } else { Ok(()) }
    }
}

#[async_trait]
impl VideoProvider for MockVideo {
    fn id(&self) -> &'static str {
        "mock-video"
    }

    async fn list_playlist_items(&self, playlist_id: &str, limit: usize) -> Result<Playlist> {
        self.record(format!("playlist:{playlist_id}"))?;
        let mut playlist = self
            .playlists
            .get(playlist_id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(format!("playlist {playlist_id}")))?;
        playlist.items.truncate(limit);
        Ok(playlist)
    }

    async fn list_channel_videos(&self, channel_id: &str, limit: usize) -> Result<Vec<RawContentItem>> {
        self.record(format!("channel:{channel_id}"))?;
        let mut videos = self.channel.clone();
        videos.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        videos.truncate(limit);
        Ok(videos)
    }
}
