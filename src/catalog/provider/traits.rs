use crate::catalog::{
    Result,
    types::{RawContentItem, Term},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Listing order by publication date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Desc,
    Asc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Desc => "desc",
            Self::Asc => "asc",
        }
    }
}

/// Post listing filter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostFilter {
    pub categories: Vec<u64>,
    pub tags: Vec<u64>,
    pub search: Option<String>,
    pub per_page: u32,
    pub page: u32,
    pub order: SortOrder,
    /// Item ids ("wp:123") to leave out
    pub exclude: Vec<String>,
}

impl Default for PostFilter {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            tags: Vec::new(),
            search: None,
            per_page: 20,
            page: 1,
            order: SortOrder::Desc,
            exclude: Vec::new(),
        }
    }
}

impl PostFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(mut self, categories: impl IntoIterator<Item = u64>) -> Self {
        self.categories = categories.into_iter().collect();
        self
    }

    pub fn with_tag(mut self, tag: u64) -> Self {
        self.tags = vec![tag];
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_per_page(mut self, per_page: u32) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    pub fn excluding(mut self, id: impl Into<String>) -> Self {
        self.exclude.push(id.into());
        self
    }
}

/// One page of a post listing
#[derive(Debug, Clone, Default)]
pub struct PostPage {
    pub items: Vec<RawContentItem>,
    /// Total page count reported by the provider (at least 1)
    pub total_pages: u32,
}

/// Taxonomy lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TermQuery {
    Search(String),
    Ids(Vec<u64>),
}

/// A video-platform playlist with its items in playlist order
#[derive(Debug, Clone, Serialize)]
pub struct Playlist {
    pub id: String,
    pub title: String,
    pub items: Vec<RawContentItem>,
}

/// Blog-style CMS exposing posts, tags and categories
#[async_trait]
pub trait CmsProvider: Send + Sync {
    /// Provider identifier (e.g., "wordpress")
    fn id(&self) -> &'static str;

    /// One page of posts matching `filter`
    async fn list_posts_page(&self, filter: &PostFilter) -> Result<PostPage>;

    /// Posts matching `filter` (the requested page only)
    async fn list_posts(&self, filter: &PostFilter) -> Result<Vec<RawContentItem>> {
        Ok(self.list_posts_page(filter).await?.items)
    }

    async fn list_tags(&self, query: &TermQuery) -> Result<Vec<Term>>;

    async fn list_categories(&self, query: &TermQuery) -> Result<Vec<Term>>;

    /// Single post by slug, numeric id or item id
    async fn find_post(&self, slug_or_id: &str) -> Result<Option<RawContentItem>>;
}

/// Video platform exposing playlists and channel uploads
#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Provider identifier (e.g., "youtube")
    fn id(&self) -> &'static str;

    async fn list_playlist_items(&self, playlist_id: &str, limit: usize) -> Result<Playlist>;

    /// Latest uploads of a channel, newest first
    async fn list_channel_videos(&self, channel_id: &str, limit: usize) -> Result<Vec<RawContentItem>>;
}
