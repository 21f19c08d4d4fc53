use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content kind, detected from the provider payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Audio,
    Video,
    #[default]
    Text,
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Audio => write!(f, "audio"),
            Self::Video => write!(f, "video"),
            Self::Text => write!(f, "text"),
        }
    }
}

/// A provider taxonomy term (tag or category)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

impl Term {
    pub fn new(id: u64, name: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            slug: slug.into(),
        }
    }
}

/// Provider-agnostic content record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawContentItem {
    /// Provider-qualified identifier ("wp:123", "yt:abc", "ytpl:PL..:abc")
    pub id: String,
    /// Raw title; may still contain HTML entities
    pub title: String,
    /// URL slug, used by tag/category scoring
    pub slug: String,
    pub kind: ContentKind,
    pub published_at: DateTime<Utc>,
    pub thumbnail_url: Option<String>,
    pub detail_url: String,
    pub tags: Vec<Term>,
    pub categories: Vec<Term>,
    /// Provider name ("wordpress", "youtube")
    pub provider: String,
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
    pub embed_url: Option<String>,
}

impl RawContentItem {
    /// Create a new item with required fields
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        published_at: DateTime<Utc>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            slug: String::new(),
            kind: ContentKind::Text,
            published_at,
            thumbnail_url: None,
            detail_url: String::new(),
            tags: Vec::new(),
            categories: Vec::new(),
            provider: provider.into(),
            audio_url: None,
            video_url: None,
            embed_url: None,
        }
    }

    /// Builder pattern: set kind
    pub fn with_kind(mut self, kind: ContentKind) -> Self {
        self.kind = kind;
        self
    }

    /// Builder pattern: set slug
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    /// Builder pattern: set thumbnail
    pub fn with_thumbnail(mut self, url: Option<String>) -> Self {
        self.thumbnail_url = url;
        self
    }

    /// Builder pattern: set detail URL
    pub fn with_detail_url(mut self, url: impl Into<String>) -> Self {
        self.detail_url = url.into();
        self
    }

    /// Builder pattern: add a tag
    pub fn with_tag(mut self, tag: Term) -> Self {
        self.tags.push(tag);
        self
    }

    /// Builder pattern: add a category
    pub fn with_category(mut self, category: Term) -> Self {
        self.categories.push(category);
        self
    }

    pub fn has_categories(&self) -> bool {
        !self.categories.is_empty()
    }

    pub fn category_ids(&self) -> Vec<u64> {
        self.categories.iter().map(|c| c.id).collect()
    }
}

/// Anything with a stable identifier, used by rail deduplication
pub trait Identified {
    fn id(&self) -> &str;
}

impl Identified for RawContentItem {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Identified for String {
    fn id(&self) -> &str {
        self
    }
}

impl Identified for &str {
    fn id(&self) -> &str {
        self
    }
}
