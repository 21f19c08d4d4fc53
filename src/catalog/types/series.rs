use super::item::RawContentItem;
use crate::catalog::normalize::NormalizedKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One item's claim to belong to a series, built during aggregation
#[derive(Debug, Clone)]
pub struct SeriesCandidate {
    /// Fragment as found in the title (before alias resolution)
    pub raw_fragment: String,
    pub key: NormalizedKey,
    pub episode_number: Option<i32>,
    pub item: RawContentItem,
}

impl SeriesCandidate {
    pub fn new(
        raw_fragment: impl Into<String>,
        key: NormalizedKey,
        episode_number: Option<i32>,
        item: RawContentItem,
    ) -> Self {
        Self {
            raw_fragment: raw_fragment.into(),
            key,
            episode_number,
            item,
        }
    }
}

/// Where a series group comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GroupSource {
    /// Inferred from CMS titles
    Cms,
    /// A video-platform playlist
    Playlist { id: String },
}

/// An episode inside a group, with its parsed position
#[derive(Debug, Clone, Serialize)]
pub struct SeriesEpisode {
    pub episode_number: Option<i32>,
    pub item: RawContentItem,
}

/// A detected series
#[derive(Debug, Clone, Serialize)]
pub struct SeriesGroup {
    pub canonical_name: String,
    pub key: NormalizedKey,
    /// Numbered episodes ascending, then unnumbered ones by date
    pub episodes: Vec<SeriesEpisode>,
    /// Always one of `episodes`
    pub representative: RawContentItem,
    pub source: GroupSource,
}

impl SeriesGroup {
    pub fn episode_count(&self) -> usize {
        self.episodes.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.episodes.iter().any(|ep| ep.item.id == id)
    }

    pub fn items(&self) -> impl Iterator<Item = &RawContentItem> {
        self.episodes.iter().map(|ep| &ep.item)
    }
}

/// "See all" link attached to a rail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeeAll {
    pub kind: SeeAllKind,
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeeAllKind {
    Category,
    Tag,
    Playlist,
    Series,
}

/// One rail of the home catalog
#[derive(Debug, Clone, Serialize)]
pub struct Section {
    pub key: String,
    pub title: String,
    pub items: Vec<RawContentItem>,
    pub see_all: Option<SeeAll>,
}

impl Section {
    pub fn new(key: impl Into<String>, title: impl Into<String>, items: Vec<RawContentItem>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            items,
            see_all: None,
        }
    }

    /// Builder pattern: set the "see all" reference
    pub fn with_see_all(mut self, kind: SeeAllKind, id: impl Into<String>) -> Self {
        self.see_all = Some(SeeAll {
            kind,
            id: id.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Result of the full series listing
#[derive(Debug, Clone, Serialize)]
pub struct SeriesCatalog {
    pub series: Vec<SeriesGroup>,
    pub total_posts: usize,
    pub generated_at: DateTime<Utc>,
}
