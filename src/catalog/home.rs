//! Home catalog: ordered rails built from CMS listings and channel uploads,
//! deduplicated so every item appears once.

use super::{
    Result,
    dedup::RailDeduplicator,
    key::SeriesKeyBuilder,
    normalize::{clean_title, has_series_prefix, normalize, strip_series_prefix},
    provider::{CmsProvider, PostFilter, SortOrder, TermQuery, VideoProvider},
    types::{ContentKind, RawContentItem, SeeAllKind, Section, Term},
};
use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A CMS category shown as its own rail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRail {
    pub key: String,
    pub title: String,
    pub category_id: u64,
    #[serde(default = "default_rail_limit")]
    pub limit: u32,
}

fn default_rail_limit() -> u32 {
    12
}

impl CategoryRail {
    pub fn new(key: impl Into<String>, title: impl Into<String>, category_id: u64) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            category_id,
            limit: default_rail_limit(),
        }
    }
}

/// Home rail layout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HomeConfig {
    /// Latest posts fetched once and shared by the "new" and "audio" rails
    pub latest_pool: u32,
    pub new_window_days: i64,
    pub new_limit: usize,
    pub audio_limit: usize,
    pub rail_limit: u32,
    pub video_limit: usize,
    /// Channel uploads fetched for the "new" and "videos" rails
    pub channel_fetch: usize,
    pub category_rails: Vec<CategoryRail>,
    /// Series shown oldest first near the top, looked up by tag name
    pub featured_series: Option<String>,
    pub featured_limit: u32,
    pub themes: Vec<String>,
    pub series_tag_queries: Vec<String>,
    pub max_series_rails: usize,
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            latest_pool: 60,
            new_window_days: 7,
            new_limit: 18,
            audio_limit: 12,
            rail_limit: 12,
            video_limit: 12,
            channel_fetch: 20,
            category_rails: vec![
                CategoryRail::new("msg", "Messages du jour", 34),
                CategoryRail::new("cultes", "Cultes", 12),
                CategoryRail::new("ens", "Enseignements", 56),
            ],
            featured_series: Some("École de croissance".to_string()),
            featured_limit: 60,
            themes: ["Foi", "Prière", "Saint-Esprit", "Famille", "Jeûne"]
                .into_iter()
                .map(String::from)
                .collect(),
            series_tag_queries: vec!["Serie:".to_string(), "Série:".to_string()],
            max_series_rails: 6,
        }
    }
}

/// Log a failed rail and fall back to nothing
fn or_empty<T: Default>(rail: &str, result: Result<T>) -> T {
    result.unwrap_or_else(|e| {
        warn!("Home rail {} unavailable: {}", rail, e);
        T::default()
    })
}

/// Builds the home rails for one request
pub struct HomeCatalogBuilder {
    cms: Arc<dyn CmsProvider>,
    video: Option<(Arc<dyn VideoProvider>, String)>,
    keys: SeriesKeyBuilder,
    config: HomeConfig,
}

impl HomeCatalogBuilder {
    pub fn new(cms: Arc<dyn CmsProvider>, keys: SeriesKeyBuilder, config: HomeConfig) -> Self {
        Self {
            cms,
            video: None,
            keys,
            config,
        }
    }

    /// Builder pattern: add channel uploads
    pub fn with_channel(mut self, video: Arc<dyn VideoProvider>, channel_id: impl Into<String>) -> Self {
        self.video = Some((video, channel_id.into()));
        self
    }

    pub fn config(&self) -> &HomeConfig {
        &self.config
    }

    /// Ordered, deduplicated rails. Only a failing latest-posts fetch is an error.
    pub async fn build(&self, now: DateTime<Utc>) -> Result<Vec<Section>> {
        let latest_filter = PostFilter::new().with_per_page(self.config.latest_pool);

        let (latest, category_rails, series_tags, theme_tags, featured_tag, videos) = tokio::join!(
            self.cms.list_posts(&latest_filter),
            self.category_rails(),
            self.series_tags(),
            self.theme_tags(),
            self.featured_tag(),
            self.channel_videos(),
        );
        let latest = latest?;
        let videos = or_empty("videos", videos);
        let featured_tag = or_empty("featured series", featured_tag);

        debug!(
            "Home wave 1: {} posts, {} videos, {} series tags, {} themes",
            latest.len(),
            videos.len(),
            series_tags.len(),
            theme_tags.len()
        );

        let (featured, themes, series) = tokio::join!(
            self.featured_rail(featured_tag),
            self.theme_rails(theme_tags),
            self.series_rails(series_tags),
        );

        let mut sections = vec![
            Section::new(
                "new-week",
                "Nouveautés cette semaine",
                self.new_this_week(&latest, &videos, now),
            ),
            Section::new("audios", "Derniers audios", self.latest_audio(&latest)),
        ];
        sections.extend(category_rails);
        sections.push(Section::new(
            "videos",
            "Vidéos récentes",
            videos.into_iter().take(self.config.video_limit).collect(),
        ));
        sections.extend(featured);
        sections.extend(themes);
        sections.extend(series);

        let sections = RailDeduplicator::dedup_sections(sections);
        info!("Home catalog built with {} rails", sections.len());
        Ok(sections)
    }

    /// Posts and videos of the last window, newest first
    fn new_this_week(
        &self,
        posts: &[RawContentItem],
        videos: &[RawContentItem],
        now: DateTime<Utc>,
    ) -> Vec<RawContentItem> {
        let since = now - Duration::days(self.config.new_window_days);
        let mut seen = HashSet::new();

        let mut recent: Vec<RawContentItem> = posts
            .iter()
            .chain(videos)
            .filter(|item| item.published_at >= since)
            .filter(|item| seen.insert(item.id.as_str()))
            .cloned()
            .collect();
        recent.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        recent.truncate(self.config.new_limit);
        recent
    }

    fn latest_audio(&self, posts: &[RawContentItem]) -> Vec<RawContentItem> {
        posts
            .iter()
            .filter(|item| item.kind == ContentKind::Audio)
            .take(self.config.audio_limit)
            .cloned()
            .collect()
    }

    async fn category_rails(&self) -> Vec<Section> {
        let rails = self.config.category_rails.iter().map(|rail| async move {
            let filter = PostFilter::new()
                .with_categories([rail.category_id])
                .with_per_page(rail.limit);
            let items = or_empty(&rail.key, self.cms.list_posts(&filter).await);
            Section::new(rail.key.clone(), rail.title.clone(), items)
                .with_see_all(SeeAllKind::Category, rail.category_id.to_string())
        });
        join_all(rails).await
    }

    async fn channel_videos(&self) -> Result<Vec<RawContentItem>> {
        match &self.video {
            Some((video, channel_id)) => {
                video
                    .list_channel_videos(channel_id, self.config.channel_fetch)
                    .await
            }
            None => Ok(Vec::new()),
        }
    }

    /// Tags named "Série: ...", unique by id, in lookup order. A failed
    /// query only loses its own tags.
    async fn series_tags(&self) -> Vec<Term> {
        let lookups = self.config.series_tag_queries.iter().map(|query| async move {
            or_empty(query, self.cms.list_tags(&TermQuery::Search(query.clone())).await)
        });

        let mut seen = HashSet::new();
        let mut tags: Vec<Term> = join_all(lookups)
            .await
            .into_iter()
            .flatten()
            .filter(|t| has_series_prefix(&clean_title(&t.name)))
            .filter(|t| seen.insert(t.id))
            .collect();

        tags.truncate(self.config.max_series_rails);
        tags
    }

    /// One tag per configured theme, matched on normalized name
    async fn theme_tags(&self) -> Vec<(String, Term)> {
        let lookups = self.config.themes.iter().map(|theme| async move {
            let tags = or_empty(theme, self.cms.list_tags(&TermQuery::Search(theme.clone())).await);
            let wanted = normalize(theme);
            tags.into_iter()
                .find(|t| normalize(&clean_title(&t.name)) == wanted)
                .map(|t| (theme.clone(), t))
        });
        join_all(lookups).await.into_iter().flatten().collect()
    }

    async fn featured_tag(&self) -> Result<Option<(String, Term)>> {
        let Some(name) = self.config.featured_series.as_deref() else {
            return Ok(None);
        };

        let canonical = self.keys.canonical_name(name);
        let wanted = self.keys.build_key(name);
        let tags = self.cms.list_tags(&TermQuery::Search(canonical.clone())).await?;
        let tags = if tags.is_empty() && canonical != name {
            self.cms.list_tags(&TermQuery::Search(name.to_string())).await?
        } else {
            tags
        };

        Ok(tags
            .into_iter()
            .find(|t| self.keys.build_key(&clean_title(&t.name)) == wanted)
            .map(|t| (canonical, t)))
    }

    fn tag_filter(tag: &Term, limit: u32, order: SortOrder) -> PostFilter {
        PostFilter::new()
            .with_tag(tag.id)
            .with_per_page(limit)
            .with_order(order)
    }

    async fn featured_rail(&self, featured: Option<(String, Term)>) -> Option<Section> {
        let (title, tag) = featured?;
        let filter = Self::tag_filter(&tag, self.config.featured_limit, SortOrder::Asc);
        let items = or_empty(&title, self.cms.list_posts(&filter).await);

        Some(
            Section::new(format!("growth-{}", tag.id), title, items)
                .with_see_all(SeeAllKind::Tag, tag.id.to_string()),
        )
    }

    async fn theme_rails(&self, themes: Vec<(String, Term)>) -> Vec<Section> {
        let rails = themes.into_iter().map(|(theme, tag)| async move {
            let filter = Self::tag_filter(&tag, self.config.rail_limit, SortOrder::Desc);
            let items = or_empty(&theme, self.cms.list_posts(&filter).await);
            Section::new(format!("theme-{}", tag.id), format!("Thème : {theme}"), items)
                .with_see_all(SeeAllKind::Tag, tag.id.to_string())
        });
        join_all(rails).await
    }

    async fn series_rails(&self, tags: Vec<Term>) -> Vec<Section> {
        let rails = tags.into_iter().map(|tag| async move {
            let filter = Self::tag_filter(&tag, self.config.rail_limit, SortOrder::Desc);
            let items = or_empty(&tag.name, self.cms.list_posts(&filter).await);
            let name = clean_title(&tag.name);
            let name = strip_series_prefix(&name).trim();
            Section::new(format!("serie-{}", tag.id), format!("Série : {name}"), items)
                .with_see_all(SeeAllKind::Tag, tag.id.to_string())
        });
        join_all(rails).await
    }
}
