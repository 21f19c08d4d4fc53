use crate::catalog::{
    CatalogError, Result,
    aggregator::SeriesAggregator,
    home::{HomeCatalogBuilder, HomeConfig},
    key::SeriesKeyBuilder,
    provider::{CmsProvider, Playlist, PostFilter, VideoProvider},
    siblings::{SiblingConfig, SiblingResolver, Siblings},
    types::{RawContentItem, Section, SeriesCatalog, SeriesGroup},
};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Series listing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesCatalogConfig {
    /// Maximum number of series returned
    pub max_series: usize,
    /// CMS page size while walking every post
    pub per_page: u32,
    /// CMS pages fetched concurrently after the first one
    pub fetch_concurrency: usize,
    /// Playlist ids or playlist URLs (`...?list=<id>`)
    pub playlists: Vec<String>,
    pub playlist_limit: usize,
    pub skip_text_items: bool,
}

impl Default for SeriesCatalogConfig {
    fn default() -> Self {
        Self {
            max_series: 500,
            per_page: 100,
            fetch_concurrency: 4,
            playlists: Vec::new(),
            playlist_limit: 80,
            skip_text_items: false,
        }
    }
}

/// Playlist id from a bare id or a playlist URL
pub fn playlist_id(reference: &str) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }

    match reqwest::Url::parse(reference) {
        Ok(url) => url
            .query_pairs()
            .find(|(k, _)| k == "list")
            .map(|(_, v)| v.into_owned()),
        Err(_) => Some(reference.to_string()),
    }
}

/// What an item reference points at
enum ItemRef<'a> {
    PlaylistVideo { playlist: &'a str, video: &'a str },
    Post(&'a str),
}

impl<'a> ItemRef<'a> {
    fn parse(item_ref: &'a str) -> Result<Self> {
        if let Some(rest) = item_ref.strip_prefix("ytpl:") {
            return match rest.split_once(':') {
                Some((playlist, video)) if !playlist.is_empty() && !video.is_empty() => {
                    Ok(Self::PlaylistVideo { playlist, video })
                }
                _ => Err(CatalogError::NotFound(format!("Malformed item reference: {item_ref}"))),
            };
        }
        if item_ref.starts_with("yt:") || item_ref.trim().is_empty() {
            return Err(CatalogError::NotFound(format!("Unknown item: {item_ref}")));
        }

        Ok(Self::Post(item_ref.strip_prefix("wp:").unwrap_or(item_ref)))
    }
}

/// Library boundary: home rails, series listing and sibling resolution
pub struct CatalogService {
    cms: Arc<dyn CmsProvider>,
    video: Option<Arc<dyn VideoProvider>>,
    channel_id: Option<String>,
    keys: SeriesKeyBuilder,
    aggregator: SeriesAggregator,
    siblings: SiblingResolver,
    home: HomeConfig,
    series: SeriesCatalogConfig,
}

impl CatalogService {
    /// Create a service over a CMS with default settings
    pub fn new(cms: Arc<dyn CmsProvider>, keys: SeriesKeyBuilder) -> Self {
        Self {
            siblings: SiblingResolver::new(cms.clone(), keys.clone(), SiblingConfig::default()),
            aggregator: SeriesAggregator::new(keys.clone()),
            cms,
            video: None,
            channel_id: None,
            keys,
            home: HomeConfig::default(),
            series: SeriesCatalogConfig::default(),
        }
    }

    /// Builder pattern: add a video platform, optionally with a channel for home rails
    pub fn with_video(mut self, video: Arc<dyn VideoProvider>, channel_id: Option<String>) -> Self {
        self.video = Some(video);
        self.channel_id = channel_id;
        self
    }

    pub fn with_sibling_config(mut self, config: SiblingConfig) -> Self {
        self.siblings = SiblingResolver::new(self.cms.clone(), self.keys.clone(), config);
        self
    }

    pub fn with_home_config(mut self, config: HomeConfig) -> Self {
        self.home = config;
        self
    }

    pub fn with_series_config(mut self, config: SeriesCatalogConfig) -> Self {
        self.aggregator = self.aggregator.with_skip_text_items(config.skip_text_items);
        self.series = config;
        self
    }

    /// Builder pattern: replace the aggregator (ignored categories, text filtering)
    pub fn with_aggregator(mut self, aggregator: SeriesAggregator) -> Self {
        self.aggregator = aggregator;
        self
    }

    pub fn keys(&self) -> &SeriesKeyBuilder {
        &self.keys
    }

    pub fn cms_id(&self) -> &'static str {
        self.cms.id()
    }

    pub async fn get_home_catalog(&self) -> Result<Vec<Section>> {
        self.get_home_catalog_at(Utc::now()).await
    }

    /// Home rails as of `now`
    pub async fn get_home_catalog_at(&self, now: DateTime<Utc>) -> Result<Vec<Section>> {
        let mut builder =
            HomeCatalogBuilder::new(self.cms.clone(), self.keys.clone(), self.home.clone());
        if let (Some(video), Some(channel_id)) = (&self.video, &self.channel_id) {
            builder = builder.with_channel(video.clone(), channel_id.clone());
        }
        builder.build(now).await
    }

    /// Siblings of the referenced item, oldest first, focal included
    pub async fn get_siblings(&self, item_ref: &str) -> Result<Vec<RawContentItem>> {
        Ok(self.resolve_siblings(item_ref).await?.items)
    }

    /// Siblings with the strategy that produced them.
    ///
    /// `ytpl:<playlist>:<video>` resolves to the playlist; `wp:<id>`, a
    /// numeric id or a slug goes through the CMS strategy chain.
    pub async fn resolve_siblings(&self, item_ref: &str) -> Result<Siblings> {
        match ItemRef::parse(item_ref)? {
            ItemRef::PlaylistVideo { playlist, video } => {
                self.playlist_siblings(item_ref, playlist, video).await
            }
            ItemRef::Post(slug_or_id) => {
                let item = self
                    .cms
                    .find_post(slug_or_id)
                    .await?
                    .ok_or_else(|| CatalogError::NotFound(format!("Unknown item: {item_ref}")))?;
                self.siblings.resolve(&item).await
            }
        }
    }

    async fn playlist_siblings(&self, item_ref: &str, playlist_id: &str, video_id: &str) -> Result<Siblings> {
        let video = self
            .video
            .as_ref()
            .ok_or_else(|| CatalogError::Config("No video provider configured".to_string()))?;

        let playlist = video
            .list_playlist_items(playlist_id, self.series.playlist_limit)
            .await?;
        if !playlist.items.iter().any(|i| i.id == item_ref) {
            return Err(CatalogError::NotFound(format!(
                "Video {video_id} not in playlist {playlist_id}"
            )));
        }

        let mut items = playlist.items;
        items.sort_by(|a, b| a.published_at.cmp(&b.published_at).then_with(|| a.id.cmp(&b.id)));
        Ok(Siblings {
            items,
            matched_by: None,
        })
    }

    /// Most recent CMS items, excluding `exclude_id`
    pub async fn recent_items(&self, exclude_id: &str, limit: u32) -> Result<Vec<RawContentItem>> {
        let filter = PostFilter::new()
            .with_per_page(limit)
            .excluding(exclude_id.to_string());
        let items = self.cms.list_posts(&filter).await?;
        Ok(items.into_iter().filter(|i| i.id != exclude_id).collect())
    }

    /// Every series detected across the CMS plus the configured playlists
    pub async fn get_series_catalog(&self) -> Result<SeriesCatalog> {
        let (posts, playlists) = tokio::join!(self.fetch_all_posts(), self.fetch_playlists());
        let posts = posts?;

        let cms_groups = self.aggregator.aggregate(&posts);
        let playlist_groups: Vec<SeriesGroup> = playlists
            .iter()
            .filter_map(|p| self.aggregator.from_playlist(p))
            .collect();

        info!(
            "Series catalog: {} CMS groups from {} posts, {} playlists",
            cms_groups.len(),
            posts.len(),
            playlist_groups.len()
        );

        Ok(SeriesCatalog {
            series: SeriesAggregator::merge_with_playlists(
                playlist_groups,
                cms_groups,
                self.series.max_series,
            ),
            total_posts: posts.len(),
            generated_at: Utc::now(),
        })
    }

    fn page_filter(&self, page: u32) -> PostFilter {
        PostFilter::new()
            .with_per_page(self.series.per_page)
            .with_page(page)
    }

    /// Page 1 gives the page count; the rest is fetched in concurrent batches.
    /// Only a failing first page is an error.
    async fn fetch_all_posts(&self) -> Result<Vec<RawContentItem>> {
        let first = self.cms.list_posts_page(&self.page_filter(1)).await?;
        let total_pages = first.total_pages.max(1);
        let mut posts = first.items;

        let remaining: Vec<u32> = (2..=total_pages).collect();
        for batch in remaining.chunks(self.series.fetch_concurrency.max(1)) {
            debug!("Fetching CMS pages {:?}/{}", batch, total_pages);
            let pages = join_all(batch.iter().map(|&page| {
                let filter = self.page_filter(page);
                async move { (page, self.cms.list_posts_page(&filter).await) }
            }))
            .await;

            for (page, result) in pages {
                match result {
                    Ok(page) => posts.extend(page.items),
                    Err(e) => warn!("Skipping CMS page {}: {}", page, e),
                }
            }
        }

        Ok(posts)
    }

    async fn fetch_playlists(&self) -> Vec<Playlist> {
        let Some(video) = self.video.as_ref() else {
            return Vec::new();
        };

        let fetches = self
            .series
            .playlists
            .iter()
            .filter_map(|reference| playlist_id(reference))
            .map(|id| async move {
                match video.list_playlist_items(&id, self.series.playlist_limit).await {
                    Ok(playlist) => Some(playlist),
                    Err(e) => {
                        warn!("Skipping playlist {}: {}", id, e);
                        None
                    }
                }
            });

        join_all(fetches).await.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playlist_id() {
        assert_eq!(
            playlist_id("https://youtube.com/playlist?list=PLabc123").as_deref(),
            Some("PLabc123")
        );
        assert_eq!(playlist_id("PLabc123").as_deref(), Some("PLabc123"));
        assert_eq!(playlist_id("https://youtube.com/watch?v=x"), None);
        assert_eq!(playlist_id("  "), None);
    }

    #[test]
    fn test_item_ref_parse() {
        assert!(matches!(
            ItemRef::parse("ytpl:PL1:abc"),
            Ok(ItemRef::PlaylistVideo { playlist: "PL1", video: "abc" })
        ));
        assert!(matches!(ItemRef::parse("wp:42"), Ok(ItemRef::Post("42"))));
        assert!(matches!(ItemRef::parse("la-foi-ep-1"), Ok(ItemRef::Post("la-foi-ep-1"))));
        assert!(ItemRef::parse("ytpl:PL1").is_err());
        assert!(ItemRef::parse("yt:abc").is_err());
    }
}
