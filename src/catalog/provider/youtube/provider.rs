use super::api_types::{Feed, FeedEntry, PlaylistItemsResponse, PlaylistListResponse};
use crate::catalog::{
    Result,
    provider::{HttpClient, Playlist, VideoProvider},
    types::{ContentKind, RawContentItem},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, warn};

const PROVIDER_ID: &str = "youtube";
const DATA_API_URL: &str = "https://www.googleapis.com/youtube/v3";
const FEED_URL: &str = "https://www.youtube.com";
/// Data API page size cap
const MAX_RESULTS: usize = 50;

/// YouTube client: Data API v3 when an API key is configured, Atom feeds otherwise
pub struct YouTubeProvider {
    api: HttpClient,
    feeds: HttpClient,
    api_key: Option<String>,
}

impl Default for YouTubeProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

impl YouTubeProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api: HttpClient::new(DATA_API_URL),
            feeds: HttpClient::new(FEED_URL),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        }
    }

    pub fn with_timeout(api_key: Option<String>, timeout: Duration) -> Self {
        Self::new(api_key).with_endpoints(DATA_API_URL, FEED_URL, timeout)
    }

    /// Point both endpoints somewhere else (mirrors, tests)
    pub fn with_endpoints(
        mut self,
        api_url: impl Into<String>,
        feed_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        self.api = HttpClient::with_timeout(api_url, timeout);
        self.feeds = HttpClient::with_timeout(feed_url, timeout);
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn playlist_item_id(playlist_id: &str, video_id: &str) -> String {
        format!("ytpl:{playlist_id}:{video_id}")
    }

    pub fn video_item_id(video_id: &str) -> String {
        format!("yt:{video_id}")
    }

    fn default_thumbnail(video_id: &str) -> String {
        format!("https://i.ytimg.com/vi/{video_id}/hqdefault.jpg")
    }

    fn parse_date(raw: Option<&str>) -> DateTime<Utc> {
        raw.and_then(|d| DateTime::parse_from_rfc3339(d).ok())
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    fn video_item(
        id: String,
        video_id: &str,
        title: String,
        published_at: DateTime<Utc>,
        thumbnail: Option<String>,
    ) -> RawContentItem {
        let mut item = RawContentItem::new(id, title, published_at, PROVIDER_ID)
            .with_kind(ContentKind::Video)
            .with_slug(video_id)
            .with_thumbnail(thumbnail.or_else(|| Some(Self::default_thumbnail(video_id))))
            .with_detail_url(format!("https://www.youtube.com/watch?v={video_id}"));
        item.embed_url = Some(format!("https://www.youtube.com/embed/{video_id}"));
        item
    }

    fn entry_to_item(entry: FeedEntry, id: String) -> RawContentItem {
        let thumbnail = entry
            .media_group
            .and_then(|g| g.thumbnail)
            .map(|t| t.url);
        let published_at = Self::parse_date(entry.published.as_deref());
        Self::video_item(id, &entry.video_id, entry.title, published_at, thumbnail)
    }

    async fn fetch_feed(&self, param: &'static str, value: &str) -> Result<Feed> {
        let xml = self
            .feeds
            .get_text("/feeds/videos.xml", &[(param, value.to_string())])
            .await?;
        Ok(quick_xml::de::from_str(&xml)?)
    }

    async fn playlist_from_api(&self, api_key: &str, playlist_id: &str, limit: usize) -> Result<Playlist> {
        let max_results = limit.clamp(1, MAX_RESULTS).to_string();
        let items_params = [
            ("part", "snippet".to_string()),
            ("playlistId", playlist_id.to_string()),
            ("maxResults", max_results),
            ("key", api_key.to_string()),
        ];
        let meta_params = [
            ("part", "snippet".to_string()),
            ("id", playlist_id.to_string()),
            ("key", api_key.to_string()),
        ];

        let (items, meta) = tokio::join!(
            self.api
                .get_with_params::<PlaylistItemsResponse>("/playlistItems", &items_params),
            self.api
                .get_with_params::<PlaylistListResponse>("/playlists", &meta_params),
        );

        let title = match meta {
            Ok(meta) => meta
                .items
                .into_iter()
                .find_map(|p| p.snippet)
                .map(|s| s.title)
                .unwrap_or_default(),
            Err(e) => {
                warn!("Playlist {} title lookup failed: {}", playlist_id, e);
                String::new()
            }
        };

        let items = items?
            .items
            .into_iter()
            .filter_map(|resource| {
                let snippet = resource.snippet?;
                let video_id = snippet.resource_id.as_ref()?.video_id.clone()?;
                let thumbnail = snippet.thumbnails.as_ref().and_then(|t| t.best());
                Some(Self::video_item(
                    Self::playlist_item_id(playlist_id, &video_id),
                    &video_id,
                    snippet.title,
                    Self::parse_date(snippet.published_at.as_deref()),
                    thumbnail,
                ))
            })
            .take(limit)
            .collect();

        Ok(Playlist {
            id: playlist_id.to_string(),
            title,
            items,
        })
    }

    async fn playlist_from_feed(&self, playlist_id: &str, limit: usize) -> Result<Playlist> {
        let feed = self.fetch_feed("playlist_id", playlist_id).await?;
        let items = feed
            .entries
            .into_iter()
            .take(limit)
            .map(|entry| {
                let id = Self::playlist_item_id(playlist_id, &entry.video_id);
                Self::entry_to_item(entry, id)
            })
            .collect();

        Ok(Playlist {
            id: playlist_id.to_string(),
            title: feed.title,
            items,
        })
    }
}

#[async_trait]
impl VideoProvider for YouTubeProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn list_playlist_items(&self, playlist_id: &str, limit: usize) -> Result<Playlist> {
        if let Some(api_key) = self.api_key.as_deref() {
            match self.playlist_from_api(api_key, playlist_id, limit).await {
                Ok(playlist) => return Ok(playlist),
                Err(e) => warn!("Data API failed for playlist {}, using feed: {}", playlist_id, e),
            }
        }

        let playlist = self.playlist_from_feed(playlist_id, limit).await?;
        debug!("Playlist {}: {} items", playlist_id, playlist.items.len());
        Ok(playlist)
    }

    async fn list_channel_videos(&self, channel_id: &str, limit: usize) -> Result<Vec<RawContentItem>> {
        let feed = self.fetch_feed("channel_id", channel_id).await?;
        let mut items: Vec<RawContentItem> = feed
            .entries
            .into_iter()
            .map(|entry| {
                let id = Self::video_item_id(&entry.video_id);
                Self::entry_to_item(entry, id)
            })
            .collect();

        items.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        items.truncate(limit);
        Ok(items)
    }
}
