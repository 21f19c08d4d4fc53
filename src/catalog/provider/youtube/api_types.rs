use serde::Deserialize;

// Data API v3 responses

#[derive(Debug, Deserialize)]
pub struct PlaylistItemsResponse {
    #[serde(default)]
    pub items: Vec<PlaylistItemResource>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistItemResource {
    pub snippet: Option<PlaylistItemSnippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    #[serde(default)]
    pub title: String,
    pub published_at: Option<String>,
    pub thumbnails: Option<Thumbnails>,
    pub resource_id: Option<ResourceId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceId {
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Thumbnails {
    pub maxres: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    pub default: Option<Thumbnail>,
}

impl Thumbnails {
    /// Largest available thumbnail
    pub fn best(&self) -> Option<String> {
        [&self.maxres, &self.high, &self.medium, &self.default]
            .into_iter()
            .flatten()
            .map(|t| t.url.clone())
            .next()
    }
}

#[derive(Debug, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistListResponse {
    #[serde(default)]
    pub items: Vec<PlaylistResource>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistResource {
    pub snippet: Option<PlaylistSnippet>,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistSnippet {
    #[serde(default)]
    pub title: String,
}

// Atom feed (`/feeds/videos.xml`)

#[derive(Debug, Deserialize)]
pub struct Feed {
    #[serde(default)]
    pub title: String,
    #[serde(rename = "entry", default)]
    pub entries: Vec<FeedEntry>,
}

#[derive(Debug, Deserialize)]
pub struct FeedEntry {
    #[serde(rename = "yt:videoId", alias = "videoId")]
    pub video_id: String,
    #[serde(default)]
    pub title: String,
    pub published: Option<String>,
    #[serde(rename = "media:group", alias = "group")]
    pub media_group: Option<MediaGroup>,
}

#[derive(Debug, Deserialize)]
pub struct MediaGroup {
    #[serde(rename = "media:thumbnail", alias = "thumbnail")]
    pub thumbnail: Option<MediaThumbnail>,
}

#[derive(Debug, Deserialize)]
pub struct MediaThumbnail {
    #[serde(rename = "@url")]
    pub url: String,
}
