use serde::Deserialize;

/// `{ "rendered": "..." }` wrapper used by the REST API
#[derive(Debug, Deserialize, Default)]
pub struct Rendered {
    #[serde(default)]
    pub rendered: String,
}

#[derive(Debug, Deserialize)]
pub struct WpPost {
    pub id: u64,
    pub date: Option<String>,
    pub date_gmt: Option<String>,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub title: Rendered,
    #[serde(default)]
    pub content: Rendered,
    #[serde(rename = "_embedded")]
    pub embedded: Option<WpEmbedded>,
}

#[derive(Debug, Deserialize, Default)]
pub struct WpEmbedded {
    #[serde(rename = "wp:featuredmedia", default)]
    pub featured_media: Vec<WpMedia>,
    /// One list per taxonomy (categories, tags, ...)
    #[serde(rename = "wp:term", default)]
    pub terms: Vec<Vec<WpTerm>>,
}

#[derive(Debug, Deserialize)]
pub struct WpMedia {
    pub source_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WpTerm {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub taxonomy: String,
}
