use super::api_types::{WpPost, WpTerm};
use crate::catalog::{
    CatalogError, Result,
    parser::patterns::PATTERNS,
    provider::{CmsProvider, HttpClient, PostFilter, PostPage, TermQuery, http::header_u32},
    types::{ContentKind, RawContentItem, Term},
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::time::Duration;
use tracing::debug;

const PROVIDER_ID: &str = "wordpress";
const ID_PREFIX: &str = "wp:";
const TOTAL_PAGES_HEADER: &str = "x-wp-totalpages";
const TERMS_PER_PAGE: &str = "100";

/// Media URLs detected in post HTML
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaLinks {
    pub audio_url: Option<String>,
    pub video_url: Option<String>,
    pub embed_url: Option<String>,
}

impl MediaLinks {
    /// Audio wins over video, video over plain text
    pub fn kind(&self) -> ContentKind {
        if self.audio_url.is_some() {
            ContentKind::Audio
        } else if self.video_url.is_some() || self.embed_url.is_some() {
            ContentKind::Video
        } else {
            ContentKind::Text
        }
    }
}

/// Detect embedded audio/video in rendered post content
pub fn detect_media(html: &str) -> MediaLinks {
    let p = &*PATTERNS;
    let first_capture = |re: &regex::Regex| {
        re.captures(html)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    };

    let audio_url = first_capture(&p.audio_src)
        .or_else(|| first_capture(&p.audio_source_src))
        .or_else(|| p.mp3_link.find(html).map(|m| m.as_str().to_string()));

    let video_url = first_capture(&p.video_src)
        .or_else(|| first_capture(&p.video_source_src))
        .or_else(|| p.mp4_link.find(html).map(|m| m.as_str().to_string()));

    let embed_url = if video_url.is_none() {
        first_capture(&p.iframe_src)
    } else {
        None
    };

    MediaLinks {
        audio_url,
        video_url,
        embed_url,
    }
}

/// WordPress REST API (`/wp-json/wp/v2`) client
pub struct WordPressProvider {
    client: HttpClient,
}

impl WordPressProvider {
    /// `base_url` points at the REST root, e.g. `https://example.org/wp-json/wp/v2`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: HttpClient::new(base_url),
        }
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: HttpClient::with_timeout(base_url, timeout),
        }
    }

    fn numeric_id(item_id: &str) -> Option<u64> {
        item_id
            .strip_prefix(ID_PREFIX)
            .unwrap_or(item_id)
            .parse()
            .ok()
    }

    fn join_ids(ids: impl IntoIterator<Item = u64>) -> String {
        ids.into_iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    fn filter_params(filter: &PostFilter) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("_embed", "1".to_string()),
            ("per_page", filter.per_page.clamp(1, 100).to_string()),
            ("page", filter.page.max(1).to_string()),
            ("orderby", "date".to_string()),
            ("order", filter.order.as_str().to_string()),
        ];

        if !filter.categories.is_empty() {
            params.push(("categories", Self::join_ids(filter.categories.iter().copied())));
        }
        if !filter.tags.is_empty() {
            params.push(("tags", Self::join_ids(filter.tags.iter().copied())));
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            params.push(("search", search.to_string()));
        }

        let exclude: Vec<u64> = filter
            .exclude
            .iter()
            .filter_map(|id| Self::numeric_id(id))
            .collect();
        if !exclude.is_empty() {
            params.push(("exclude", Self::join_ids(exclude)));
        }

        params
    }

    fn parse_date(post: &WpPost) -> DateTime<Utc> {
        let parse = |raw: &str| {
            DateTime::parse_from_rfc3339(raw)
                .map(|d| d.with_timezone(&Utc))
                .ok()
                .or_else(|| {
                    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                        .ok()
                        .map(|n| n.and_utc())
                })
        };

        post.date_gmt
            .as_deref()
            .and_then(parse)
            .or_else(|| post.date.as_deref().and_then(parse))
            .unwrap_or_else(|| {
                debug!("Post {} has no usable date", post.id);
                DateTime::<Utc>::UNIX_EPOCH
            })
    }

    fn term(term: &WpTerm) -> Term {
        Term::new(term.id, term.name.clone(), term.slug.clone())
    }

    fn post_to_item(post: WpPost) -> RawContentItem {
        let published_at = Self::parse_date(&post);
        let media = detect_media(&post.content.rendered);
        let embedded = post.embedded.unwrap_or_default();

        let thumbnail = embedded
            .featured_media
            .iter()
            .find_map(|m| m.source_url.clone());

        let mut item = RawContentItem::new(
            format!("{ID_PREFIX}{}", post.id),
            post.title.rendered,
            published_at,
            PROVIDER_ID,
        )
        .with_kind(media.kind())
        .with_slug(post.slug)
        .with_thumbnail(thumbnail)
        .with_detail_url(post.link);

        for term in embedded.terms.iter().flatten() {
            match term.taxonomy.as_str() {
                "category" => item.categories.push(Self::term(term)),
                "post_tag" => item.tags.push(Self::term(term)),
                _ => {}
            }
        }

        item.audio_url = media.audio_url;
        item.video_url = media.video_url;
        item.embed_url = media.embed_url;
        item
    }

    async fn list_terms(&self, endpoint: &str, query: &TermQuery) -> Result<Vec<Term>> {
        let mut params = vec![("per_page", TERMS_PER_PAGE.to_string())];
        match query {
            TermQuery::Search(text) => params.push(("search", text.clone())),
            TermQuery::Ids(ids) if ids.is_empty() => return Ok(Vec::new()),
            TermQuery::Ids(ids) => params.push(("include", Self::join_ids(ids.iter().copied()))),
        }

        let terms: Vec<WpTerm> = self.client.get_with_params(endpoint, &params).await?;
        Ok(terms.iter().map(Self::term).collect())
    }
}

#[async_trait]
impl CmsProvider for WordPressProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    async fn list_posts_page(&self, filter: &PostFilter) -> Result<PostPage> {
        let params = Self::filter_params(filter);
        let (posts, headers): (Vec<WpPost>, _) =
            self.client.get_with_headers("/posts", &params).await?;

        let total_pages = header_u32(&headers, TOTAL_PAGES_HEADER).unwrap_or(1).max(1);
        debug!(
            "Fetched {} posts (page {}/{})",
            posts.len(),
            filter.page,
            total_pages
        );

        Ok(PostPage {
            items: posts.into_iter().map(Self::post_to_item).collect(),
            total_pages,
        })
    }

    async fn list_tags(&self, query: &TermQuery) -> Result<Vec<Term>> {
        self.list_terms("/tags", query).await
    }

    async fn list_categories(&self, query: &TermQuery) -> Result<Vec<Term>> {
        self.list_terms("/categories", query).await
    }

    async fn find_post(&self, slug_or_id: &str) -> Result<Option<RawContentItem>> {
        if let Some(id) = Self::numeric_id(slug_or_id) {
            let params = vec![("_embed", "1".to_string())];
            return match self
                .client
                .get_with_params::<WpPost>(&format!("/posts/{id}"), &params)
                .await
            {
                Ok(post) => Ok(Some(Self::post_to_item(post))),
                Err(CatalogError::Api { status: 404, .. }) => Ok(None),
                Err(e) => Err(e),
            };
        }

        let params = vec![
            ("_embed", "1".to_string()),
            ("slug", slug_or_id.to_string()),
        ];
        let posts: Vec<WpPost> = self.client.get_with_params("/posts", &params).await?;
        Ok(posts.into_iter().next().map(Self::post_to_item))
    }
}
