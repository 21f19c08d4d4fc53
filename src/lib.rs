//! Series detection, sibling resolution and home rails over a WordPress
//! catalog and YouTube playlists.

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;

use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use catalog::{
    AliasResolver, CachedCms, CatalogService, CmsProvider, ProviderCache, SeriesAggregator,
    SeriesKeyBuilder, VideoProvider, WordPressProvider, YouTubeProvider,
};
use config::AppConfig;
use error::AppError;

/// Shared request context
#[derive(Clone)]
pub struct Ctx {
    pub service: Arc<CatalogService>,
    pub config: Arc<AppConfig>,
    /// Provider response cache, when enabled
    pub cache: Option<ProviderCache>,
}

/// JSON envelope of every API response
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            code: 200,
            message: message.into(),
            data: Some(data),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, AppError>;

impl Ctx {
    /// Wire providers and the catalog service from configuration
    pub fn from_config(config: AppConfig) -> Self {
        let keys = SeriesKeyBuilder::new(
            AliasResolver::new().with_aliases(config.series.aliases.clone()),
        );

        let wordpress: Arc<dyn CmsProvider> = Arc::new(WordPressProvider::with_timeout(
            config.cms.base_url.clone(),
            config.cms.timeout(),
        ));
        let (cms, cache) = if config.cache.enabled {
            let cache = ProviderCache::with_config(&config.cache);
            let cached: Arc<dyn CmsProvider> = Arc::new(CachedCms::new(wordpress, cache.clone()));
            (cached, Some(cache))
        } else {
            (wordpress, None)
        };

        let aggregator = SeriesAggregator::new(keys.clone())
            .with_skip_text_items(config.series.catalog.skip_text_items)
            .with_ignored_categories(&config.series.ignored_categories);

        let mut service = CatalogService::new(cms, keys)
            .with_sibling_config(config.siblings.clone())
            .with_home_config(config.home.clone())
            .with_series_config(config.series.catalog.clone())
            .with_aggregator(aggregator);

        if config.video.enabled {
            let youtube = YouTubeProvider::with_timeout(config.video.api_key.clone(), config.video.timeout());
            info!(
                "YouTube enabled (api key: {}, channel: {:?})",
                youtube.has_api_key(),
                config.video.channel_id
            );
            let video: Arc<dyn VideoProvider> = Arc::new(youtube);
            service = service.with_video(video, config.video.channel_id.clone());
        }

        Self {
            service: Arc::new(service),
            config: Arc::new(config),
            cache,
        }
    }
}
