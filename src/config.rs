use crate::catalog::{CacheConfig, HomeConfig, SeriesCatalogConfig, SiblingConfig};
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cms: CmsConfig,
    pub video: VideoConfig,
    pub cache: CacheConfig,
    pub series: SeriesConfig,
    pub siblings: SiblingConfig,
    pub home: HomeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

/// WordPress REST endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    /// REST root, e.g. `https://example.org/wp-json/wp/v2`
    pub base_url: String,
    pub timeout_secs: u64,
}

impl CmsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://webradio.iccagoe.net/wp-json/wp/v2".to_string(),
            timeout_secs: 30,
        }
    }
}

/// YouTube access
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub enabled: bool,
    /// Data API key; without it playlists come from the public feed
    pub api_key: Option<String>,
    /// Channel whose uploads feed the home rails
    pub channel_id: Option<String>,
    pub timeout_secs: u64,
}

impl VideoConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            channel_id: None,
            timeout_secs: 30,
        }
    }
}

/// Series detection and listing
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesConfig {
    /// Extra synonyms: variant name → canonical name
    pub aliases: HashMap<String, String>,
    /// Categories that never reinforce a series, on top of the built-in ones
    pub ignored_categories: Vec<String>,
    #[serde(flatten)]
    pub catalog: SeriesCatalogConfig,
}

impl AppConfig {
    /// Load from the default locations and `CATALOG__*` environment variables
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(None)
    }

    /// Same as [`AppConfig::load`], with an explicit file layered on top of
    /// the default locations
    pub fn load_from(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(user_file) = Self::user_config_file() {
            builder = builder.add_source(config::File::from(user_file).required(false));
        }
        builder = builder.add_source(config::File::with_name("config/catalog").required(false));
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix("CATALOG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// `<config dir>/sermon-catalog/catalog.toml`
    pub fn user_config_file() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("sermon-catalog").join("catalog.toml"))
    }
}
