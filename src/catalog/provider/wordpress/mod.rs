mod api_types;
mod provider;

pub use provider::{MediaLinks, WordPressProvider, detect_media};
