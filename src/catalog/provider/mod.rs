pub mod http;
mod traits;
pub mod wordpress;
pub mod youtube;

pub use http::HttpClient;
pub use traits::{
    CmsProvider, Playlist, PostFilter, PostPage, SortOrder, TermQuery, VideoProvider,
};
pub use wordpress::WordPressProvider;
pub use youtube::YouTubeProvider;
