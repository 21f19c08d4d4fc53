use std::net::SocketAddr;

use sermon_catalog::{Ctx, config::AppConfig, logging, routes};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1) {
        Some(path) => AppConfig::load_from(Some(std::path::Path::new(&path)))?,
        None => AppConfig::load()?,
    };
    let _log_guard = logging::init(&config.logging)?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(
        "Starting sermon-catalog {} (cms: {})",
        env!("CARGO_PKG_VERSION"),
        config.cms.base_url
    );

    let app = routes::router(Ctx::from_config(config));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
