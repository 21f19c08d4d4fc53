use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::Ctx;

pub mod api;

/// Full application router
pub fn router(ctx: Ctx) -> Router {
    Router::new()
        .nest("/api", api::mount())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}
