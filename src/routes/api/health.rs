use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::{ApiResponse, Ctx, catalog::CacheStats};

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub cms: &'static str,
    pub cache: Option<CacheStats>,
}

/// Liveness and cache occupancy
/// GET /api/health
async fn health(State(ctx): State<Ctx>) -> Json<ApiResponse<HealthResponse>> {
    Json(ApiResponse::ok(
        "Service is healthy",
        HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            cms: ctx.service.cms_id(),
            cache: ctx.cache.as_ref().map(|c| c.stats()),
        },
    ))
}

pub fn mount() -> Router<Ctx> {
    Router::new().route("/health", get(health))
}
