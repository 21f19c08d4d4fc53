use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    ApiResponse, ApiResult, Ctx,
    catalog::{
        PrevNext, RawContentItem, Section, SeriesCatalog, StrategyKind, TitleParser, prev_next,
    },
    error::AppError,
};

/// Siblings of one item, ready for a player view
#[derive(Debug, Serialize)]
pub struct SiblingsResponse {
    /// Oldest first, the requested item included
    pub items: Vec<RawContentItem>,
    pub matched_by: Option<StrategyKind>,
    pub navigation: PrevNext<RawContentItem>,
    /// Latest items, filled only when no sibling was found
    pub recent: Vec<RawContentItem>,
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub cleaned: String,
    pub fragment: Option<String>,
    pub episode: Option<i32>,
    pub canonical_name: Option<String>,
    pub key: Option<String>,
}

/// Home rails
/// GET /api/home
async fn home(State(ctx): State<Ctx>) -> ApiResult<Vec<Section>> {
    let sections = ctx.service.get_home_catalog().await?;

    Ok(Json(ApiResponse::ok(
        format!("{} rails", sections.len()),
        sections,
    )))
}

/// Every detected series
/// GET /api/series
async fn series(State(ctx): State<Ctx>) -> ApiResult<SeriesCatalog> {
    let catalog = ctx.service.get_series_catalog().await?;

    Ok(Json(ApiResponse::ok(
        format!("{} series", catalog.series.len()),
        catalog,
    )))
}

/// Other episodes of the same series
/// GET /api/siblings/{item_ref}
async fn siblings(
    State(ctx): State<Ctx>,
    Path(item_ref): Path<String>,
) -> ApiResult<SiblingsResponse> {
    let resolved = ctx.service.resolve_siblings(&item_ref).await?;
    let focal_id = resolved
        .items
        .iter()
        .find(|i| i.id == item_ref || i.id.strip_prefix("wp:") == Some(item_ref.as_str()))
        .or_else(|| resolved.items.first())
        .map(|i| i.id.clone())
        .unwrap_or_else(|| item_ref.clone());

    let recent = if resolved.items.len() <= 1 {
        let limit = ctx.config.siblings.recent_limit;
        ctx.service
            .recent_items(&focal_id, limit)
            .await
            .unwrap_or_else(|e| {
                warn!("No recent fallback for {}: {}", item_ref, e);
                Vec::new()
            })
    } else {
        Vec::new()
    };

    Ok(Json(ApiResponse::ok(
        "Siblings resolved",
        SiblingsResponse {
            navigation: prev_next(&resolved.items, &focal_id),
            items: resolved.items,
            matched_by: resolved.matched_by,
            recent,
        },
    )))
}

/// Run the title parser on one title
/// POST /api/parse
async fn parse_title(
    State(ctx): State<Ctx>,
    Json(req): Json<ParseRequest>,
) -> ApiResult<ParseResponse> {
    if req.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }

    let parsed = TitleParser::parse(&req.title);
    let keys = ctx.service.keys();

    Ok(Json(ApiResponse::ok(
        "Title parsed",
        ParseResponse {
            canonical_name: parsed.fragment.as_deref().map(|f| keys.canonical_name(f)),
            key: parsed
                .fragment
                .as_deref()
                .map(|f| keys.build_key(f).as_str().to_string()),
            cleaned: parsed.cleaned,
            fragment: parsed.fragment,
            episode: parsed.episode,
        },
    )))
}

pub fn mount() -> Router<Ctx> {
    Router::new()
        .route("/home", get(home))
        .route("/series", get(series))
        .route("/siblings/{item_ref}", get(siblings))
        .route("/parse", post(parse_title))
}

#[cfg(test)]
mod tests {
    use crate::{
        Ctx,
        catalog::{CatalogService, RawContentItem, SeriesKeyBuilder, testing::MockCms},
        config::AppConfig,
        routes::router,
    };
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use chrono::{TimeZone, Utc};
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn ctx(posts: Vec<RawContentItem>) -> Ctx {
        let cms = Arc::new(MockCms::new().with_posts(posts));
        Ctx {
            service: Arc::new(CatalogService::new(cms, SeriesKeyBuilder::default())),
            config: Arc::new(AppConfig::default()),
            cache: None,
        }
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_parse_endpoint() {
        let app = router(ctx(Vec::new()));
        let request = Request::builder()
            .method("POST")
            .uri("/api/parse")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"title":"Ecole croissance | EP 3"}"#))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["data"]["episode"], 3);
        assert_eq!(body["data"]["canonical_name"], "École de croissance");
        assert_eq!(body["data"]["key"], "ecole de croissance");
    }

    #[tokio::test]
    async fn test_siblings_recent_fallback() {
        let at = |d| Utc.with_ymd_and_hms(2024, 4, d, 0, 0, 0).unwrap();
        let app = router(ctx(vec![
            RawContentItem::new("wp:1", "Louange", at(1), "wordpress"),
            RawContentItem::new("wp:2", "Le réveil EP 1", at(2), "wordpress"),
        ]));
        let request = Request::builder()
            .uri("/api/siblings/wp:2")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["data"]["items"].as_array().map(Vec::len), Some(1));
        assert!(body["data"]["matched_by"].is_null());
        assert_eq!(body["data"]["recent"][0]["id"], "wp:1");
        assert_eq!(body["data"]["navigation"]["index"], 0);
    }

    #[tokio::test]
    async fn test_unknown_item_is_404() {
        let app = router(ctx(Vec::new()));
        let request = Request::builder()
            .uri("/api/siblings/missing-slug")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["code"], 404);
    }
}
