use axum::Router;

use crate::Ctx;

pub mod catalog;
pub mod health;

/// Mount all API routes
pub fn mount() -> Router<Ctx> {
    Router::new()
        .merge(health::mount())
        .merge(catalog::mount())
}
