mod api;
mod pages;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .route("/", get(pages::index))
        .route("/health", get(api::health))
        .route("/verify", get(api::verify))
        .route("/certificate", get(api::certificate))
        .route("/generate-all", get(api::generate_all));

    let assets = state.config.frontend_dist.join("assets");
    if assets.is_dir() {
        app = app.nest_service("/assets", ServeDir::new(assets));
    }
    if state.config.static_dir.is_dir() {
        app = app.nest_service("/static", ServeDir::new(&state.config.static_dir));
    }

    app.fallback(pages::spa_fallback)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
