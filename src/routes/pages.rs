use axum::{
    extract::State,
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Response},
};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use crate::state::AppState;

fn spa_index(state: &AppState) -> PathBuf {
    state.config.frontend_dist.join("index.html")
}

async fn html_file(path: &Path) -> Option<Html<String>> {
    tokio::fs::read_to_string(path).await.ok().map(Html)
}

/// Built SPA first, then the legacy static page.
pub async fn index(State(state): State<Arc<AppState>>) -> Response {
    if let Some(page) = html_file(&spa_index(&state)).await {
        return page.into_response();
    }
    if let Some(page) = html_file(&state.config.static_dir.join("index.html")).await {
        return page.into_response();
    }

    tracing::error!("No index page found in {} or {}", state.config.frontend_dist.display(), state.config.static_dir.display());
    (StatusCode::INTERNAL_SERVER_ERROR, "Template file not found").into_response()
}

/// Client-side routes: real files from the SPA build, otherwise its index page.
pub async fn spa_fallback(State(state): State<Arc<AppState>>, uri: Uri) -> Response {
    let index = spa_index(&state);
    if !index.is_file() {
        return StatusCode::NOT_FOUND.into_response();
    }

    let relative = Path::new(uri.path().trim_start_matches('/'));
    let safe = relative.components().all(|c| matches!(c, Component::Normal(_)));
    if safe && !relative.as_os_str().is_empty() {
        let candidate = state.config.frontend_dist.join(relative);
        if candidate.is_file() {
            if let Ok(content) = tokio::fs::read(&candidate).await {
                let mime = mime_guess::from_path(&candidate)
                    .first_raw()
                    .unwrap_or("application/octet-stream");
                return ([(header::CONTENT_TYPE, mime)], content).into_response();
            }
        }
    }

    match html_file(&index).await {
        Some(page) => page.into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
