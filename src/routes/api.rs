use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::service::{BulkReport, CertificateService, Verification};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct StudentQuery {
    name: String,
    student_id: String,
}

#[derive(Deserialize)]
pub struct AdminQuery {
    admin_key: String,
}

/// Lookups re-read the CSV and renders are CPU-bound; keep both off the async workers.
async fn run_blocking<T, F>(state: &AppState, job: F) -> AppResult<T>
where
    F: FnOnce(&CertificateService) -> AppResult<T> + Send + 'static,
    T: Send + 'static,
{
    let service = state.service.clone();
    tokio::task::spawn_blocking(move || job(&service))
        .await
        .map_err(AppError::render)?
}

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "running" }))
}

pub async fn verify(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StudentQuery>,
) -> AppResult<Json<Verification>> {
    let verification = run_blocking(&state, move |service| service.verify(&query.name, &query.student_id)).await?;
    Ok(Json(verification))
}

pub async fn certificate(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StudentQuery>,
) -> AppResult<impl IntoResponse> {
    let download =
        run_blocking(&state, move |service| service.certificate(&query.name, &query.student_id)).await?;

    let disposition = attachment_disposition(&download.file_name());
    let content = download.artifact.into_bytes().await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        content,
    ))
}

/// RFC 6266 `attr-char`: everything else is percent-encoded in `filename*`.
const ATTR_CHAR_RESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Quoted ASCII `filename`, plus an encoded `filename*` when the name needed rewriting.
fn attachment_disposition(file_name: &str) -> String {
    let quoted: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();
    if quoted == file_name {
        return format!("attachment; filename=\"{}\"", quoted);
    }
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        quoted,
        utf8_percent_encode(file_name, ATTR_CHAR_RESERVED)
    )
}

pub async fn generate_all(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminQuery>,
) -> AppResult<Json<BulkReport>> {
    let report = run_blocking(&state, move |service| service.generate_all(&query.admin_key)).await?;
    Ok(Json(report))
}
