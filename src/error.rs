use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// The CSV source or the certificate template is missing.
    #[error("Source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("Malformed source {}: {reason}", path.display())]
    MalformedSource { path: PathBuf, reason: String },

    #[error("Student not found with name: {name} and ID: {student_id}")]
    RecordNotFound { name: String, student_id: String },

    #[error("Render error: {0}")]
    Render(String),

    /// Operation not available in the current deployment mode.
    #[error("{0}")]
    Configuration(String),

    #[error("Invalid admin key")]
    Unauthorized,
}

impl AppError {
    pub fn render(err: impl std::fmt::Display) -> Self {
        AppError::Render(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Render(err.to_string())
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Render(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::RecordNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::FORBIDDEN,
            AppError::Configuration(_) => StatusCode::NOT_IMPLEMENTED,
            AppError::SourceNotFound(_)
            | AppError::MalformedSource { .. }
            | AppError::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Server-side causes go to the log, not to the caller.
        let detail = match self {
            AppError::Render(ref cause) => {
                tracing::error!("Certificate rendering failed: {}", cause);
                "Error generating certificate".to_string()
            }
            AppError::SourceNotFound(_) | AppError::MalformedSource { .. } => {
                tracing::error!("{}", self);
                "Student records are unavailable".to_string()
            }
            ref other => other.to_string(),
        };

        (status, Json(serde_json::json!({ "detail": detail }))).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
