//! Mapping classification failures onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use roomtag_core::ClassifyError;
use serde_json::json;
use thiserror::Error;

/// Errors returned by the REST handlers, rendered as `{"detail": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The image URL could not be fetched
    #[error("{0}")]
    Download(ClassifyError),

    /// Anything that went wrong while classifying
    #[error("Error processing image: {0}")]
    Processing(ClassifyError),

    /// The request itself is unusable (missing field, bad multipart)
    #[error("{message}")]
    Unprocessable { message: String },
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Download(_) => StatusCode::BAD_REQUEST,
            ApiError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unprocessable { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl From<ClassifyError> for ApiError {
    fn from(err: ClassifyError) -> Self {
        if err.is_download() {
            ApiError::Download(err)
        } else {
            ApiError::Processing(err)
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), "{self}");
        } else {
            tracing::warn!(status = status.as_u16(), "{self}");
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
