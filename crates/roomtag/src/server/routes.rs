//! REST handlers.

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Multipart, Query, State};
use axum::Json;
use roomtag_core::{Classification, ImageSource};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::AppState;

/// Successful classification body: `{"classification": "<label>"}`.
#[derive(Debug, Serialize)]
pub struct ClassificationResponse {
    pub classification: Classification,
}

/// `image_url` may come in the query string or a JSON body.
#[derive(Debug, Deserialize)]
pub struct ImageUrlParams {
    pub image_url: Option<String>,
}

/// `POST /classify-image/` with a multipart `file` field.
pub async fn classify_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ClassificationResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::Unprocessable {
        message: format!("Expected multipart/form-data: {e}"),
    })?;
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Unprocessable {
            message: format!("Failed to parse multipart data: {e}"),
        })?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().map(String::from);
        let bytes = field.bytes().await.map_err(|e| ApiError::Unprocessable {
            message: format!("Failed to read uploaded file: {e}"),
        })?;
        tracing::info!(file_name = ?file_name, size = bytes.len(), "Received image upload");
        upload = Some(bytes.to_vec());
        break;
    }

    let bytes = upload.ok_or_else(|| ApiError::Unprocessable {
        message: "Missing multipart field 'file'".to_string(),
    })?;

    classify(&state, ImageSource::Upload(bytes)).await
}

/// `POST /classify-image-url/` with `image_url` as a query parameter or
/// JSON body field.
pub async fn classify_image_url(
    State(state): State<AppState>,
    query: Result<Query<ImageUrlParams>, QueryRejection>,
    body: Bytes,
) -> Result<Json<ClassificationResponse>, ApiError> {
    let Query(params) = query.map_err(|e| ApiError::Unprocessable {
        message: format!("Invalid query string: {e}"),
    })?;
    let image_url = params
        .image_url
        .or_else(|| {
            serde_json::from_slice::<ImageUrlParams>(&body)
                .ok()
                .and_then(|p| p.image_url)
        })
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| ApiError::Unprocessable {
            message: "Missing required parameter 'image_url'".to_string(),
        })?;

    tracing::info!(image_url = %image_url, "Received image URL");
    classify(&state, ImageSource::Url(image_url)).await
}

/// `GET /health`.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": roomtag_core::VERSION,
    }))
}

async fn classify(
    state: &AppState,
    source: ImageSource,
) -> Result<Json<ClassificationResponse>, ApiError> {
    let image = state.fetcher.load(source).await?;
    let classification = state.classifier.classify(&image).await?;
    Ok(Json(ClassificationResponse { classification }))
}
