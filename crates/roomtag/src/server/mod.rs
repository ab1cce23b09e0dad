//! REST front end.
//!
//! Two classification endpoints (file upload and image URL) plus a health
//! check. Handlers share one `Classifier`; every request stages its own
//! file, so concurrent requests are independent.

mod error;
mod routes;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use roomtag_core::{Classifier, ImageFetcher};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Arc<Classifier>,
    pub fetcher: ImageFetcher,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/classify-image/", post(routes::classify_image))
        .route("/classify-image-url/", post(routes::classify_image_url))
        .route("/health", get(routes::health))
        // Uploads are forwarded unchecked, whatever their size
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl+C.
pub async fn run(state: AppState, addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Cannot bind {addr}: {e}"))?;

    tracing::info!(
        addr = %listener.local_addr()?,
        backend = state.classifier.backend_name(),
        "Roomtag REST API listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use futures_util::stream::{self, StreamExt};
    use roomtag_core::backend::{FileRef, GenerationRequest, TextStream};
    use roomtag_core::config::DownloadConfig;
    use roomtag_core::{ClassifyError, ClassifyOptions, Stager, VisionBackend};
    use std::path::Path;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Backend that answers every request with a fixed label, or fails
    /// generation when `label` is `None`.
    struct FixedBackend {
        label: Option<&'static str>,
        uploads: Arc<AtomicU32>,
    }

    #[async_trait]
    impl VisionBackend for FixedBackend {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn upload(&self, path: &Path, mime_type: &str) -> Result<FileRef, ClassifyError> {
            assert!(path.exists());
            self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(FileRef {
                uri: "mock://files/1".to_string(),
                mime_type: mime_type.to_string(),
            })
        }

        async fn stream_generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<TextStream, ClassifyError> {
            match self.label {
                Some(label) => Ok(stream::iter(vec![
                    Ok("{\"classification\":".to_string()),
                    Ok(format!("\"{label}\"}}")),
                ])
                .boxed()),
                None => Err(ClassifyError::Generation {
                    message: "HTTP 400: Unable to process input image".to_string(),
                    status_code: Some(400),
                }),
            }
        }
    }

    fn test_server(label: Option<&'static str>) -> (TestServer, Arc<AtomicU32>) {
        let uploads = Arc::new(AtomicU32::new(0));
        let backend = FixedBackend {
            label,
            uploads: uploads.clone(),
        };
        let classifier = Classifier::new(
            Arc::new(backend),
            Stager::default(),
            ClassifyOptions {
                timeout_ms: 5000,
                retry_attempts: 0,
                retry_delay_ms: 10,
            },
        );
        let state = AppState {
            classifier: Arc::new(classifier),
            fetcher: ImageFetcher::new(&DownloadConfig { timeout_ms: 5000 }),
        };
        (TestServer::new(router(state)).unwrap(), uploads)
    }

    /// Serve a tiny image host on an ephemeral port.
    async fn spawn_image_host() -> String {
        let app = Router::new()
            .route("/listing/1.jpg", get(|| async { vec![0xFFu8, 0xD8, 0xFF, 0xE0, 1, 2, 3] }))
            .route("/gone.jpg", get(|| async { StatusCode::NOT_FOUND }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn jpeg_form() -> MultipartForm {
        let part = Part::bytes(vec![0xFF, 0xD8, 0xFF, 0xE0, 9, 9])
            .file_name("bedroom.jpg")
            .mime_type("image/jpeg");
        MultipartForm::new().add_part("file", part)
    }

    #[tokio::test]
    async fn test_classify_upload() {
        let (server, uploads) = test_server(Some("Bedroom"));

        let response = server.post("/classify-image/").multipart(jpeg_form()).await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body, serde_json::json!({ "classification": "Bedroom" }));
        assert_eq!(uploads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_classify_upload_not_real_estate() {
        let (server, _) = test_server(Some("false"));

        let response = server.post("/classify-image/").multipart(jpeg_form()).await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["classification"], "false");
    }

    #[tokio::test]
    async fn test_classify_upload_missing_file_field() {
        let (server, uploads) = test_server(Some("Bedroom"));

        let response = server
            .post("/classify-image/")
            .multipart(MultipartForm::new().add_text("other", "value"))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = response.json();
        assert!(body["detail"].as_str().unwrap().contains("file"));
        assert_eq!(uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_classify_upload_not_multipart() {
        let (server, _) = test_server(Some("Bedroom"));

        let response = server
            .post("/classify-image/")
            .json(&serde_json::json!({ "file": "bedroom.jpg" }))
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_remote_rejection_is_500() {
        let (server, _) = test_server(None);

        let part = Part::bytes(b"definitely not an image".to_vec()).file_name("notes.txt");
        let response = server
            .post("/classify-image/")
            .multipart(MultipartForm::new().add_part("file", part))
            .await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = response.json();
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .starts_with("Error processing image: "));
    }

    #[tokio::test]
    async fn test_classify_url_query_param() {
        let host = spawn_image_host().await;
        let (server, uploads) = test_server(Some("Exterior View"));

        let response = server
            .post("/classify-image-url/")
            .add_query_param("image_url", format!("{host}/listing/1.jpg"))
            .await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["classification"], "Exterior View");
        assert_eq!(uploads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_classify_url_json_body() {
        let host = spawn_image_host().await;
        let (server, _) = test_server(Some("Floor Plan"));

        let response = server
            .post("/classify-image-url/")
            .json(&serde_json::json!({ "image_url": format!("{host}/listing/1.jpg") }))
            .await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["classification"], "Floor Plan");
    }

    #[tokio::test]
    async fn test_classify_url_404_is_400_and_skips_classifier() {
        let host = spawn_image_host().await;
        let (server, uploads) = test_server(Some("Kitchen"));

        let response = server
            .post("/classify-image-url/")
            .add_query_param("image_url", format!("{host}/gone.jpg"))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .starts_with("Failed to download image"));
        assert_eq!(uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_classify_url_missing_param() {
        let (server, _) = test_server(Some("Kitchen"));

        let response = server.post("/classify-image-url/").await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_classify_url_duplicate_query_param_is_422_json() {
        let (server, uploads) = test_server(Some("Kitchen"));

        let response = server
            .post("/classify-image-url/?image_url=http://a/1.jpg&image_url=http://b/2.jpg")
            .await;

        response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
        let body: serde_json::Value = response.json();
        assert!(body["detail"]
            .as_str()
            .unwrap()
            .starts_with("Invalid query string"));
        assert_eq!(uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_health() {
        let (server, _) = test_server(Some("Kitchen"));

        let response = server.get("/health").await;

        response.assert_status(StatusCode::OK);
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], roomtag_core::VERSION);
    }
}
