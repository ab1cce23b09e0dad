//! Classification client: stage, upload, generate, parse.
//!
//! One call classifies one image. Each attempt stages the bytes in its own
//! file, uploads it, drops the file, then streams a schema-constrained
//! generation and parses the concatenated reply. Transient remote failures
//! are retried with exponential backoff; everything else fails fast.

use crate::backend::{self, GeminiBackend, GenerationRequest, VisionBackend};
use crate::config::{ClassifierConfig, Config};
use crate::error::{ClassifyError, ConfigError};
use crate::label::{self, Classification};
use crate::source::ImagePayload;
use crate::staging::Stager;
use futures_util::StreamExt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Retry and timeout policy for the classifier.
#[derive(Debug, Clone)]
pub struct ClassifyOptions {
    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,
    /// Maximum retries per image
    pub retry_attempts: u32,
    /// Base backoff delay in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self::from(&ClassifierConfig::default())
    }
}

impl From<&ClassifierConfig> for ClassifyOptions {
    fn from(config: &ClassifierConfig) -> Self {
        Self {
            timeout_ms: config.timeout_ms,
            retry_attempts: config.retry_attempts,
            retry_delay_ms: config.retry_delay_ms,
        }
    }
}

/// Classifies listing photos through a remote vision backend.
pub struct Classifier {
    backend: Arc<dyn VisionBackend>,
    stager: Stager,
    options: ClassifyOptions,
}

impl Classifier {
    pub fn new(backend: Arc<dyn VisionBackend>, stager: Stager, options: ClassifyOptions) -> Self {
        Self {
            backend,
            stager,
            options,
        }
    }

    /// Build a Gemini-backed classifier from configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let backend = GeminiBackend::from_config(&config.gemini)?;
        tracing::debug!(model = backend.model(), "Gemini backend ready");
        Ok(Self::new(
            Arc::new(backend),
            Stager::new(config.staging_dir()),
            ClassifyOptions::from(&config.classifier),
        ))
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Classify an image, retrying transient remote failures.
    pub async fn classify(&self, payload: &ImagePayload) -> Result<Classification, ClassifyError> {
        let timeout = Duration::from_millis(self.options.timeout_ms);
        let start = Instant::now();
        let mut attempt = 0u32;

        loop {
            let result = match tokio::time::timeout(timeout, self.classify_once(payload)).await {
                Ok(result) => result,
                Err(_) => Err(ClassifyError::Timeout {
                    stage: "classify".to_string(),
                    timeout_ms: self.options.timeout_ms,
                }),
            };

            match result {
                Ok(classification) => {
                    tracing::info!(
                        classification = %classification,
                        backend = self.backend.name(),
                        attempts = attempt + 1,
                        latency_ms = start.elapsed().as_millis() as u64,
                        "Image classified"
                    );
                    return Ok(classification);
                }
                Err(e) if attempt < self.options.retry_attempts && backend::is_retryable(&e) => {
                    let delay = backend::backoff_duration(attempt, self.options.retry_delay_ms);
                    attempt += 1;
                    tracing::debug!(
                        stage = e.stage(),
                        "Retry {attempt}/{} after {delay:?}: {e}",
                        self.options.retry_attempts
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    tracing::warn!(stage = e.stage(), attempts = attempt + 1, "Classification failed: {e}");
                    return Err(e);
                }
            }
        }
    }

    /// One attempt, with no retry.
    async fn classify_once(&self, payload: &ImagePayload) -> Result<Classification, ClassifyError> {
        let staged = self.stager.stage(payload).await?;
        let uploaded = self.backend.upload(staged.path(), payload.mime_type).await;
        staged.remove();
        let file = uploaded?;

        let request = GenerationRequest::classify(file);
        let mut stream = self.backend.stream_generate(&request).await?;

        let mut reply = String::new();
        while let Some(chunk) = stream.next().await {
            reply.push_str(&chunk?);
        }

        label::parse_reply(&reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{FileRef, TextStream};
    use crate::label::RoomLabel;
    use async_trait::async_trait;
    use futures_util::stream;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    type ReplyFn = Box<dyn Fn(u32, &[u8]) -> Result<Vec<String>, ClassifyError> + Send + Sync>;

    /// A configurable mock backend.
    ///
    /// `upload` reads the staged file (so tests see exactly what was staged)
    /// and hands out an opaque URI. `stream_generate` calls the reply
    /// factory with the call index and the uploaded bytes.
    struct MockBackend {
        reply_fn: ReplyFn,
        upload_status: Option<u16>,
        fail_mid_stream: bool,
        delay: Option<Duration>,
        generate_calls: Arc<AtomicU32>,
        staged_paths: Arc<Mutex<Vec<PathBuf>>>,
        uploads: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl MockBackend {
        fn new(reply_fn: ReplyFn) -> Self {
            Self {
                reply_fn,
                upload_status: None,
                fail_mid_stream: false,
                delay: None,
                generate_calls: Arc::new(AtomicU32::new(0)),
                staged_paths: Arc::new(Mutex::new(Vec::new())),
                uploads: Mutex::new(HashMap::new()),
            }
        }

        /// Always reply with `{"classification": label}`, split in two chunks.
        fn replying(label: &str) -> Self {
            let label = label.to_string();
            Self::new(Box::new(move |_: u32, _: &[u8]| {
                Ok(vec![
                    "{\"classification\": ".to_string(),
                    format!("\"{label}\"}}"),
                ])
            }))
        }

        /// Reply with the label whose lowercase name prefixes the image bytes.
        fn by_content() -> Self {
            Self::new(Box::new(|_: u32, bytes: &[u8]| {
                let text = String::from_utf8_lossy(bytes).to_string();
                let label = RoomLabel::ALL
                    .iter()
                    .find(|l| text.starts_with(&l.as_str().to_lowercase()))
                    .map_or("false", |l| l.as_str());
                Ok(vec![format!("{{\"classification\": \"{label}\"}}")])
            }))
        }

        fn failing_generate(status_code: Option<u16>) -> Self {
            Self::new(Box::new(move |_: u32, _: &[u8]| {
                Err(ClassifyError::Generation {
                    message: "remote failure".to_string(),
                    status_code,
                })
            }))
        }

        /// First generation fails with `status_code`, later ones succeed.
        fn fail_then_succeed(status_code: u16, label: &str) -> Self {
            let label = label.to_string();
            Self::new(Box::new(move |idx: u32, _: &[u8]| {
                if idx == 0 {
                    Err(ClassifyError::Generation {
                        message: "transient".to_string(),
                        status_code: Some(status_code),
                    })
                } else {
                    Ok(vec![format!("{{\"classification\": \"{label}\"}}")])
                }
            }))
        }

        fn with_upload_status(mut self, status: u16) -> Self {
            self.upload_status = Some(status);
            self
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn with_mid_stream_failure(mut self) -> Self {
            self.fail_mid_stream = true;
            self
        }
    }

    #[async_trait]
    impl VisionBackend for MockBackend {
        fn name(&self) -> &str {
            "mock"
        }

        async fn upload(&self, path: &Path, mime_type: &str) -> Result<FileRef, ClassifyError> {
            self.staged_paths.lock().unwrap().push(path.to_path_buf());
            let bytes = std::fs::read(path).map_err(|e| ClassifyError::Upload {
                message: e.to_string(),
                status_code: None,
            })?;
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if let Some(status) = self.upload_status {
                return Err(ClassifyError::Upload {
                    message: format!("HTTP {status}: unsupported file"),
                    status_code: Some(status),
                });
            }
            let mut uploads = self.uploads.lock().unwrap();
            let uri = format!("mock://files/{}", uploads.len());
            uploads.insert(uri.clone(), bytes);
            Ok(FileRef {
                uri,
                mime_type: mime_type.to_string(),
            })
        }

        async fn stream_generate(
            &self,
            request: &GenerationRequest,
        ) -> Result<TextStream, ClassifyError> {
            let idx = self.generate_calls.fetch_add(1, Ordering::SeqCst);
            let bytes = self
                .uploads
                .lock()
                .unwrap()
                .get(&request.image.uri)
                .cloned()
                .unwrap_or_default();
            let mut items: Vec<Result<String, ClassifyError>> =
                (self.reply_fn)(idx, &bytes)?.into_iter().map(Ok).collect();
            if self.fail_mid_stream {
                items.insert(
                    1,
                    Err(ClassifyError::Generation {
                        message: "stream interrupted".to_string(),
                        status_code: None,
                    }),
                );
            }
            Ok(stream::iter(items).boxed())
        }
    }

    fn fast_options() -> ClassifyOptions {
        ClassifyOptions {
            timeout_ms: 5000,
            retry_attempts: 0,
            retry_delay_ms: 10,
        }
    }

    /// Build a classifier staging into a fresh temp dir.
    fn classifier(
        backend: MockBackend,
        options: ClassifyOptions,
    ) -> (Classifier, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let classifier = Classifier::new(
            Arc::new(backend),
            Stager::new(Some(dir.path().to_path_buf())),
            options,
        );
        (classifier, dir)
    }

    fn staged_files_left(dir: &tempfile::TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    fn jpeg(tail: &[u8]) -> ImagePayload {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.extend_from_slice(tail);
        ImagePayload::new(bytes)
    }

    #[tokio::test]
    async fn test_classify_concatenates_chunks() {
        let (classifier, dir) = classifier(MockBackend::replying("Kitchen"), fast_options());
        let result = classifier.classify(&jpeg(b"photo")).await.unwrap();
        assert_eq!(result.label(), Some(RoomLabel::Kitchen));
        assert_eq!(staged_files_left(&dir), 0);
    }

    #[tokio::test]
    async fn test_non_real_estate_image_is_sentinel() {
        let (classifier, _dir) = classifier(MockBackend::replying("false"), fast_options());
        let result = classifier.classify(&jpeg(b"a cat")).await.unwrap();
        assert_eq!(result, Classification::not_real_estate());
    }

    #[tokio::test]
    async fn test_label_outside_enum_is_parse_error_and_not_retried() {
        let backend = MockBackend::replying("Garage");
        let calls = backend.generate_calls.clone();
        let options = ClassifyOptions {
            retry_attempts: 3,
            ..fast_options()
        };
        let (classifier, _dir) = classifier(backend, options);

        let err = classifier.classify(&jpeg(b"x")).await.unwrap_err();
        assert!(matches!(err, ClassifyError::Parse { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_on_transient_error() {
        let backend = MockBackend::fail_then_succeed(429, "Balcony");
        let calls = backend.generate_calls.clone();
        let options = ClassifyOptions {
            retry_attempts: 1,
            ..fast_options()
        };
        let (classifier, dir) = classifier(backend, options);

        let result = classifier.classify(&jpeg(b"x")).await.unwrap();
        assert_eq!(result.label(), Some(RoomLabel::Balcony));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(staged_files_left(&dir), 0);
    }

    #[tokio::test]
    async fn test_retry_on_unreachable_api() {
        let backend = MockBackend::new(Box::new(|idx: u32, _: &[u8]| {
            if idx == 0 {
                Err(ClassifyError::Transport {
                    stage: "generation".to_string(),
                    message: "tcp connect error: Connection refused".to_string(),
                })
            } else {
                Ok(vec!["{\"classification\": \"Parking\"}".to_string()])
            }
        }));
        let calls = backend.generate_calls.clone();
        let options = ClassifyOptions {
            retry_attempts: 1,
            ..fast_options()
        };
        let (classifier, _dir) = classifier(backend, options);

        let result = classifier.classify(&jpeg(b"x")).await.unwrap();
        assert_eq!(result.label(), Some(RoomLabel::Parking));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retries_exhausted() {
        let backend = MockBackend::failing_generate(Some(503));
        let calls = backend.generate_calls.clone();
        let options = ClassifyOptions {
            retry_attempts: 2,
            ..fast_options()
        };
        let (classifier, _dir) = classifier(backend, options);

        let err = classifier.classify(&jpeg(b"x")).await.unwrap_err();
        assert!(matches!(err, ClassifyError::Generation { status_code: Some(503), .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried() {
        let backend = MockBackend::failing_generate(Some(403));
        let calls = backend.generate_calls.clone();
        let options = ClassifyOptions {
            retry_attempts: 3,
            ..fast_options()
        };
        let (classifier, _dir) = classifier(backend, options);

        let err = classifier.classify(&jpeg(b"x")).await.unwrap_err();
        assert!(matches!(err, ClassifyError::Generation { status_code: Some(403), .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_upload_failure_removes_staged_file() {
        let backend = MockBackend::replying("Room").with_upload_status(400);
        let staged = backend.staged_paths.clone();
        let (classifier, dir) = classifier(backend, fast_options());

        let err = classifier.classify(&ImagePayload::new(b"not an image".to_vec())).await;
        assert!(matches!(err, Err(ClassifyError::Upload { status_code: Some(400), .. })));
        assert_eq!(staged.lock().unwrap().len(), 1);
        assert_eq!(staged_files_left(&dir), 0);
    }

    #[tokio::test]
    async fn test_mid_stream_failure_is_generation_error() {
        let backend = MockBackend::replying("Gym").with_mid_stream_failure();
        let (classifier, dir) = classifier(backend, fast_options());

        let err = classifier.classify(&jpeg(b"x")).await.unwrap_err();
        assert!(matches!(err, ClassifyError::Generation { .. }));
        assert_eq!(staged_files_left(&dir), 0);
    }

    #[tokio::test]
    async fn test_timeout_cleans_up_staged_file() {
        let backend = MockBackend::replying("Gym").with_delay(Duration::from_millis(500));
        let options = ClassifyOptions {
            timeout_ms: 50,
            ..fast_options()
        };
        let (classifier, dir) = classifier(backend, options);

        let err = classifier.classify(&jpeg(b"x")).await.unwrap_err();
        assert!(matches!(err, ClassifyError::Timeout { timeout_ms: 50, .. }));
        assert_eq!(staged_files_left(&dir), 0);
    }

    #[tokio::test]
    async fn test_same_bytes_twice_same_label() {
        let (classifier, _dir) = classifier(MockBackend::by_content(), fast_options());
        let payload = ImagePayload::new(b"staircase shot".to_vec());
        let first = classifier.classify(&payload).await.unwrap();
        let second = classifier.classify(&payload).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.label(), Some(RoomLabel::Staircase));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_calls_do_not_share_staging() {
        let backend = MockBackend::by_content().with_delay(Duration::from_millis(50));
        let staged = backend.staged_paths.clone();
        let (classifier, dir) = classifier(backend, fast_options());

        let kitchen = ImagePayload::new(b"kitchen with island".to_vec());
        let garden = ImagePayload::new(b"garden in bloom".to_vec());
        let (a, b) = tokio::join!(classifier.classify(&kitchen), classifier.classify(&garden));

        assert_eq!(a.unwrap().label(), Some(RoomLabel::Kitchen));
        assert_eq!(b.unwrap().label(), Some(RoomLabel::Garden));

        let staged = staged.lock().unwrap();
        assert_eq!(staged.len(), 2);
        assert_ne!(staged[0], staged[1]);
        assert_eq!(staged_files_left(&dir), 0);
    }
}
