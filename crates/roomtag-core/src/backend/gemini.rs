//! Gemini vision backend.
//!
//! Uploads staged files through the resumable Files API and streams
//! `streamGenerateContent` as server-sent events.

use super::provider::{FileRef, GenerationRequest, TextStream, VisionBackend};
use super::sse::SseDecoder;
use crate::config::{resolve_env_var, GeminiConfig};
use crate::error::{ClassifyError, ConfigError};
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::Path;

/// Gemini backend using the v1beta REST API.
pub struct GeminiBackend {
    api_key: String,
    model: String,
    endpoint: String,
    upload_endpoint: String,
    client: reqwest::Client,
}

impl GeminiBackend {
    pub fn new(endpoint: &str, upload_endpoint: &str, api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            upload_endpoint: upload_endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build the backend from config, resolving `${ENV_VAR}` credentials.
    pub fn from_config(config: &GeminiConfig) -> Result<Self, ConfigError> {
        let api_key =
            resolve_env_var(&config.api_key).ok_or_else(|| ConfigError::MissingCredential {
                name: "Gemini API key".to_string(),
                env_hint: "GEMINI_API_KEY".to_string(),
            })?;

        if let Some(credentials) = resolve_env_var(&config.credentials_file) {
            let path = shellexpand::tilde(&credentials).into_owned();
            if !Path::new(&path).is_file() {
                return Err(ConfigError::ValidationError(format!(
                    "gemini.credentials_file {path} does not exist"
                )));
            }
            tracing::debug!(path = %path, "Using Google credentials file");
        }

        Ok(Self::new(
            &config.endpoint,
            &config.upload_endpoint,
            &api_key,
            &config.model,
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

// --- Upload types ---

#[derive(Serialize)]
struct UploadStart<'a> {
    file: UploadMetadata<'a>,
}

#[derive(Serialize)]
struct UploadMetadata<'a> {
    display_name: &'a str,
}

#[derive(Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFile {
    uri: String,
    mime_type: Option<String>,
}

// --- Generation request types ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    File {
        #[serde(rename = "fileData")]
        file_data: FileData<'a>,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData<'a> {
    mime_type: &'a str,
    file_uri: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig<'a> {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: &'a str,
    response_schema: &'a serde_json::Value,
}

impl<'a> GenerateRequest<'a> {
    fn from_request(request: &'a GenerationRequest) -> Self {
        Self {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: &request.system_instruction,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::File {
                        file_data: FileData {
                            mime_type: &request.image.mime_type,
                            file_uri: &request.image.uri,
                        },
                    },
                    Part::Text {
                        text: &request.prompt,
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: request.sampling.temperature,
                top_p: request.sampling.top_p,
                top_k: request.sampling.top_k,
                max_output_tokens: request.sampling.max_output_tokens,
                response_mime_type: &request.response_mime_type,
                response_schema: &request.response_schema,
            },
        }
    }
}

// --- Stream chunk types ---

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    code: Option<u16>,
    message: String,
}

/// Connect failures and client timeouts become retryable `Transport`
/// errors; anything else is built by `other`.
fn transport_or(
    stage: &str,
    context: &str,
    e: reqwest::Error,
    other: impl FnOnce(String) -> ClassifyError,
) -> ClassifyError {
    let message = format!("{context}: {}", error_chain(&e));
    if e.is_connect() || e.is_timeout() {
        ClassifyError::Transport {
            stage: stage.to_string(),
            message,
        }
    } else {
        other(message)
    }
}

/// An error's message followed by its sources.
fn error_chain(e: &dyn std::error::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

/// Text carried by one SSE data payload. `None` for chunks without text
/// (an empty event, or a trailing usage-only chunk).
fn chunk_text(data: &str) -> Option<Result<String, ClassifyError>> {
    if data.trim().is_empty() {
        return None;
    }
    let chunk: StreamChunk = match serde_json::from_str(data) {
        Ok(chunk) => chunk,
        Err(e) => {
            return Some(Err(ClassifyError::Generation {
                message: format!("malformed stream chunk: {e}"),
                status_code: None,
            }))
        }
    };

    if let Some(error) = chunk.error {
        return Some(Err(ClassifyError::Generation {
            message: error.message,
            status_code: error.code,
        }));
    }

    let text: String = chunk
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        None
    } else {
        Some(Ok(text))
    }
}

struct StreamState {
    body: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    decoder: SseDecoder,
    pending: VecDeque<Result<String, ClassifyError>>,
    finished: bool,
}

/// Turn an SSE response body into a stream of text chunks.
fn text_stream(resp: reqwest::Response) -> TextStream {
    let state = StreamState {
        body: resp.bytes_stream().map(|r| r.map(|b| b.to_vec())).boxed(),
        decoder: SseDecoder::default(),
        pending: VecDeque::new(),
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if let Some(item) = st.pending.pop_front() {
                return Some((item, st));
            }
            if st.finished {
                return None;
            }
            match st.body.next().await {
                Some(Ok(bytes)) => {
                    for data in st.decoder.push(&bytes) {
                        st.pending.extend(chunk_text(&data));
                    }
                }
                Some(Err(e)) => {
                    st.finished = true;
                    st.pending.push_back(Err(transport_or(
                        "generation",
                        "stream interrupted",
                        e,
                        |message| ClassifyError::Generation {
                            message,
                            status_code: None,
                        },
                    )));
                }
                None => {
                    st.finished = true;
                    if let Some(data) = st.decoder.finish() {
                        st.pending.extend(chunk_text(&data));
                    }
                }
            }
        }
    })
    .boxed()
}

#[async_trait]
impl VisionBackend for GeminiBackend {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn upload(&self, path: &Path, mime_type: &str) -> Result<FileRef, ClassifyError> {
        let upload_err = |message: String, status_code: Option<u16>| ClassifyError::Upload {
            message,
            status_code,
        };

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            upload_err(
                format!("cannot read staged file {}: {e}", path.display()),
                None,
            )
        })?;
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        let start = self
            .client
            .post(format!("{}/upload/v1beta/files", self.upload_endpoint))
            .header("x-goog-api-key", &self.api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len().to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&UploadStart {
                file: UploadMetadata {
                    display_name: &display_name,
                },
            })
            .send()
            .await
            .map_err(|e| {
                transport_or("upload", "Gemini upload request failed", e, |m| {
                    upload_err(m, None)
                })
            })?;

        let status = start.status();
        if !status.is_success() {
            let text = start.text().await.unwrap_or_default();
            return Err(upload_err(
                format!("Gemini upload HTTP {status}: {text}"),
                Some(status.as_u16()),
            ));
        }

        let session_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| upload_err("Gemini upload returned no session URL".to_string(), None))?;

        let resp = self
            .client
            .post(&session_url)
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await
            .map_err(|e| {
                transport_or("upload", "Gemini upload request failed", e, |m| {
                    upload_err(m, None)
                })
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(upload_err(
                format!("Gemini upload HTTP {status}: {text}"),
                Some(status.as_u16()),
            ));
        }

        let uploaded: UploadResponse = resp
            .json()
            .await
            .map_err(|e| upload_err(format!("Failed to parse Gemini upload response: {e}"), None))?;

        tracing::debug!(uri = %uploaded.file.uri, "Uploaded staged image");
        Ok(FileRef {
            uri: uploaded.file.uri,
            mime_type: uploaded
                .file
                .mime_type
                .unwrap_or_else(|| mime_type.to_string()),
        })
    }

    async fn stream_generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<TextStream, ClassifyError> {
        let url = format!(
            "{}/v1beta/models/{}:streamGenerateContent?alt=sse",
            self.endpoint, self.model
        );

        let resp = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateRequest::from_request(request))
            .send()
            .await
            .map_err(|e| {
                transport_or("generation", "Gemini request failed", e, |message| {
                    ClassifyError::Generation {
                        message,
                        status_code: None,
                    }
                })
            })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(ClassifyError::Generation {
                message: format!("Gemini HTTP {status}: {text}"),
                status_code: Some(status.as_u16()),
            });
        }

        Ok(text_stream(resp))
    }
}
