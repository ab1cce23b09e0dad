//! Vision backend trait and the structured classification request.
//!
//! Defines the interface a remote vision API implements (upload a staged
//! file, stream a generation), plus the fixed request the classifier sends.

use crate::error::ClassifyError;
use crate::label;
use async_trait::async_trait;
use futures_util::stream::BoxStream;
use std::path::Path;

/// Instruction given to the model ahead of every request.
pub const SYSTEM_INSTRUCTION: &str = "You are an image classifier for images shown in real estate listings.\n\
     - If image not related to real-estate then return 'false'.";

/// User prompt sent alongside the image.
pub const CLASSIFY_PROMPT: &str = "Classify this image";

/// A file the remote API has accepted, referenced by URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub uri: String,
    pub mime_type: String,
}

/// Decoding parameters for a generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingParams {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 1.0,
            top_p: 0.95,
            top_k: 40,
            max_output_tokens: 8192,
        }
    }
}

/// A structured generation request: one user turn with an image and a
/// prompt, answered as JSON constrained by `response_schema`.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_instruction: String,
    pub image: FileRef,
    pub prompt: String,
    pub sampling: SamplingParams,
    pub response_mime_type: String,
    pub response_schema: serde_json::Value,
}

impl GenerationRequest {
    /// The listing-photo classification request for an uploaded image.
    pub fn classify(image: FileRef) -> Self {
        Self {
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            image,
            prompt: CLASSIFY_PROMPT.to_string(),
            sampling: SamplingParams::default(),
            response_mime_type: "application/json".to_string(),
            response_schema: classification_schema(),
        }
    }
}

/// Schema with a single enumerated string field, `classification`.
pub fn classification_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "classification": {
                "type": "STRING",
                "enum": label::schema_enum(),
            }
        }
    })
}

/// Text chunks of a streamed generation, in arrival order.
pub type TextStream = BoxStream<'static, Result<String, ClassifyError>>;

/// Trait that remote vision APIs implement.
///
/// Uses `async_trait` because native async fn in trait is not object-safe
/// (the classifier holds an `Arc<dyn VisionBackend>`).
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Backend name for logging (e.g., "gemini").
    fn name(&self) -> &str;

    /// Upload a staged file and return the remote reference to it.
    async fn upload(&self, path: &Path, mime_type: &str) -> Result<FileRef, ClassifyError>;

    /// Start a streamed generation. Errors before the first chunk come back
    /// directly; errors mid-stream come back as stream items.
    async fn stream_generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<TextStream, ClassifyError>;
}
