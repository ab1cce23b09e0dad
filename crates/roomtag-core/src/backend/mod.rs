//! Remote vision API integration.
//!
//! Provides the backend abstraction the classifier talks to, the Gemini
//! implementation of it, and retry helpers for transient remote failures.

pub(crate) mod gemini;
pub(crate) mod provider;
pub(crate) mod retry;
mod sse;

pub use gemini::GeminiBackend;
pub use provider::{
    classification_schema, FileRef, GenerationRequest, SamplingParams, TextStream, VisionBackend,
    CLASSIFY_PROMPT, SYSTEM_INSTRUCTION,
};
pub use retry::{backoff_duration, is_retryable};
