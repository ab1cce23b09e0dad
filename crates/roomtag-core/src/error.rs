//! Error types for roomtag.
//!
//! Classification failures are split by stage so callers (and the REST
//! layer) can tell a bad download apart from a remote rejection or a
//! malformed model reply.

use thiserror::Error;

/// Top-level error type for roomtag operations.
#[derive(Error, Debug)]
pub enum RoomtagError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Classification errors
    #[error("Classification error: {0}")]
    Classify(#[from] ClassifyError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// A required credential is not set
    #[error("{name} not set. Set the {env_hint} env var or add it to the config file.")]
    MissingCredential { name: String, env_hint: String },
}

/// Classification errors, organized by stage.
#[derive(Error, Debug)]
pub enum ClassifyError {
    /// Fetching the image from a remote URL failed
    #[error("Failed to download image from {url}: {message}")]
    Download {
        url: String,
        message: String,
        status_code: Option<u16>,
    },

    /// Writing the staged file failed
    #[error("Failed to stage image: {message}")]
    Staging { message: String },

    /// Uploading the staged file to the vision API failed
    #[error("Upload failed: {message}")]
    Upload {
        message: String,
        status_code: Option<u16>,
    },

    /// The generation call or its response stream failed
    #[error("Generation failed: {message}")]
    Generation {
        message: String,
        status_code: Option<u16>,
    },

    /// The model reply was not the expected JSON envelope
    #[error("Failed to parse classification: {message}")]
    Parse { message: String },

    /// The remote API was unreachable (connect failure or HTTP client timeout)
    #[error("Cannot reach the vision API during {stage}: {message}")]
    Transport { stage: String, message: String },

    /// An attempt exceeded its time budget
    #[error("Timeout in {stage} stage after {timeout_ms}ms")]
    Timeout { stage: String, timeout_ms: u64 },
}

impl ClassifyError {
    /// Whether this error came from fetching the caller's image URL.
    pub fn is_download(&self) -> bool {
        matches!(self, ClassifyError::Download { .. })
    }

    /// Short stage name, used as a structured logging field.
    pub fn stage(&self) -> &'static str {
        match self {
            ClassifyError::Download { .. } => "download",
            ClassifyError::Staging { .. } => "staging",
            ClassifyError::Upload { .. } => "upload",
            ClassifyError::Generation { .. } => "generation",
            ClassifyError::Parse { .. } => "parse",
            ClassifyError::Transport { .. } => "transport",
            ClassifyError::Timeout { .. } => "timeout",
        }
    }
}

/// Convenience type alias for roomtag results.
pub type Result<T> = std::result::Result<T, RoomtagError>;

/// Convenience type alias for classification results.
pub type ClassifyResult<T> = std::result::Result<T, ClassifyError>;
