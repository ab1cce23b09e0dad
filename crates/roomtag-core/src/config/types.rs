//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Gemini API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// API key (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Service-account credentials file (supports ${ENV_VAR} syntax).
    /// Optional; only checked for existence when set.
    pub credentials_file: String,

    /// Base URL for the generation API
    pub endpoint: String,

    /// Base URL for the file upload API
    pub upload_endpoint: String,

    /// Model name
    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: "${GEMINI_API_KEY}".to_string(),
            credentials_file: "${GOOGLE_APPLICATION_CREDENTIALS}".to_string(),
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            upload_endpoint: "https://generativelanguage.googleapis.com".to_string(),
            model: "gemini-2.0-flash-lite".to_string(),
        }
    }
}

/// Retry and timeout settings for a classification call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Max retry attempts for transient remote failures
    pub retry_attempts: u32,

    /// Base delay between retries in milliseconds
    pub retry_delay_ms: u64,

    /// Per-attempt timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 2,
            retry_delay_ms: 500,
            timeout_ms: 60_000,
        }
    }
}

/// Settings for fetching images from URLs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self { timeout_ms: 30_000 }
    }
}

/// Staging store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Directory for staged images. Empty means the system temp dir.
    pub dir: String,
}

/// REST server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
