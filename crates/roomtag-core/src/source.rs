//! Image source adapter: raw upload bytes or a remote URL.
//!
//! Bytes are passed through unchecked. The only inspection is a magic-byte
//! sniff to pick a MIME type (and a file extension for staging).

use crate::config::DownloadConfig;
use crate::error::ClassifyError;
use std::io::Cursor;
use std::time::Duration;

/// Image bytes plus the MIME type inferred from them.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    pub bytes: Vec<u8>,
    pub mime_type: &'static str,
}

impl ImagePayload {
    pub fn new(bytes: Vec<u8>) -> Self {
        let mime_type = infer_mime(&bytes);
        Self { bytes, mime_type }
    }

    /// File extension matching the inferred MIME type.
    pub fn extension(&self) -> &'static str {
        match self.mime_type {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "jpeg",
        }
    }

    /// Cheap, decode-free summary for showing the user what they picked.
    pub fn preview(&self) -> ImagePreview {
        let dimensions = image::ImageReader::new(Cursor::new(&self.bytes))
            .with_guessed_format()
            .ok()
            .and_then(|reader| reader.into_dimensions().ok());
        ImagePreview {
            mime_type: self.mime_type,
            size_bytes: self.bytes.len(),
            dimensions,
        }
    }
}

/// Summary of an image shown before classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePreview {
    pub mime_type: &'static str,
    pub size_bytes: usize,
    /// `None` when the header can't be read
    pub dimensions: Option<(u32, u32)>,
}

/// Infer the MIME type from the leading bytes, defaulting to JPEG.
pub fn infer_mime(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::WebP) => "image/webp",
        Ok(image::ImageFormat::Gif) => "image/gif",
        Ok(image::ImageFormat::Jpeg) => "image/jpeg",
        Ok(other) => {
            tracing::debug!("Unhandled image format {other:?}, defaulting to image/jpeg");
            "image/jpeg"
        }
        Err(_) => "image/jpeg",
    }
}

/// Where a caller's image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Bytes supplied directly (file upload, local path)
    Upload(Vec<u8>),
    /// A URL to fetch
    Url(String),
}

/// Fetches images from URLs.
#[derive(Clone)]
pub struct ImageFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl ImageFetcher {
    pub fn new(config: &DownloadConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Resolve a source into an image payload.
    pub async fn load(&self, source: ImageSource) -> Result<ImagePayload, ClassifyError> {
        match source {
            ImageSource::Upload(bytes) => Ok(ImagePayload::new(bytes)),
            ImageSource::Url(url) => self.fetch(&url).await,
        }
    }

    /// GET the URL and return its body. Any transport failure or non-2xx
    /// status is a `ClassifyError::Download`.
    pub async fn fetch(&self, url: &str) -> Result<ImagePayload, ClassifyError> {
        let download_err = |message: String, status_code: Option<u16>| ClassifyError::Download {
            url: url.to_string(),
            message,
            status_code,
        };

        let resp = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| download_err(e.to_string(), None))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(download_err(format!("HTTP {status}"), Some(status.as_u16())));
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| download_err(format!("failed to read body: {e}"), None))?;

        tracing::debug!(url, size = bytes.len(), "Downloaded image");
        Ok(ImagePayload::new(bytes.to_vec()))
    }
}
