//! Roomtag Core - classify real-estate listing photos with a hosted vision model.
//!
//! Roomtag forwards an image to Gemini and gets back exactly one label from a
//! closed set of listing-photo categories ("Bathroom", "Exterior View", ...),
//! or the verdict that the picture is not a real-estate image at all.
//!
//! # Architecture
//!
//! ```text
//! Upload / URL → ImagePayload → staged file → remote upload
//!              → streamed JSON generation → Classification
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use roomtag_core::{Classifier, Config, ImageFetcher, ImageSource};
//!
//! #[tokio::main]
//! async fn main() -> roomtag_core::Result<()> {
//!     let config = Config::load()?;
//!     let classifier = Classifier::from_config(&config)?;
//!     let fetcher = ImageFetcher::new(&config.download);
//!
//!     let image = fetcher
//!         .load(ImageSource::Url("https://example.com/listing/1.jpg".into()))
//!         .await?;
//!     let classification = classifier.classify(&image).await?;
//!     println!("{classification}");
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod backend;
pub mod classifier;
pub mod config;
pub mod error;
pub mod label;
pub mod source;
pub mod staging;

// Re-exports for convenient access
pub use backend::{GeminiBackend, VisionBackend};
pub use classifier::{ClassifyOptions, Classifier};
pub use config::Config;
pub use error::{ClassifyError, ClassifyResult, ConfigError, Result, RoomtagError};
pub use label::{Classification, RoomLabel};
pub use source::{ImageFetcher, ImagePayload, ImagePreview, ImageSource};
pub use staging::Stager;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
