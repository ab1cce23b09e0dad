//! Staging store: per-call temporary files for the upload API.
//!
//! Every call gets its own randomly named file, so concurrent
//! classifications never touch each other's bytes. The file lives inside a
//! [`StagedImage`] guard and is removed when the guard goes away, whichever
//! way the call exits.

use crate::error::ClassifyError;
use crate::source::ImagePayload;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Creates staged files in a directory (system temp dir by default).
#[derive(Debug, Clone, Default)]
pub struct Stager {
    dir: Option<PathBuf>,
}

impl Stager {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Write the payload to a fresh uniquely named file.
    pub async fn stage(&self, payload: &ImagePayload) -> Result<StagedImage, ClassifyError> {
        let suffix = format!(".{}", payload.extension());
        let mut builder = tempfile::Builder::new();
        builder.prefix("roomtag-").suffix(&suffix);

        let file = match &self.dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
        .map_err(|e| ClassifyError::Staging {
            message: format!("cannot create staging file: {e}"),
        })?;

        tokio::fs::write(file.path(), &payload.bytes)
            .await
            .map_err(|e| ClassifyError::Staging {
                message: format!("cannot write {}: {e}", file.path().display()),
            })?;

        tracing::debug!(path = %file.path().display(), size = payload.bytes.len(), "Staged image");
        Ok(StagedImage { file })
    }
}

/// A staged image file, deleted on drop.
#[derive(Debug)]
pub struct StagedImage {
    file: NamedTempFile,
}

impl StagedImage {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Delete the file now, logging (not failing) if removal goes wrong.
    pub fn remove(self) {
        let path = self.file.path().to_path_buf();
        if let Err(e) = self.file.close() {
            tracing::warn!(path = %path.display(), "Failed to remove staged image: {e}");
        }
    }
}
