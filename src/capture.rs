//! Image capture collaborator.

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, instrument};

use crate::backend::InlineImage;
use crate::error::StorageError;

/// Produces an optional JPEG image for the new-analysis form.
///
/// `capture` returns a data URI, or `None` if the capture was abandoned.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn capture(&self) -> Result<Option<String>, StorageError>;

    /// Abandon any capture in progress.
    fn cancel(&self) {}
}

/// Reads a JPEG from disk, standing in for a camera on a terminal.
#[derive(Debug, Clone)]
pub struct FileImageSource {
    path: PathBuf,
}

impl FileImageSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ImageSource for FileImageSource {
    #[instrument(name = "file_image_capture", skip(self), fields(path = %self.path.display()))]
    async fn capture(&self) -> Result<Option<String>, StorageError> {
        let bytes = tokio::fs::read(&self.path).await?;
        if bytes.is_empty() {
            debug!("Image file is empty, nothing captured");
            return Ok(None);
        }
        debug!(bytes = bytes.len(), "Captured image from file");
        Ok(Some(InlineImage::from_jpeg_bytes(&bytes).to_data_uri()))
    }
}
