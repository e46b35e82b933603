use thiserror::Error;

use crate::models::SegmentationMode;

#[derive(Debug, Error)]
pub enum IdCardError {
    #[error("Image decode error: {0}")]
    ImageDecodeError(String),

    #[error("Image processing error: {0}")]
    ImageProcessingError(String),

    #[error("OCR pass '{mode}' failed: {message}")]
    OcrPassError {
        mode: SegmentationMode,
        message: String,
    },

    #[error("OCR unavailable: {0}")]
    OcrUnavailable(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(String),
}

impl IdCardError {
    /// Errors that abort a pipeline run, as opposed to a single dropped OCR pass.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, IdCardError::OcrPassError { .. })
    }
}

