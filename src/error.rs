//! Error types
//!
//! Every stage of the extraction pipeline fails with a [`StageError`]. At the
//! pipeline boundary it is wrapped into a [`ProcessingError`], so callers see a
//! single error shape and can still branch on [`ErrorKind`].

use std::path::PathBuf;
use thiserror::Error;

/// Closed set of failure categories a caller can branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Language data missing or unusable at construction
    Configuration,
    /// Language data removed after construction
    DataFileMissing,
    /// Reading or capturing the input failed
    Io,
    /// Input bytes are not a decodable image
    Decode,
    /// Normalized image could not be encoded
    Encode,
    /// The OCR engine failed
    Recognition,
}

/// Failure of a single pipeline stage
#[derive(Debug, Error)]
pub enum StageError {
    #[error(
        "Tesseract data file '{file}' not found in {}. Please download '{file}' into that directory.",
        .dir.display()
    )]
    Configuration { file: String, dir: PathBuf },

    #[error("Invalid configuration: {0}")]
    InvalidSetting(String),

    #[error("Tesseract data file '{file}' not found. Please download '{file}' into the tessdata directory.")]
    DataFileMissing { file: String },

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("{0}")]
    Recognition(String),
}

impl StageError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StageError::Configuration { .. } | StageError::InvalidSetting(_) => ErrorKind::Configuration,
            StageError::DataFileMissing { .. } => ErrorKind::DataFileMissing,
            StageError::Io(_) | StageError::Capture(_) => ErrorKind::Io,
            StageError::Decode(_) => ErrorKind::Decode,
            StageError::Encode(_) => ErrorKind::Encode,
            StageError::Recognition(_) => ErrorKind::Recognition,
        }
    }
}

/// Capture surface failure
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Webcam not started")]
    NotStarted,

    #[error("No image selected")]
    NoSelection,

    #[error("Error accessing webcam: {0}")]
    Device(String),

    #[error("Error capturing image: {0}")]
    Frame(String),

    #[error("Invalid download payload: {0}")]
    Payload(#[from] base64::DecodeError),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Error surfaced by [`crate::vision::TextExtractor::extract_text`]
#[derive(Debug, Error)]
#[error("Error processing image: {source}")]
pub struct ProcessingError {
    #[source]
    source: StageError,
}

impl ProcessingError {
    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    /// The stage error this wraps
    pub fn stage_error(&self) -> &StageError {
        &self.source
    }
}

impl From<StageError> for ProcessingError {
    fn from(source: StageError) -> Self {
        Self { source }
    }
}
