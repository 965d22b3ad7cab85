//! ImageTextExtractor - image to text with OCR
//!
//! Takes an uploaded or captured image, bounds and re-encodes it for the OCR
//! engine, and extracts its text while reporting progress to the caller.

pub mod capture;
pub mod config;
pub mod error;
pub mod vision;

pub use config::{AppConfig, EngineConfig, EngineMode, PreprocessConfig};
pub use error::{CaptureError, ErrorKind, ProcessingError, StageError};
pub use vision::{ExtractionResult, ProgressSink, TextExtractor};
