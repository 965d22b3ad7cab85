//! OCR (Optical Character Recognition) module
//!
//! The OCR engine itself is external. [`OcrBackend`] is the seam to it: a
//! backend opens one [`OcrSession`] per extraction, the session loads the
//! normalized image and runs recognition, and is dropped afterwards.

use crate::config::EngineConfig;
use crate::error::StageError;

/// Factory for per-call OCR engine handles
pub trait OcrBackend: Send + Sync + 'static {
    type Session: OcrSession;

    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Initialize an engine handle for the given configuration
    fn init(&self, config: &EngineConfig) -> Result<Self::Session, StageError>;
}

/// A live engine handle, released when dropped
pub trait OcrSession {
    /// Load an encoded image into the engine
    fn load_image(&mut self, image: &[u8]) -> Result<(), StageError>;

    /// Run recognition on the loaded image and return the text verbatim
    fn recognize(&mut self) -> Result<String, StageError>;
}

#[cfg(feature = "tesseract")]
pub use self::tesseract::{TesseractBackend, TesseractSession};

#[cfg(feature = "tesseract")]
mod tesseract {
    use leptess::LepTess;
    use tracing::{debug, warn};

    use super::{OcrBackend, OcrSession};
    use crate::config::{EngineConfig, EngineMode};
    use crate::error::StageError;

    /// Tesseract via leptess
    #[derive(Debug, Default, Clone, Copy)]
    pub struct TesseractBackend;

    impl TesseractBackend {
        pub fn new() -> Self {
            Self
        }
    }

    pub struct TesseractSession {
        tess: LepTess,
    }

    impl OcrBackend for TesseractBackend {
        type Session = TesseractSession;

        fn name(&self) -> &'static str {
            "tesseract"
        }

        fn init(&self, config: &EngineConfig) -> Result<TesseractSession, StageError> {
            if config.mode != EngineMode::Default {
                // leptess always initializes with the default OEM
                warn!("Engine mode {:?} not supported by leptess, using default", config.mode);
            }

            let data_path = config.tessdata_dir.to_str().ok_or_else(|| {
                StageError::Recognition(format!(
                    "tessdata path is not valid UTF-8: {:?}",
                    config.tessdata_dir
                ))
            })?;

            debug!("Initializing Tesseract ({}) from {}", config.language, data_path);
            let tess = LepTess::new(Some(data_path), &config.language)
                .map_err(|e| StageError::Recognition(format!("Failed to initialize Tesseract: {}", e)))?;

            Ok(TesseractSession { tess })
        }
    }

    impl OcrSession for TesseractSession {
        fn load_image(&mut self, image: &[u8]) -> Result<(), StageError> {
            self.tess
                .set_image_from_mem(image)
                .map_err(|e| StageError::Decode(format!("Failed to load image for OCR: {}", e)))
        }

        fn recognize(&mut self) -> Result<String, StageError> {
            self.tess
                .get_utf8_text()
                .map_err(|e| StageError::Recognition(format!("Failed to extract text: {}", e)))
        }
    }
}
