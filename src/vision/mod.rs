//! Vision/OCR Layer
//!
//! Turns uploaded or captured image bytes into text:
//! read -> optimize -> init engine -> load image -> recognize.
//! Progress milestones are reported before each stage starts.

pub mod ocr;
pub mod preprocess;
pub mod progress;

pub use ocr::{OcrBackend, OcrSession};
#[cfg(feature = "tesseract")]
pub use ocr::TesseractBackend;
pub use preprocess::{optimize, NormalizedImage};
pub use progress::{ProgressEvent, ProgressLog, ProgressSink};

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info};

use crate::capture::ImageSource;
use crate::config::{EngineConfig, PreprocessConfig};
use crate::error::{ProcessingError, StageError};

/// Status returned with every successful extraction
pub const SUCCESS_STATUS: &str = "Text extraction completed successfully.";

/// Text extracted from one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// Recognized text, exactly as the engine produced it
    pub text: String,
    /// Terminal status message
    pub status: String,
}

/// Milestone handed from the engine thread to the async caller. The engine
/// thread waits for `ack` so the sink sees the milestone before the stage runs.
struct StageSignal {
    milestone: (u8, &'static str),
    ack: oneshot::Sender<()>,
}

/// Recognition engine adapter and extraction pipeline
pub struct TextExtractor<B: OcrBackend> {
    backend: Arc<B>,
    engine: Arc<EngineConfig>,
    preprocess: PreprocessConfig,
}

impl<B: OcrBackend> TextExtractor<B> {
    /// Create an extractor; fails if the language data is not installed
    pub fn new(backend: B, engine: EngineConfig, preprocess: PreprocessConfig) -> Result<Self, StageError> {
        engine.validate()?;
        preprocess.validate()?;
        info!(
            "OCR backend '{}' ready (language: {}, tessdata: {:?})",
            backend.name(),
            engine.language,
            engine.tessdata_dir
        );

        Ok(Self {
            backend: Arc::new(backend),
            engine: Arc::new(engine),
            preprocess,
        })
    }

    /// Read an image from `reader` and extract its text
    pub async fn extract_text<R, P>(&self, mut reader: R, sink: &P) -> Result<ExtractionResult, ProcessingError>
    where
        R: AsyncRead + Unpin,
        P: ProgressSink + ?Sized,
    {
        let read = async move {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf).await?;
            Ok::<_, StageError>(buf)
        };
        self.finish(self.run(read, sink).await, sink)
    }

    /// Extract text from an image already held in memory
    pub async fn extract_bytes<P>(&self, bytes: Vec<u8>, sink: &P) -> Result<ExtractionResult, ProcessingError>
    where
        P: ProgressSink + ?Sized,
    {
        let read = async move { Ok::<_, StageError>(bytes) };
        self.finish(self.run(read, sink).await, sink)
    }

    /// Acquire an image from a capture source and extract its text
    pub async fn extract_from_source<S, P>(&self, source: &mut S, sink: &P) -> Result<ExtractionResult, ProcessingError>
    where
        S: ImageSource + ?Sized,
        P: ProgressSink + ?Sized,
    {
        let read = source.acquire();
        self.finish(self.run(read, sink).await, sink)
    }

    fn finish<P>(&self, result: Result<ExtractionResult, StageError>, sink: &P) -> Result<ExtractionResult, ProcessingError>
    where
        P: ProgressSink + ?Sized,
    {
        result.map_err(|err| {
            error!("Text extraction failed: {}", err);
            sink.on_progress(0, &format!("Error: {}", err));
            ProcessingError::from(err)
        })
    }

    async fn run<F, P>(&self, read: F, sink: &P) -> Result<ExtractionResult, StageError>
    where
        F: Future<Output = Result<Vec<u8>, StageError>>,
        P: ProgressSink + ?Sized,
    {
        let start = Instant::now();
        self.engine.ensure_data_file()?;

        progress::report(sink, progress::READING);
        let raw = read.await?;
        debug!("Read {} bytes", raw.len());

        progress::report(sink, progress::OPTIMIZING);
        let preprocess = self.preprocess.clone();
        let normalized = tokio::task::spawn_blocking(move || optimize(&raw, &preprocess))
            .await
            .map_err(|e| StageError::Decode(e.to_string()))??;
        debug!(
            "Normalized image {}x{} ({} bytes, resized: {})",
            normalized.width,
            normalized.height,
            normalized.bytes.len(),
            normalized.resized
        );

        let text = self.recognize(normalized.bytes, sink).await?;

        progress::report(sink, progress::COMPLETE);
        info!(
            "Extracted {} characters in {:.1}ms",
            text.chars().count(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(ExtractionResult {
            text,
            status: SUCCESS_STATUS.to_string(),
        })
    }

    /// Run the engine stages on a blocking thread, forwarding milestones
    async fn recognize<P>(&self, image: Vec<u8>, sink: &P) -> Result<String, StageError>
    where
        P: ProgressSink + ?Sized,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<StageSignal>();
        let backend = Arc::clone(&self.backend);
        let engine = Arc::clone(&self.engine);

        let handle = tokio::task::spawn_blocking(move || run_engine(&*backend, &engine, &image, &tx));

        // Ends once the engine thread drops its sender
        while let Some(signal) = rx.recv().await {
            progress::report(sink, signal.milestone);
            let _ = signal.ack.send(());
        }

        handle
            .await
            .map_err(|e| StageError::Recognition(e.to_string()))?
    }
}

fn enter_stage(tx: &mpsc::UnboundedSender<StageSignal>, milestone: (u8, &'static str)) {
    let (ack, acked) = oneshot::channel();
    if tx.send(StageSignal { milestone, ack }).is_ok() {
        let _ = acked.blocking_recv();
    }
}

/// Engine stages; the session is dropped on every return path
fn run_engine<B: OcrBackend>(
    backend: &B,
    engine: &EngineConfig,
    image: &[u8],
    tx: &mpsc::UnboundedSender<StageSignal>,
) -> Result<String, StageError> {
    enter_stage(tx, progress::INITIALIZING);
    let mut session = backend.init(engine)?;

    enter_stage(tx, progress::LOADING);
    session.load_image(image)?;

    enter_stage(tx, progress::RECOGNIZING);
    session.recognize()
}
