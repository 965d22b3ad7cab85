//! Image Capture Layer
//!
//! Where pipeline input comes from: a file on disk (the upload path) or a
//! still grabbed from a camera. Camera access itself is platform glue behind
//! [`FrameSource`]; this module only handles the still-capture lifecycle.

pub mod download;
pub mod frame;

pub use download::download_text;
pub use frame::CapturedFrame;

use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::error::{CaptureError, StageError};

/// Anything that can hand the pipeline an encoded image
#[async_trait]
pub trait ImageSource: Send {
    async fn acquire(&mut self) -> Result<Vec<u8>, StageError>;
}

/// Image read from a file, the equivalent of a file picker upload
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ImageSource for FileSource {
    async fn acquire(&mut self) -> Result<Vec<u8>, StageError> {
        debug!("Reading image from {:?}", self.path);
        Ok(tokio::fs::read(&self.path).await?)
    }
}

/// A camera or other device producing raw frames
pub trait FrameSource: Send {
    /// Acquire the device
    fn open(&mut self) -> Result<(), CaptureError>;
    /// Grab the current frame
    fn grab(&mut self) -> Result<CapturedFrame, CaptureError>;
    /// Release the device
    fn close(&mut self);
}

/// Still capture from a [`FrameSource`] with a single current selection
pub struct StillCapture<F: FrameSource> {
    source: F,
    streaming: bool,
    selection: Option<Vec<u8>>,
}

impl<F: FrameSource> StillCapture<F> {
    pub fn new(source: F) -> Self {
        Self {
            source,
            streaming: false,
            selection: None,
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Currently selected still, if any
    pub fn selection(&self) -> Option<&[u8]> {
        self.selection.as_deref()
    }

    /// Start acquisition; no-op when already started
    pub fn start_capture(&mut self) -> Result<(), CaptureError> {
        if self.streaming {
            return Ok(());
        }
        self.source.open()?;
        self.streaming = true;
        info!("Capture started");
        Ok(())
    }

    /// Grab one frame, encode it as a JPEG still and make it the selection
    pub fn capture_frame(&mut self) -> Result<&[u8], CaptureError> {
        if !self.streaming {
            return Err(CaptureError::NotStarted);
        }

        let frame = self.source.grab()?;
        let still = frame.to_still().map_err(|e| CaptureError::Frame(e.to_string()))?;
        debug!("Captured {}x{} frame ({} bytes)", frame.width, frame.height, still.len());

        Ok(self.selection.insert(still).as_slice())
    }

    /// Stop acquisition and release the device; no-op when stopped
    pub fn stop_capture(&mut self) {
        if self.streaming {
            self.source.close();
            self.streaming = false;
            info!("Capture stopped");
        }
    }

    /// Drop the current selection
    pub fn clear_selection(&mut self) {
        self.selection = None;
    }
}

impl<F: FrameSource> Drop for StillCapture<F> {
    fn drop(&mut self) {
        self.stop_capture();
    }
}

#[async_trait]
impl<F: FrameSource> ImageSource for StillCapture<F> {
    async fn acquire(&mut self) -> Result<Vec<u8>, StageError> {
        self.selection
            .clone()
            .ok_or_else(|| CaptureError::NoSelection.into())
    }
}
