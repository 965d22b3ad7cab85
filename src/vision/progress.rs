//! Progress reporting for the extraction pipeline

use parking_lot::Mutex;

pub const READING: (u8, &str) = (10, "Reading file...");
pub const OPTIMIZING: (u8, &str) = (30, "Optimizing image...");
pub const INITIALIZING: (u8, &str) = (50, "Initializing OCR engine...");
pub const LOADING: (u8, &str) = (60, "Loading image...");
pub const RECOGNIZING: (u8, &str) = (70, "Performing text recognition...");
pub const COMPLETE: (u8, &str) = (100, "Complete!");

/// Receives pipeline progress notifications.
///
/// Called synchronously from the pipeline; implementations must return
/// quickly and must not panic.
pub trait ProgressSink: Send + Sync {
    fn on_progress(&self, percentage: u8, message: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(u8, &str) + Send + Sync,
{
    fn on_progress(&self, percentage: u8, message: &str) {
        self(percentage, message)
    }
}

/// A single progress notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    pub percentage: u8,
    pub message: String,
}

/// Sink that records every event it receives
#[derive(Debug, Default)]
pub struct ProgressLog {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events received so far
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().clone()
    }

    pub fn percentages(&self) -> Vec<u8> {
        self.events.lock().iter().map(|e| e.percentage).collect()
    }
}

impl ProgressSink for ProgressLog {
    fn on_progress(&self, percentage: u8, message: &str) {
        self.events.lock().push(ProgressEvent {
            percentage,
            message: message.to_string(),
        });
    }
}

pub(crate) fn report<P: ProgressSink + ?Sized>(sink: &P, milestone: (u8, &str)) {
    sink.on_progress(milestone.0, milestone.1);
}
