//! Saving extracted text for the user

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::CaptureError;

/// Decode `content_base64` and write it to `dir/filename`.
///
/// Only the final component of `filename` is used, so a download can never
/// escape `dir`. Returns the written path.
pub fn download_text(dir: &Path, filename: &str, content_base64: &str) -> Result<PathBuf, CaptureError> {
    let content = STANDARD.decode(content_base64.trim())?;

    let name = Path::new(filename)
        .file_name()
        .ok_or_else(|| {
            CaptureError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid download filename: {:?}", filename),
            ))
        })?;

    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, content)?;

    info!("Saved {:?}", path);
    Ok(path)
}

/// Encode text the way [`download_text`] expects it
pub fn encode_text(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}
