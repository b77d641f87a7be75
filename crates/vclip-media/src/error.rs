//! Error types for local media handling.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while selecting a video or creating its handle.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to create local handle: {0}")]
    HandleCreation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a handle creation error.
    pub fn handle_creation(message: impl Into<String>) -> Self {
        Self::HandleCreation(message.into())
    }
}
