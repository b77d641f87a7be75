//! Selected video files.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MediaError, MediaResult};

/// Container formats accepted for upload, by extension.
const VIDEO_TYPES: &[(&str, &str)] = &[
    ("mp4", "video/mp4"),
    ("m4v", "video/x-m4v"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
    ("mkv", "video/x-matroska"),
    ("avi", "video/x-msvideo"),
    ("mpg", "video/mpeg"),
    ("mpeg", "video/mpeg"),
    ("ogv", "video/ogg"),
    ("3gp", "video/3gpp"),
    ("ts", "video/mp2t"),
];

/// MIME type for a video file extension (case-insensitive).
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let ext = ext.to_ascii_lowercase();
    VIDEO_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// A local video file picked by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoFile {
    path: PathBuf,
    name: String,
    size: u64,
    mime_type: String,
}

impl VideoFile {
    /// Load file metadata from disk.
    pub async fn open(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();

        let metadata = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MediaError::FileNotFound(path.to_path_buf()));
            }
            Err(e) => return Err(e.into()),
        };

        if !metadata.is_file() {
            return Err(MediaError::InvalidVideo(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let file = Self::new(path, metadata.len())?;
        debug!(
            "Selected video {} ({}, {} bytes)",
            file.name, file.mime_type, file.size
        );
        Ok(file)
    }

    /// Describe a file whose size is already known.
    pub fn new(path: impl Into<PathBuf>, size: u64) -> MediaResult<Self> {
        let path = path.into();

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let mime_type = mime_for_extension(ext)
            .ok_or_else(|| MediaError::UnsupportedFormat(path.display().to_string()))?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            path,
            name,
            size,
            mime_type: mime_type.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }
}
