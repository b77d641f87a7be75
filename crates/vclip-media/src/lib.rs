//! Local media handling for the ViralClip job client.
//!
//! This crate provides:
//! - Video file selection with format detection
//! - Revocable local URL handles for the selected video
//! - A store that owns the selected video and its handle

pub mod error;
pub mod file;
pub mod resource;

pub use error::{MediaError, MediaResult};
pub use file::VideoFile;
pub use resource::{BlobUrlRegistry, HandleRegistry, LocalHandle, VideoResource, VideoResourceStore};
