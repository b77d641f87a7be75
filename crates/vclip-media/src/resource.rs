//! Local resource handles for the selected video.
//!
//! A local handle makes a picked file addressable by URL (for preview and
//! upload) without copying it. Handles must be revoked when no longer
//! referenced; `VideoResourceStore` is the only owner and guarantees that.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::MediaResult;
use crate::file::VideoFile;

/// A live, revocable local URL.
///
/// Not `Clone`: revoking consumes the handle, so it cannot be revoked twice.
#[derive(Debug, PartialEq, Eq)]
pub struct LocalHandle {
    url: String,
}

impl LocalHandle {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Creates and revokes local handles.
pub trait HandleRegistry: Send + Sync {
    /// Make `file` addressable under a new URL.
    fn create(&self, file: &VideoFile) -> MediaResult<LocalHandle>;

    /// Release a handle. Its URL stops resolving.
    fn revoke(&self, handle: LocalHandle);
}

impl<R: HandleRegistry + ?Sized> HandleRegistry for std::sync::Arc<R> {
    fn create(&self, file: &VideoFile) -> MediaResult<LocalHandle> {
        (**self).create(file)
    }

    fn revoke(&self, handle: LocalHandle) {
        (**self).revoke(handle)
    }
}

/// In-process registry of `blob:` URLs pointing at local files.
#[derive(Debug)]
pub struct BlobUrlRegistry {
    origin: String,
    live: Mutex<HashMap<String, PathBuf>>,
}

impl Default for BlobUrlRegistry {
    fn default() -> Self {
        Self::new("vclip")
    }
}

impl BlobUrlRegistry {
    pub fn new(origin: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            live: Mutex::new(HashMap::new()),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        Self::new(std::env::var("VCLIP_BLOB_ORIGIN").unwrap_or_else(|_| "vclip".to_string()))
    }

    fn live(&self) -> MutexGuard<'_, HashMap<String, PathBuf>> {
        self.live.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// File behind a live URL.
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        self.live().get(url).cloned()
    }

    /// Number of URLs not yet revoked.
    pub fn live_count(&self) -> usize {
        self.live().len()
    }
}

impl HandleRegistry for BlobUrlRegistry {
    fn create(&self, file: &VideoFile) -> MediaResult<LocalHandle> {
        let url = format!("blob:{}/{}", self.origin, Uuid::new_v4());
        self.live().insert(url.clone(), file.path().to_path_buf());
        debug!("Created local handle {} for {}", url, file.path().display());
        Ok(LocalHandle::new(url))
    }

    fn revoke(&self, handle: LocalHandle) {
        if self.live().remove(handle.url()).is_none() {
            warn!("Revoked unknown local handle {}", handle.url());
        } else {
            debug!("Revoked local handle {}", handle.url());
        }
    }
}

/// Snapshot of the selected video. `url` is set iff `file` is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoResource {
    pub file: Option<VideoFile>,
    pub url: Option<String>,
}

#[derive(Debug)]
struct Selection {
    file: VideoFile,
    handle: LocalHandle,
}

/// Holder of the selected video and its local handle.
///
/// Construct one per session and share it (e.g. behind an `Arc`). At most one
/// handle is live at a time; the previous one is revoked before a new one is
/// created, and the live one is revoked on drop.
pub struct VideoResourceStore<R: HandleRegistry = BlobUrlRegistry> {
    registry: R,
    selection: Mutex<Option<Selection>>,
}

impl<R: HandleRegistry> VideoResourceStore<R> {
    pub fn new(registry: R) -> Self {
        Self {
            registry,
            selection: Mutex::new(None),
        }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    fn selection(&self) -> MutexGuard<'_, Option<Selection>> {
        self.selection.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Select a video, replacing any previous one.
    ///
    /// If the new handle cannot be created the store is left empty.
    pub fn set_video(&self, file: VideoFile) -> MediaResult<VideoResource> {
        let mut selection = self.selection();

        if let Some(previous) = selection.take() {
            debug!("Replacing selected video {}", previous.file.name());
            self.registry.revoke(previous.handle);
        }

        let handle = self.registry.create(&file)?;
        info!("Selected video {} as {}", file.name(), handle.url());

        let resource = VideoResource {
            file: Some(file.clone()),
            url: Some(handle.url().to_string()),
        };
        *selection = Some(Selection { file, handle });

        Ok(resource)
    }

    /// Drop the selected video. No-op when nothing is selected.
    pub fn clear_video(&self) {
        if let Some(previous) = self.selection().take() {
            info!("Cleared selected video {}", previous.file.name());
            self.registry.revoke(previous.handle);
        }
    }

    pub fn snapshot(&self) -> VideoResource {
        match self.selection().as_ref() {
            Some(s) => VideoResource {
                file: Some(s.file.clone()),
                url: Some(s.handle.url().to_string()),
            },
            None => VideoResource::default(),
        }
    }

    pub fn file(&self) -> Option<VideoFile> {
        self.selection().as_ref().map(|s| s.file.clone())
    }

    pub fn url(&self) -> Option<String> {
        self.selection().as_ref().map(|s| s.handle.url().to_string())
    }

    pub fn is_empty(&self) -> bool {
        self.selection().is_none()
    }
}

impl Default for VideoResourceStore<BlobUrlRegistry> {
    fn default() -> Self {
        Self::new(BlobUrlRegistry::default())
    }
}

impl<R: HandleRegistry> Drop for VideoResourceStore<R> {
    fn drop(&mut self) {
        self.clear_video();
    }
}
