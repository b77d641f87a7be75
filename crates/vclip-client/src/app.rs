//! Tracking loop and video selection.

use std::future::Future;
use std::path::Path;

use tracing::{info, warn};

use vclip_media::{HandleRegistry, MediaResult, VideoFile, VideoResource, VideoResourceStore};
use vclip_models::{ClientState, ErrorKind, JobStatus};
use vclip_progress::ProgressTracker;

/// How tracking ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackOutcome {
    /// The job completed
    Completed(ClientState),
    /// The progress connection failed
    Failed(ClientState),
    /// Tracking was stopped before the job settled
    Interrupted(ClientState),
}

impl TrackOutcome {
    pub fn state(&self) -> &ClientState {
        match self {
            TrackOutcome::Completed(s) | TrackOutcome::Failed(s) | TrackOutcome::Interrupted(s) => s,
        }
    }

    /// Process exit code for the outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            TrackOutcome::Completed(_) => 0,
            TrackOutcome::Failed(_) => 1,
            TrackOutcome::Interrupted(_) => 130,
        }
    }
}

/// Load a local video and make it the selected one.
pub async fn select_video<R: HandleRegistry>(
    store: &VideoResourceStore<R>,
    path: impl AsRef<Path>,
) -> MediaResult<VideoResource> {
    let file = VideoFile::open(path).await?;
    store.set_video(file)
}

/// Log state changes until the job settles or `shutdown` resolves.
///
/// On shutdown the tracker is deactivated, closing its session.
pub async fn run_until_settled<F>(tracker: &mut ProgressTracker, shutdown: F) -> TrackOutcome
where
    F: Future<Output = ()>,
{
    let mut rx = tracker.subscribe();
    tokio::pin!(shutdown);

    loop {
        let state = rx.borrow_and_update().clone();
        log_state(&state);

        if state.status == JobStatus::Completed {
            return TrackOutcome::Completed(state);
        }
        if state.error_kind() == Some(ErrorKind::ConnectionFailed) {
            return TrackOutcome::Failed(state);
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    return TrackOutcome::Interrupted(state);
                }
            }
            _ = &mut shutdown => {
                info!("Stopping progress tracking");
                tracker.deactivate();
                return TrackOutcome::Interrupted(tracker.state());
            }
        }
    }
}

fn log_state(state: &ClientState) {
    match &state.error {
        Some(error) if error.kind == ErrorKind::ConnectionFailed => {
            warn!(progress = state.progress, "Connection lost: {}", error.message);
        }
        Some(error) => {
            warn!(
                progress = state.progress,
                status = %state.status,
                "Ignored bad progress message ({}): {}",
                error.kind,
                error.message
            );
        }
        None => {
            info!(progress = state.progress, status = %state.status, "Job progress");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use std::time::Duration;

    use vclip_media::BlobUrlRegistry;
    use vclip_models::JobId;
    use vclip_progress::MemorySource;

    #[tokio::test]
    async fn test_run_until_completed() {
        let source = MemorySource::new();
        let job = JobId::new(9);
        let mut tracker = ProgressTracker::with_job(Arc::new(source.clone()), Some(job));

        source.message(job, r#"{"progress": 10, "status": "processing"}"#);
        source.message(job, "oops");
        source.message(job, r#"{"progress": 100, "status": "completed"}"#);

        let outcome = tokio::time::timeout(
            Duration::from_secs(1),
            run_until_settled(&mut tracker, std::future::pending()),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, TrackOutcome::Completed(_)));
        assert_eq!(outcome.state().progress, 100.0);
        assert_eq!(outcome.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_run_until_connection_failure() {
        let source = MemorySource::new();
        let job = JobId::new(10);
        let mut tracker = ProgressTracker::with_job(Arc::new(source.clone()), Some(job));

        source.fail(job, "refused");

        let outcome = tokio::time::timeout(
            Duration::from_secs(1),
            run_until_settled(&mut tracker, std::future::pending()),
        )
        .await
        .unwrap();

        assert!(matches!(outcome, TrackOutcome::Failed(_)));
        assert_eq!(outcome.state().status, JobStatus::Idle);
        assert_eq!(outcome.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_deactivates_tracker() {
        let source = MemorySource::new();
        let job = JobId::new(11);
        let mut tracker = ProgressTracker::with_job(Arc::new(source.clone()), Some(job));

        let outcome = run_until_settled(&mut tracker, async {}).await;

        assert!(matches!(outcome, TrackOutcome::Interrupted(_)));
        assert_eq!(tracker.job_id(), None);
        assert!(!tracker.is_active());
    }

    #[tokio::test]
    async fn test_select_video_replaces_previous() {
        let mut first = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
        first.write_all(b"first").unwrap();
        let second = tempfile::Builder::new().suffix(".mov").tempfile().unwrap();

        let store = VideoResourceStore::new(BlobUrlRegistry::new("test"));
        let a = select_video(&store, first.path()).await.unwrap();
        let b = select_video(&store, second.path()).await.unwrap();

        assert_eq!(a.file.as_ref().unwrap().size(), 5);
        assert_eq!(b.file.as_ref().unwrap().mime_type(), "video/quicktime");
        assert_eq!(store.registry().live_count(), 1);
        assert_eq!(store.url(), b.url);

        assert!(select_video(&store, "/definitely/missing.mp4").await.is_err());
    }
}
