//! Progress tracking bound to a consumer.
//!
//! A `ProgressTracker` follows a job id that may change over time and keeps
//! at most one session open for it. Dropping the tracker tears the session
//! down.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::debug;

use vclip_models::{ClientState, JobId};

use crate::session::ProgressSession;
use crate::source::ProgressSource;

/// Tracks the progress of the currently selected job.
pub struct ProgressTracker {
    source: Arc<dyn ProgressSource>,
    state: Arc<watch::Sender<ClientState>>,
    job_id: Option<JobId>,
    session: Option<ProgressSession>,
}

impl ProgressTracker {
    /// Create an inactive tracker in the idle state.
    pub fn new(source: Arc<dyn ProgressSource>) -> Self {
        let (state, _) = watch::channel(ClientState::idle());
        Self {
            source,
            state: Arc::new(state),
            job_id: None,
            session: None,
        }
    }

    /// Create a tracker and start following `job_id`.
    pub fn with_job(source: Arc<dyn ProgressSource>, job_id: Option<JobId>) -> Self {
        let mut tracker = Self::new(source);
        tracker.set_job(job_id);
        tracker
    }

    /// Follow a different job.
    ///
    /// The previous session is closed before the new one opens, and the state
    /// starts over from idle. Passing the current id again does nothing.
    pub fn set_job(&mut self, job_id: Option<JobId>) {
        if self.job_id == job_id {
            return;
        }

        self.close_session();
        self.state.send_replace(ClientState::idle());
        self.job_id = job_id;

        if let Some(id) = job_id {
            self.session = Some(ProgressSession::open_with_state(
                self.source.as_ref(),
                id,
                Arc::clone(&self.state),
            ));
        }
    }

    /// Stop tracking. The last state stays readable.
    ///
    /// A later `set_job` with any id, including the previous one, opens a
    /// new session.
    pub fn deactivate(&mut self) {
        self.close_session();
        self.job_id = None;
    }

    fn close_session(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("Tearing down progress session for job {}", session.job_id());
            session.close();
        }
    }

    pub fn job_id(&self) -> Option<JobId> {
        self.job_id
    }

    /// Latest state.
    pub fn state(&self) -> ClientState {
        self.state.borrow().clone()
    }

    /// Change notifications for the state.
    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.state.subscribe()
    }

    /// Whether a session is open and still listening.
    pub fn is_active(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.is_closed())
    }

    /// Wait until the tracked job completes or its connection fails.
    ///
    /// Returns `None` when no job is tracked.
    pub async fn wait_for_terminal(&self) -> Option<ClientState> {
        self.job_id?;
        let mut rx = self.subscribe();
        let state = rx.wait_for(ClientState::is_settled).await.ok()?.clone();
        Some(state)
    }
}

impl Drop for ProgressTracker {
    fn drop(&mut self) {
        self.close_session();
    }
}
