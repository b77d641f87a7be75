//! Progress stream session.
//!
//! A session owns one connection to one job's event stream. Messages are
//! decoded, validated and folded into a `ClientState` in arrival order.
//! Noisy messages (undecodable or malformed) are reported and skipped; a
//! transport failure or a `completed` event ends the session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use vclip_models::{validate_event, ClientState, ErrorInfo, JobId, JobStatus};

use crate::metrics::{self, ActiveSessionGuard};
use crate::source::{EventStream, ProgressSource, TransportEvent};

/// What applying one transport event did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Valid `processing` event applied
    Progress,
    /// Valid `completed` event applied (terminal)
    Completed,
    /// Payload was not JSON
    ParseError,
    /// Payload was JSON but not a progress event
    InvalidData,
    /// Transport failed (terminal)
    ConnectionFailed,
    /// State is already terminal; nothing applied
    Ignored,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Progress => "progress",
            Outcome::Completed => "completed",
            Outcome::ParseError => "parse_error",
            Outcome::InvalidData => "invalid_data",
            Outcome::ConnectionFailed => "connection_failed",
            Outcome::Ignored => "ignored",
        }
    }

    /// Whether the session must stop listening.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Outcome::Completed | Outcome::ConnectionFailed | Outcome::Ignored
        )
    }
}

/// Fold one transport event into the client state.
///
/// Progress is taken as reported: regressions are not clamped.
pub fn reconcile(state: &mut ClientState, event: TransportEvent) -> Outcome {
    if state.status.is_terminal() {
        return Outcome::Ignored;
    }

    match event {
        TransportEvent::Message(payload) => {
            let value: serde_json::Value = match serde_json::from_str(&payload) {
                Ok(value) => value,
                Err(e) => {
                    state.error = Some(ErrorInfo::parse_error(format!(
                        "Failed to parse progress event: {}",
                        e
                    )));
                    return Outcome::ParseError;
                }
            };

            let Some(event) = validate_event(&value) else {
                state.error = Some(ErrorInfo::invalid_data(
                    "Progress event is missing a numeric progress or a known status",
                ));
                return Outcome::InvalidData;
            };

            if event.progress < state.progress {
                debug!(
                    "Progress went backwards from {} to {}",
                    state.progress, event.progress
                );
            }

            state.error = None;
            state.progress = event.progress;
            state.status = event.status.into();

            if event.is_completed() {
                Outcome::Completed
            } else {
                Outcome::Progress
            }
        }
        TransportEvent::Error(reason) => {
            state.error = Some(ErrorInfo::connection_failed(format!(
                "Progress stream connection failed: {}",
                reason
            )));
            state.status = JobStatus::Idle;
            Outcome::ConnectionFailed
        }
    }
}

/// One live connection to a job's progress stream.
///
/// Closing is idempotent and also happens on drop.
pub struct ProgressSession {
    job_id: JobId,
    state: Arc<watch::Sender<ClientState>>,
    closed: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl ProgressSession {
    /// Open a session with its own fresh state.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn open<S>(source: &S, job_id: JobId) -> Self
    where
        S: ProgressSource + ?Sized,
    {
        let (state, _) = watch::channel(ClientState::idle());
        Self::open_with_state(source, job_id, Arc::new(state))
    }

    /// Open a session that publishes into an existing state channel.
    pub fn open_with_state<S>(
        source: &S,
        job_id: JobId,
        state: Arc<watch::Sender<ClientState>>,
    ) -> Self
    where
        S: ProgressSource + ?Sized,
    {
        info!("Opening progress session for job {}", job_id);
        metrics::record_session_opened();

        let stream = source.connect(job_id);
        let closed = Arc::new(AtomicBool::new(false));
        let task = tokio::spawn(read_events(
            job_id,
            stream,
            Arc::clone(&state),
            Arc::clone(&closed),
        ));

        Self {
            job_id,
            state,
            closed,
            task,
        }
    }

    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    /// Latest state.
    pub fn state(&self) -> ClientState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ClientState> {
        self.state.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst) || self.task.is_finished()
    }

    /// Stop delivery and drop the connection.
    pub fn close(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!("Closing progress session for job {}", self.job_id);
        }
        self.task.abort();
    }
}

impl Drop for ProgressSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ProgressSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProgressSession")
            .field("job_id", &self.job_id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

async fn read_events(
    job_id: JobId,
    mut stream: EventStream,
    state: Arc<watch::Sender<ClientState>>,
    closed: Arc<AtomicBool>,
) {
    let _active = ActiveSessionGuard::new();

    loop {
        let event = stream
            .next()
            .await
            .unwrap_or_else(|| TransportEvent::Error("event stream closed".to_string()));

        // The closed flag is re-checked under the channel lock so nothing
        // lands after a close has been observed.
        let mut outcome = None;
        state.send_if_modified(|current| {
            if closed.load(Ordering::SeqCst) {
                return false;
            }
            let applied = reconcile(current, event);
            if applied.is_terminal() {
                closed.store(true, Ordering::SeqCst);
            }
            outcome = Some(applied);
            applied != Outcome::Ignored
        });

        let Some(outcome) = outcome else {
            debug!("Progress session for job {} closed, dropping event", job_id);
            break;
        };

        metrics::record_message(outcome.as_str());

        match outcome {
            Outcome::ParseError | Outcome::InvalidData => {
                warn!("Progress session for job {}: {}", job_id, outcome.as_str());
            }
            Outcome::Completed => {
                info!("Job {} completed", job_id);
                break;
            }
            Outcome::ConnectionFailed => {
                warn!("Progress stream for job {} lost", job_id);
                break;
            }
            Outcome::Ignored => break,
            Outcome::Progress => {}
        }
    }
}
