//! Event sources for job progress.
//!
//! A `ProgressSource` turns a job id into a stream of raw transport events.
//! The stream is the connection: dropping it disconnects.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::Stream;
use tokio::sync::mpsc;
use tracing::debug;

use vclip_models::JobId;

/// Raw event delivered by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Text payload of one pushed message
    Message(String),
    /// Transport-level failure
    Error(String),
}

/// Connection to one job's event stream.
pub type EventStream = Pin<Box<dyn Stream<Item = TransportEvent> + Send>>;

/// Opens per-job event streams.
pub trait ProgressSource: Send + Sync + 'static {
    /// Connect to the progress endpoint of `job_id`.
    ///
    /// Connection failures are reported in-band as `TransportEvent::Error`.
    fn connect(&self, job_id: JobId) -> EventStream;
}

impl<S: ProgressSource + ?Sized> ProgressSource for Arc<S> {
    fn connect(&self, job_id: JobId) -> EventStream {
        (**self).connect(job_id)
    }
}

type Senders = HashMap<JobId, Vec<mpsc::UnboundedSender<TransportEvent>>>;

/// In-process event source.
///
/// Events are pushed per job id with `send` and fanned out to every live
/// connection for that job. Used for embedding the client next to an
/// in-process producer, and in tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    senders: Arc<Mutex<Senders>>,
    connects: Arc<AtomicUsize>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    fn senders(&self) -> std::sync::MutexGuard<'_, Senders> {
        self.senders.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Deliver an event to every live connection of a job.
    ///
    /// Returns the number of connections that received it.
    pub fn send(&self, job_id: JobId, event: TransportEvent) -> usize {
        let mut senders = self.senders();
        let Some(list) = senders.get_mut(&job_id) else {
            return 0;
        };

        list.retain(|tx| !tx.is_closed());
        list.iter()
            .filter(|tx| tx.send(event.clone()).is_ok())
            .count()
    }

    /// Deliver a text message.
    pub fn message(&self, job_id: JobId, payload: impl Into<String>) -> usize {
        self.send(job_id, TransportEvent::Message(payload.into()))
    }

    /// Deliver a transport error.
    pub fn fail(&self, job_id: JobId, reason: impl Into<String>) -> usize {
        self.send(job_id, TransportEvent::Error(reason.into()))
    }

    /// End every stream of a job, as if the server closed the connection.
    pub fn disconnect(&self, job_id: JobId) {
        self.senders().remove(&job_id);
    }

    /// Whether any connection to the job is still held by a reader.
    pub fn is_connected(&self, job_id: JobId) -> bool {
        self.senders()
            .get(&job_id)
            .is_some_and(|list| list.iter().any(|tx| !tx.is_closed()))
    }

    /// Total number of connections opened so far.
    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl ProgressSource for MemorySource {
    fn connect(&self, job_id: JobId) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.senders().entry(job_id).or_default().push(tx);
        self.connects.fetch_add(1, Ordering::SeqCst);
        debug!("Memory source connected for job {}", job_id);

        Box::pin(futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|event| (event, rx))
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[tokio::test]
    async fn test_memory_source_delivers_in_order() {
        let source = MemorySource::new();
        let job = JobId::new(1);
        let mut stream = source.connect(job);

        assert_eq!(source.message(job, "a"), 1);
        assert_eq!(source.fail(job, "b"), 1);

        assert_eq!(stream.next().await, Some(TransportEvent::Message("a".into())));
        assert_eq!(stream.next().await, Some(TransportEvent::Error("b".into())));
    }

    #[tokio::test]
    async fn test_memory_source_drop_disconnects() {
        let source = MemorySource::new();
        let job = JobId::new(2);
        let stream = source.connect(job);
        assert!(source.is_connected(job));

        drop(stream);
        assert!(!source.is_connected(job));
        assert_eq!(source.message(job, "late"), 0);
    }

    #[tokio::test]
    async fn test_memory_source_disconnect_ends_stream() {
        let source = MemorySource::new();
        let job = JobId::new(3);
        let mut stream = source.connect(job);

        source.disconnect(job);
        assert_eq!(stream.next().await, None);
        assert_eq!(source.connect_count(), 1);
    }
}
