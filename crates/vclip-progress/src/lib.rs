//! Real-time job progress client.
//!
//! This crate provides:
//! - Per-job event sources (SSE over HTTP, in-memory)
//! - Progress sessions that fold pushed events into client state
//! - A tracker that binds a session to a consumer and a changing job id

pub mod config;
pub mod error;
pub mod metrics;
pub mod session;
pub mod source;
pub mod sse;
pub mod tracker;

pub use config::ProgressClientConfig;
pub use error::{ProgressError, ProgressResult};
pub use session::{reconcile, Outcome, ProgressSession};
pub use source::{EventStream, MemorySource, ProgressSource, TransportEvent};
pub use sse::{SseParser, SseSource};
pub use tracker::ProgressTracker;
