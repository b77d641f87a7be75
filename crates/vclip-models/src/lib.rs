//! Shared data models for the ViralClip job client.
//!
//! This crate provides Serde-serializable types for:
//! - Job identifiers and progress events pushed by the backend
//! - Client-side progress state and error reporting
//! - Validation of untrusted progress payloads

pub mod progress;
pub mod validate;

// Re-export common types
pub use progress::{ClientState, ErrorInfo, ErrorKind, EventStatus, JobId, JobStatus, ProgressEvent};
pub use validate::{is_progress_event, validate_event};
