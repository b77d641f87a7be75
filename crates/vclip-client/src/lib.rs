//! Command-line job progress client.
//!
//! This crate provides:
//! - Client configuration from the environment
//! - Video selection into a shared resource store
//! - Tracking a job to completion with state-change logging

pub mod app;
pub mod config;
pub mod error;

pub use app::{run_until_settled, select_video, TrackOutcome};
pub use config::{ClientConfig, TrackArgs};
pub use error::{ClientError, ClientResult};
