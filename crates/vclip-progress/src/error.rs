//! Progress client error types.
//!
//! These cover setting the client up. Failures while a session is running
//! are reported as `ErrorInfo` on the client state instead.

use thiserror::Error;

pub type ProgressResult<T> = Result<T, ProgressError>;

#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl ProgressError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
