//! Client error types.

use thiserror::Error;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Usage: {0}")]
    Usage(String),

    #[error("Invalid job id: {0}")]
    InvalidJobId(String),

    #[error("Progress client error: {0}")]
    Progress(#[from] vclip_progress::ProgressError),

    #[error("Media error: {0}")]
    Media(#[from] vclip_media::MediaError),

    #[error("Metrics exporter error: {0}")]
    Metrics(String),
}

impl ClientError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }
}
