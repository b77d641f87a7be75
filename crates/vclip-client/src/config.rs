//! Client configuration.

use std::path::PathBuf;

use vclip_models::JobId;
use vclip_progress::ProgressClientConfig;

use crate::error::{ClientError, ClientResult};

pub const USAGE: &str = "vclip-track <job-id> [video-path]";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Progress endpoint settings
    pub progress: ProgressClientConfig,
    /// Origin used in local `blob:` URLs
    pub blob_origin: String,
    /// Port for the Prometheus exporter (disabled when unset)
    pub metrics_port: Option<u16>,
    /// Emit JSON logs instead of human-readable ones
    pub json_logs: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            progress: ProgressClientConfig::default(),
            blob_origin: "vclip".to_string(),
            metrics_port: None,
            json_logs: false,
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            progress: ProgressClientConfig::from_env(),
            blob_origin: std::env::var("VCLIP_BLOB_ORIGIN").unwrap_or_else(|_| "vclip".to_string()),
            metrics_port: std::env::var("METRICS_PORT")
                .ok()
                .and_then(|s| s.parse().ok()),
            json_logs: std::env::var("LOG_FORMAT")
                .map(|v| v.to_lowercase() == "json")
                .unwrap_or(false),
        }
    }
}

/// Command-line arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackArgs {
    /// Job to follow
    pub job_id: JobId,
    /// Local video to select before tracking
    pub video: Option<PathBuf>,
}

impl TrackArgs {
    /// Parse arguments, excluding the program name.
    pub fn parse<I>(args: I) -> ClientResult<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();

        let raw_id = args.next().ok_or_else(|| ClientError::usage(USAGE))?;
        let job_id = raw_id
            .parse()
            .map_err(|_| ClientError::InvalidJobId(raw_id.clone()))?;
        let video = args.next().map(PathBuf::from);

        if args.next().is_some() {
            return Err(ClientError::usage(USAGE));
        }

        Ok(Self { job_id, video })
    }
}
