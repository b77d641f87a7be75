//! Progress client configuration.

use std::time::Duration;

use reqwest::Url;
use vclip_models::JobId;

use crate::error::{ProgressError, ProgressResult};

/// Placeholder substituted with the job id in `progress_path`.
pub const JOB_ID_PLACEHOLDER: &str = "{job_id}";

/// Configuration for the progress event client.
#[derive(Debug, Clone)]
pub struct ProgressClientConfig {
    /// Base URL of the backend API
    pub base_url: String,
    /// Path of the per-job event stream, containing `{job_id}`
    pub progress_path: String,
    /// Connect timeout (the stream itself has no overall timeout)
    pub connect_timeout: Duration,
}

impl Default for ProgressClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            progress_path: "/api/jobs/{job_id}/progress".to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl ProgressClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("VCLIP_API_URL").unwrap_or(defaults.base_url),
            progress_path: std::env::var("VCLIP_PROGRESS_PATH").unwrap_or(defaults.progress_path),
            connect_timeout: std::env::var("VCLIP_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
        }
    }

    /// Check that the endpoint can be built for any job id.
    pub fn validate(&self) -> ProgressResult<()> {
        Url::parse(&self.base_url)
            .map_err(|e| ProgressError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        if !self.progress_path.contains(JOB_ID_PLACEHOLDER) {
            return Err(ProgressError::invalid_config(format!(
                "progress path {:?} does not contain {}",
                self.progress_path, JOB_ID_PLACEHOLDER
            )));
        }

        Ok(())
    }

    /// Event stream URL for a job.
    pub fn endpoint(&self, job_id: JobId) -> String {
        let path = self
            .progress_path
            .replace(JOB_ID_PLACEHOLDER, &job_id.to_string());
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ProgressClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint() {
        let config = ProgressClientConfig {
            base_url: "https://api.example.com/".to_string(),
            progress_path: "/progress/{job_id}".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint(JobId::new(17)),
            "https://api.example.com/progress/17"
        );
    }

    #[test]
    fn test_validate_rejects_bad_config() {
        let missing_placeholder = ProgressClientConfig {
            progress_path: "/progress".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            missing_placeholder.validate(),
            Err(ProgressError::InvalidConfig(_))
        ));

        let bad_url = ProgressClientConfig {
            base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(matches!(bad_url.validate(), Err(ProgressError::InvalidUrl(_))));
    }
}
