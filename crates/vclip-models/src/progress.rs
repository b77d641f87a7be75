//! Job progress models.
//!
//! `ProgressEvent` is the payload pushed by the backend for a job;
//! `ClientState` is what the client exposes to its consumers.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Backend processing job identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for JobId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for JobId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Status carried by a progress event on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Processing,
    Completed,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Processing => "processing",
            EventStatus::Completed => "completed",
        }
    }

    /// Parse the exact wire spelling. Anything else is rejected.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "processing" => Some(EventStatus::Processing),
            "completed" => Some(EventStatus::Completed),
            _ => None,
        }
    }
}

/// Progress event pushed by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProgressEvent {
    /// Progress value as reported by the backend (usually 0-100)
    pub progress: f64,
    /// Processing status
    pub status: EventStatus,
}

impl ProgressEvent {
    pub fn processing(progress: f64) -> Self {
        Self {
            progress,
            status: EventStatus::Processing,
        }
    }

    pub fn completed(progress: f64) -> Self {
        Self {
            progress,
            status: EventStatus::Completed,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == EventStatus::Completed
    }
}

/// Job status as seen by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// No job tracked, or the connection was lost
    #[default]
    Idle,
    /// Job is being processed
    Processing,
    /// Job finished (terminal)
    Completed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Idle => "idle",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }
}

impl From<EventStatus> for JobStatus {
    fn from(status: EventStatus) -> Self {
        match status {
            EventStatus::Processing => JobStatus::Processing,
            EventStatus::Completed => JobStatus::Completed,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of error surfaced to consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Transport-level failure; terminal for the session
    ConnectionFailed,
    /// Payload was not valid JSON
    ParseError,
    /// Payload was JSON but not a progress event
    InvalidData,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ConnectionFailed => "connection_failed",
            ErrorKind::ParseError => "parse_error",
            ErrorKind::InvalidData => "invalid_data",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ErrorKind::ConnectionFailed)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error reported alongside the client state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConnectionFailed, message)
    }

    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseError, message)
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidData, message)
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Progress state exposed to consumers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ClientState {
    pub progress: f64,
    pub status: JobStatus,
    pub error: Option<ErrorInfo>,
}

impl ClientState {
    /// Initial state: `{progress: 0, status: idle, error: null}`.
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Completed, or abandoned after a transport failure.
    pub fn is_settled(&self) -> bool {
        self.status.is_terminal() || self.error_kind().is_some_and(|k| k.is_terminal())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_state_serialization() {
        let state = ClientState {
            progress: 42.0,
            status: JobStatus::Processing,
            error: None,
        };
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"progress": 42.0, "status": "processing", "error": null})
        );
    }

    #[test]
    fn test_error_info_serialization() {
        let state = ClientState {
            error: Some(ErrorInfo::connection_failed("boom")),
            ..ClientState::idle()
        };
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"kind\":\"connection_failed\""));
        assert!(json.contains("\"status\":\"idle\""));
    }

    #[test]
    fn test_job_id_parse() {
        let id: JobId = " 1234 ".parse().unwrap();
        assert_eq!(id, JobId::new(1234));
        assert_eq!(id.to_string(), "1234");
        assert!("abc".parse::<JobId>().is_err());
    }

    #[test]
    fn test_settled() {
        assert!(!ClientState::idle().is_settled());

        let completed = ClientState {
            progress: 100.0,
            status: JobStatus::Completed,
            error: None,
        };
        assert!(completed.is_settled());

        let noisy = ClientState {
            error: Some(ErrorInfo::parse_error("bad")),
            ..ClientState::idle()
        };
        assert!(!noisy.is_settled());

        let dropped = ClientState {
            error: Some(ErrorInfo::connection_failed("gone")),
            ..ClientState::idle()
        };
        assert!(dropped.is_settled());
    }
}
