//! Metrics for progress sessions.

use metrics::{counter, gauge};

/// Metric names as constants for consistency.
pub mod names {
    pub const SESSIONS_TOTAL: &str = "vclip_progress_sessions_total";
    pub const SESSIONS_ACTIVE: &str = "vclip_progress_sessions_active";
    pub const MESSAGES_TOTAL: &str = "vclip_progress_messages_total";
}

/// Record a session being opened.
pub fn record_session_opened() {
    counter!(names::SESSIONS_TOTAL).increment(1);
}

/// Record one transport event and what it did.
pub fn record_message(outcome: &'static str) {
    counter!(names::MESSAGES_TOTAL, "outcome" => outcome).increment(1);
}

/// Counts a reader task as active for as long as it is alive.
pub(crate) struct ActiveSessionGuard;

impl ActiveSessionGuard {
    pub(crate) fn new() -> Self {
        gauge!(names::SESSIONS_ACTIVE).increment(1.0);
        Self
    }
}

impl Drop for ActiveSessionGuard {
    fn drop(&mut self) {
        gauge!(names::SESSIONS_ACTIVE).decrement(1.0);
    }
}
