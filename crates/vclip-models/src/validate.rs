//! Progress event validation.
//!
//! Decoded payloads are untrusted: the backend contract is
//! `{ "progress": <number>, "status": "processing" | "completed" }` and
//! anything else is rejected without touching client state.

use serde_json::Value;

use crate::progress::{EventStatus, ProgressEvent};

/// Narrow a decoded JSON value to a progress event.
///
/// Extra fields are ignored. Arrays, primitives, `null`, missing fields and
/// wrongly typed fields all yield `None`.
pub fn validate_event(value: &Value) -> Option<ProgressEvent> {
    let object = value.as_object()?;
    let progress = object.get("progress")?.as_f64()?;
    let status = EventStatus::from_wire(object.get("status")?.as_str()?)?;

    Some(ProgressEvent { progress, status })
}

/// Whether a decoded JSON value is a well-formed progress event.
pub fn is_progress_event(value: &Value) -> bool {
    validate_event(value).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_processing_and_completed() {
        assert_eq!(
            validate_event(&json!({"progress": 42, "status": "processing"})),
            Some(ProgressEvent::processing(42.0))
        );
        assert_eq!(
            validate_event(&json!({"progress": 100.0, "status": "completed"})),
            Some(ProgressEvent::completed(100.0))
        );
    }

    #[test]
    fn test_extra_fields_are_fine() {
        let value = json!({"progress": 7.5, "status": "processing", "eta": 30, "stage": "render"});
        assert_eq!(validate_event(&value), Some(ProgressEvent::processing(7.5)));
    }

    #[test]
    fn test_rejects_missing_fields() {
        assert!(!is_progress_event(&json!({"status": "processing"})));
        assert!(!is_progress_event(&json!({"progress": 10})));
        assert!(!is_progress_event(&json!({})));
    }

    #[test]
    fn test_rejects_wrong_types() {
        assert!(!is_progress_event(&json!({"progress": "10", "status": "processing"})));
        assert!(!is_progress_event(&json!({"progress": null, "status": "processing"})));
        assert!(!is_progress_event(&json!({"progress": 10, "status": 1})));
        assert!(!is_progress_event(&json!({"progress": [10], "status": "completed"})));
    }

    #[test]
    fn test_rejects_unknown_status() {
        assert!(!is_progress_event(&json!({"progress": 10, "status": "idle"})));
        assert!(!is_progress_event(&json!({"progress": 10, "status": "failed"})));
        assert!(!is_progress_event(&json!({"progress": 10, "status": "Completed"})));
    }

    #[test]
    fn test_rejects_non_objects() {
        assert!(!is_progress_event(&Value::Null));
        assert!(!is_progress_event(&json!(42)));
        assert!(!is_progress_event(&json!("processing")));
        assert!(!is_progress_event(&json!(true)));
        assert!(!is_progress_event(&json!([{"progress": 1, "status": "processing"}])));
    }
}
