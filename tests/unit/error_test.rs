//! Tests for error types

use prometheus_notify::core::NotifyError;

#[test]
fn test_queue_full_error() {
    let err = NotifyError::QueueFull("max queue depth reached".to_string());
    assert_eq!(format!("{}", err), "queue full: max queue depth reached");
}

#[test]
fn test_not_found_error() {
    assert_eq!(NotifyError::event_not_found(7).to_string(), "event 7 not found");
    assert_eq!(NotifyError::user_not_found(3).to_string(), "user 3 not found");
}

#[test]
fn test_duplicate_pending_error() {
    let err = NotifyError::DuplicatePending {
        user_id: 1,
        event_id: 2,
    };
    assert_eq!(
        format!("{}", err),
        "pending delivery already exists for user 1 and event 2"
    );
}

#[test]
fn test_backend_error() {
    let err = NotifyError::Backend("connection failed".to_string());
    assert_eq!(format!("{}", err), "backend error: connection failed");
}
