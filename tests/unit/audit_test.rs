//! Tests for audit sink

use chrono::NaiveDate;
use prometheus_notify::core::{build_audit_event, AuditAction, AuditSink, InMemoryAuditSink, JsonLinesAuditSink};

fn at() -> chrono::NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 2)
        .unwrap()
        .and_hms_opt(10, 30, 0)
        .unwrap()
}

#[test]
fn test_in_memory_audit_sink() {
    let mut sink = InMemoryAuditSink::new(10);

    let event = build_audit_event(1, "Иван", 5, AuditAction::Delivered, at(), Some("hello".to_string()));
    sink.record(event);

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].user_id, 1);
    assert_eq!(events[0].event_id, 5);
    assert_eq!(events[0].action, AuditAction::Delivered);
}

#[test]
fn test_audit_sink_overflow() {
    let mut sink = InMemoryAuditSink::new(2);

    sink.record(build_audit_event(1, "a", 1, AuditAction::Queued, at(), None));
    sink.record(build_audit_event(1, "a", 2, AuditAction::Queued, at(), None));
    sink.record(build_audit_event(1, "a", 3, AuditAction::Queued, at(), None));

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_id, 2); // First one popped
    assert_eq!(events[1].event_id, 3);
}

#[test]
fn test_audit_ids_are_unique() {
    let a = build_audit_event(1, "a", 1, AuditAction::Failed, at(), Some("boom".into()));
    let b = build_audit_event(1, "a", 1, AuditAction::Failed, at(), Some("boom".into()));
    assert_ne!(a.audit_id, b.audit_id);
}

#[test]
fn test_json_lines_audit_sink() {
    let dir = std::env::temp_dir().join(format!("notify-audit-{}", uuid::Uuid::new_v4()));
    let mut sink = JsonLinesAuditSink::new(&dir, "deliveries").unwrap();
    sink.record(build_audit_event(4, "Ольга", 9, AuditAction::Delivered, at(), None));
    sink.record(build_audit_event(4, "Ольга", 10, AuditAction::Queued, at(), None));

    let contents = std::fs::read_to_string(sink.path()).unwrap();
    let lines: Vec<serde_json::Value> = contents
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["action"], "delivered");
    assert_eq!(lines[1]["event_id"], 10);
    let _ = std::fs::remove_dir_all(&dir);
}
