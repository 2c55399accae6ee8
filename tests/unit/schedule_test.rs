//! Tests for the schedule codec, evaluator, and formatter through the public API

use chrono::{NaiveDate, NaiveDateTime};
use prometheus_notify::core::codec::{decode, decode_stored, encode, normalize, normalize_str};
use prometheus_notify::core::{format_schedule, is_active, NotifyError, Weekday};
use serde_json::json;

fn monday(h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 2)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

#[test]
fn test_normalize_then_evaluate() {
    let text = normalize(&json!({"Monday": ["09:00-18:00"]})).unwrap();
    let schedule = decode(&text).unwrap();

    assert!(is_active(&schedule, monday(9, 0)));
    assert!(is_active(&schedule, monday(12, 0)));
    assert!(is_active(&schedule, monday(18, 0)));
    assert!(!is_active(&schedule, monday(18, 1)));
    assert!(!is_active(&schedule, monday(8, 59)));
}

#[test]
fn test_normalize_round_trips() {
    let raw = json!({
        "sunday": ["21:00-22:00", "16:00-20:00"],
        "wednesday": ["08:00-13:00"],
        "Friday": []
    });
    let canonical = normalize(&raw).unwrap();
    assert_eq!(
        canonical,
        r#"{"WEDNESDAY":["08:00-13:00"],"FRIDAY":[],"SUNDAY":["21:00-22:00","16:00-20:00"]}"#
    );

    let again = normalize_str(&encode(&decode(&canonical).unwrap()).unwrap()).unwrap();
    assert_eq!(again, canonical);
}

#[test]
fn test_unknown_weekday_is_validation_error() {
    let err = normalize(&json!({"someday": ["09:00-10:00"]})).unwrap_err();
    assert!(matches!(err, NotifyError::Validation(_)));
}

#[test]
fn test_corrupt_stored_text_is_format_error() {
    assert!(matches!(decode("{\"MONDAY\":"), Err(NotifyError::ScheduleFormat(_))));
    assert!(matches!(
        decode(r#"{"MONDAY":["9-18"]}"#),
        Err(NotifyError::ScheduleFormat(_))
    ));
    assert!(decode_stored(None).unwrap().is_empty());
}

#[test]
fn test_formatter_literal() {
    let schedule = decode(
        r#"{"WEDNESDAY":["08:00-13:00"],"THURSDAY":["08:00-13:00"],"FRIDAY":["08:00-13:00"],"SATURDAY":["09:30-10:30"],"SUNDAY":["16:00-20:00","21:00-22:00"]}"#,
    )
    .unwrap();
    assert_eq!(
        format_schedule(&schedule),
        "среда-пятница с 08:00 до 13:00, суббота с 09:30 до 10:30, воскресенье с 16:00 до 20:00 и с 21:00 до 22:00"
    );
}

#[test]
fn test_weekday_calendar_order() {
    let names: Vec<&str> = Weekday::ALL.iter().map(|d| d.name()).collect();
    assert_eq!(
        names,
        ["MONDAY", "TUESDAY", "WEDNESDAY", "THURSDAY", "FRIDAY", "SATURDAY", "SUNDAY"]
    );
}
