//! Schedule codec: normalize raw input, decode stored text, encode canonical text.
//!
//! Stored form is a JSON object keyed by canonical weekday name, emitted in calendar
//! order, with each value an array of `"HH:MM-HH:MM"` strings:
//!
//! ```text
//! {"MONDAY":["09:00-18:00"],"SATURDAY":["10:00-12:00","14:00-16:00"]}
//! ```
//!
//! All functions are pure; there is no shared parser instance.

use serde::Serialize;
use serde_json::Value;

use crate::core::schedule::{CalendarMap, DaySlots};
use crate::core::{NotifyError, Schedule, TimeInterval, Weekday};

/// Normalize a raw structured schedule into canonical text.
///
/// Keys are matched case-insensitively against the seven weekday names and rewritten
/// in canonical uppercase; interval strings must already read `HH:MM-HH:MM` and are
/// carried over untouched and in their original order. A `null` day value drops the
/// day, a `null` schedule becomes `{}`.
///
/// # Errors
///
/// [`NotifyError::Validation`] when the input is not an object, a key is not a
/// weekday, two keys name the same weekday, a value is not an array of strings, or
/// an interval would not decode.
pub fn normalize(raw: &Value) -> Result<String, NotifyError> {
    let object = match raw {
        Value::Null => return to_text(&CalendarMap::<String>(&DaySlots::default())),
        Value::Object(object) => object,
        other => {
            return Err(NotifyError::Validation(format!(
                "schedule must be an object, got {}",
                kind_of(other)
            )))
        }
    };

    let mut days: DaySlots<String> = DaySlots::default();
    let mut seen = [false; 7];
    for (key, value) in object {
        let day = Weekday::parse_name(key)
            .ok_or_else(|| NotifyError::Validation(format!("unrecognized weekday `{key}`")))?;
        if std::mem::replace(&mut seen[day.index()], true) {
            return Err(NotifyError::Validation(format!(
                "weekday {day} given more than once"
            )));
        }
        days[day.index()] = match value {
            Value::Null => None,
            Value::Array(items) => Some(
                items
                    .iter()
                    .map(|item| {
                        let text = item.as_str().ok_or_else(|| {
                            NotifyError::Validation(format!(
                                "interval for {day} must be a string, got {}",
                                kind_of(item)
                            ))
                        })?;
                        text.parse::<TimeInterval>().map_err(|_| {
                            NotifyError::Validation(format!(
                                "interval `{text}` for {day} is not HH:MM-HH:MM"
                            ))
                        })?;
                        Ok(text.to_owned())
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            other => {
                return Err(NotifyError::Validation(format!(
                    "intervals for {day} must be an array, got {}",
                    kind_of(other)
                )))
            }
        };
    }
    to_text(&CalendarMap(&days))
}

/// Parse JSON text, then [`normalize`].
///
/// # Errors
///
/// [`NotifyError::Validation`] when the text is not JSON or fails normalization.
pub fn normalize_str(raw: &str) -> Result<String, NotifyError> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| NotifyError::Validation(format!("schedule is not valid JSON: {e}")))?;
    normalize(&value)
}

/// Decode canonical stored text into a [`Schedule`].
///
/// # Errors
///
/// [`NotifyError::ScheduleFormat`] when the text is not JSON, not an object, uses a
/// non-canonical key, or holds an interval that is not exactly `HH:MM-HH:MM`.
pub fn decode(text: &str) -> Result<Schedule, NotifyError> {
    let value: Value = serde_json::from_str(text)
        .map_err(|e| NotifyError::ScheduleFormat(format!("not valid JSON: {e}")))?;
    let object = match value {
        Value::Null => return Ok(Schedule::new()),
        Value::Object(object) => object,
        other => {
            return Err(NotifyError::ScheduleFormat(format!(
                "expected object, got {}",
                kind_of(&other)
            )))
        }
    };

    let mut schedule = Schedule::new();
    for (key, value) in object {
        let day = Weekday::from_canonical(&key)
            .ok_or_else(|| NotifyError::ScheduleFormat(format!("unknown day key `{key}`")))?;
        let intervals = match value {
            Value::Null => None,
            Value::Array(items) => Some(
                items
                    .iter()
                    .map(|item| {
                        item.as_str()
                            .ok_or_else(|| {
                                NotifyError::ScheduleFormat(format!(
                                    "interval for {day} is {}, not a string",
                                    kind_of(item)
                                ))
                            })
                            .and_then(str::parse::<TimeInterval>)
                    })
                    .collect::<Result<Vec<_>, _>>()?,
            ),
            other => {
                return Err(NotifyError::ScheduleFormat(format!(
                    "intervals for {day} are {}, not an array",
                    kind_of(&other)
                )))
            }
        };
        schedule.set_day(day, intervals);
    }
    Ok(schedule)
}

/// Decode the schedule column of a user record. Missing or blank text is the empty schedule.
///
/// # Errors
///
/// Propagates [`decode`] failures.
pub fn decode_stored(text: Option<&str>) -> Result<Schedule, NotifyError> {
    match text {
        Some(text) if !text.trim().is_empty() => decode(text),
        _ => Ok(Schedule::new()),
    }
}

/// Encode a schedule into canonical stored text.
///
/// # Errors
///
/// [`NotifyError::Backend`] if serialization fails.
pub fn encode(schedule: &Schedule) -> Result<String, NotifyError> {
    to_text(schedule)
}

fn to_text<T: Serialize + ?Sized>(value: &T) -> Result<String, NotifyError> {
    serde_json::to_string(value).map_err(|e| NotifyError::Backend(format!("encode schedule: {e}")))
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
