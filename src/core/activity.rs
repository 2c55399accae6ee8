//! Activity evaluation over a weekly schedule.
//!
//! Instants are local wall-clock readings; no timezone conversion happens here.

use chrono::{Datelike, NaiveDateTime};

use crate::core::model::User;
use crate::core::{codec, NotifyError, Schedule, Weekday};

/// Whether `at` falls inside any interval scheduled for its weekday.
#[must_use]
pub fn is_active(schedule: &Schedule, at: NaiveDateTime) -> bool {
    let time = at.time();
    schedule
        .day(Weekday::from(at.weekday()))
        .iter()
        .any(|interval| interval.contains(time))
}

/// Decode a user's stored schedule and evaluate it at `at`.
///
/// # Errors
///
/// [`NotifyError::ScheduleFormat`] when the stored text is corrupt.
pub fn is_user_active(user: &User, at: NaiveDateTime) -> Result<bool, NotifyError> {
    let schedule = codec::decode_stored(user.notification_schedule.as_deref())?;
    Ok(is_active(&schedule, at))
}
