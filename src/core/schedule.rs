//! Canonical in-memory weekly schedule.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::core::{NotifyError, Weekday};

/// Closed time-of-day window `[start, end]`.
///
/// No ordering is enforced between `start` and `end`; an inverted interval simply
/// never contains any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeInterval {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeInterval {
    /// Create an interval from its bounds.
    #[must_use]
    pub const fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Build from hour/minute pairs, `None` if either is out of range.
    #[must_use]
    pub fn from_hm(start: (u32, u32), end: (u32, u32)) -> Option<Self> {
        Some(Self {
            start: NaiveTime::from_hms_opt(start.0, start.1, 0)?,
            end: NaiveTime::from_hms_opt(end.0, end.1, 0)?,
        })
    }

    /// Window start.
    #[must_use]
    pub const fn start(&self) -> NaiveTime {
        self.start
    }

    /// Window end.
    #[must_use]
    pub const fn end(&self) -> NaiveTime {
        self.end
    }

    /// Both ends inclusive.
    #[must_use]
    pub fn contains(&self, time: NaiveTime) -> bool {
        self.start <= time && time <= self.end
    }
}

/// Render as `HH:MM`.
pub(crate) fn clock_label(time: NaiveTime) -> String {
    format!("{:02}:{:02}", time.hour(), time.minute())
}

/// Parse an exact `HH:MM` clock reading.
fn parse_clock(part: &str) -> Option<NaiveTime> {
    let bytes = part.as_bytes();
    if bytes.len() != 5 || bytes[2] != b':' {
        return None;
    }
    let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
    if !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let hour = u32::from(digits[0] - b'0') * 10 + u32::from(digits[1] - b'0');
    let minute = u32::from(digits[2] - b'0') * 10 + u32::from(digits[3] - b'0');
    NaiveTime::from_hms_opt(hour, minute, 0)
}

impl FromStr for TimeInterval {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || NotifyError::ScheduleFormat(format!("interval `{s}` is not HH:MM-HH:MM"));
        let (start, end) = s.split_once('-').ok_or_else(malformed)?;
        let start = parse_clock(start).ok_or_else(malformed)?;
        let end = parse_clock(end).ok_or_else(malformed)?;
        Ok(Self { start, end })
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", clock_label(self.start), clock_label(self.end))
    }
}

impl Serialize for TimeInterval {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Per-day slots in calendar order; `None` means the day has no entry at all.
pub(crate) type DaySlots<T> = [Option<Vec<T>>; 7];

/// Serializes day slots as a map keyed by canonical weekday name, in calendar order.
pub(crate) struct CalendarMap<'a, T>(pub(crate) &'a DaySlots<T>);

impl<T: Serialize> Serialize for CalendarMap<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present = self.0.iter().filter(|slot| slot.is_some()).count();
        let mut map = serializer.serialize_map(Some(present))?;
        for day in Weekday::ALL {
            if let Some(values) = &self.0[day.index()] {
                map.serialize_entry(day.name(), values)?;
            }
        }
        map.end()
    }
}

/// Weekly availability keyed by [`Weekday`].
///
/// A day can be absent, explicitly empty, or hold intervals in the order they were
/// given. Absent and empty days are both inactive; the distinction is only kept so
/// the codec reproduces the stored form exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    days: DaySlots<TimeInterval>,
}

impl Schedule {
    /// Empty schedule, never active.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style day assignment.
    #[must_use]
    pub fn with_day(mut self, day: Weekday, intervals: Vec<TimeInterval>) -> Self {
        self.set_day(day, Some(intervals));
        self
    }

    /// Replace a day's entry. `None` removes it.
    pub fn set_day(&mut self, day: Weekday, intervals: Option<Vec<TimeInterval>>) {
        self.days[day.index()] = intervals;
    }

    /// Intervals for a day, empty if the day has no entry.
    #[must_use]
    pub fn day(&self, day: Weekday) -> &[TimeInterval] {
        self.days[day.index()].as_deref().unwrap_or_default()
    }

    /// Raw entry for a day, distinguishing absent from empty.
    #[must_use]
    pub fn entry(&self, day: Weekday) -> Option<&[TimeInterval]> {
        self.days[day.index()].as_deref()
    }

    /// True when no day has any interval.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.iter().flatten().all(Vec::is_empty)
    }

    /// Days with at least one interval, in calendar order.
    pub fn active_days(&self) -> impl Iterator<Item = (Weekday, &[TimeInterval])> + '_ {
        Weekday::ALL
            .into_iter()
            .map(|day| (day, self.day(day)))
            .filter(|(_, intervals)| !intervals.is_empty())
    }
}

impl Serialize for Schedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        CalendarMap(&self.days).serialize(serializer)
    }
}
