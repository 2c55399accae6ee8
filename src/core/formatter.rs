//! Human-readable schedule compaction.
//!
//! Consecutive weekdays (Monday through Sunday, no wraparound) sharing an identical
//! time-signature collapse into one `first-last` run. Days without intervals break a
//! run and are otherwise skipped.

use crate::core::schedule::clock_label;
use crate::core::{codec, NotifyError, Schedule, TimeInterval, Weekday};

/// Render one day's intervals, e.g. `" с 16:00 до 20:00 и с 21:00 до 22:00"`.
#[must_use]
pub fn time_signature(intervals: &[TimeInterval]) -> String {
    intervals
        .iter()
        .map(|interval| {
            format!(
                " с {} до {}",
                clock_label(interval.start()),
                clock_label(interval.end())
            )
        })
        .collect::<Vec<_>>()
        .join(" и")
}

struct Run {
    first: Weekday,
    last: Weekday,
    signature: String,
}

impl Run {
    fn render(&self) -> String {
        if self.first == self.last {
            format!("{}{}", self.first.display_name(), self.signature)
        } else {
            format!(
                "{}-{}{}",
                self.first.display_name(),
                self.last.display_name(),
                self.signature
            )
        }
    }
}

/// Compact a schedule into a single line. An empty schedule yields `""`.
#[must_use]
pub fn format_schedule(schedule: &Schedule) -> String {
    let mut runs: Vec<Run> = Vec::new();
    let mut open = false;

    for day in Weekday::ALL {
        let intervals = schedule.day(day);
        if intervals.is_empty() {
            open = false;
            continue;
        }
        let signature = time_signature(intervals);
        match runs.last_mut() {
            Some(run) if open && run.signature == signature => run.last = day,
            _ => runs.push(Run {
                first: day,
                last: day,
                signature,
            }),
        }
        open = true;
    }

    runs.iter().map(Run::render).collect::<Vec<_>>().join(", ")
}

/// Format a stored schedule column for display. Missing or blank text yields `None`.
///
/// # Errors
///
/// [`NotifyError::ScheduleFormat`] when the stored text is corrupt.
pub fn export_schedule(stored: Option<&str>) -> Result<Option<String>, NotifyError> {
    match stored {
        Some(text) if !text.trim().is_empty() => Ok(Some(format_schedule(&codec::decode(text)?))),
        _ => Ok(None),
    }
}
