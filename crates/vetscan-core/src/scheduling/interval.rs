//! Half-open appointment windows.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Appointment;

/// The window `[start, end)` during which a veterinarian is occupied.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window starting at `start` lasting `minutes`. `None` unless `minutes >= 1`.
    pub fn from_duration(start: DateTime<Utc>, minutes: i64) -> Option<Self> {
        if minutes < 1 {
            return None;
        }
        let end = start.checked_add_signed(Duration::try_minutes(minutes)?)?;
        Some(Self { start, end })
    }

    /// Two half-open windows overlap iff each starts before the other ends.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

impl From<&Appointment> for TimeWindow {
    fn from(appt: &Appointment) -> Self {
        Self {
            start: appt.start_time,
            end: appt.end_time(),
        }
    }
}
