//! Scheduling conflict detection.

use chrono::{DateTime, Utc};

use super::TimeWindow;
use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::Appointment;

/// First existing appointment whose window overlaps `candidate`.
///
/// Cancelled and no-show appointments never conflict. The appointment being
/// edited must already be removed from `existing`.
pub fn find_conflict<'a>(
    candidate: &TimeWindow,
    existing: &'a [Appointment],
) -> Option<&'a Appointment> {
    existing
        .iter()
        .filter(|appt| appt.status.occupies_slot())
        .find(|appt| TimeWindow::from(*appt).overlaps(candidate))
}

/// Validates a requested window and checks it against a veterinarian's
/// bookings.
pub struct ConflictChecker<'a> {
    db: &'a Database,
    max_duration_minutes: i64,
}

impl<'a> ConflictChecker<'a> {
    /// Create a checker with the default duration limit.
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            max_duration_minutes: crate::config::SchedulingConfig::default().max_duration_minutes,
        }
    }

    /// Set the longest bookable duration.
    pub fn with_max_duration(mut self, minutes: i64) -> Self {
        self.max_duration_minutes = minutes;
        self
    }

    /// Validate `duration_minutes` and build the candidate window.
    ///
    /// Runs before any database access so a bad duration never reaches the
    /// overlap check.
    pub fn candidate_window(
        &self,
        start: DateTime<Utc>,
        duration_minutes: i64,
    ) -> ServiceResult<TimeWindow> {
        if duration_minutes < 1 {
            return Err(ServiceError::Validation(
                "duration_minutes must be at least 1".into(),
            ));
        }
        if duration_minutes > self.max_duration_minutes {
            return Err(ServiceError::Validation(format!(
                "duration_minutes must be at most {}",
                self.max_duration_minutes
            )));
        }
        TimeWindow::from_duration(start, duration_minutes)
            .ok_or_else(|| ServiceError::Validation("start_time is out of range".into()))
    }

    /// Reject the window if it overlaps any other booking of the veterinarian.
    ///
    /// `exclude_appointment_id` is the appointment being edited, so an edit
    /// never conflicts with its own previous slot.
    pub fn ensure_available(
        &self,
        veterinarian_id: &str,
        start: DateTime<Utc>,
        duration_minutes: i64,
        exclude_appointment_id: Option<&str>,
    ) -> ServiceResult<TimeWindow> {
        let candidate = self.candidate_window(start, duration_minutes)?;
        let existing = self
            .db
            .list_occupying_appointments(veterinarian_id, exclude_appointment_id)?;

        tracing::debug!(
            veterinarian_id,
            start = %candidate.start,
            end = %candidate.end,
            compared = existing.len(),
            "checking appointment window"
        );

        match find_conflict(&candidate, &existing) {
            Some(conflict) => {
                tracing::warn!(
                    veterinarian_id,
                    conflicting_appointment = %conflict.appointment_id,
                    start = %candidate.start,
                    end = %candidate.end,
                    "scheduling conflict"
                );
                Err(ServiceError::SchedulingConflict {
                    veterinarian_id: veterinarian_id.to_string(),
                    appointment_id: conflict.appointment_id.clone(),
                    start: conflict.start_time,
                    end: conflict.end_time(),
                })
            }
            None => Ok(candidate),
        }
    }
}
