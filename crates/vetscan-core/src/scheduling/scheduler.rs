//! Appointment booking, editing and removal.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ConflictChecker;
use crate::config::SchedulingConfig;
use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Appointment, AppointmentStatus, UserRole};
use crate::validation::{self, MAX_NAME_LEN, MAX_NOTES_LEN};

/// Request to book a new appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewAppointment {
    pub pet_id: String,
    pub veterinarian_id: String,
    pub start_time: DateTime<Utc>,
    /// Falls back to the configured default when absent
    pub duration_minutes: Option<i64>,
    pub appointment_type: String,
    pub notes: Option<String>,
    pub estimated_cost_cents: Option<i64>,
}

/// Partial edit of an appointment. `None` leaves a field unchanged; a blank
/// `notes` string clears the notes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppointmentUpdate {
    pub pet_id: Option<String>,
    pub veterinarian_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i64>,
    pub appointment_type: Option<String>,
    pub status: Option<AppointmentStatus>,
    pub notes: Option<String>,
    pub estimated_cost_cents: Option<i64>,
    pub actual_cost_cents: Option<i64>,
}

/// Books and edits appointments, running the conflict check before every
/// write.
pub struct AppointmentScheduler<'a> {
    db: &'a Database,
    config: SchedulingConfig,
}

impl<'a> AppointmentScheduler<'a> {
    /// Create a scheduler with default limits.
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            config: SchedulingConfig::default(),
        }
    }

    /// Use explicit scheduling limits.
    pub fn with_config(mut self, config: SchedulingConfig) -> Self {
        self.config = config;
        self
    }

    fn checker(&self) -> ConflictChecker<'a> {
        ConflictChecker::new(self.db).with_max_duration(self.config.max_duration_minutes)
    }

    /// Book a new appointment.
    pub fn create_appointment(&self, request: NewAppointment) -> ServiceResult<Appointment> {
        let appointment_type =
            validation::required_text("appointment_type", &request.appointment_type, MAX_NAME_LEN)?;
        let notes = validation::optional_text("notes", request.notes.as_deref(), MAX_NOTES_LEN)?;
        let estimated_cost_cents =
            validation::cents("estimated_cost_cents", request.estimated_cost_cents)?;
        let duration = request
            .duration_minutes
            .unwrap_or(self.config.default_duration_minutes);
        let checker = self.checker();
        checker.candidate_window(request.start_time, duration)?;

        let mut appt = Appointment::new(
            request.pet_id,
            request.veterinarian_id,
            request.start_time,
            duration,
            appointment_type,
        );
        appt.notes = notes;
        appt.estimated_cost_cents = estimated_cost_cents;

        let tx = self.db.immediate_transaction()?;
        self.ensure_pet_bookable(&appt.pet_id)?;
        self.ensure_veterinarian_bookable(&appt.veterinarian_id)?;
        checker.ensure_available(&appt.veterinarian_id, appt.start_time, appt.duration_minutes, None)?;
        self.db.insert_appointment(&appt)?;
        tx.commit()?;

        tracing::info!(
            appointment_id = %appt.appointment_id,
            veterinarian_id = %appt.veterinarian_id,
            pet_id = %appt.pet_id,
            start = %appt.start_time,
            duration_minutes = appt.duration_minutes,
            "appointment booked"
        );
        Ok(appt)
    }

    /// Apply an edit to an existing appointment.
    ///
    /// The result is re-checked against every other booking of the (possibly
    /// new) veterinarian; the appointment's own previous slot is ignored.
    pub fn update_appointment(
        &self,
        appointment_id: &str,
        update: AppointmentUpdate,
    ) -> ServiceResult<Appointment> {
        let tx = self.db.immediate_transaction()?;
        let mut appt = self
            .db
            .get_appointment(appointment_id)?
            .ok_or_else(|| ServiceError::not_found("appointment", appointment_id))?;

        if let Some(pet_id) = update.pet_id {
            if pet_id != appt.pet_id {
                self.ensure_pet_bookable(&pet_id)?;
                appt.pet_id = pet_id;
            }
        }
        if let Some(vet_id) = update.veterinarian_id {
            if vet_id != appt.veterinarian_id {
                self.ensure_veterinarian_bookable(&vet_id)?;
                appt.veterinarian_id = vet_id;
            }
        }
        if let Some(start) = update.start_time {
            appt.start_time = start;
        }
        if let Some(duration) = update.duration_minutes {
            appt.duration_minutes = duration;
        }
        if let Some(kind) = update.appointment_type {
            appt.appointment_type =
                validation::required_text("appointment_type", &kind, MAX_NAME_LEN)?;
        }
        if let Some(status) = update.status {
            appt.status = status;
        }
        if let Some(notes) = update.notes {
            appt.notes = validation::optional_text("notes", Some(&notes), MAX_NOTES_LEN)?;
        }
        if update.estimated_cost_cents.is_some() {
            appt.estimated_cost_cents =
                validation::cents("estimated_cost_cents", update.estimated_cost_cents)?;
        }
        if update.actual_cost_cents.is_some() {
            appt.actual_cost_cents =
                validation::cents("actual_cost_cents", update.actual_cost_cents)?;
        }

        let checker = self.checker();
        if appt.status.occupies_slot() {
            checker.ensure_available(
                &appt.veterinarian_id,
                appt.start_time,
                appt.duration_minutes,
                Some(&appt.appointment_id),
            )?;
        } else {
            checker.candidate_window(appt.start_time, appt.duration_minutes)?;
        }

        appt.touch();
        self.db.update_appointment(&appt)?;
        tx.commit()?;

        tracing::info!(
            appointment_id = %appt.appointment_id,
            veterinarian_id = %appt.veterinarian_id,
            status = %appt.status,
            "appointment updated"
        );
        Ok(appt)
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, appointment_id: &str) -> ServiceResult<Appointment> {
        self.db
            .get_appointment(appointment_id)?
            .ok_or_else(|| ServiceError::not_found("appointment", appointment_id))
    }

    /// Remove an appointment permanently.
    pub fn delete_appointment(&self, appointment_id: &str) -> ServiceResult<()> {
        if !self.db.delete_appointment(appointment_id)? {
            return Err(ServiceError::not_found("appointment", appointment_id));
        }
        tracing::info!(appointment_id, "appointment deleted");
        Ok(())
    }

    /// Appointments of a veterinarian starting in `[from, to)`.
    pub fn list_for_veterinarian(
        &self,
        veterinarian_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ServiceResult<Vec<Appointment>> {
        if to <= from {
            return Err(ServiceError::Validation("range end must be after start".into()));
        }
        Ok(self
            .db
            .list_appointments_between(from, to, Some(veterinarian_id))?)
    }

    /// Appointments of a veterinarian on one calendar day (UTC).
    pub fn list_for_veterinarian_on(
        &self,
        veterinarian_id: &str,
        day: NaiveDate,
    ) -> ServiceResult<Vec<Appointment>> {
        let from = day.and_time(chrono::NaiveTime::MIN).and_utc();
        let to = from + chrono::Duration::days(1);
        self.list_for_veterinarian(veterinarian_id, from, to)
    }

    /// Every appointment of a pet, most recent first.
    pub fn list_for_pet(&self, pet_id: &str) -> ServiceResult<Vec<Appointment>> {
        Ok(self.db.list_appointments_for_pet(pet_id)?)
    }

    fn ensure_pet_bookable(&self, pet_id: &str) -> ServiceResult<()> {
        let pet = self
            .db
            .get_pet(pet_id)?
            .ok_or_else(|| ServiceError::not_found("pet", pet_id))?;
        if !pet.status.is_active() {
            return Err(ServiceError::Validation(format!(
                "pet {} is retired and cannot be booked",
                pet_id
            )));
        }
        Ok(())
    }

    fn ensure_veterinarian_bookable(&self, veterinarian_id: &str) -> ServiceResult<()> {
        let vet = self
            .db
            .get_veterinarian(veterinarian_id)?
            .ok_or_else(|| ServiceError::not_found("veterinarian", veterinarian_id))?;
        if vet.user.role != UserRole::Veterinarian || !vet.user.status.is_active() {
            return Err(ServiceError::Validation(format!(
                "veterinarian {} is not available for booking",
                veterinarian_id
            )));
        }
        Ok(())
    }
}
