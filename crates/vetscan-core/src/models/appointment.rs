//! Appointment models.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{new_id, now_stamp};

/// Appointment status. A fixed set; there is no enforced transition graph.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
        }
    }

    /// Whether an appointment in this status keeps the veterinarian busy.
    pub fn occupies_slot(&self) -> bool {
        !matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::NoShow)
    }

    /// Statuses that still expect the pet and veterinarian to show up.
    pub fn is_pending(&self) -> bool {
        matches!(self, AppointmentStatus::Scheduled | AppointmentStatus::Confirmed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "confirmed" => Ok(AppointmentStatus::Confirmed),
            "in_progress" => Ok(AppointmentStatus::InProgress),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            "no_show" => Ok(AppointmentStatus::NoShow),
            other => Err(format!("Unknown appointment status: {}", other)),
        }
    }
}

/// A booked visit of one pet with one veterinarian.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub appointment_id: String,
    pub pet_id: String,
    pub veterinarian_id: String,
    pub start_time: DateTime<Utc>,
    /// Length in minutes, always >= 1 once persisted
    pub duration_minutes: i64,
    /// Free-form visit type (e.g., "checkup", "surgery")
    pub appointment_type: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub estimated_cost_cents: Option<i64>,
    pub actual_cost_cents: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl Appointment {
    /// Create a new scheduled appointment.
    pub fn new(
        pet_id: String,
        veterinarian_id: String,
        start_time: DateTime<Utc>,
        duration_minutes: i64,
        appointment_type: String,
    ) -> Self {
        let now = now_stamp();
        Self {
            appointment_id: new_id(),
            pet_id,
            veterinarian_id,
            start_time,
            duration_minutes,
            appointment_type,
            status: AppointmentStatus::Scheduled,
            notes: None,
            estimated_cost_cents: None,
            actual_cost_cents: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Exclusive end of the occupied window.
    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + Duration::minutes(self.duration_minutes)
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = now_stamp();
    }
}
