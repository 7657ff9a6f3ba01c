//! Appointment schedule report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::escape_csv;
use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Appointment, AppointmentStatus};

/// One appointment joined with the names needed to print a day sheet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduleRow {
    pub appointment_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub pet_name: String,
    pub species: String,
    pub owner_name: String,
    pub veterinarian_name: String,
    pub appointment_type: String,
    pub status: AppointmentStatus,
}

/// Appointments starting in `[from, to)`, ordered by start time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleReport {
    pub generated_at: String,
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    /// Set when the report covers a single veterinarian
    pub veterinarian_id: Option<String>,
    pub rows: Vec<ScheduleRow>,
}

impl ScheduleReport {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        csv.push_str("appointment_id,start,end,pet,species,owner,veterinarian,type,status\n");

        for row in &self.rows {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{}\n",
                escape_csv(&row.appointment_id),
                row.start_time.to_rfc3339(),
                row.end_time.to_rfc3339(),
                escape_csv(&row.pet_name),
                escape_csv(&row.species),
                escape_csv(&row.owner_name),
                escape_csv(&row.veterinarian_name),
                escape_csv(&row.appointment_type),
                row.status,
            ));
        }

        csv
    }
}

/// Builds [`ScheduleReport`]s.
pub struct ScheduleExporter<'a> {
    db: &'a Database,
}

impl<'a> ScheduleExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Report for one veterinarian, or for everyone when `veterinarian_id`
    /// is `None`.
    pub fn export(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        veterinarian_id: Option<&str>,
    ) -> ServiceResult<ScheduleReport> {
        if to <= from {
            return Err(ServiceError::Validation("range end must be after start".into()));
        }
        let appointments = self.db.list_appointments_between(from, to, veterinarian_id)?;

        let mut names = NameCache::default();
        let mut rows = Vec::with_capacity(appointments.len());
        for appt in &appointments {
            rows.push(self.row(appt, &mut names)?);
        }

        tracing::debug!(rows = rows.len(), %from, %to, "schedule report built");
        Ok(ScheduleReport {
            generated_at: Utc::now().to_rfc3339(),
            from,
            to,
            veterinarian_id: veterinarian_id.map(str::to_string),
            rows,
        })
    }

    fn row(&self, appt: &Appointment, names: &mut NameCache) -> ServiceResult<ScheduleRow> {
        let (pet_name, species, owner_name) = match names.pets.get(&appt.pet_id) {
            Some(entry) => entry.clone(),
            None => {
                let pet = self
                    .db
                    .get_pet(&appt.pet_id)?
                    .ok_or_else(|| ServiceError::not_found("pet", &appt.pet_id))?;
                let owner_name = self
                    .db
                    .get_owner(&pet.owner_id)?
                    .map(|o| o.full_name())
                    .unwrap_or_default();
                let entry = (pet.name, pet.species, owner_name);
                names.pets.insert(appt.pet_id.clone(), entry.clone());
                entry
            }
        };

        let veterinarian_name = match names.vets.get(&appt.veterinarian_id) {
            Some(name) => name.clone(),
            None => {
                let name = self
                    .db
                    .get_veterinarian(&appt.veterinarian_id)?
                    .map(|v| v.display_name())
                    .unwrap_or_else(|| appt.veterinarian_id.clone());
                names.vets.insert(appt.veterinarian_id.clone(), name.clone());
                name
            }
        };

        Ok(ScheduleRow {
            appointment_id: appt.appointment_id.clone(),
            start_time: appt.start_time,
            end_time: appt.end_time(),
            pet_name,
            species,
            owner_name,
            veterinarian_name,
            appointment_type: appt.appointment_type.clone(),
            status: appt.status,
        })
    }
}

#[derive(Default)]
struct NameCache {
    pets: HashMap<String, (String, String, String)>,
    vets: HashMap<String, String>,
}
