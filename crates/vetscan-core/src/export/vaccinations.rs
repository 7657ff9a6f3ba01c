//! Vaccination reminder report.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::escape_csv;
use crate::db::Database;
use crate::error::ServiceResult;

/// A booster that is due, with the contact details needed to remind the
/// owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VaccinationDueRow {
    pub vaccination_id: String,
    pub pet_name: String,
    pub species: String,
    pub owner_name: String,
    pub owner_email: String,
    pub owner_phone: Option<String>,
    pub vaccine_name: String,
    pub administered_on: NaiveDate,
    pub next_due_on: NaiveDate,
    /// Days past due as of the report date; zero when due that day
    pub days_overdue: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaccinationDueReport {
    pub generated_at: String,
    pub due_by: NaiveDate,
    pub rows: Vec<VaccinationDueRow>,
}

impl VaccinationDueReport {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Export to CSV format.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        csv.push_str("pet,species,owner,email,phone,vaccine,administered_on,next_due_on,days_overdue\n");

        for row in &self.rows {
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{}\n",
                escape_csv(&row.pet_name),
                escape_csv(&row.species),
                escape_csv(&row.owner_name),
                escape_csv(&row.owner_email),
                escape_csv(row.owner_phone.as_deref().unwrap_or("")),
                escape_csv(&row.vaccine_name),
                row.administered_on,
                row.next_due_on,
                row.days_overdue,
            ));
        }

        csv
    }
}

/// Builds [`VaccinationDueReport`]s.
pub struct VaccinationExporter<'a> {
    db: &'a Database,
}

impl<'a> VaccinationExporter<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Boosters of active pets due on or before `due_by`.
    pub fn export_due(&self, due_by: NaiveDate) -> ServiceResult<VaccinationDueReport> {
        let mut rows = Vec::new();
        for vax in self.db.list_vaccinations_due_by(due_by)? {
            let Some(next_due_on) = vax.next_due_on else {
                continue;
            };
            let Some(pet) = self.db.get_pet(&vax.pet_id)? else {
                continue;
            };
            let owner = self.db.get_owner(&pet.owner_id)?;

            rows.push(VaccinationDueRow {
                vaccination_id: vax.vaccination_id,
                pet_name: pet.name,
                species: pet.species,
                owner_name: owner.as_ref().map(|o| o.full_name()).unwrap_or_default(),
                owner_email: owner.as_ref().map(|o| o.email.clone()).unwrap_or_default(),
                owner_phone: owner.and_then(|o| o.phone),
                vaccine_name: vax.vaccine_name,
                administered_on: vax.administered_on,
                next_due_on,
                days_overdue: (due_by - next_due_on).num_days(),
            });
        }

        Ok(VaccinationDueReport {
            generated_at: Utc::now().to_rfc3339(),
            due_by,
            rows,
        })
    }
}
