//! Clinical record models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{new_id, now_stamp, RecordStatus};

/// The medical chart of a pet. One per pet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalRecord {
    pub record_id: String,
    pub pet_id: String,
    /// Human facing chart number, unique across records
    pub record_number: String,
    pub opened_on: NaiveDate,
    pub notes: Option<String>,
    pub status: RecordStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl MedicalRecord {
    pub fn new(pet_id: String, record_number: String, opened_on: NaiveDate) -> Self {
        let now = now_stamp();
        Self {
            record_id: new_id(),
            pet_id,
            record_number,
            opened_on,
            notes: None,
            status: RecordStatus::Active,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

/// A single clinical consultation entered on a medical record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Consultation {
    pub consultation_id: String,
    pub record_id: String,
    pub veterinarian_id: String,
    /// Appointment this consultation came out of, if any
    pub appointment_id: Option<String>,
    pub consulted_at: DateTime<Utc>,
    pub reason: String,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl Consultation {
    pub fn new(
        record_id: String,
        veterinarian_id: String,
        consulted_at: DateTime<Utc>,
        reason: String,
    ) -> Self {
        Self {
            consultation_id: new_id(),
            record_id,
            veterinarian_id,
            appointment_id: None,
            consulted_at,
            reason,
            diagnosis: None,
            treatment: None,
            notes: None,
            created_at: now_stamp(),
        }
    }
}

/// Vital signs measured during a consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VitalSigns {
    pub vital_id: String,
    pub consultation_id: String,
    pub temperature_c: Option<f64>,
    pub heart_rate_bpm: Option<i64>,
    pub respiratory_rate: Option<i64>,
    pub weight_kg: Option<f64>,
    pub recorded_at: DateTime<Utc>,
}

impl VitalSigns {
    pub fn new(consultation_id: String, recorded_at: DateTime<Utc>) -> Self {
        Self {
            vital_id: new_id(),
            consultation_id,
            temperature_c: None,
            heart_rate_bpm: None,
            respiratory_rate: None,
            weight_kg: None,
            recorded_at,
        }
    }
}

/// Medication prescribed during a consultation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    pub prescription_id: String,
    pub consultation_id: String,
    pub medication: String,
    /// Dose as written (e.g., "10 mg")
    pub dosage: String,
    /// Frequency as written (e.g., "BID")
    pub frequency: String,
    pub duration_days: i64,
    pub instructions: Option<String>,
    pub created_at: String,
}

impl Prescription {
    pub fn new(
        consultation_id: String,
        medication: String,
        dosage: String,
        frequency: String,
        duration_days: i64,
    ) -> Self {
        Self {
            prescription_id: new_id(),
            consultation_id,
            medication,
            dosage,
            frequency,
            duration_days,
            instructions: None,
            created_at: now_stamp(),
        }
    }
}

/// A vaccine dose given to a pet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Vaccination {
    pub vaccination_id: String,
    pub pet_id: String,
    pub veterinarian_id: String,
    pub vaccine_name: String,
    pub batch_number: Option<String>,
    pub administered_on: NaiveDate,
    /// Booster due date, never before `administered_on`
    pub next_due_on: Option<NaiveDate>,
    pub notes: Option<String>,
    pub created_at: String,
}

impl Vaccination {
    pub fn new(
        pet_id: String,
        veterinarian_id: String,
        vaccine_name: String,
        administered_on: NaiveDate,
    ) -> Self {
        Self {
            vaccination_id: new_id(),
            pet_id,
            veterinarian_id,
            vaccine_name,
            batch_number: None,
            administered_on,
            next_due_on: None,
            notes: None,
            created_at: now_stamp(),
        }
    }

    /// Whether a booster is due on or before `on`.
    pub fn is_due_by(&self, on: NaiveDate) -> bool {
        self.next_due_on.is_some_and(|due| due <= on)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vaccination_due() {
        let given = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let mut vax = Vaccination::new("pet".into(), "vet".into(), "Rabies".into(), given);
        assert!(!vax.is_due_by(given));

        vax.next_due_on = NaiveDate::from_ymd_opt(2025, 1, 10);
        assert!(!vax.is_due_by(NaiveDate::from_ymd_opt(2025, 1, 9).unwrap()));
        assert!(vax.is_due_by(NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()));
    }
}
