//! Medical records, consultations, vitals, prescriptions and vaccinations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    Consultation, MedicalRecord, Prescription, Vaccination, VeterinarianDetails, VitalSigns,
};
use crate::validation::{self, MAX_NAME_LEN, MAX_NOTES_LEN};

/// Plausible body temperature range in degrees Celsius.
pub const TEMPERATURE_RANGE_C: (f64, f64) = (25.0, 45.0);
pub const HEART_RATE_RANGE_BPM: (i64, i64) = (1, 400);
pub const RESPIRATORY_RATE_RANGE: (i64, i64) = (1, 200);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewConsultation {
    pub veterinarian_id: String,
    pub appointment_id: Option<String>,
    /// Defaults to now
    pub consulted_at: Option<DateTime<Utc>>,
    pub reason: String,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
}

/// Measurements taken during a consultation. At least one is required.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VitalsInput {
    pub temperature_c: Option<f64>,
    pub heart_rate_bpm: Option<i64>,
    pub respiratory_rate: Option<i64>,
    pub weight_kg: Option<f64>,
    pub recorded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PrescriptionInput {
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub duration_days: i64,
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VaccinationInput {
    pub pet_id: String,
    pub veterinarian_id: String,
    pub vaccine_name: String,
    pub batch_number: Option<String>,
    pub administered_on: NaiveDate,
    pub next_due_on: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Clinical history of pets.
pub struct ClinicalRecords<'a> {
    db: &'a Database,
}

impl<'a> ClinicalRecords<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Open the medical record of a pet. A pet has at most one record and
    /// record numbers are unique.
    pub fn open_medical_record(
        &self,
        pet_id: &str,
        record_number: &str,
        opened_on: NaiveDate,
    ) -> ServiceResult<MedicalRecord> {
        let record_number = validation::required_text("record_number", record_number, MAX_NAME_LEN)?;
        self.db
            .get_pet(pet_id)?
            .ok_or_else(|| ServiceError::not_found("pet", pet_id))?;

        if self.db.get_medical_record_for_pet(pet_id)?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "pet {} already has a medical record",
                pet_id
            )));
        }
        if self.db.find_medical_record_by_number(&record_number)?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "record number {} is already in use",
                record_number
            )));
        }

        let record = MedicalRecord::new(pet_id.to_string(), record_number, opened_on);
        self.db.insert_medical_record(&record)?;
        tracing::info!(record_id = %record.record_id, pet_id, "medical record opened");
        Ok(record)
    }

    pub fn get_record_for_pet(&self, pet_id: &str) -> ServiceResult<MedicalRecord> {
        self.db
            .get_medical_record_for_pet(pet_id)?
            .ok_or_else(|| ServiceError::not_found("medical record for pet", pet_id))
    }

    /// Add a consultation to a record. A linked appointment must be for the
    /// record's pet with the same veterinarian.
    pub fn add_consultation(
        &self,
        record_id: &str,
        input: NewConsultation,
    ) -> ServiceResult<Consultation> {
        let reason = validation::required_text("reason", &input.reason, MAX_NAME_LEN)?;
        let diagnosis = validation::optional_text("diagnosis", input.diagnosis.as_deref(), MAX_NOTES_LEN)?;
        let treatment = validation::optional_text("treatment", input.treatment.as_deref(), MAX_NOTES_LEN)?;
        let notes = validation::optional_text("notes", input.notes.as_deref(), MAX_NOTES_LEN)?;

        let record = self
            .db
            .get_medical_record(record_id)?
            .ok_or_else(|| ServiceError::not_found("medical record", record_id))?;
        self.require_veterinarian(&input.veterinarian_id)?;
        if let Some(appointment_id) = &input.appointment_id {
            let appt = self
                .db
                .get_appointment(appointment_id)?
                .ok_or_else(|| ServiceError::not_found("appointment", appointment_id))?;
            if appt.pet_id != record.pet_id {
                return Err(ServiceError::Validation(format!(
                    "appointment {} is for another pet",
                    appointment_id
                )));
            }
            if appt.veterinarian_id != input.veterinarian_id {
                return Err(ServiceError::Validation(format!(
                    "appointment {} is with another veterinarian",
                    appointment_id
                )));
            }
        }

        let mut consultation = Consultation::new(
            record_id.to_string(),
            input.veterinarian_id,
            input.consulted_at.unwrap_or_else(Utc::now),
            reason,
        );
        consultation.appointment_id = input.appointment_id;
        consultation.diagnosis = diagnosis;
        consultation.treatment = treatment;
        consultation.notes = notes;
        self.db.insert_consultation(&consultation)?;
        tracing::info!(
            consultation_id = %consultation.consultation_id,
            record_id,
            veterinarian_id = %consultation.veterinarian_id,
            "consultation added"
        );
        Ok(consultation)
    }

    /// Consultations on a record, most recent first.
    pub fn list_consultations(&self, record_id: &str) -> ServiceResult<Vec<Consultation>> {
        Ok(self.db.list_consultations_for_record(record_id)?)
    }

    pub fn record_vital_signs(
        &self,
        consultation_id: &str,
        input: VitalsInput,
    ) -> ServiceResult<VitalSigns> {
        if input.temperature_c.is_none()
            && input.heart_rate_bpm.is_none()
            && input.respiratory_rate.is_none()
            && input.weight_kg.is_none()
        {
            return Err(ServiceError::Validation(
                "at least one measurement is required".into(),
            ));
        }
        let (t_min, t_max) = TEMPERATURE_RANGE_C;
        let (hr_min, hr_max) = HEART_RATE_RANGE_BPM;
        let (rr_min, rr_max) = RESPIRATORY_RATE_RANGE;
        let temperature_c = validation::in_range("temperature_c", input.temperature_c, t_min, t_max)?;
        let heart_rate_bpm = validation::in_range("heart_rate_bpm", input.heart_rate_bpm, hr_min, hr_max)?;
        let respiratory_rate =
            validation::in_range("respiratory_rate", input.respiratory_rate, rr_min, rr_max)?;
        if let Some(weight) = input.weight_kg {
            if !(weight > 0.0 && weight.is_finite()) {
                return Err(ServiceError::Validation("weight_kg must be positive".into()));
            }
        }

        self.require_consultation(consultation_id)?;

        let mut vitals = VitalSigns::new(
            consultation_id.to_string(),
            input.recorded_at.unwrap_or_else(Utc::now),
        );
        vitals.temperature_c = temperature_c;
        vitals.heart_rate_bpm = heart_rate_bpm;
        vitals.respiratory_rate = respiratory_rate;
        vitals.weight_kg = input.weight_kg;
        self.db.insert_vital_signs(&vitals)?;
        tracing::debug!(consultation_id, vital_id = %vitals.vital_id, "vital signs recorded");
        Ok(vitals)
    }

    pub fn list_vital_signs(&self, consultation_id: &str) -> ServiceResult<Vec<VitalSigns>> {
        Ok(self.db.list_vital_signs(consultation_id)?)
    }

    pub fn add_prescription(
        &self,
        consultation_id: &str,
        input: PrescriptionInput,
    ) -> ServiceResult<Prescription> {
        let medication = validation::required_text("medication", &input.medication, MAX_NAME_LEN)?;
        let dosage = validation::required_text("dosage", &input.dosage, MAX_NAME_LEN)?;
        let frequency = validation::required_text("frequency", &input.frequency, MAX_NAME_LEN)?;
        let instructions =
            validation::optional_text("instructions", input.instructions.as_deref(), MAX_NOTES_LEN)?;
        if input.duration_days < 1 {
            return Err(ServiceError::Validation(
                "duration_days must be at least 1".into(),
            ));
        }

        self.require_consultation(consultation_id)?;

        let mut rx = Prescription::new(
            consultation_id.to_string(),
            medication,
            dosage,
            frequency,
            input.duration_days,
        );
        rx.instructions = instructions;
        self.db.insert_prescription(&rx)?;
        tracing::info!(consultation_id, prescription_id = %rx.prescription_id, "prescription added");
        Ok(rx)
    }

    pub fn list_prescriptions(&self, consultation_id: &str) -> ServiceResult<Vec<Prescription>> {
        Ok(self.db.list_prescriptions(consultation_id)?)
    }

    pub fn record_vaccination(&self, input: VaccinationInput) -> ServiceResult<Vaccination> {
        let vaccine_name = validation::required_text("vaccine_name", &input.vaccine_name, MAX_NAME_LEN)?;
        let batch_number =
            validation::optional_text("batch_number", input.batch_number.as_deref(), MAX_NAME_LEN)?;
        let notes = validation::optional_text("notes", input.notes.as_deref(), MAX_NOTES_LEN)?;
        if let Some(due) = input.next_due_on {
            if due < input.administered_on {
                return Err(ServiceError::Validation(
                    "next_due_on cannot be before administered_on".into(),
                ));
            }
        }

        self.db
            .get_pet(&input.pet_id)?
            .ok_or_else(|| ServiceError::not_found("pet", &input.pet_id))?;
        self.require_veterinarian(&input.veterinarian_id)?;

        let mut vax = Vaccination::new(
            input.pet_id,
            input.veterinarian_id,
            vaccine_name,
            input.administered_on,
        );
        vax.batch_number = batch_number;
        vax.next_due_on = input.next_due_on;
        vax.notes = notes;
        self.db.insert_vaccination(&vax)?;
        tracing::info!(
            vaccination_id = %vax.vaccination_id,
            pet_id = %vax.pet_id,
            vaccine = %vax.vaccine_name,
            "vaccination recorded"
        );
        Ok(vax)
    }

    pub fn list_vaccinations_for_pet(&self, pet_id: &str) -> ServiceResult<Vec<Vaccination>> {
        Ok(self.db.list_vaccinations_for_pet(pet_id)?)
    }

    /// Vaccinations of active pets whose booster is due on or before `on`.
    pub fn vaccinations_due_by(&self, on: NaiveDate) -> ServiceResult<Vec<Vaccination>> {
        Ok(self.db.list_vaccinations_due_by(on)?)
    }

    fn require_veterinarian(&self, veterinarian_id: &str) -> ServiceResult<VeterinarianDetails> {
        self.db
            .get_veterinarian(veterinarian_id)?
            .ok_or_else(|| ServiceError::not_found("veterinarian", veterinarian_id))
    }

    fn require_consultation(&self, consultation_id: &str) -> ServiceResult<Consultation> {
        self.db
            .get_consultation(consultation_id)?
            .ok_or_else(|| ServiceError::not_found("consultation", consultation_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Appointment, Pet, PetOwner, User, UserRole, Veterinarian};
    use chrono::TimeZone;

    struct Fixture {
        db: Database,
        owner_id: String,
        pet_id: String,
        vet_id: String,
    }

    fn fixture() -> Fixture {
        let db = Database::open_in_memory().unwrap();
        let owner = PetOwner::new("Ana".into(), "Silva".into(), "ana@example.com".into());
        db.insert_owner(&owner).unwrap();
        let pet = Pet::new(owner.owner_id.clone(), "Rex".into(), "canine".into());
        db.insert_pet(&pet).unwrap();
        let user = User::new(
            "house".into(),
            "house@clinic.example".into(),
            "Greg".into(),
            "House".into(),
            UserRole::Veterinarian,
        );
        db.insert_user(&user).unwrap();
        db.insert_veterinarian(&Veterinarian {
            user_id: user.user_id.clone(),
            specialty_id: None,
            license_number: None,
        })
        .unwrap();
        Fixture {
            db,
            owner_id: owner.owner_id,
            pet_id: pet.pet_id,
            vet_id: user.user_id,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn consultation(records: &ClinicalRecords<'_>, f: &Fixture) -> Consultation {
        let record = records
            .open_medical_record(&f.pet_id, "MR-0001", date(2024, 1, 10))
            .unwrap();
        records
            .add_consultation(
                &record.record_id,
                NewConsultation {
                    veterinarian_id: f.vet_id.clone(),
                    appointment_id: None,
                    consulted_at: None,
                    reason: "Limping".into(),
                    diagnosis: Some("Sprain".into()),
                    treatment: None,
                    notes: None,
                },
            )
            .unwrap()
    }

    #[test]
    fn test_one_record_per_pet() {
        let f = fixture();
        let records = ClinicalRecords::new(&f.db);

        records
            .open_medical_record(&f.pet_id, "MR-0001", date(2024, 1, 10))
            .unwrap();
        let err = records
            .open_medical_record(&f.pet_id, "MR-0002", date(2024, 1, 11))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(records.get_record_for_pet(&f.pet_id).unwrap().record_number, "MR-0001");
    }

    #[test]
    fn test_consultation_requires_known_veterinarian() {
        let f = fixture();
        let records = ClinicalRecords::new(&f.db);
        let record = records
            .open_medical_record(&f.pet_id, "MR-0001", date(2024, 1, 10))
            .unwrap();

        let err = records
            .add_consultation(
                &record.record_id,
                NewConsultation {
                    veterinarian_id: "nobody".into(),
                    appointment_id: None,
                    consulted_at: None,
                    reason: "Checkup".into(),
                    diagnosis: None,
                    treatment: None,
                    notes: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }


    fn consultation_for(veterinarian_id: &str, appointment_id: &str) -> NewConsultation {
        NewConsultation {
            veterinarian_id: veterinarian_id.into(),
            appointment_id: Some(appointment_id.into()),
            consulted_at: None,
            reason: "Follow-up".into(),
            diagnosis: None,
            treatment: None,
            notes: None,
        }
    }

    #[test]
    fn test_consultation_appointment_must_match_record() {
        let f = fixture();
        let records = ClinicalRecords::new(&f.db);
        let record = records
            .open_medical_record(&f.pet_id, "MR-0001", date(2024, 1, 10))
            .unwrap();

        let other_pet = Pet::new(f.owner_id.clone(), "Milo".into(), "feline".into());
        f.db.insert_pet(&other_pet).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 1, 12, 9, 0, 0).unwrap();
        let own = Appointment::new(f.pet_id.clone(), f.vet_id.clone(), start, 30, "checkup".into());
        let foreign = Appointment::new(
            other_pet.pet_id.clone(),
            f.vet_id.clone(),
            start + chrono::Duration::hours(1),
            30,
            "checkup".into(),
        );
        f.db.insert_appointment(&own).unwrap();
        f.db.insert_appointment(&foreign).unwrap();

        let err = records
            .add_consultation(&record.record_id, consultation_for(&f.vet_id, &foreign.appointment_id))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let second_vet = User::new(
            "wilson".into(),
            "wilson@clinic.example".into(),
            "James".into(),
            "Wilson".into(),
            UserRole::Veterinarian,
        );
        f.db.insert_user(&second_vet).unwrap();
        f.db.insert_veterinarian(&Veterinarian {
            user_id: second_vet.user_id.clone(),
            specialty_id: None,
            license_number: None,
        })
        .unwrap();
        let err = records
            .add_consultation(
                &record.record_id,
                consultation_for(&second_vet.user_id, &own.appointment_id),
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let linked = records
            .add_consultation(&record.record_id, consultation_for(&f.vet_id, &own.appointment_id))
            .unwrap();
        assert_eq!(linked.appointment_id.as_deref(), Some(own.appointment_id.as_str()));
        assert_eq!(records.list_consultations(&record.record_id).unwrap().len(), 1);
    }

    #[test]
    fn test_vital_sign_ranges() {
        let f = fixture();
        let records = ClinicalRecords::new(&f.db);
        let c = consultation(&records, &f);

        let ok = records
            .record_vital_signs(
                &c.consultation_id,
                VitalsInput {
                    temperature_c: Some(38.6),
                    heart_rate_bpm: Some(90),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(ok.temperature_c, Some(38.6));

        for bad in [
            VitalsInput { temperature_c: Some(46.0), ..Default::default() },
            VitalsInput { heart_rate_bpm: Some(0), ..Default::default() },
            VitalsInput { respiratory_rate: Some(201), ..Default::default() },
            VitalsInput { weight_kg: Some(-1.0), ..Default::default() },
            VitalsInput { temperature_c: Some(f64::NAN), ..Default::default() },
            VitalsInput { temperature_c: Some(f64::INFINITY), ..Default::default() },
            VitalsInput { weight_kg: Some(f64::NAN), ..Default::default() },
            VitalsInput::default(),
        ] {
            assert!(matches!(
                records.record_vital_signs(&c.consultation_id, bad),
                Err(ServiceError::Validation(_))
            ));
        }
        assert_eq!(records.list_vital_signs(&c.consultation_id).unwrap().len(), 1);
    }

    #[test]
    fn test_prescription_duration() {
        let f = fixture();
        let records = ClinicalRecords::new(&f.db);
        let c = consultation(&records, &f);

        let input = PrescriptionInput {
            medication: "Carprofen".into(),
            dosage: "75 mg".into(),
            frequency: "BID".into(),
            duration_days: 0,
            instructions: None,
        };
        assert!(records.add_prescription(&c.consultation_id, input.clone()).is_err());

        let rx = records
            .add_prescription(&c.consultation_id, PrescriptionInput { duration_days: 7, ..input })
            .unwrap();
        assert_eq!(records.list_prescriptions(&c.consultation_id).unwrap(), vec![rx]);
    }

    #[test]
    fn test_vaccination_due_dates() {
        let f = fixture();
        let records = ClinicalRecords::new(&f.db);
        let input = VaccinationInput {
            pet_id: f.pet_id.clone(),
            veterinarian_id: f.vet_id.clone(),
            vaccine_name: "Rabies".into(),
            batch_number: None,
            administered_on: date(2024, 3, 1),
            next_due_on: Some(date(2024, 2, 1)),
            notes: None,
        };
        assert!(matches!(
            records.record_vaccination(input.clone()),
            Err(ServiceError::Validation(_))
        ));

        records
            .record_vaccination(VaccinationInput {
                next_due_on: Some(date(2025, 3, 1)),
                ..input
            })
            .unwrap();
        assert!(records.vaccinations_due_by(date(2025, 2, 28)).unwrap().is_empty());
        assert_eq!(records.vaccinations_due_by(date(2025, 3, 1)).unwrap().len(), 1);
        assert_eq!(records.list_vaccinations_for_pet(&f.pet_id).unwrap().len(), 1);
    }
}
