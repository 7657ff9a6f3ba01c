//! Clinical record database operations.

use chrono::NaiveDate;
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Consultation, MedicalRecord, Prescription, Vaccination, VitalSigns};

const RECORD_COLUMNS: &str =
    "record_id, pet_id, record_number, opened_on, notes, status, created_at, updated_at";

const CONSULTATION_COLUMNS: &str = "consultation_id, record_id, veterinarian_id, appointment_id, \
                                    consulted_at, reason, diagnosis, treatment, notes, created_at";

const VACCINATION_COLUMNS: &str = "vaccination_id, pet_id, veterinarian_id, vaccine_name, \
                                   batch_number, administered_on, next_due_on, notes, created_at";

fn record_from_row(row: &Row<'_>) -> rusqlite::Result<MedicalRecord> {
    Ok(MedicalRecord {
        record_id: row.get(0)?,
        pet_id: row.get(1)?,
        record_number: row.get(2)?,
        opened_on: row.get(3)?,
        notes: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

fn consultation_from_row(row: &Row<'_>) -> rusqlite::Result<Consultation> {
    Ok(Consultation {
        consultation_id: row.get(0)?,
        record_id: row.get(1)?,
        veterinarian_id: row.get(2)?,
        appointment_id: row.get(3)?,
        consulted_at: row.get(4)?,
        reason: row.get(5)?,
        diagnosis: row.get(6)?,
        treatment: row.get(7)?,
        notes: row.get(8)?,
        created_at: row.get(9)?,
    })
}

fn vaccination_from_row(row: &Row<'_>) -> rusqlite::Result<Vaccination> {
    Ok(Vaccination {
        vaccination_id: row.get(0)?,
        pet_id: row.get(1)?,
        veterinarian_id: row.get(2)?,
        vaccine_name: row.get(3)?,
        batch_number: row.get(4)?,
        administered_on: row.get(5)?,
        next_due_on: row.get(6)?,
        notes: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl Database {
    // =========================================================================
    // Medical Records
    // =========================================================================

    /// Insert a new medical record.
    pub fn insert_medical_record(&self, record: &MedicalRecord) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO medical_records (
                record_id, pet_id, record_number, opened_on, notes, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                record.record_id,
                record.pet_id,
                record.record_number,
                record.opened_on,
                record.notes,
                record.status,
                record.created_at,
                record.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Get a medical record by ID.
    pub fn get_medical_record(&self, record_id: &str) -> DbResult<Option<MedicalRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM medical_records WHERE record_id = ?", RECORD_COLUMNS),
                [record_id],
                record_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get the medical record of a pet.
    pub fn get_medical_record_for_pet(&self, pet_id: &str) -> DbResult<Option<MedicalRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM medical_records WHERE pet_id = ?", RECORD_COLUMNS),
                [pet_id],
                record_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Find a medical record by its chart number.
    pub fn find_medical_record_by_number(
        &self,
        record_number: &str,
    ) -> DbResult<Option<MedicalRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM medical_records WHERE record_number = ?",
                    RECORD_COLUMNS
                ),
                [record_number],
                record_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    // =========================================================================
    // Consultations
    // =========================================================================

    /// Insert a new consultation.
    pub fn insert_consultation(&self, consultation: &Consultation) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO consultations (
                consultation_id, record_id, veterinarian_id, appointment_id,
                consulted_at, reason, diagnosis, treatment, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                consultation.consultation_id,
                consultation.record_id,
                consultation.veterinarian_id,
                consultation.appointment_id,
                consultation.consulted_at,
                consultation.reason,
                consultation.diagnosis,
                consultation.treatment,
                consultation.notes,
                consultation.created_at,
            ],
        )?;
        Ok(())
    }

    /// Get a consultation by ID.
    pub fn get_consultation(&self, consultation_id: &str) -> DbResult<Option<Consultation>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM consultations WHERE consultation_id = ?",
                    CONSULTATION_COLUMNS
                ),
                [consultation_id],
                consultation_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List consultations on a record, most recent first.
    pub fn list_consultations_for_record(&self, record_id: &str) -> DbResult<Vec<Consultation>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM consultations WHERE record_id = ? ORDER BY consulted_at DESC",
            CONSULTATION_COLUMNS
        ))?;
        let rows = stmt.query_map([record_id], consultation_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // =========================================================================
    // Vital Signs and Prescriptions
    // =========================================================================

    /// Insert a vital signs reading.
    pub fn insert_vital_signs(&self, vitals: &VitalSigns) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO vital_signs (
                vital_id, consultation_id, temperature_c, heart_rate_bpm,
                respiratory_rate, weight_kg, recorded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                vitals.vital_id,
                vitals.consultation_id,
                vitals.temperature_c,
                vitals.heart_rate_bpm,
                vitals.respiratory_rate,
                vitals.weight_kg,
                vitals.recorded_at,
            ],
        )?;
        Ok(())
    }

    /// List vital signs of a consultation in recording order.
    pub fn list_vital_signs(&self, consultation_id: &str) -> DbResult<Vec<VitalSigns>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT vital_id, consultation_id, temperature_c, heart_rate_bpm,
                   respiratory_rate, weight_kg, recorded_at
            FROM vital_signs
            WHERE consultation_id = ?
            ORDER BY recorded_at
            "#,
        )?;
        let rows = stmt.query_map([consultation_id], |row| {
            Ok(VitalSigns {
                vital_id: row.get(0)?,
                consultation_id: row.get(1)?,
                temperature_c: row.get(2)?,
                heart_rate_bpm: row.get(3)?,
                respiratory_rate: row.get(4)?,
                weight_kg: row.get(5)?,
                recorded_at: row.get(6)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Insert a prescription.
    pub fn insert_prescription(&self, rx: &Prescription) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO prescriptions (
                prescription_id, consultation_id, medication, dosage, frequency,
                duration_days, instructions, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                rx.prescription_id,
                rx.consultation_id,
                rx.medication,
                rx.dosage,
                rx.frequency,
                rx.duration_days,
                rx.instructions,
                rx.created_at,
            ],
        )?;
        Ok(())
    }

    /// List prescriptions of a consultation.
    pub fn list_prescriptions(&self, consultation_id: &str) -> DbResult<Vec<Prescription>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT prescription_id, consultation_id, medication, dosage, frequency,
                   duration_days, instructions, created_at
            FROM prescriptions
            WHERE consultation_id = ?
            ORDER BY created_at
            "#,
        )?;
        let rows = stmt.query_map([consultation_id], |row| {
            Ok(Prescription {
                prescription_id: row.get(0)?,
                consultation_id: row.get(1)?,
                medication: row.get(2)?,
                dosage: row.get(3)?,
                frequency: row.get(4)?,
                duration_days: row.get(5)?,
                instructions: row.get(6)?,
                created_at: row.get(7)?,
            })
        })?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // =========================================================================
    // Vaccinations
    // =========================================================================

    /// Insert a vaccination.
    pub fn insert_vaccination(&self, vax: &Vaccination) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO vaccinations (
                vaccination_id, pet_id, veterinarian_id, vaccine_name, batch_number,
                administered_on, next_due_on, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                vax.vaccination_id,
                vax.pet_id,
                vax.veterinarian_id,
                vax.vaccine_name,
                vax.batch_number,
                vax.administered_on,
                vax.next_due_on,
                vax.notes,
                vax.created_at,
            ],
        )?;
        Ok(())
    }

    /// List vaccinations of a pet, most recent first.
    pub fn list_vaccinations_for_pet(&self, pet_id: &str) -> DbResult<Vec<Vaccination>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM vaccinations WHERE pet_id = ? ORDER BY administered_on DESC",
            VACCINATION_COLUMNS
        ))?;
        let rows = stmt.query_map([pet_id], vaccination_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Vaccinations of active pets whose booster is due on or before `on`,
    /// soonest first.
    pub fn list_vaccinations_due_by(&self, on: NaiveDate) -> DbResult<Vec<Vaccination>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM vaccinations
            WHERE next_due_on IS NOT NULL AND next_due_on <= ?1
              AND pet_id IN (SELECT pet_id FROM pets WHERE status = 'active')
            ORDER BY next_due_on, vaccine_name
            "#,
            VACCINATION_COLUMNS
        ))?;
        let rows = stmt.query_map([on], vaccination_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Pet, PetOwner, User, UserRole, Veterinarian};
    use chrono::{TimeZone, Utc};

    fn setup() -> (Database, Pet, String) {
        let db = Database::open_in_memory().unwrap();
        let owner = PetOwner::new("Ana".into(), "Silva".into(), "ana@example.com".into());
        db.insert_owner(&owner).unwrap();
        let pet = Pet::new(owner.owner_id, "Max".into(), "canine".into());
        db.insert_pet(&pet).unwrap();

        let mut user = User::new(
            "drjo".into(),
            "jo@example.com".into(),
            "Jo".into(),
            "Vet".into(),
            UserRole::Veterinarian,
        );
        user.password_hash = "h".into();
        user.password_salt = "s".into();
        db.insert_user(&user).unwrap();
        db.insert_veterinarian(&Veterinarian {
            user_id: user.user_id.clone(),
            specialty_id: None,
            license_number: None,
        })
        .unwrap();
        (db, pet, user.user_id)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_record_consultation_chain() {
        let (db, pet, vet_id) = setup();
        let record = MedicalRecord::new(pet.pet_id.clone(), "MR-0001".into(), date(2024, 1, 2));
        db.insert_medical_record(&record).unwrap();
        assert_eq!(db.get_medical_record_for_pet(&pet.pet_id).unwrap().unwrap(), record);

        let when = Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap();
        let mut consultation =
            Consultation::new(record.record_id.clone(), vet_id, when, "Limping".into());
        consultation.diagnosis = Some("Sprain".into());
        db.insert_consultation(&consultation).unwrap();

        let mut vitals = VitalSigns::new(consultation.consultation_id.clone(), when);
        vitals.temperature_c = Some(38.6);
        vitals.heart_rate_bpm = Some(90);
        db.insert_vital_signs(&vitals).unwrap();

        let rx = Prescription::new(
            consultation.consultation_id.clone(),
            "Carprofen".into(),
            "75 mg".into(),
            "BID".into(),
            7,
        );
        db.insert_prescription(&rx).unwrap();

        let listed = db.list_consultations_for_record(&record.record_id).unwrap();
        assert_eq!(listed, vec![consultation.clone()]);
        assert_eq!(db.list_vital_signs(&consultation.consultation_id).unwrap(), vec![vitals]);
        assert_eq!(db.list_prescriptions(&consultation.consultation_id).unwrap(), vec![rx]);
    }

    #[test]
    fn test_duplicate_record_number_rejected() {
        let (db, pet, _) = setup();
        let first = MedicalRecord::new(pet.pet_id.clone(), "MR-0001".into(), date(2024, 1, 2));
        db.insert_medical_record(&first).unwrap();

        let other = Pet::new(pet.owner_id.clone(), "Luna".into(), "feline".into());
        db.insert_pet(&other).unwrap();
        let second = MedicalRecord::new(other.pet_id, "MR-0001".into(), date(2024, 1, 3));
        assert!(db.insert_medical_record(&second).unwrap_err().is_unique_violation());
    }

    #[test]
    fn test_vaccinations_due() {
        let (db, pet, vet_id) = setup();
        let mut rabies = Vaccination::new(pet.pet_id.clone(), vet_id.clone(), "Rabies".into(), date(2023, 3, 1));
        rabies.next_due_on = Some(date(2024, 3, 1));
        let mut dhpp = Vaccination::new(pet.pet_id.clone(), vet_id, "DHPP".into(), date(2023, 6, 1));
        dhpp.next_due_on = Some(date(2024, 6, 1));
        db.insert_vaccination(&rabies).unwrap();
        db.insert_vaccination(&dhpp).unwrap();

        let due = db.list_vaccinations_due_by(date(2024, 4, 1)).unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].vaccine_name, "Rabies");

        assert_eq!(db.list_vaccinations_for_pet(&pet.pet_id).unwrap().len(), 2);
        assert_eq!(db.count_pet_dependents(&pet.pet_id).unwrap().vaccinations, 2);
    }
}
