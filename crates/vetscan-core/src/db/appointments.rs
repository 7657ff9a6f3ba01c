//! Appointment database operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::Appointment;

const APPOINTMENT_COLUMNS: &str = "appointment_id, pet_id, veterinarian_id, start_time, \
                                   duration_minutes, appointment_type, status, notes, \
                                   estimated_cost_cents, actual_cost_cents, created_at, updated_at";

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        appointment_id: row.get(0)?,
        pet_id: row.get(1)?,
        veterinarian_id: row.get(2)?,
        start_time: row.get(3)?,
        duration_minutes: row.get(4)?,
        appointment_type: row.get(5)?,
        status: row.get(6)?,
        notes: row.get(7)?,
        estimated_cost_cents: row.get(8)?,
        actual_cost_cents: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Pending appointments whose end (`start_time + duration_minutes`) is later
/// than `?2`.
const PENDING_AFTER: &str = "status IN ('scheduled', 'confirmed') \
     AND julianday(start_time) + duration_minutes / 1440.0 > julianday(?2)";

impl Database {
    /// Insert a new appointment. Overlap checking is the caller's job.
    pub fn insert_appointment(&self, appt: &Appointment) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO appointments (
                appointment_id, pet_id, veterinarian_id, start_time, duration_minutes,
                appointment_type, status, notes, estimated_cost_cents, actual_cost_cents,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                appt.appointment_id,
                appt.pet_id,
                appt.veterinarian_id,
                appt.start_time,
                appt.duration_minutes,
                appt.appointment_type,
                appt.status,
                appt.notes,
                appt.estimated_cost_cents,
                appt.actual_cost_cents,
                appt.created_at,
                appt.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing appointment.
    pub fn update_appointment(&self, appt: &Appointment) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE appointments SET
                pet_id = ?2,
                veterinarian_id = ?3,
                start_time = ?4,
                duration_minutes = ?5,
                appointment_type = ?6,
                status = ?7,
                notes = ?8,
                estimated_cost_cents = ?9,
                actual_cost_cents = ?10,
                updated_at = ?11
            WHERE appointment_id = ?1
            "#,
            params![
                appt.appointment_id,
                appt.pet_id,
                appt.veterinarian_id,
                appt.start_time,
                appt.duration_minutes,
                appt.appointment_type,
                appt.status,
                appt.notes,
                appt.estimated_cost_cents,
                appt.actual_cost_cents,
                appt.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, appointment_id: &str) -> DbResult<Option<Appointment>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM appointments WHERE appointment_id = ?",
                    APPOINTMENT_COLUMNS
                ),
                [appointment_id],
                appointment_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Delete an appointment.
    pub fn delete_appointment(&self, appointment_id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "DELETE FROM appointments WHERE appointment_id = ?",
            [appointment_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Appointments that keep a veterinarian busy, i.e. everything except
    /// cancelled and no-show visits, optionally skipping one appointment.
    pub fn list_occupying_appointments(
        &self,
        veterinarian_id: &str,
        exclude_appointment_id: Option<&str>,
    ) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM appointments
            WHERE veterinarian_id = ?1
              AND status NOT IN ('cancelled', 'no_show')
              AND (?2 IS NULL OR appointment_id != ?2)
            ORDER BY start_time
            "#,
            APPOINTMENT_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![veterinarian_id, exclude_appointment_id],
            appointment_from_row,
        )?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Appointments starting in `[from, to)`, optionally for one veterinarian.
    pub fn list_appointments_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        veterinarian_id: Option<&str>,
    ) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM appointments
            WHERE start_time >= ?1 AND start_time < ?2
              AND (?3 IS NULL OR veterinarian_id = ?3)
            ORDER BY start_time, veterinarian_id
            "#,
            APPOINTMENT_COLUMNS
        ))?;
        let rows = stmt.query_map(params![from, to, veterinarian_id], appointment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// All appointments of a pet, most recent first.
    pub fn list_appointments_for_pet(&self, pet_id: &str) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM appointments WHERE pet_id = ? ORDER BY start_time DESC",
            APPOINTMENT_COLUMNS
        ))?;
        let rows = stmt.query_map([pet_id], appointment_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Count scheduled or confirmed appointments of a pet that end after
    /// `now`, including one already under way.
    pub fn count_pending_appointments_for_pet(
        &self,
        pet_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<i64> {
        let count = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM appointments WHERE pet_id = ?1 AND {}",
                PENDING_AFTER
            ),
            params![pet_id, now],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Count scheduled or confirmed appointments of a veterinarian that end
    /// after `now`.
    pub fn count_pending_appointments_for_veterinarian(
        &self,
        veterinarian_id: &str,
        now: DateTime<Utc>,
    ) -> DbResult<i64> {
        let count = self.conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM appointments WHERE veterinarian_id = ?1 AND {}",
                PENDING_AFTER
            ),
            params![veterinarian_id, now],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AppointmentStatus, Pet, PetOwner, User, UserRole, Veterinarian,
    };
    use chrono::TimeZone;

    struct Fixture {
        db: Database,
        pet_id: String,
        vet_id: String,
    }

    fn setup() -> Fixture {
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

        Fixture {
            db,
            pet_id: pet.pet_id,
            vet_id: user.user_id,
        }
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let f = setup();
        let mut appt = Appointment::new(f.pet_id.clone(), f.vet_id.clone(), at(10, 0), 30, "checkup".into());
        appt.estimated_cost_cents = Some(4500);
        f.db.insert_appointment(&appt).unwrap();

        let retrieved = f.db.get_appointment(&appt.appointment_id).unwrap().unwrap();
        assert_eq!(retrieved, appt);
    }

    #[test]
    fn test_occupying_skips_cancelled_and_excluded() {
        let f = setup();
        let a = Appointment::new(f.pet_id.clone(), f.vet_id.clone(), at(9, 0), 30, "checkup".into());
        let b = Appointment::new(f.pet_id.clone(), f.vet_id.clone(), at(10, 0), 30, "checkup".into());
        let mut c = Appointment::new(f.pet_id.clone(), f.vet_id.clone(), at(11, 0), 30, "checkup".into());
        c.status = AppointmentStatus::Cancelled;
        for appt in [&a, &b, &c] {
            f.db.insert_appointment(appt).unwrap();
        }

        let all = f.db.list_occupying_appointments(&f.vet_id, None).unwrap();
        assert_eq!(all.len(), 2);

        let without_a = f
            .db
            .list_occupying_appointments(&f.vet_id, Some(&a.appointment_id))
            .unwrap();
        assert_eq!(without_a.len(), 1);
        assert_eq!(without_a[0].appointment_id, b.appointment_id);
    }

    #[test]
    fn test_list_between_and_pending_counts() {
        let f = setup();
        let early = Appointment::new(f.pet_id.clone(), f.vet_id.clone(), at(8, 0), 30, "checkup".into());
        let late = Appointment::new(f.pet_id.clone(), f.vet_id.clone(), at(15, 0), 30, "surgery".into());
        f.db.insert_appointment(&early).unwrap();
        f.db.insert_appointment(&late).unwrap();

        let window = f.db.list_appointments_between(at(12, 0), at(18, 0), None).unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].appointment_type, "surgery");

        assert_eq!(f.db.count_pending_appointments_for_pet(&f.pet_id, at(12, 0)).unwrap(), 1);
        assert_eq!(
            f.db.count_pending_appointments_for_veterinarian(&f.vet_id, at(7, 0)).unwrap(),
            2
        );
    }

    #[test]
    fn test_pending_counts_include_appointment_under_way() {
        let f = setup();
        let appt = Appointment::new(f.pet_id.clone(), f.vet_id.clone(), at(10, 0), 60, "surgery".into());
        f.db.insert_appointment(&appt).unwrap();

        assert_eq!(f.db.count_pending_appointments_for_pet(&f.pet_id, at(10, 30)).unwrap(), 1);
        assert_eq!(
            f.db.count_pending_appointments_for_veterinarian(&f.vet_id, at(10, 59)).unwrap(),
            1
        );
        assert_eq!(f.db.count_pending_appointments_for_pet(&f.pet_id, at(11, 1)).unwrap(), 0);
    }

    #[test]
    fn test_delete() {
        let f = setup();
        let appt = Appointment::new(f.pet_id, f.vet_id, at(10, 0), 30, "checkup".into());
        f.db.insert_appointment(&appt).unwrap();
        assert!(f.db.delete_appointment(&appt.appointment_id).unwrap());
        assert!(!f.db.delete_appointment(&appt.appointment_id).unwrap());
    }
}
