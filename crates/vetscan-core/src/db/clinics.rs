//! Clinic database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Clinic, RecordStatus};

const CLINIC_COLUMNS: &str =
    "clinic_id, name, address, phone, email, status, created_at, updated_at";

fn clinic_from_row(row: &Row<'_>) -> rusqlite::Result<Clinic> {
    Ok(Clinic {
        clinic_id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        phone: row.get(3)?,
        email: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

impl Database {
    /// Insert a new clinic.
    pub fn insert_clinic(&self, clinic: &Clinic) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO clinics (
                clinic_id, name, address, phone, email, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                clinic.clinic_id,
                clinic.name,
                clinic.address,
                clinic.phone,
                clinic.email,
                clinic.status,
                clinic.created_at,
                clinic.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update contact details of a clinic. Status is changed separately.
    pub fn update_clinic(&self, clinic: &Clinic) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE clinics SET
                name = ?2,
                address = ?3,
                phone = ?4,
                email = ?5,
                updated_at = ?6
            WHERE clinic_id = ?1
            "#,
            params![
                clinic.clinic_id,
                clinic.name,
                clinic.address,
                clinic.phone,
                clinic.email,
                clinic.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a clinic by ID.
    pub fn get_clinic(&self, clinic_id: &str) -> DbResult<Option<Clinic>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM clinics WHERE clinic_id = ?", CLINIC_COLUMNS),
                [clinic_id],
                clinic_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List clinics by name, optionally including retired ones.
    pub fn list_clinics(&self, include_retired: bool) -> DbResult<Vec<Clinic>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM clinics WHERE ?1 OR status = 'active' ORDER BY name",
            CLINIC_COLUMNS
        ))?;
        let rows = stmt.query_map([include_retired], clinic_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Set clinic lifecycle status.
    pub fn set_clinic_status(&self, clinic_id: &str, status: RecordStatus) -> DbResult<bool> {
        self.update_status("clinics", "clinic_id", clinic_id, status)
    }

    /// Count active users assigned to a clinic.
    pub fn count_active_users_in_clinic(&self, clinic_id: &str) -> DbResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE clinic_id = ? AND status = 'active'",
            [clinic_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
