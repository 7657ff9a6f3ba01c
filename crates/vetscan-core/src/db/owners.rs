//! Pet owner database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{PetOwner, RecordStatus};

const OWNER_COLUMNS: &str =
    "owner_id, first_name, last_name, email, phone, address, status, created_at, updated_at";

fn owner_from_row(row: &Row<'_>) -> rusqlite::Result<PetOwner> {
    Ok(PetOwner {
        owner_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        address: row.get(5)?,
        status: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

impl Database {
    /// Insert a new owner.
    pub fn insert_owner(&self, owner: &PetOwner) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO owners (
                owner_id, first_name, last_name, email, phone, address,
                status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                owner.owner_id,
                owner.first_name,
                owner.last_name,
                owner.email,
                owner.phone,
                owner.address,
                owner.status,
                owner.created_at,
                owner.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing owner's details.
    pub fn update_owner(&self, owner: &PetOwner) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE owners SET
                first_name = ?2,
                last_name = ?3,
                email = ?4,
                phone = ?5,
                address = ?6,
                updated_at = ?7
            WHERE owner_id = ?1
            "#,
            params![
                owner.owner_id,
                owner.first_name,
                owner.last_name,
                owner.email,
                owner.phone,
                owner.address,
                owner.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an owner by ID.
    pub fn get_owner(&self, owner_id: &str) -> DbResult<Option<PetOwner>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM owners WHERE owner_id = ?", OWNER_COLUMNS),
                [owner_id],
                owner_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Find an owner by email (case-insensitive).
    pub fn find_owner_by_email(&self, email: &str) -> DbResult<Option<PetOwner>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM owners WHERE email = ?", OWNER_COLUMNS),
                [email],
                owner_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Search active owners by last name (prefix match).
    pub fn search_owners(&self, query: &str, limit: usize) -> DbResult<Vec<PetOwner>> {
        let pattern = format!("{}%", query);
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM owners
            WHERE status = 'active' AND (last_name LIKE ?1 OR first_name LIKE ?1)
            ORDER BY last_name, first_name
            LIMIT ?2
            "#,
            OWNER_COLUMNS
        ))?;
        let rows = stmt.query_map(params![pattern, limit as i64], owner_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Set owner lifecycle status.
    pub fn set_owner_status(&self, owner_id: &str, status: RecordStatus) -> DbResult<bool> {
        self.update_status("owners", "owner_id", owner_id, status)
    }

    /// Count active pets belonging to an owner.
    pub fn count_active_pets_for_owner(&self, owner_id: &str) -> DbResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM pets WHERE owner_id = ? AND status = 'active'",
            [owner_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_find_by_email() {
        let db = Database::open_in_memory().unwrap();
        let owner = PetOwner::new("Ana".into(), "Silva".into(), "ana@example.com".into());
        db.insert_owner(&owner).unwrap();

        let found = db.find_owner_by_email("ANA@example.com").unwrap().unwrap();
        assert_eq!(found.owner_id, owner.owner_id);
    }

    #[test]
    fn test_duplicate_email_is_unique_violation() {
        let db = Database::open_in_memory().unwrap();
        let first = PetOwner::new("Ana".into(), "Silva".into(), "ana@example.com".into());
        let second = PetOwner::new("Ann".into(), "Smith".into(), "ana@example.com".into());
        db.insert_owner(&first).unwrap();

        let err = db.insert_owner(&second).unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn test_search_owners() {
        let db = Database::open_in_memory().unwrap();
        for (first, last, email) in [
            ("Ana", "Silva", "a@example.com"),
            ("Bo", "Silverman", "b@example.com"),
            ("Cy", "Jones", "c@example.com"),
        ] {
            db.insert_owner(&PetOwner::new(first.into(), last.into(), email.into()))
                .unwrap();
        }

        let results = db.search_owners("Sil", 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].last_name, "Silva");
    }
}
