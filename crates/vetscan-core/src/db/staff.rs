//! Staff database operations: users, veterinarians, specialties.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{RecordStatus, Specialty, User, Veterinarian, VeterinarianDetails};

const USER_COLUMNS: &str = "u.user_id, u.username, u.email, u.password_hash, u.password_salt, \
                            u.first_name, u.last_name, u.role, u.clinic_id, u.status, \
                            u.created_at, u.updated_at";

const SPECIALTY_COLUMNS: &str =
    "specialty_id, name, description, status, created_at, updated_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        user_id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        password_salt: row.get(4)?,
        first_name: row.get(5)?,
        last_name: row.get(6)?,
        role: row.get(7)?,
        clinic_id: row.get(8)?,
        status: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Expects the user columns followed by specialty_id, license_number and
/// specialty name.
fn vet_from_row(row: &Row<'_>) -> rusqlite::Result<VeterinarianDetails> {
    let user = user_from_row(row)?;
    Ok(VeterinarianDetails {
        profile: Veterinarian {
            user_id: user.user_id.clone(),
            specialty_id: row.get(12)?,
            license_number: row.get(13)?,
        },
        specialty_name: row.get(14)?,
        user,
    })
}

fn specialty_from_row(row: &Row<'_>) -> rusqlite::Result<Specialty> {
    Ok(Specialty {
        specialty_id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl Database {
    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a new user.
    pub fn insert_user(&self, user: &User) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO users (
                user_id, username, email, password_hash, password_salt,
                first_name, last_name, role, clinic_id, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                user.user_id,
                user.username,
                user.email,
                user.password_hash,
                user.password_salt,
                user.first_name,
                user.last_name,
                user.role,
                user.clinic_id,
                user.status,
                user.created_at,
                user.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update profile fields of a user. Credentials and status have their own
    /// setters.
    pub fn update_user(&self, user: &User) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE users SET
                username = ?2,
                email = ?3,
                first_name = ?4,
                last_name = ?5,
                clinic_id = ?6,
                updated_at = ?7
            WHERE user_id = ?1
            "#,
            params![
                user.user_id,
                user.username,
                user.email,
                user.first_name,
                user.last_name,
                user.clinic_id,
                user.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Replace a user's password digest and salt.
    pub fn update_user_password(&self, user_id: &str, hash: &str, salt: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE users SET password_hash = ?2, password_salt = ?3, updated_at = ?4 WHERE user_id = ?1",
            params![user_id, hash, salt, crate::models::now_stamp()],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a user by ID.
    pub fn get_user(&self, user_id: &str) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM users u WHERE u.user_id = ?", USER_COLUMNS),
                [user_id],
                user_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Find a user by login name (case-insensitive).
    pub fn find_user_by_username(&self, username: &str) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM users u WHERE u.username = ?", USER_COLUMNS),
                [username],
                user_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Find a user by email (case-insensitive).
    pub fn find_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM users u WHERE u.email = ?", USER_COLUMNS),
                [email],
                user_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List users, optionally including retired ones.
    pub fn list_users(&self, include_retired: bool) -> DbResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM users u WHERE ?1 OR u.status = 'active' ORDER BY u.last_name, u.first_name",
            USER_COLUMNS
        ))?;
        let rows = stmt.query_map([include_retired], user_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Set user lifecycle status.
    pub fn set_user_status(&self, user_id: &str, status: RecordStatus) -> DbResult<bool> {
        self.update_status("users", "user_id", user_id, status)
    }

    // =========================================================================
    // Veterinarians
    // =========================================================================

    /// Insert the veterinarian profile for an existing user.
    pub fn insert_veterinarian(&self, vet: &Veterinarian) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO veterinarians (user_id, specialty_id, license_number) VALUES (?1, ?2, ?3)",
            params![vet.user_id, vet.specialty_id, vet.license_number],
        )?;
        Ok(())
    }

    /// Change (or clear) a veterinarian's specialty.
    pub fn set_veterinarian_specialty(
        &self,
        user_id: &str,
        specialty_id: Option<&str>,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE veterinarians SET specialty_id = ?2 WHERE user_id = ?1",
            params![user_id, specialty_id],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a veterinarian joined with their user account.
    pub fn get_veterinarian(&self, user_id: &str) -> DbResult<Option<VeterinarianDetails>> {
        self.conn
            .query_row(
                &format!(
                    r#"
                    SELECT {}, v.specialty_id, v.license_number, s.name
                    FROM veterinarians v
                    JOIN users u ON u.user_id = v.user_id
                    LEFT JOIN specialties s ON s.specialty_id = v.specialty_id
                    WHERE v.user_id = ?
                    "#,
                    USER_COLUMNS
                ),
                [user_id],
                vet_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List veterinarians with active accounts.
    pub fn list_active_veterinarians(&self) -> DbResult<Vec<VeterinarianDetails>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}, v.specialty_id, v.license_number, s.name
            FROM veterinarians v
            JOIN users u ON u.user_id = v.user_id
            LEFT JOIN specialties s ON s.specialty_id = v.specialty_id
            WHERE u.status = 'active'
            ORDER BY u.last_name, u.first_name
            "#,
            USER_COLUMNS
        ))?;
        let rows = stmt.query_map([], vet_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    // =========================================================================
    // Specialties
    // =========================================================================

    /// Insert a new specialty.
    pub fn insert_specialty(&self, specialty: &Specialty) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO specialties (
                specialty_id, name, description, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                specialty.specialty_id,
                specialty.name,
                specialty.description,
                specialty.status,
                specialty.created_at,
                specialty.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update a specialty's name and description.
    pub fn update_specialty(&self, specialty: &Specialty) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE specialties SET name = ?2, description = ?3, updated_at = ?4 WHERE specialty_id = ?1",
            params![
                specialty.specialty_id,
                specialty.name,
                specialty.description,
                specialty.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a specialty by ID.
    pub fn get_specialty(&self, specialty_id: &str) -> DbResult<Option<Specialty>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM specialties WHERE specialty_id = ?",
                    SPECIALTY_COLUMNS
                ),
                [specialty_id],
                specialty_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Find a specialty by name (case-insensitive).
    pub fn find_specialty_by_name(&self, name: &str) -> DbResult<Option<Specialty>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM specialties WHERE name = ?", SPECIALTY_COLUMNS),
                [name],
                specialty_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List specialties, optionally including retired ones.
    pub fn list_specialties(&self, include_retired: bool) -> DbResult<Vec<Specialty>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM specialties WHERE ?1 OR status = 'active' ORDER BY name",
            SPECIALTY_COLUMNS
        ))?;
        let rows = stmt.query_map([include_retired], specialty_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Set specialty lifecycle status.
    pub fn set_specialty_status(&self, specialty_id: &str, status: RecordStatus) -> DbResult<bool> {
        self.update_status("specialties", "specialty_id", specialty_id, status)
    }

    /// Count veterinarians with active accounts holding a specialty.
    pub fn count_active_veterinarians_with_specialty(&self, specialty_id: &str) -> DbResult<i64> {
        let count = self.conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM veterinarians v
            JOIN users u ON u.user_id = v.user_id
            WHERE v.specialty_id = ? AND u.status = 'active'
            "#,
            [specialty_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UserRole;

    fn make_user(username: &str, role: UserRole) -> User {
        let mut user = User::new(
            username.into(),
            format!("{}@example.com", username),
            "Jo".into(),
            username.to_uppercase(),
            role,
        );
        user.password_hash = "digest".into();
        user.password_salt = "salt".into();
        user
    }

    #[test]
    fn test_insert_and_find_user() {
        let db = Database::open_in_memory().unwrap();
        let user = make_user("frontdesk", UserRole::Receptionist);
        db.insert_user(&user).unwrap();

        let found = db.find_user_by_username("FrontDesk").unwrap().unwrap();
        assert_eq!(found, user);
        assert!(db.find_user_by_email("frontdesk@example.com").unwrap().is_some());
    }

    #[test]
    fn test_duplicate_username_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.insert_user(&make_user("jo", UserRole::Admin)).unwrap();

        let mut dup = make_user("jo", UserRole::Admin);
        dup.email = "other@example.com".into();
        assert!(db.insert_user(&dup).unwrap_err().is_unique_violation());
    }

    #[test]
    fn test_veterinarian_details_join() {
        let db = Database::open_in_memory().unwrap();
        let specialty = Specialty::new("Dermatology".into());
        db.insert_specialty(&specialty).unwrap();

        let user = make_user("drjo", UserRole::Veterinarian);
        db.insert_user(&user).unwrap();
        db.insert_veterinarian(&Veterinarian {
            user_id: user.user_id.clone(),
            specialty_id: Some(specialty.specialty_id.clone()),
            license_number: Some("LIC-1".into()),
        })
        .unwrap();

        let vet = db.get_veterinarian(&user.user_id).unwrap().unwrap();
        assert_eq!(vet.user.username, "drjo");
        assert_eq!(vet.specialty_name.as_deref(), Some("Dermatology"));
        assert_eq!(vet.profile.license_number.as_deref(), Some("LIC-1"));
        assert_eq!(
            db.count_active_veterinarians_with_specialty(&specialty.specialty_id)
                .unwrap(),
            1
        );

        db.set_user_status(&user.user_id, RecordStatus::Retired).unwrap();
        assert_eq!(
            db.count_active_veterinarians_with_specialty(&specialty.specialty_id)
                .unwrap(),
            0
        );
        assert!(db.list_active_veterinarians().unwrap().is_empty());
    }
}
