//! Pet database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{Pet, RecordStatus};

const PET_COLUMNS: &str = "pet_id, owner_id, name, species, breed, sex, date_of_birth, \
                           weight_kg, status, created_at, updated_at";

fn pet_from_row(row: &Row<'_>) -> rusqlite::Result<Pet> {
    Ok(Pet {
        pet_id: row.get(0)?,
        owner_id: row.get(1)?,
        name: row.get(2)?,
        species: row.get(3)?,
        breed: row.get(4)?,
        sex: row.get(5)?,
        date_of_birth: row.get(6)?,
        weight_kg: row.get(7)?,
        status: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

/// Rows in other tables that point at a pet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PetDependents {
    pub appointments: i64,
    pub vaccinations: i64,
    pub medical_records: i64,
}

impl PetDependents {
    pub fn is_empty(&self) -> bool {
        self.appointments == 0 && self.vaccinations == 0 && self.medical_records == 0
    }
}

impl Database {
    /// Insert a new pet.
    pub fn insert_pet(&self, pet: &Pet) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO pets (
                pet_id, owner_id, name, species, breed, sex, date_of_birth,
                weight_kg, status, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                pet.pet_id,
                pet.owner_id,
                pet.name,
                pet.species,
                pet.breed,
                pet.sex,
                pet.date_of_birth,
                pet.weight_kg,
                pet.status,
                pet.created_at,
                pet.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing pet. Status is changed separately.
    pub fn update_pet(&self, pet: &Pet) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE pets SET
                owner_id = ?2,
                name = ?3,
                species = ?4,
                breed = ?5,
                sex = ?6,
                date_of_birth = ?7,
                weight_kg = ?8,
                updated_at = ?9
            WHERE pet_id = ?1
            "#,
            params![
                pet.pet_id,
                pet.owner_id,
                pet.name,
                pet.species,
                pet.breed,
                pet.sex,
                pet.date_of_birth,
                pet.weight_kg,
                pet.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a pet by ID.
    pub fn get_pet(&self, pet_id: &str) -> DbResult<Option<Pet>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM pets WHERE pet_id = ?", PET_COLUMNS),
                [pet_id],
                pet_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List pets of an owner, optionally including retired ones.
    pub fn list_pets_for_owner(&self, owner_id: &str, include_retired: bool) -> DbResult<Vec<Pet>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM pets WHERE owner_id = ?1 AND (?2 OR status = 'active') ORDER BY name",
            PET_COLUMNS
        ))?;
        let rows = stmt.query_map(params![owner_id, include_retired], pet_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Search active pets by name (prefix match).
    pub fn search_pets(&self, query: &str, limit: usize) -> DbResult<Vec<Pet>> {
        let pattern = format!("{}%", query);
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM pets
            WHERE status = 'active' AND name LIKE ?1
            ORDER BY name
            LIMIT ?2
            "#,
            PET_COLUMNS
        ))?;
        let rows = stmt.query_map(params![pattern, limit as i64], pet_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Set pet lifecycle status.
    pub fn set_pet_status(&self, pet_id: &str, status: RecordStatus) -> DbResult<bool> {
        self.update_status("pets", "pet_id", pet_id, status)
    }

    /// Physically remove a pet row.
    pub fn delete_pet(&self, pet_id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM pets WHERE pet_id = ?", [pet_id])?;
        Ok(rows_affected > 0)
    }

    /// Count rows that reference a pet.
    pub fn count_pet_dependents(&self, pet_id: &str) -> DbResult<PetDependents> {
        self.conn
            .query_row(
                r#"
                SELECT
                    (SELECT COUNT(*) FROM appointments WHERE pet_id = ?1),
                    (SELECT COUNT(*) FROM vaccinations WHERE pet_id = ?1),
                    (SELECT COUNT(*) FROM medical_records WHERE pet_id = ?1)
                "#,
                [pet_id],
                |row| {
                    Ok(PetDependents {
                        appointments: row.get(0)?,
                        vaccinations: row.get(1)?,
                        medical_records: row.get(2)?,
                    })
                },
            )
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PetOwner;
    use chrono::NaiveDate;

    fn setup_db() -> (Database, PetOwner) {
        let db = Database::open_in_memory().unwrap();
        let owner = PetOwner::new("Ana".into(), "Silva".into(), "ana@example.com".into());
        db.insert_owner(&owner).unwrap();
        (db, owner)
    }

    #[test]
    fn test_insert_and_get() {
        let (db, owner) = setup_db();

        let mut pet = Pet::new(owner.owner_id.clone(), "Max".into(), "canine".into());
        pet.breed = Some("Golden Retriever".into());
        pet.date_of_birth = NaiveDate::from_ymd_opt(2020, 5, 17);
        pet.weight_kg = Some(30.0);
        db.insert_pet(&pet).unwrap();

        let retrieved = db.get_pet(&pet.pet_id).unwrap().unwrap();
        assert_eq!(retrieved, pet);
    }

    #[test]
    fn test_update_pet() {
        let (db, owner) = setup_db();

        let mut pet = Pet::new(owner.owner_id, "Max".into(), "canine".into());
        db.insert_pet(&pet).unwrap();

        pet.weight_kg = Some(32.5);
        pet.breed = Some("Labrador".into());
        assert!(db.update_pet(&pet).unwrap());

        let retrieved = db.get_pet(&pet.pet_id).unwrap().unwrap();
        assert_eq!(retrieved.weight_kg, Some(32.5));
        assert_eq!(retrieved.breed, Some("Labrador".into()));
    }

    #[test]
    fn test_list_for_owner_hides_retired() {
        let (db, owner) = setup_db();
        let max = Pet::new(owner.owner_id.clone(), "Max".into(), "canine".into());
        let luna = Pet::new(owner.owner_id.clone(), "Luna".into(), "feline".into());
        db.insert_pet(&max).unwrap();
        db.insert_pet(&luna).unwrap();
        db.set_pet_status(&max.pet_id, RecordStatus::Retired).unwrap();

        let active = db.list_pets_for_owner(&owner.owner_id, false).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "Luna");
        assert_eq!(db.count_active_pets_for_owner(&owner.owner_id).unwrap(), 1);
        assert_eq!(db.list_pets_for_owner(&owner.owner_id, true).unwrap().len(), 2);
    }

    #[test]
    fn test_delete_pet_without_dependents() {
        let (db, owner) = setup_db();
        let pet = Pet::new(owner.owner_id, "Max".into(), "canine".into());
        db.insert_pet(&pet).unwrap();

        assert!(db.count_pet_dependents(&pet.pet_id).unwrap().is_empty());
        assert!(db.delete_pet(&pet.pet_id).unwrap());
        assert!(db.get_pet(&pet.pet_id).unwrap().is_none());
    }
}
