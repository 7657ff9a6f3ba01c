//! Clinic, owner and pet directory.
//!
//! Nothing here is ever deleted silently. Entities are retired through
//! [`RecordStatus`], and each retire is refused while active dependents
//! still point at the entity. Pets are the one exception: a pet with no
//! history can be hard deleted.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AuthConfig;
use crate::db::Database;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{now_stamp, Clinic, Pet, PetOwner, RecordStatus};
use crate::validation::{self, MAX_NAME_LEN, MAX_NOTES_LEN};

const SEARCH_LIMIT: usize = 50;

/// Clinic fields accepted on create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ClinicInput {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Owner fields accepted on create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct OwnerInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Pet fields accepted on create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PetInput {
    pub owner_id: String,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub sex: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub weight_kg: Option<f64>,
}

/// Directory of clinics, owners, pets and staff.
pub struct Directory<'a> {
    pub(super) db: &'a Database,
    pub(super) auth: AuthConfig,
}

impl<'a> Directory<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            auth: AuthConfig::default(),
        }
    }

    /// Password policy applied to new staff accounts.
    pub fn with_auth_config(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    // =========================================================================
    // Clinics
    // =========================================================================

    pub fn create_clinic(&self, input: ClinicInput) -> ServiceResult<Clinic> {
        let mut clinic = Clinic::new(String::new());
        apply_clinic_input(&mut clinic, input)?;
        self.db.insert_clinic(&clinic)?;
        tracing::info!(clinic_id = %clinic.clinic_id, "clinic created");
        Ok(clinic)
    }

    pub fn update_clinic(&self, clinic_id: &str, input: ClinicInput) -> ServiceResult<Clinic> {
        let mut clinic = self.get_clinic(clinic_id)?;
        apply_clinic_input(&mut clinic, input)?;
        clinic.updated_at = now_stamp();
        self.db.update_clinic(&clinic)?;
        Ok(clinic)
    }

    pub fn get_clinic(&self, clinic_id: &str) -> ServiceResult<Clinic> {
        self.db
            .get_clinic(clinic_id)?
            .ok_or_else(|| ServiceError::not_found("clinic", clinic_id))
    }

    pub fn list_clinics(&self, include_retired: bool) -> ServiceResult<Vec<Clinic>> {
        Ok(self.db.list_clinics(include_retired)?)
    }

    /// Retire a clinic. Refused while active staff are assigned to it.
    pub fn retire_clinic(&self, clinic_id: &str) -> ServiceResult<Clinic> {
        let mut clinic = self.get_clinic(clinic_id)?;
        if !clinic.status.is_active() {
            return Ok(clinic);
        }
        let staff = self.db.count_active_users_in_clinic(clinic_id)?;
        if staff > 0 {
            return Err(retire_refused("clinic", clinic_id, staff, "active staff members"));
        }
        self.db.set_clinic_status(clinic_id, RecordStatus::Retired)?;
        clinic.status = RecordStatus::Retired;
        tracing::info!(clinic_id, "clinic retired");
        Ok(clinic)
    }

    pub fn reactivate_clinic(&self, clinic_id: &str) -> ServiceResult<Clinic> {
        let mut clinic = self.get_clinic(clinic_id)?;
        self.db.set_clinic_status(clinic_id, RecordStatus::Active)?;
        clinic.status = RecordStatus::Active;
        Ok(clinic)
    }

    // =========================================================================
    // Owners
    // =========================================================================

    pub fn create_owner(&self, input: OwnerInput) -> ServiceResult<PetOwner> {
        let mut owner = PetOwner::new(String::new(), String::new(), String::new());
        apply_owner_input(&mut owner, input)?;
        self.ensure_owner_email_free(&owner.email, None)?;
        self.db.insert_owner(&owner)?;
        tracing::info!(owner_id = %owner.owner_id, "owner created");
        Ok(owner)
    }

    pub fn update_owner(&self, owner_id: &str, input: OwnerInput) -> ServiceResult<PetOwner> {
        let mut owner = self.get_owner(owner_id)?;
        apply_owner_input(&mut owner, input)?;
        self.ensure_owner_email_free(&owner.email, Some(owner_id))?;
        owner.updated_at = now_stamp();
        self.db.update_owner(&owner)?;
        Ok(owner)
    }

    pub fn get_owner(&self, owner_id: &str) -> ServiceResult<PetOwner> {
        self.db
            .get_owner(owner_id)?
            .ok_or_else(|| ServiceError::not_found("owner", owner_id))
    }

    /// Active owners whose first or last name starts with `query`.
    pub fn search_owners(&self, query: &str) -> ServiceResult<Vec<PetOwner>> {
        Ok(self.db.search_owners(query.trim(), SEARCH_LIMIT)?)
    }

    /// Retire an owner. Refused while the owner still has active pets.
    pub fn retire_owner(&self, owner_id: &str) -> ServiceResult<PetOwner> {
        let mut owner = self.get_owner(owner_id)?;
        if !owner.status.is_active() {
            return Ok(owner);
        }
        let pets = self.db.count_active_pets_for_owner(owner_id)?;
        if pets > 0 {
            return Err(retire_refused("owner", owner_id, pets, "active pets"));
        }
        self.db.set_owner_status(owner_id, RecordStatus::Retired)?;
        owner.status = RecordStatus::Retired;
        tracing::info!(owner_id, "owner retired");
        Ok(owner)
    }

    pub fn reactivate_owner(&self, owner_id: &str) -> ServiceResult<PetOwner> {
        let mut owner = self.get_owner(owner_id)?;
        self.db.set_owner_status(owner_id, RecordStatus::Active)?;
        owner.status = RecordStatus::Active;
        Ok(owner)
    }

    fn ensure_owner_email_free(&self, email: &str, owner_id: Option<&str>) -> ServiceResult<()> {
        match self.db.find_owner_by_email(email)? {
            Some(existing) if Some(existing.owner_id.as_str()) != owner_id => Err(
                ServiceError::Conflict(format!("an owner with email {} already exists", email)),
            ),
            _ => Ok(()),
        }
    }

    // =========================================================================
    // Pets
    // =========================================================================

    pub fn create_pet(&self, input: PetInput) -> ServiceResult<Pet> {
        let mut pet = Pet::new(String::new(), String::new(), String::new());
        self.apply_pet_input(&mut pet, input)?;
        self.db.insert_pet(&pet)?;
        tracing::info!(pet_id = %pet.pet_id, owner_id = %pet.owner_id, "pet registered");
        Ok(pet)
    }

    pub fn update_pet(&self, pet_id: &str, input: PetInput) -> ServiceResult<Pet> {
        let mut pet = self.get_pet(pet_id)?;
        self.apply_pet_input(&mut pet, input)?;
        pet.updated_at = now_stamp();
        self.db.update_pet(&pet)?;
        Ok(pet)
    }

    pub fn get_pet(&self, pet_id: &str) -> ServiceResult<Pet> {
        self.db
            .get_pet(pet_id)?
            .ok_or_else(|| ServiceError::not_found("pet", pet_id))
    }

    pub fn list_pets_for_owner(
        &self,
        owner_id: &str,
        include_retired: bool,
    ) -> ServiceResult<Vec<Pet>> {
        self.get_owner(owner_id)?;
        Ok(self.db.list_pets_for_owner(owner_id, include_retired)?)
    }

    /// Active pets whose name starts with `query`.
    pub fn search_pets(&self, query: &str) -> ServiceResult<Vec<Pet>> {
        Ok(self.db.search_pets(query.trim(), SEARCH_LIMIT)?)
    }

    /// Human readable age of a pet as of `on`.
    pub fn pet_age(&self, pet_id: &str, on: NaiveDate) -> ServiceResult<String> {
        Ok(self.get_pet(pet_id)?.age_display(on))
    }

    /// Retire a pet. Refused while it has upcoming scheduled or confirmed
    /// appointments.
    pub fn retire_pet(&self, pet_id: &str) -> ServiceResult<Pet> {
        let mut pet = self.get_pet(pet_id)?;
        if !pet.status.is_active() {
            return Ok(pet);
        }
        let upcoming = self
            .db
            .count_pending_appointments_for_pet(pet_id, Utc::now())?;
        if upcoming > 0 {
            return Err(retire_refused("pet", pet_id, upcoming, "upcoming appointments"));
        }
        self.db.set_pet_status(pet_id, RecordStatus::Retired)?;
        pet.status = RecordStatus::Retired;
        tracing::info!(pet_id, "pet retired");
        Ok(pet)
    }

    /// Bring a retired pet back. The owner must be active.
    pub fn reactivate_pet(&self, pet_id: &str) -> ServiceResult<Pet> {
        let mut pet = self.get_pet(pet_id)?;
        if !self.get_owner(&pet.owner_id)?.status.is_active() {
            return Err(ServiceError::Conflict(format!(
                "owner {} of pet {} is retired",
                pet.owner_id, pet_id
            )));
        }
        self.db.set_pet_status(pet_id, RecordStatus::Active)?;
        pet.status = RecordStatus::Active;
        Ok(pet)
    }

    /// Permanently remove a pet that has no appointments, vaccinations or
    /// medical record.
    pub fn delete_pet(&self, pet_id: &str) -> ServiceResult<()> {
        let tx = self.db.immediate_transaction()?;
        self.get_pet(pet_id)?;
        let dependents = self.db.count_pet_dependents(pet_id)?;
        if !dependents.is_empty() {
            return Err(ServiceError::Conflict(format!(
                "pet {} has history ({} appointments, {} vaccinations, {} medical records); retire it instead",
                pet_id, dependents.appointments, dependents.vaccinations, dependents.medical_records
            )));
        }
        self.db.delete_pet(pet_id)?;
        tx.commit()?;
        tracing::info!(pet_id, "pet deleted");
        Ok(())
    }

    fn apply_pet_input(&self, pet: &mut Pet, input: PetInput) -> ServiceResult<()> {
        let name = validation::required_text("name", &input.name, MAX_NAME_LEN)?;
        let species = validation::required_text("species", &input.species, MAX_NAME_LEN)?;
        let breed = validation::optional_text("breed", input.breed.as_deref(), MAX_NAME_LEN)?;
        let sex = validation::optional_text("sex", input.sex.as_deref(), MAX_NAME_LEN)?;
        let date_of_birth = validation::not_in_future(
            "date_of_birth",
            input.date_of_birth,
            Utc::now().date_naive(),
        )?;
        if let Some(weight) = input.weight_kg {
            if !(weight > 0.0 && weight.is_finite()) {
                return Err(ServiceError::Validation("weight_kg must be positive".into()));
            }
        }

        if pet.owner_id.is_empty() || input.owner_id != pet.owner_id {
            let owner = self.get_owner(&input.owner_id)?;
            if !owner.status.is_active() {
                return Err(ServiceError::Validation(format!(
                    "owner {} is retired",
                    input.owner_id
                )));
            }
        }

        pet.owner_id = input.owner_id;
        pet.name = name;
        pet.species = species;
        pet.breed = breed;
        pet.sex = sex;
        pet.date_of_birth = date_of_birth;
        pet.weight_kg = input.weight_kg;
        Ok(())
    }
}

pub(super) fn retire_refused(kind: &str, id: &str, count: i64, what: &str) -> ServiceError {
    ServiceError::Conflict(format!(
        "cannot retire {} {}: {} {} still reference it",
        kind, id, count, what
    ))
}

fn apply_clinic_input(clinic: &mut Clinic, input: ClinicInput) -> ServiceResult<()> {
    clinic.name = validation::required_text("name", &input.name, MAX_NAME_LEN)?;
    clinic.address = validation::optional_text("address", input.address.as_deref(), MAX_NOTES_LEN)?;
    clinic.phone = validation::optional_text("phone", input.phone.as_deref(), MAX_NAME_LEN)?;
    clinic.email = match input.email.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(email) => Some(validation::email("email", email)?),
    };
    Ok(())
}

fn apply_owner_input(owner: &mut PetOwner, input: OwnerInput) -> ServiceResult<()> {
    owner.first_name = validation::required_text("first_name", &input.first_name, MAX_NAME_LEN)?;
    owner.last_name = validation::required_text("last_name", &input.last_name, MAX_NAME_LEN)?;
    owner.email = validation::email("email", &input.email)?;
    owner.phone = validation::optional_text("phone", input.phone.as_deref(), MAX_NAME_LEN)?;
    owner.address = validation::optional_text("address", input.address.as_deref(), MAX_NOTES_LEN)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner_input(email: &str) -> OwnerInput {
        OwnerInput {
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            email: email.into(),
            ..Default::default()
        }
    }

    fn pet_input(owner_id: &str) -> PetInput {
        PetInput {
            owner_id: owner_id.into(),
            name: "Rex".into(),
            species: "canine".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_owner_email_is_unique() {
        let db = Database::open_in_memory().unwrap();
        let dir = Directory::new(&db);

        dir.create_owner(owner_input("ana@example.com")).unwrap();
        let err = dir.create_owner(owner_input("ANA@example.com")).unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn test_update_owner_keeps_own_email() {
        let db = Database::open_in_memory().unwrap();
        let dir = Directory::new(&db);

        let owner = dir.create_owner(owner_input("ana@example.com")).unwrap();
        let mut input = owner_input("ana@example.com");
        input.phone = Some("555-0100".into());
        let updated = dir.update_owner(&owner.owner_id, input).unwrap();
        assert_eq!(updated.phone.as_deref(), Some("555-0100"));
    }

    #[test]
    fn test_pet_requires_active_owner() {
        let db = Database::open_in_memory().unwrap();
        let dir = Directory::new(&db);

        let owner = dir.create_owner(owner_input("ana@example.com")).unwrap();
        dir.retire_owner(&owner.owner_id).unwrap();

        let err = dir.create_pet(pet_input(&owner.owner_id)).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let err = dir.create_pet(pet_input("missing")).unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test]
    fn test_pet_input_validation() {
        let db = Database::open_in_memory().unwrap();
        let dir = Directory::new(&db);
        let owner = dir.create_owner(owner_input("ana@example.com")).unwrap();

        let mut input = pet_input(&owner.owner_id);
        input.date_of_birth = Some(Utc::now().date_naive() + chrono::Duration::days(2));
        assert!(matches!(dir.create_pet(input), Err(ServiceError::Validation(_))));

        let mut input = pet_input(&owner.owner_id);
        input.weight_kg = Some(0.0);
        assert!(matches!(dir.create_pet(input), Err(ServiceError::Validation(_))));

        let mut input = pet_input(&owner.owner_id);
        input.species = "  ".into();
        assert!(matches!(dir.create_pet(input), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn test_owner_retire_guard() {
        let db = Database::open_in_memory().unwrap();
        let dir = Directory::new(&db);
        let owner = dir.create_owner(owner_input("ana@example.com")).unwrap();
        let pet = dir.create_pet(pet_input(&owner.owner_id)).unwrap();

        assert!(matches!(
            dir.retire_owner(&owner.owner_id),
            Err(ServiceError::Conflict(_))
        ));

        dir.retire_pet(&pet.pet_id).unwrap();
        let retired = dir.retire_owner(&owner.owner_id).unwrap();
        assert_eq!(retired.status, RecordStatus::Retired);

        // Retiring twice is a no-op
        assert!(dir.retire_owner(&owner.owner_id).is_ok());

        // A pet cannot come back while its owner is retired
        assert!(matches!(dir.reactivate_pet(&pet.pet_id), Err(ServiceError::Conflict(_))));
        dir.reactivate_owner(&owner.owner_id).unwrap();
        assert!(dir.reactivate_pet(&pet.pet_id).unwrap().status.is_active());
    }

    #[test]
    fn test_delete_pet_without_history() {
        let db = Database::open_in_memory().unwrap();
        let dir = Directory::new(&db);
        let owner = dir.create_owner(owner_input("ana@example.com")).unwrap();
        let pet = dir.create_pet(pet_input(&owner.owner_id)).unwrap();

        dir.delete_pet(&pet.pet_id).unwrap();
        assert!(matches!(dir.get_pet(&pet.pet_id), Err(ServiceError::NotFound(_))));
        assert!(matches!(dir.delete_pet(&pet.pet_id), Err(ServiceError::NotFound(_))));
    }

    #[test]
    fn test_pet_age() {
        let db = Database::open_in_memory().unwrap();
        let dir = Directory::new(&db);
        let owner = dir.create_owner(owner_input("ana@example.com")).unwrap();

        let mut input = pet_input(&owner.owner_id);
        input.date_of_birth = NaiveDate::from_ymd_opt(2021, 3, 15);
        let pet = dir.create_pet(input).unwrap();

        let on = NaiveDate::from_ymd_opt(2023, 6, 20).unwrap();
        assert_eq!(dir.pet_age(&pet.pet_id, on).unwrap(), "2 years, 3 months");

        let unknown = dir.create_pet(pet_input(&owner.owner_id)).unwrap();
        assert_eq!(dir.pet_age(&unknown.pet_id, on).unwrap(), "unknown");
    }

    #[test]
    fn test_clinic_lifecycle() {
        let db = Database::open_in_memory().unwrap();
        let dir = Directory::new(&db);

        let clinic = dir
            .create_clinic(ClinicInput {
                name: "Downtown".into(),
                email: Some("front@downtown.example".into()),
                ..Default::default()
            })
            .unwrap();
        assert!(dir
            .create_clinic(ClinicInput {
                name: "Bad".into(),
                email: Some("not-an-email".into()),
                ..Default::default()
            })
            .is_err());

        dir.retire_clinic(&clinic.clinic_id).unwrap();
        assert!(dir.list_clinics(false).unwrap().is_empty());
        assert_eq!(dir.list_clinics(true).unwrap().len(), 1);
    }
}
