//! Staff accounts, veterinarian profiles and specialties.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::directory::{retire_refused, Directory};
use crate::auth::{AuthContext, Authenticator};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    now_stamp, RecordStatus, Specialty, User, UserRole, Veterinarian, VeterinarianDetails,
};
use crate::validation::{self, MAX_NAME_LEN, MAX_NOTES_LEN};

/// Specialty fields accepted on create and update.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SpecialtyInput {
    pub name: String,
    pub description: Option<String>,
}

/// A staff account to be created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    pub clinic_id: Option<String>,
}

/// Veterinarian profile fields layered on a [`NewUser`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct VeterinarianProfile {
    pub specialty_id: Option<String>,
    pub license_number: Option<String>,
}

const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];

impl<'a> Directory<'a> {
    // =========================================================================
    // Specialties
    // =========================================================================

    pub fn create_specialty(&self, input: SpecialtyInput) -> ServiceResult<Specialty> {
        let mut specialty = Specialty::new(String::new());
        apply_specialty_input(&mut specialty, input)?;
        self.ensure_specialty_name_free(&specialty.name, None)?;
        self.db.insert_specialty(&specialty)?;
        tracing::info!(specialty_id = %specialty.specialty_id, name = %specialty.name, "specialty created");
        Ok(specialty)
    }

    pub fn update_specialty(
        &self,
        specialty_id: &str,
        input: SpecialtyInput,
    ) -> ServiceResult<Specialty> {
        let mut specialty = self.get_specialty(specialty_id)?;
        apply_specialty_input(&mut specialty, input)?;
        self.ensure_specialty_name_free(&specialty.name, Some(specialty_id))?;
        specialty.updated_at = now_stamp();
        self.db.update_specialty(&specialty)?;
        Ok(specialty)
    }

    pub fn get_specialty(&self, specialty_id: &str) -> ServiceResult<Specialty> {
        self.db
            .get_specialty(specialty_id)?
            .ok_or_else(|| ServiceError::not_found("specialty", specialty_id))
    }

    pub fn list_specialties(&self, include_retired: bool) -> ServiceResult<Vec<Specialty>> {
        Ok(self.db.list_specialties(include_retired)?)
    }

    /// Retire a specialty. Refused while active veterinarians hold it.
    pub fn retire_specialty(&self, specialty_id: &str) -> ServiceResult<Specialty> {
        let mut specialty = self.get_specialty(specialty_id)?;
        if !specialty.status.is_active() {
            return Ok(specialty);
        }
        let vets = self
            .db
            .count_active_veterinarians_with_specialty(specialty_id)?;
        if vets > 0 {
            return Err(retire_refused("specialty", specialty_id, vets, "active veterinarians"));
        }
        self.db
            .set_specialty_status(specialty_id, RecordStatus::Retired)?;
        specialty.status = RecordStatus::Retired;
        tracing::info!(specialty_id, "specialty retired");
        Ok(specialty)
    }

    pub fn reactivate_specialty(&self, specialty_id: &str) -> ServiceResult<Specialty> {
        let mut specialty = self.get_specialty(specialty_id)?;
        self.db
            .set_specialty_status(specialty_id, RecordStatus::Active)?;
        specialty.status = RecordStatus::Active;
        Ok(specialty)
    }

    fn ensure_specialty_name_free(&self, name: &str, specialty_id: Option<&str>) -> ServiceResult<()> {
        match self.db.find_specialty_by_name(name)? {
            Some(existing) if Some(existing.specialty_id.as_str()) != specialty_id => Err(
                ServiceError::Conflict(format!("specialty {} already exists", name)),
            ),
            _ => Ok(()),
        }
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Create the first administrator of an empty installation. Refused once
    /// any account exists.
    pub fn bootstrap_admin(&self, mut request: NewUser) -> ServiceResult<User> {
        let tx = self.db.immediate_transaction()?;
        if !self.db.list_users(true)?.is_empty() {
            return Err(ServiceError::Forbidden(
                "staff accounts already exist; ask an administrator".into(),
            ));
        }
        request.role = UserRole::Admin;
        let user = self.insert_new_user(request)?;
        tx.commit()?;
        tracing::info!(user_id = %user.user_id, "initial administrator created");
        Ok(user)
    }

    /// Create a staff account. Administrators only.
    pub fn create_user(&self, ctx: &AuthContext, request: NewUser) -> ServiceResult<User> {
        ctx.require_role(ADMIN_ONLY)?;
        if request.role == UserRole::Veterinarian {
            return self
                .create_veterinarian(ctx, request, VeterinarianProfile::default())
                .map(|vet| vet.user);
        }
        let user = self.insert_new_user(request)?;
        tracing::info!(user_id = %user.user_id, role = %user.role, created_by = %ctx.user_id, "user created");
        Ok(user)
    }

    /// Create a user with the veterinarian role together with its profile.
    pub fn create_veterinarian(
        &self,
        ctx: &AuthContext,
        mut request: NewUser,
        profile: VeterinarianProfile,
    ) -> ServiceResult<VeterinarianDetails> {
        ctx.require_role(ADMIN_ONLY)?;
        request.role = UserRole::Veterinarian;
        let license_number = validation::optional_text(
            "license_number",
            profile.license_number.as_deref(),
            MAX_NAME_LEN,
        )?;

        let tx = self.db.immediate_transaction()?;
        if let Some(specialty_id) = &profile.specialty_id {
            self.ensure_specialty_assignable(specialty_id)?;
        }
        let user = self.insert_new_user(request)?;
        self.db.insert_veterinarian(&Veterinarian {
            user_id: user.user_id.clone(),
            specialty_id: profile.specialty_id,
            license_number,
        })?;
        tx.commit()?;

        tracing::info!(user_id = %user.user_id, created_by = %ctx.user_id, "veterinarian created");
        self.get_veterinarian(&user.user_id)
    }

    /// Set or clear the specialty of a veterinarian.
    pub fn assign_specialty(
        &self,
        ctx: &AuthContext,
        veterinarian_id: &str,
        specialty_id: Option<&str>,
    ) -> ServiceResult<VeterinarianDetails> {
        ctx.require_role(ADMIN_ONLY)?;
        self.get_veterinarian(veterinarian_id)?;
        if let Some(specialty_id) = specialty_id {
            self.ensure_specialty_assignable(specialty_id)?;
        }
        self.db
            .set_veterinarian_specialty(veterinarian_id, specialty_id)?;
        tracing::info!(veterinarian_id, specialty_id = ?specialty_id, "specialty assigned");
        self.get_veterinarian(veterinarian_id)
    }

    pub fn get_user(&self, user_id: &str) -> ServiceResult<User> {
        self.db
            .get_user(user_id)?
            .ok_or_else(|| ServiceError::not_found("user", user_id))
    }

    pub fn list_users(&self, include_retired: bool) -> ServiceResult<Vec<User>> {
        Ok(self.db.list_users(include_retired)?)
    }

    pub fn get_veterinarian(&self, veterinarian_id: &str) -> ServiceResult<VeterinarianDetails> {
        self.db
            .get_veterinarian(veterinarian_id)?
            .ok_or_else(|| ServiceError::not_found("veterinarian", veterinarian_id))
    }

    pub fn list_veterinarians(&self) -> ServiceResult<Vec<VeterinarianDetails>> {
        Ok(self.db.list_active_veterinarians()?)
    }

    /// Retire a staff account and close its sessions. Veterinarians with
    /// upcoming scheduled or confirmed appointments cannot be retired.
    pub fn retire_user(&self, ctx: &AuthContext, user_id: &str) -> ServiceResult<User> {
        ctx.require_role(ADMIN_ONLY)?;
        if ctx.user_id == user_id {
            return Err(ServiceError::Conflict("cannot retire your own account".into()));
        }
        let mut user = self.get_user(user_id)?;
        if !user.status.is_active() {
            return Ok(user);
        }
        if user.role == UserRole::Veterinarian {
            let upcoming = self
                .db
                .count_pending_appointments_for_veterinarian(user_id, Utc::now())?;
            if upcoming > 0 {
                return Err(retire_refused("veterinarian", user_id, upcoming, "upcoming appointments"));
            }
        }
        self.db.set_user_status(user_id, RecordStatus::Retired)?;
        let closed = self.db.delete_sessions_for_user(user_id)?;
        user.status = RecordStatus::Retired;
        tracing::info!(user_id, closed_sessions = closed, retired_by = %ctx.user_id, "user retired");
        Ok(user)
    }

    pub fn reactivate_user(&self, ctx: &AuthContext, user_id: &str) -> ServiceResult<User> {
        ctx.require_role(ADMIN_ONLY)?;
        let mut user = self.get_user(user_id)?;
        self.db.set_user_status(user_id, RecordStatus::Active)?;
        user.status = RecordStatus::Active;
        Ok(user)
    }

    fn insert_new_user(&self, request: NewUser) -> ServiceResult<User> {
        let username = validation::required_text("username", &request.username, MAX_NAME_LEN)?;
        let email = validation::email("email", &request.email)?;
        let first_name = validation::required_text("first_name", &request.first_name, MAX_NAME_LEN)?;
        let last_name = validation::required_text("last_name", &request.last_name, MAX_NAME_LEN)?;
        let (password_hash, password_salt) = Authenticator::new(self.db)
            .with_config(self.auth.clone())
            .digest_password(&request.password)?;

        if self.db.find_user_by_username(&username)?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "username {} is already taken",
                username
            )));
        }
        if self.db.find_user_by_email(&email)?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "a user with email {} already exists",
                email
            )));
        }
        if let Some(clinic_id) = &request.clinic_id {
            let clinic = self.get_clinic(clinic_id)?;
            if !clinic.status.is_active() {
                return Err(ServiceError::Validation(format!("clinic {} is retired", clinic_id)));
            }
        }

        let mut user = User::new(username, email, first_name, last_name, request.role);
        user.clinic_id = request.clinic_id;
        user.password_hash = password_hash;
        user.password_salt = password_salt;
        self.db.insert_user(&user)?;
        Ok(user)
    }

    fn ensure_specialty_assignable(&self, specialty_id: &str) -> ServiceResult<()> {
        if !self.get_specialty(specialty_id)?.status.is_active() {
            return Err(ServiceError::Validation(format!(
                "specialty {} is retired",
                specialty_id
            )));
        }
        Ok(())
    }
}

fn apply_specialty_input(specialty: &mut Specialty, input: SpecialtyInput) -> ServiceResult<()> {
    specialty.name = validation::required_text("name", &input.name, MAX_NAME_LEN)?;
    specialty.description =
        validation::optional_text("description", input.description.as_deref(), MAX_NOTES_LEN)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn new_user(username: &str, role: UserRole) -> NewUser {
        NewUser {
            username: username.into(),
            email: format!("{}@clinic.example", username),
            password: "long-enough".into(),
            first_name: "Lee".into(),
            last_name: "Park".into(),
            role,
            clinic_id: None,
        }
    }

    fn admin_ctx(user: &User) -> AuthContext {
        AuthContext {
            user_id: user.user_id.clone(),
            username: user.username.clone(),
            role: user.role,
        }
    }

    #[test]
    fn test_bootstrap_only_once() {
        let db = Database::open_in_memory().unwrap();
        let dir = Directory::new(&db);

        let admin = dir.bootstrap_admin(new_user("root", UserRole::Receptionist)).unwrap();
        assert_eq!(admin.role, UserRole::Admin);
        assert!(matches!(
            dir.bootstrap_admin(new_user("root2", UserRole::Admin)),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn test_create_user_requires_admin() {
        let db = Database::open_in_memory().unwrap();
        let dir = Directory::new(&db);
        let admin = dir.bootstrap_admin(new_user("root", UserRole::Admin)).unwrap();

        let desk = dir
            .create_user(&admin_ctx(&admin), new_user("desk", UserRole::Receptionist))
            .unwrap();
        let err = dir
            .create_user(&admin_ctx(&desk), new_user("desk2", UserRole::Receptionist))
            .unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[test]
    fn test_duplicate_username_and_short_password() {
        let db = Database::open_in_memory().unwrap();
        let dir = Directory::new(&db);
        let admin = dir.bootstrap_admin(new_user("root", UserRole::Admin)).unwrap();
        let ctx = admin_ctx(&admin);

        let mut dup = new_user("ROOT", UserRole::Receptionist);
        dup.email = "other@clinic.example".into();
        assert!(matches!(dir.create_user(&ctx, dup), Err(ServiceError::Conflict(_))));

        let mut short = new_user("desk", UserRole::Receptionist);
        short.password = "short".into();
        assert!(matches!(dir.create_user(&ctx, short), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn test_veterinarian_with_specialty() {
        let db = Database::open_in_memory().unwrap();
        let dir = Directory::new(&db);
        let admin = dir.bootstrap_admin(new_user("root", UserRole::Admin)).unwrap();
        let ctx = admin_ctx(&admin);

        let derm = dir
            .create_specialty(SpecialtyInput {
                name: "Dermatology".into(),
                description: None,
            })
            .unwrap();
        let vet = dir
            .create_veterinarian(
                &ctx,
                new_user("house", UserRole::Receptionist),
                VeterinarianProfile {
                    specialty_id: Some(derm.specialty_id.clone()),
                    license_number: Some("VET-123".into()),
                },
            )
            .unwrap();
        assert_eq!(vet.user.role, UserRole::Veterinarian);
        assert_eq!(vet.specialty_name.as_deref(), Some("Dermatology"));
        assert_eq!(vet.display_name(), "Dr. Lee Park");

        assert!(matches!(
            dir.retire_specialty(&derm.specialty_id),
            Err(ServiceError::Conflict(_))
        ));
        dir.assign_specialty(&ctx, &vet.user.user_id, None).unwrap();
        dir.retire_specialty(&derm.specialty_id).unwrap();

        assert!(matches!(
            dir.assign_specialty(&ctx, &vet.user.user_id, Some(&derm.specialty_id)),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn test_specialty_names_unique() {
        let db = Database::open_in_memory().unwrap();
        let dir = Directory::new(&db);
        dir.create_specialty(SpecialtyInput {
            name: "Surgery".into(),
            description: None,
        })
        .unwrap();
        let err = dir
            .create_specialty(SpecialtyInput {
                name: "surgery".into(),
                description: None,
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn test_cannot_retire_self() {
        let db = Database::open_in_memory().unwrap();
        let dir = Directory::new(&db);
        let admin = dir.bootstrap_admin(new_user("root", UserRole::Admin)).unwrap();
        assert!(dir.retire_user(&admin_ctx(&admin), &admin.user_id).is_err());
    }
}
