//! VetScan Core Library
//!
//! Local-first veterinary clinic management: client and patient directory,
//! staff accounts, appointment booking and clinical records on SQLite.
//!
//! # Architecture
//!
//! ```text
//!   host app (Swift / Kotlin via UniFFI)
//!                  │ token + request
//!                  ▼
//!            VetScanCore ── authenticate ──► AuthContext
//!                  │
//!      ┌───────────┼──────────────┬───────────────┐
//!      ▼           ▼              ▼               ▼
//!  Directory  AppointmentScheduler ClinicalRecords Exporters
//!                  │
//!          ConflictChecker  (IMMEDIATE transaction)
//!                  │
//!                  ▼
//!               Database
//! ```
//!
//! # Core Principle
//!
//! **A veterinarian is never double-booked.** Every create and edit of an
//! appointment runs the overlap check and the write under one write lock.
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer
//! - [`models`]: Domain types (Pet, Appointment, User, etc.)
//! - [`scheduling`]: Conflict checker and appointment scheduler
//! - [`service`]: Directory and clinical-record services
//! - [`auth`]: Password digests, sessions and roles
//! - [`export`]: Schedule and vaccination reports
//! - [`config`]: TOML configuration
//! - [`logging`]: `tracing` subscriber setup for host apps

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
mod ffi;
pub mod logging;
pub mod models;
pub mod scheduling;
pub mod service;
pub mod validation;

// Re-export commonly used types
pub use auth::{AuthContext, Authenticator, Session};
pub use config::ClinicConfig;
pub use db::Database;
pub use error::{ServiceError, ServiceResult};
pub use ffi::*;
pub use models::{
    Appointment, AppointmentStatus, Clinic, Pet, PetOwner, RecordStatus, Specialty, User,
    UserRole,
};
pub use scheduling::{AppointmentScheduler, ConflictChecker, TimeWindow};
pub use service::{ClinicalRecords, Directory};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use export::{ScheduleExporter, VaccinationExporter};
use ffi::{parse_date, parse_timestamp};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum VetScanError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<ServiceError> for VetScanError {
    fn from(e: ServiceError) -> Self {
        let message = e.to_string();
        match e {
            ServiceError::Validation(m) => VetScanError::Validation(m),
            ServiceError::SchedulingConflict { .. } => VetScanError::Conflict(message),
            ServiceError::Conflict(m) => VetScanError::Conflict(m),
            ServiceError::NotFound(m) => VetScanError::NotFound(m),
            ServiceError::Unauthorized(m) => VetScanError::Unauthorized(m),
            ServiceError::Forbidden(m) => VetScanError::Forbidden(m),
            ServiceError::Database(_) => VetScanError::Database(message),
        }
    }
}

impl From<db::DbError> for VetScanError {
    fn from(e: db::DbError) -> Self {
        ServiceError::from(e).into()
    }
}

impl From<serde_json::Error> for VetScanError {
    fn from(e: serde_json::Error) -> Self {
        VetScanError::Serialization(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for VetScanError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        VetScanError::Database(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path with default settings.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<VetScanCore>, VetScanError> {
    let config = ClinicConfig {
        database_path: path.into(),
        ..ClinicConfig::default()
    };
    VetScanCore::open(config)
}

/// Load a TOML configuration file and open the database it names.
#[uniffi::export]
pub fn open_database_with_config(config_path: String) -> Result<Arc<VetScanCore>, VetScanError> {
    let config = ClinicConfig::load(&config_path)
        .map_err(|e| VetScanError::Validation(format!("{:#}", e)))?;
    VetScanCore::open(config)
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<VetScanCore>, VetScanError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(VetScanCore {
        db: Arc::new(Mutex::new(db)),
        config: ClinicConfig::default(),
    }))
}

/// Install a `tracing` subscriber writing to stderr. Returns false when one
/// is already installed.
#[uniffi::export]
pub fn init_logging(filter: String) -> bool {
    logging::init_tracing(&filter)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
///
/// Every call except login and bootstrap takes the caller's session token.
#[derive(uniffi::Object)]
pub struct VetScanCore {
    db: Arc<Mutex<Database>>,
    config: ClinicConfig,
}

const ANY_STAFF: &[UserRole] = &[UserRole::Admin, UserRole::Receptionist, UserRole::Veterinarian];
const CLINICIANS: &[UserRole] = &[UserRole::Admin, UserRole::Veterinarian];

impl VetScanCore {
    fn open(config: ClinicConfig) -> Result<Arc<Self>, VetScanError> {
        let db = Database::open(&config.database_path)?;
        tracing::info!(path = %config.database_path.display(), "database opened");
        Ok(Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        }))
    }

    fn authenticator<'a>(&self, db: &'a Database) -> Authenticator<'a> {
        Authenticator::new(db).with_config(self.config.auth.clone())
    }

    fn scheduler<'a>(&self, db: &'a Database) -> AppointmentScheduler<'a> {
        AppointmentScheduler::new(db).with_config(self.config.scheduling.clone())
    }

    fn directory<'a>(&self, db: &'a Database) -> Directory<'a> {
        Directory::new(db).with_auth_config(self.config.auth.clone())
    }

    /// Lock the database and resolve the token, requiring one of `roles`.
    fn authorize(
        &self,
        token: &str,
        roles: &[UserRole],
    ) -> Result<(MutexGuard<'_, Database>, AuthContext), VetScanError> {
        let db = self.db.lock()?;
        let ctx = self.authenticator(&db).authenticate(token)?;
        ctx.require_role(roles)?;
        Ok((db, ctx))
    }
}

#[uniffi::export]
impl VetScanCore {
    // =========================================================================
    // Authentication
    // =========================================================================

    /// Create the first administrator. Fails once any account exists.
    pub fn bootstrap_admin(&self, user: FfiNewUser) -> Result<FfiUser, VetScanError> {
        let db = self.db.lock()?;
        let request = user.into_request()?;
        Ok(self.directory(&db).bootstrap_admin(request)?.into())
    }

    /// Exchange credentials for a session token.
    pub fn login(&self, username: String, password: String) -> Result<FfiSession, VetScanError> {
        let db = self.db.lock()?;
        Ok(self.authenticator(&db).login(&username, &password)?.into())
    }

    pub fn logout(&self, token: String) -> Result<(), VetScanError> {
        let db = self.db.lock()?;
        Ok(self.authenticator(&db).logout(&token)?)
    }

    /// Identity behind a token.
    pub fn whoami(&self, token: String) -> Result<FfiAuthContext, VetScanError> {
        let (_db, ctx) = self.authorize(&token, ANY_STAFF)?;
        Ok(ctx.into())
    }

    pub fn change_password(
        &self,
        token: String,
        current_password: String,
        new_password: String,
    ) -> Result<(), VetScanError> {
        let (db, ctx) = self.authorize(&token, ANY_STAFF)?;
        Ok(self
            .authenticator(&db)
            .change_password(&ctx, &current_password, &new_password)?)
    }

    /// Drop expired sessions. Returns how many were removed.
    pub fn purge_expired_sessions(&self, token: String) -> Result<u32, VetScanError> {
        let (db, _) = self.authorize(&token, &[UserRole::Admin])?;
        let purged = db.purge_expired_sessions(Utc::now())?;
        Ok(purged as u32)
    }

    // =========================================================================
    // Appointment Operations
    // =========================================================================

    /// Book an appointment after checking the veterinarian is free.
    pub fn create_appointment(
        &self,
        token: String,
        appointment: FfiNewAppointment,
    ) -> Result<FfiAppointment, VetScanError> {
        let (db, ctx) = self.authorize(&token, ANY_STAFF)?;
        let request = appointment.into_request()?;
        let appt = self.scheduler(&db).create_appointment(request)?;
        tracing::debug!(user_id = %ctx.user_id, appointment_id = %appt.appointment_id, "booked via ffi");
        Ok(appt.into())
    }

    /// Edit an appointment. Timing changes are re-checked for conflicts.
    pub fn update_appointment(
        &self,
        token: String,
        appointment_id: String,
        update: FfiAppointmentUpdate,
    ) -> Result<FfiAppointment, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let update = update.into_update()?;
        Ok(self
            .scheduler(&db)
            .update_appointment(&appointment_id, update)?
            .into())
    }

    /// Check whether a veterinarian is free for a window without booking.
    pub fn check_availability(
        &self,
        token: String,
        veterinarian_id: String,
        start_time: String,
        duration_minutes: i64,
        exclude_appointment_id: Option<String>,
    ) -> Result<(), VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let start = parse_timestamp("start_time", &start_time)?;
        ConflictChecker::new(&db)
            .with_max_duration(self.config.scheduling.max_duration_minutes)
            .ensure_available(
                &veterinarian_id,
                start,
                duration_minutes,
                exclude_appointment_id.as_deref(),
            )?;
        Ok(())
    }

    pub fn get_appointment(
        &self,
        token: String,
        appointment_id: String,
    ) -> Result<FfiAppointment, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        Ok(self.scheduler(&db).get_appointment(&appointment_id)?.into())
    }

    pub fn delete_appointment(&self, token: String, appointment_id: String) -> Result<(), VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        Ok(self.scheduler(&db).delete_appointment(&appointment_id)?)
    }

    /// Appointments of a veterinarian starting in `[from, to)`.
    pub fn list_appointments_for_veterinarian(
        &self,
        token: String,
        veterinarian_id: String,
        from: String,
        to: String,
    ) -> Result<Vec<FfiAppointment>, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let from = parse_timestamp("from", &from)?;
        let to = parse_timestamp("to", &to)?;
        let appts = self
            .scheduler(&db)
            .list_for_veterinarian(&veterinarian_id, from, to)?;
        Ok(appts.into_iter().map(|a| a.into()).collect())
    }

    /// Appointments of a veterinarian on a calendar day (`YYYY-MM-DD`, UTC).
    pub fn list_appointments_for_veterinarian_on(
        &self,
        token: String,
        veterinarian_id: String,
        day: String,
    ) -> Result<Vec<FfiAppointment>, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let day = parse_date("day", &day)?;
        let appts = self
            .scheduler(&db)
            .list_for_veterinarian_on(&veterinarian_id, day)?;
        Ok(appts.into_iter().map(|a| a.into()).collect())
    }

    pub fn list_appointments_for_pet(
        &self,
        token: String,
        pet_id: String,
    ) -> Result<Vec<FfiAppointment>, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let appts = self.scheduler(&db).list_for_pet(&pet_id)?;
        Ok(appts.into_iter().map(|a| a.into()).collect())
    }

    // =========================================================================
    // Clinic Operations
    // =========================================================================

    pub fn create_clinic(&self, token: String, clinic: FfiClinicInput) -> Result<FfiClinic, VetScanError> {
        let (db, _) = self.authorize(&token, &[UserRole::Admin])?;
        Ok(self.directory(&db).create_clinic(clinic.into())?.into())
    }

    pub fn update_clinic(
        &self,
        token: String,
        clinic_id: String,
        clinic: FfiClinicInput,
    ) -> Result<FfiClinic, VetScanError> {
        let (db, _) = self.authorize(&token, &[UserRole::Admin])?;
        Ok(self.directory(&db).update_clinic(&clinic_id, clinic.into())?.into())
    }

    pub fn get_clinic(&self, token: String, clinic_id: String) -> Result<FfiClinic, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        Ok(self.directory(&db).get_clinic(&clinic_id)?.into())
    }

    pub fn list_clinics(&self, token: String, include_retired: bool) -> Result<Vec<FfiClinic>, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let clinics = self.directory(&db).list_clinics(include_retired)?;
        Ok(clinics.into_iter().map(|c| c.into()).collect())
    }

    pub fn retire_clinic(&self, token: String, clinic_id: String) -> Result<FfiClinic, VetScanError> {
        let (db, _) = self.authorize(&token, &[UserRole::Admin])?;
        Ok(self.directory(&db).retire_clinic(&clinic_id)?.into())
    }

    pub fn reactivate_clinic(&self, token: String, clinic_id: String) -> Result<FfiClinic, VetScanError> {
        let (db, _) = self.authorize(&token, &[UserRole::Admin])?;
        Ok(self.directory(&db).reactivate_clinic(&clinic_id)?.into())
    }

    // =========================================================================
    // Owner Operations
    // =========================================================================

    pub fn create_owner(&self, token: String, owner: FfiOwnerInput) -> Result<FfiOwner, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        Ok(self.directory(&db).create_owner(owner.into())?.into())
    }

    pub fn update_owner(
        &self,
        token: String,
        owner_id: String,
        owner: FfiOwnerInput,
    ) -> Result<FfiOwner, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        Ok(self.directory(&db).update_owner(&owner_id, owner.into())?.into())
    }

    pub fn get_owner(&self, token: String, owner_id: String) -> Result<FfiOwner, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        Ok(self.directory(&db).get_owner(&owner_id)?.into())
    }

    pub fn search_owners(&self, token: String, query: String) -> Result<Vec<FfiOwner>, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let owners = self.directory(&db).search_owners(&query)?;
        Ok(owners.into_iter().map(|o| o.into()).collect())
    }

    pub fn retire_owner(&self, token: String, owner_id: String) -> Result<FfiOwner, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        Ok(self.directory(&db).retire_owner(&owner_id)?.into())
    }

    pub fn reactivate_owner(&self, token: String, owner_id: String) -> Result<FfiOwner, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        Ok(self.directory(&db).reactivate_owner(&owner_id)?.into())
    }

    // =========================================================================
    // Pet Operations
    // =========================================================================

    pub fn create_pet(&self, token: String, pet: FfiPetInput) -> Result<FfiPet, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let input = pet.into_input()?;
        Ok(self.directory(&db).create_pet(input)?.into())
    }

    pub fn update_pet(&self, token: String, pet_id: String, pet: FfiPetInput) -> Result<FfiPet, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let input = pet.into_input()?;
        Ok(self.directory(&db).update_pet(&pet_id, input)?.into())
    }

    pub fn get_pet(&self, token: String, pet_id: String) -> Result<FfiPet, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        Ok(self.directory(&db).get_pet(&pet_id)?.into())
    }

    pub fn list_pets_for_owner(
        &self,
        token: String,
        owner_id: String,
        include_retired: bool,
    ) -> Result<Vec<FfiPet>, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let pets = self.directory(&db).list_pets_for_owner(&owner_id, include_retired)?;
        Ok(pets.into_iter().map(|p| p.into()).collect())
    }

    pub fn search_pets(&self, token: String, query: String) -> Result<Vec<FfiPet>, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let pets = self.directory(&db).search_pets(&query)?;
        Ok(pets.into_iter().map(|p| p.into()).collect())
    }

    /// Age of a pet as display text, as of `on` (`YYYY-MM-DD`) or today.
    pub fn pet_age(&self, token: String, pet_id: String, on: Option<String>) -> Result<String, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let on = match on {
            Some(day) => parse_date("on", &day)?,
            None => Utc::now().date_naive(),
        };
        Ok(self.directory(&db).pet_age(&pet_id, on)?)
    }

    pub fn retire_pet(&self, token: String, pet_id: String) -> Result<FfiPet, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        Ok(self.directory(&db).retire_pet(&pet_id)?.into())
    }

    pub fn reactivate_pet(&self, token: String, pet_id: String) -> Result<FfiPet, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        Ok(self.directory(&db).reactivate_pet(&pet_id)?.into())
    }

    /// Permanently delete a pet that has no history.
    pub fn delete_pet(&self, token: String, pet_id: String) -> Result<(), VetScanError> {
        let (db, _) = self.authorize(&token, &[UserRole::Admin])?;
        Ok(self.directory(&db).delete_pet(&pet_id)?)
    }

    // =========================================================================
    // Staff Operations
    // =========================================================================

    pub fn create_specialty(
        &self,
        token: String,
        name: String,
        description: Option<String>,
    ) -> Result<FfiSpecialty, VetScanError> {
        let (db, _) = self.authorize(&token, &[UserRole::Admin])?;
        let input = service::SpecialtyInput { name, description };
        Ok(self.directory(&db).create_specialty(input)?.into())
    }

    pub fn update_specialty(
        &self,
        token: String,
        specialty_id: String,
        name: String,
        description: Option<String>,
    ) -> Result<FfiSpecialty, VetScanError> {
        let (db, _) = self.authorize(&token, &[UserRole::Admin])?;
        let input = service::SpecialtyInput { name, description };
        Ok(self.directory(&db).update_specialty(&specialty_id, input)?.into())
    }

    pub fn list_specialties(
        &self,
        token: String,
        include_retired: bool,
    ) -> Result<Vec<FfiSpecialty>, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let specialties = self.directory(&db).list_specialties(include_retired)?;
        Ok(specialties.into_iter().map(|s| s.into()).collect())
    }

    pub fn retire_specialty(&self, token: String, specialty_id: String) -> Result<FfiSpecialty, VetScanError> {
        let (db, _) = self.authorize(&token, &[UserRole::Admin])?;
        Ok(self.directory(&db).retire_specialty(&specialty_id)?.into())
    }

    pub fn reactivate_specialty(
        &self,
        token: String,
        specialty_id: String,
    ) -> Result<FfiSpecialty, VetScanError> {
        let (db, _) = self.authorize(&token, &[UserRole::Admin])?;
        Ok(self.directory(&db).reactivate_specialty(&specialty_id)?.into())
    }

    pub fn create_user(&self, token: String, user: FfiNewUser) -> Result<FfiUser, VetScanError> {
        let (db, ctx) = self.authorize(&token, ANY_STAFF)?;
        let request = user.into_request()?;
        Ok(self.directory(&db).create_user(&ctx, request)?.into())
    }

    pub fn create_veterinarian(
        &self,
        token: String,
        user: FfiNewUser,
        specialty_id: Option<String>,
        license_number: Option<String>,
    ) -> Result<FfiVeterinarian, VetScanError> {
        let (db, ctx) = self.authorize(&token, ANY_STAFF)?;
        let request = user.into_request()?;
        let profile = service::VeterinarianProfile {
            specialty_id,
            license_number,
        };
        Ok(self
            .directory(&db)
            .create_veterinarian(&ctx, request, profile)?
            .into())
    }

    pub fn assign_specialty(
        &self,
        token: String,
        veterinarian_id: String,
        specialty_id: Option<String>,
    ) -> Result<FfiVeterinarian, VetScanError> {
        let (db, ctx) = self.authorize(&token, ANY_STAFF)?;
        Ok(self
            .directory(&db)
            .assign_specialty(&ctx, &veterinarian_id, specialty_id.as_deref())?
            .into())
    }

    pub fn get_user(&self, token: String, user_id: String) -> Result<FfiUser, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        Ok(self.directory(&db).get_user(&user_id)?.into())
    }

    pub fn list_users(&self, token: String, include_retired: bool) -> Result<Vec<FfiUser>, VetScanError> {
        let (db, _) = self.authorize(&token, &[UserRole::Admin])?;
        let users = self.directory(&db).list_users(include_retired)?;
        Ok(users.into_iter().map(|u| u.into()).collect())
    }

    pub fn list_veterinarians(&self, token: String) -> Result<Vec<FfiVeterinarian>, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let vets = self.directory(&db).list_veterinarians()?;
        Ok(vets.into_iter().map(|v| v.into()).collect())
    }

    pub fn retire_user(&self, token: String, user_id: String) -> Result<FfiUser, VetScanError> {
        let (db, ctx) = self.authorize(&token, ANY_STAFF)?;
        Ok(self.directory(&db).retire_user(&ctx, &user_id)?.into())
    }

    pub fn reactivate_user(&self, token: String, user_id: String) -> Result<FfiUser, VetScanError> {
        let (db, ctx) = self.authorize(&token, ANY_STAFF)?;
        Ok(self.directory(&db).reactivate_user(&ctx, &user_id)?.into())
    }

    // =========================================================================
    // Clinical Record Operations
    // =========================================================================

    pub fn open_medical_record(
        &self,
        token: String,
        pet_id: String,
        record_number: String,
        opened_on: Option<String>,
    ) -> Result<FfiMedicalRecord, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let opened_on = match opened_on {
            Some(day) => parse_date("opened_on", &day)?,
            None => Utc::now().date_naive(),
        };
        Ok(ClinicalRecords::new(&db)
            .open_medical_record(&pet_id, &record_number, opened_on)?
            .into())
    }

    pub fn get_medical_record_for_pet(
        &self,
        token: String,
        pet_id: String,
    ) -> Result<FfiMedicalRecord, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        Ok(ClinicalRecords::new(&db).get_record_for_pet(&pet_id)?.into())
    }

    pub fn add_consultation(
        &self,
        token: String,
        record_id: String,
        consultation: FfiNewConsultation,
    ) -> Result<FfiConsultation, VetScanError> {
        let (db, _) = self.authorize(&token, CLINICIANS)?;
        let input = consultation.into_input()?;
        Ok(ClinicalRecords::new(&db)
            .add_consultation(&record_id, input)?
            .into())
    }

    pub fn list_consultations(
        &self,
        token: String,
        record_id: String,
    ) -> Result<Vec<FfiConsultation>, VetScanError> {
        let (db, _) = self.authorize(&token, CLINICIANS)?;
        let consultations = ClinicalRecords::new(&db).list_consultations(&record_id)?;
        Ok(consultations.into_iter().map(|c| c.into()).collect())
    }

    pub fn record_vital_signs(
        &self,
        token: String,
        consultation_id: String,
        vitals: FfiVitalsInput,
    ) -> Result<FfiVitalSigns, VetScanError> {
        let (db, _) = self.authorize(&token, CLINICIANS)?;
        let input = vitals.into_input()?;
        Ok(ClinicalRecords::new(&db)
            .record_vital_signs(&consultation_id, input)?
            .into())
    }

    pub fn list_vital_signs(
        &self,
        token: String,
        consultation_id: String,
    ) -> Result<Vec<FfiVitalSigns>, VetScanError> {
        let (db, _) = self.authorize(&token, CLINICIANS)?;
        let vitals = ClinicalRecords::new(&db).list_vital_signs(&consultation_id)?;
        Ok(vitals.into_iter().map(|v| v.into()).collect())
    }

    pub fn add_prescription(
        &self,
        token: String,
        consultation_id: String,
        prescription: FfiPrescriptionInput,
    ) -> Result<FfiPrescription, VetScanError> {
        let (db, _) = self.authorize(&token, CLINICIANS)?;
        Ok(ClinicalRecords::new(&db)
            .add_prescription(&consultation_id, prescription.into())?
            .into())
    }

    pub fn list_prescriptions(
        &self,
        token: String,
        consultation_id: String,
    ) -> Result<Vec<FfiPrescription>, VetScanError> {
        let (db, _) = self.authorize(&token, CLINICIANS)?;
        let rxs = ClinicalRecords::new(&db).list_prescriptions(&consultation_id)?;
        Ok(rxs.into_iter().map(|rx| rx.into()).collect())
    }

    pub fn record_vaccination(
        &self,
        token: String,
        vaccination: FfiVaccinationInput,
    ) -> Result<FfiVaccination, VetScanError> {
        let (db, _) = self.authorize(&token, CLINICIANS)?;
        let input = vaccination.into_input()?;
        Ok(ClinicalRecords::new(&db).record_vaccination(input)?.into())
    }

    pub fn list_vaccinations_for_pet(
        &self,
        token: String,
        pet_id: String,
    ) -> Result<Vec<FfiVaccination>, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let vaccinations = ClinicalRecords::new(&db).list_vaccinations_for_pet(&pet_id)?;
        Ok(vaccinations.into_iter().map(|v| v.into()).collect())
    }

    /// Vaccinations of active pets with a booster due on or before `due_by`.
    pub fn list_vaccinations_due_by(
        &self,
        token: String,
        due_by: String,
    ) -> Result<Vec<FfiVaccination>, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let due_by = parse_date("due_by", &due_by)?;
        let vaccinations = ClinicalRecords::new(&db).vaccinations_due_by(due_by)?;
        Ok(vaccinations.into_iter().map(|v| v.into()).collect())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Schedule report as JSON. `veterinarian_id = None` covers everyone.
    pub fn export_schedule_json(
        &self,
        token: String,
        from: String,
        to: String,
        veterinarian_id: Option<String>,
    ) -> Result<String, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let from = parse_timestamp("from", &from)?;
        let to = parse_timestamp("to", &to)?;
        let report = ScheduleExporter::new(&db).export(from, to, veterinarian_id.as_deref())?;
        Ok(report.to_json()?)
    }

    /// Schedule report as CSV.
    pub fn export_schedule_csv(
        &self,
        token: String,
        from: String,
        to: String,
        veterinarian_id: Option<String>,
    ) -> Result<String, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let from = parse_timestamp("from", &from)?;
        let to = parse_timestamp("to", &to)?;
        let report = ScheduleExporter::new(&db).export(from, to, veterinarian_id.as_deref())?;
        Ok(report.to_csv())
    }

    /// Boosters due on or before `due_by` (`YYYY-MM-DD`) as JSON.
    pub fn export_vaccinations_due_json(&self, token: String, due_by: String) -> Result<String, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let due_by = parse_date("due_by", &due_by)?;
        let report = VaccinationExporter::new(&db).export_due(due_by)?;
        Ok(report.to_json()?)
    }

    /// Boosters due on or before `due_by` (`YYYY-MM-DD`) as CSV.
    pub fn export_vaccinations_due_csv(&self, token: String, due_by: String) -> Result<String, VetScanError> {
        let (db, _) = self.authorize(&token, ANY_STAFF)?;
        let due_by = parse_date("due_by", &due_by)?;
        let report = VaccinationExporter::new(&db).export_due(due_by)?;
        Ok(report.to_csv())
    }
}
