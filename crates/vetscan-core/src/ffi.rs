//! FFI-safe records exchanged with host apps.
//!
//! Timestamps cross the boundary as RFC 3339 strings and calendar dates as
//! `YYYY-MM-DD`; enums cross as their lowercase names.

use chrono::{DateTime, NaiveDate, Utc};

use crate::auth::{AuthContext, Session};
use crate::models::{
    Appointment, AppointmentStatus, Clinic, Consultation, MedicalRecord, Pet, PetOwner,
    Prescription, Specialty, User, UserRole, Vaccination, VeterinarianDetails, VitalSigns,
};
use crate::scheduling::{AppointmentUpdate, NewAppointment};
use crate::service::{
    ClinicInput, NewConsultation, NewUser, OwnerInput, PetInput, PrescriptionInput,
    VaccinationInput, VitalsInput,
};
use crate::VetScanError;

pub(crate) fn parse_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, VetScanError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| VetScanError::Validation(format!("{} is not an RFC 3339 timestamp: {}", field, e)))
}

pub(crate) fn parse_date(field: &str, value: &str) -> Result<NaiveDate, VetScanError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|e| VetScanError::Validation(format!("{} is not a YYYY-MM-DD date: {}", field, e)))
}

fn parse_optional_date(field: &str, value: Option<String>) -> Result<Option<NaiveDate>, VetScanError> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| parse_date(field, &v))
        .transpose()
}

fn parse_optional_timestamp(
    field: &str,
    value: Option<String>,
) -> Result<Option<DateTime<Utc>>, VetScanError> {
    value.map(|v| parse_timestamp(field, &v)).transpose()
}

// =========================================================================
// Authentication
// =========================================================================

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAuthContext {
    pub user_id: String,
    pub username: String,
    pub role: String,
}

impl From<AuthContext> for FfiAuthContext {
    fn from(ctx: AuthContext) -> Self {
        Self {
            user_id: ctx.user_id,
            username: ctx.username,
            role: ctx.role.to_string(),
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSession {
    pub token: String,
    pub user: FfiAuthContext,
    pub expires_at: String,
}

impl From<Session> for FfiSession {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            user: session.context.into(),
            expires_at: session.expires_at.to_rfc3339(),
        }
    }
}

// =========================================================================
// Appointments
// =========================================================================

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAppointment {
    pub appointment_id: String,
    pub pet_id: String,
    pub veterinarian_id: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: i64,
    pub appointment_type: String,
    pub status: String,
    pub notes: Option<String>,
    pub estimated_cost_cents: Option<i64>,
    pub actual_cost_cents: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Appointment> for FfiAppointment {
    fn from(appt: Appointment) -> Self {
        Self {
            end_time: appt.end_time().to_rfc3339(),
            appointment_id: appt.appointment_id,
            pet_id: appt.pet_id,
            veterinarian_id: appt.veterinarian_id,
            start_time: appt.start_time.to_rfc3339(),
            duration_minutes: appt.duration_minutes,
            appointment_type: appt.appointment_type,
            status: appt.status.to_string(),
            notes: appt.notes,
            estimated_cost_cents: appt.estimated_cost_cents,
            actual_cost_cents: appt.actual_cost_cents,
            created_at: appt.created_at,
            updated_at: appt.updated_at,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewAppointment {
    pub pet_id: String,
    pub veterinarian_id: String,
    pub start_time: String,
    pub duration_minutes: Option<i64>,
    pub appointment_type: String,
    pub notes: Option<String>,
    pub estimated_cost_cents: Option<i64>,
}

impl FfiNewAppointment {
    pub(crate) fn into_request(self) -> Result<NewAppointment, VetScanError> {
        Ok(NewAppointment {
            start_time: parse_timestamp("start_time", &self.start_time)?,
            pet_id: self.pet_id,
            veterinarian_id: self.veterinarian_id,
            duration_minutes: self.duration_minutes,
            appointment_type: self.appointment_type,
            notes: self.notes,
            estimated_cost_cents: self.estimated_cost_cents,
        })
    }
}

/// Partial appointment edit; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiAppointmentUpdate {
    pub pet_id: Option<String>,
    pub veterinarian_id: Option<String>,
    pub start_time: Option<String>,
    pub duration_minutes: Option<i64>,
    pub appointment_type: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub estimated_cost_cents: Option<i64>,
    pub actual_cost_cents: Option<i64>,
}

impl FfiAppointmentUpdate {
    pub(crate) fn into_update(self) -> Result<AppointmentUpdate, VetScanError> {
        let status = self
            .status
            .map(|s| s.parse::<AppointmentStatus>())
            .transpose()
            .map_err(VetScanError::Validation)?;
        Ok(AppointmentUpdate {
            pet_id: self.pet_id,
            veterinarian_id: self.veterinarian_id,
            start_time: parse_optional_timestamp("start_time", self.start_time)?,
            duration_minutes: self.duration_minutes,
            appointment_type: self.appointment_type,
            status,
            notes: self.notes,
            estimated_cost_cents: self.estimated_cost_cents,
            actual_cost_cents: self.actual_cost_cents,
        })
    }
}

// =========================================================================
// Directory
// =========================================================================

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClinic {
    pub clinic_id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub active: bool,
}

impl From<Clinic> for FfiClinic {
    fn from(clinic: Clinic) -> Self {
        Self {
            active: clinic.status.is_active(),
            clinic_id: clinic.clinic_id,
            name: clinic.name,
            address: clinic.address,
            phone: clinic.phone,
            email: clinic.email,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiClinicInput {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl From<FfiClinicInput> for ClinicInput {
    fn from(input: FfiClinicInput) -> Self {
        ClinicInput {
            name: input.name,
            address: input.address,
            phone: input.phone,
            email: input.email,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOwner {
    pub owner_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub active: bool,
}

impl From<PetOwner> for FfiOwner {
    fn from(owner: PetOwner) -> Self {
        Self {
            active: owner.status.is_active(),
            owner_id: owner.owner_id,
            first_name: owner.first_name,
            last_name: owner.last_name,
            email: owner.email,
            phone: owner.phone,
            address: owner.address,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiOwnerInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl From<FfiOwnerInput> for OwnerInput {
    fn from(input: FfiOwnerInput) -> Self {
        OwnerInput {
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            phone: input.phone,
            address: input.address,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPet {
    pub pet_id: String,
    pub owner_id: String,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub sex: Option<String>,
    pub date_of_birth: Option<String>,
    pub weight_kg: Option<f64>,
    /// Age as of today, e.g. "2 years, 3 months"
    pub age: String,
    pub active: bool,
}

impl From<Pet> for FfiPet {
    fn from(pet: Pet) -> Self {
        Self {
            age: pet.age_display(Utc::now().date_naive()),
            active: pet.status.is_active(),
            date_of_birth: pet.date_of_birth.map(|d| d.to_string()),
            pet_id: pet.pet_id,
            owner_id: pet.owner_id,
            name: pet.name,
            species: pet.species,
            breed: pet.breed,
            sex: pet.sex,
            weight_kg: pet.weight_kg,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPetInput {
    pub owner_id: String,
    pub name: String,
    pub species: String,
    pub breed: Option<String>,
    pub sex: Option<String>,
    pub date_of_birth: Option<String>,
    pub weight_kg: Option<f64>,
}

impl FfiPetInput {
    pub(crate) fn into_input(self) -> Result<PetInput, VetScanError> {
        Ok(PetInput {
            date_of_birth: parse_optional_date("date_of_birth", self.date_of_birth)?,
            owner_id: self.owner_id,
            name: self.name,
            species: self.species,
            breed: self.breed,
            sex: self.sex,
            weight_kg: self.weight_kg,
        })
    }
}

// =========================================================================
// Staff
// =========================================================================

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSpecialty {
    pub specialty_id: String,
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
}

impl From<Specialty> for FfiSpecialty {
    fn from(specialty: Specialty) -> Self {
        Self {
            active: specialty.status.is_active(),
            specialty_id: specialty.specialty_id,
            name: specialty.name,
            description: specialty.description,
        }
    }
}

/// Staff account as seen by host apps. Never carries credentials.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUser {
    pub user_id: String,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub clinic_id: Option<String>,
    pub active: bool,
}

impl From<User> for FfiUser {
    fn from(user: User) -> Self {
        Self {
            active: user.status.is_active(),
            role: user.role.to_string(),
            user_id: user.user_id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            clinic_id: user.clinic_id,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    /// "admin", "receptionist" or "veterinarian"
    pub role: String,
    pub clinic_id: Option<String>,
}

impl FfiNewUser {
    pub(crate) fn into_request(self) -> Result<NewUser, VetScanError> {
        let role = self
            .role
            .trim()
            .to_lowercase()
            .parse::<UserRole>()
            .map_err(VetScanError::Validation)?;
        Ok(NewUser {
            username: self.username,
            email: self.email,
            password: self.password,
            first_name: self.first_name,
            last_name: self.last_name,
            role,
            clinic_id: self.clinic_id,
        })
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVeterinarian {
    pub user: FfiUser,
    /// "Dr. First Last"
    pub display_name: String,
    pub specialty_id: Option<String>,
    pub specialty_name: Option<String>,
    pub license_number: Option<String>,
}

impl From<VeterinarianDetails> for FfiVeterinarian {
    fn from(vet: VeterinarianDetails) -> Self {
        Self {
            display_name: vet.display_name(),
            specialty_id: vet.profile.specialty_id,
            specialty_name: vet.specialty_name,
            license_number: vet.profile.license_number,
            user: vet.user.into(),
        }
    }
}

// =========================================================================
// Clinical Records
// =========================================================================

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedicalRecord {
    pub record_id: String,
    pub pet_id: String,
    pub record_number: String,
    pub opened_on: String,
    pub notes: Option<String>,
}

impl From<MedicalRecord> for FfiMedicalRecord {
    fn from(record: MedicalRecord) -> Self {
        Self {
            record_id: record.record_id,
            pet_id: record.pet_id,
            record_number: record.record_number,
            opened_on: record.opened_on.to_string(),
            notes: record.notes,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConsultation {
    pub consultation_id: String,
    pub record_id: String,
    pub veterinarian_id: String,
    pub appointment_id: Option<String>,
    pub consulted_at: String,
    pub reason: String,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
}

impl From<Consultation> for FfiConsultation {
    fn from(c: Consultation) -> Self {
        Self {
            consultation_id: c.consultation_id,
            record_id: c.record_id,
            veterinarian_id: c.veterinarian_id,
            appointment_id: c.appointment_id,
            consulted_at: c.consulted_at.to_rfc3339(),
            reason: c.reason,
            diagnosis: c.diagnosis,
            treatment: c.treatment,
            notes: c.notes,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewConsultation {
    pub veterinarian_id: String,
    pub appointment_id: Option<String>,
    /// Defaults to now
    pub consulted_at: Option<String>,
    pub reason: String,
    pub diagnosis: Option<String>,
    pub treatment: Option<String>,
    pub notes: Option<String>,
}

impl FfiNewConsultation {
    pub(crate) fn into_input(self) -> Result<NewConsultation, VetScanError> {
        Ok(NewConsultation {
            consulted_at: parse_optional_timestamp("consulted_at", self.consulted_at)?,
            veterinarian_id: self.veterinarian_id,
            appointment_id: self.appointment_id,
            reason: self.reason,
            diagnosis: self.diagnosis,
            treatment: self.treatment,
            notes: self.notes,
        })
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVitalSigns {
    pub vital_id: String,
    pub consultation_id: String,
    pub temperature_c: Option<f64>,
    pub heart_rate_bpm: Option<i64>,
    pub respiratory_rate: Option<i64>,
    pub weight_kg: Option<f64>,
    pub recorded_at: String,
}

impl From<VitalSigns> for FfiVitalSigns {
    fn from(v: VitalSigns) -> Self {
        Self {
            vital_id: v.vital_id,
            consultation_id: v.consultation_id,
            temperature_c: v.temperature_c,
            heart_rate_bpm: v.heart_rate_bpm,
            respiratory_rate: v.respiratory_rate,
            weight_kg: v.weight_kg,
            recorded_at: v.recorded_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiVitalsInput {
    pub temperature_c: Option<f64>,
    pub heart_rate_bpm: Option<i64>,
    pub respiratory_rate: Option<i64>,
    pub weight_kg: Option<f64>,
    pub recorded_at: Option<String>,
}

impl FfiVitalsInput {
    pub(crate) fn into_input(self) -> Result<VitalsInput, VetScanError> {
        Ok(VitalsInput {
            recorded_at: parse_optional_timestamp("recorded_at", self.recorded_at)?,
            temperature_c: self.temperature_c,
            heart_rate_bpm: self.heart_rate_bpm,
            respiratory_rate: self.respiratory_rate,
            weight_kg: self.weight_kg,
        })
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescription {
    pub prescription_id: String,
    pub consultation_id: String,
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub duration_days: i64,
    pub instructions: Option<String>,
}

impl From<Prescription> for FfiPrescription {
    fn from(rx: Prescription) -> Self {
        Self {
            prescription_id: rx.prescription_id,
            consultation_id: rx.consultation_id,
            medication: rx.medication,
            dosage: rx.dosage,
            frequency: rx.frequency,
            duration_days: rx.duration_days,
            instructions: rx.instructions,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPrescriptionInput {
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub duration_days: i64,
    pub instructions: Option<String>,
}

impl From<FfiPrescriptionInput> for PrescriptionInput {
    fn from(input: FfiPrescriptionInput) -> Self {
        PrescriptionInput {
            medication: input.medication,
            dosage: input.dosage,
            frequency: input.frequency,
            duration_days: input.duration_days,
            instructions: input.instructions,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVaccination {
    pub vaccination_id: String,
    pub pet_id: String,
    pub veterinarian_id: String,
    pub vaccine_name: String,
    pub batch_number: Option<String>,
    pub administered_on: String,
    pub next_due_on: Option<String>,
    pub notes: Option<String>,
}

impl From<Vaccination> for FfiVaccination {
    fn from(v: Vaccination) -> Self {
        Self {
            vaccination_id: v.vaccination_id,
            pet_id: v.pet_id,
            veterinarian_id: v.veterinarian_id,
            vaccine_name: v.vaccine_name,
            batch_number: v.batch_number,
            administered_on: v.administered_on.to_string(),
            next_due_on: v.next_due_on.map(|d| d.to_string()),
            notes: v.notes,
        }
    }
}

#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiVaccinationInput {
    pub pet_id: String,
    pub veterinarian_id: String,
    pub vaccine_name: String,
    pub batch_number: Option<String>,
    pub administered_on: String,
    pub next_due_on: Option<String>,
    pub notes: Option<String>,
}

impl FfiVaccinationInput {
    pub(crate) fn into_input(self) -> Result<VaccinationInput, VetScanError> {
        Ok(VaccinationInput {
            administered_on: parse_date("administered_on", &self.administered_on)?,
            next_due_on: parse_optional_date("next_due_on", self.next_due_on)?,
            pet_id: self.pet_id,
            veterinarian_id: self.veterinarian_id,
            vaccine_name: self.vaccine_name,
            batch_number: self.batch_number,
            notes: self.notes,
        })
    }
}
