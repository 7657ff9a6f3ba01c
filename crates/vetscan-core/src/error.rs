//! Domain errors surfaced by the service layer.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db::DbError;

/// Errors returned by scheduling, directory, records and auth operations.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Malformed or missing input, rejected before any lookup.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The candidate window overlaps an existing booking.
    #[error(
        "Scheduling conflict: veterinarian {veterinarian_id} is already booked \
         from {start} to {end} (appointment {appointment_id})"
    )]
    SchedulingConflict {
        veterinarian_id: String,
        appointment_id: String,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Duplicate unique value or a guarded lifecycle transition.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(DbError),
}

impl ServiceError {
    /// HTTP-equivalent status for transport layers.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 400,
            ServiceError::Unauthorized(_) => 401,
            ServiceError::Forbidden(_) => 403,
            ServiceError::NotFound(_) => 404,
            ServiceError::SchedulingConflict { .. } | ServiceError::Conflict(_) => 409,
            ServiceError::Database(_) => 500,
        }
    }

    pub(crate) fn not_found(kind: &str, id: &str) -> Self {
        ServiceError::NotFound(format!("{} {}", kind, id))
    }
}

impl From<DbError> for ServiceError {
    fn from(e: DbError) -> Self {
        if e.is_unique_violation() {
            return ServiceError::Conflict(e.to_string());
        }
        ServiceError::Database(e)
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(e: rusqlite::Error) -> Self {
        DbError::from(e).into()
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;
