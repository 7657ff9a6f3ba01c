//! Clinic models.

use serde::{Deserialize, Serialize};

use super::{new_id, now_stamp, RecordStatus};

/// A physical clinic location that staff are assigned to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Clinic {
    pub clinic_id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub status: RecordStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl Clinic {
    /// Create a new active clinic.
    pub fn new(name: String) -> Self {
        let now = now_stamp();
        Self {
            clinic_id: new_id(),
            name,
            address: None,
            phone: None,
            email: None,
            status: RecordStatus::Active,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
