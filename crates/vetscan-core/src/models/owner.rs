//! Pet owner (client) models.

use serde::{Deserialize, Serialize};

use super::{new_id, now_stamp, RecordStatus};

/// A client who owns one or more pets.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PetOwner {
    /// Local UUID
    pub owner_id: String,
    pub first_name: String,
    pub last_name: String,
    /// Unique across owners
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub status: RecordStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl PetOwner {
    /// Create a new active owner.
    pub fn new(first_name: String, last_name: String, email: String) -> Self {
        let now = now_stamp();
        Self {
            owner_id: new_id(),
            first_name,
            last_name,
            email,
            phone: None,
            address: None,
            status: RecordStatus::Active,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Display name, "First Last".
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
