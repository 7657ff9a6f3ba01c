//! Staff models: users, veterinarians and specialties.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{new_id, now_stamp, RecordStatus};

/// Role a staff user plays in the clinic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Receptionist,
    Veterinarian,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Receptionist => "receptionist",
            UserRole::Veterinarian => "veterinarian",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(UserRole::Admin),
            "receptionist" => Ok(UserRole::Receptionist),
            "veterinarian" => Ok(UserRole::Veterinarian),
            other => Err(format!("Unknown user role: {}", other)),
        }
    }
}

/// A staff account. Credentials are stored as a salted digest only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub user_id: String,
    /// Unique login name
    pub username: String,
    /// Unique contact email
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    #[serde(skip_serializing, default)]
    pub password_salt: String,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
    /// Clinic the user works at, if assigned
    pub clinic_id: Option<String>,
    pub status: RecordStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    /// Create a new active user. The caller fills in the credential digest.
    pub fn new(
        username: String,
        email: String,
        first_name: String,
        last_name: String,
        role: UserRole,
    ) -> Self {
        let now = now_stamp();
        Self {
            user_id: new_id(),
            username,
            email,
            password_hash: String::new(),
            password_salt: String::new(),
            first_name,
            last_name,
            role,
            clinic_id: None,
            status: RecordStatus::Active,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Veterinarian profile layered on top of a [`User`] with the same id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Veterinarian {
    pub user_id: String,
    pub specialty_id: Option<String>,
    pub license_number: Option<String>,
}

/// Veterinarian profile joined with the user account it specializes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VeterinarianDetails {
    pub user: User,
    pub profile: Veterinarian,
    /// Specialty name, when one is assigned
    pub specialty_name: Option<String>,
}

impl VeterinarianDetails {
    /// "Dr. First Last"
    pub fn display_name(&self) -> String {
        format!("Dr. {}", self.user.full_name())
    }
}

/// A clinical specialty (e.g., "Dermatology").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Specialty {
    pub specialty_id: String,
    /// Unique across specialties
    pub name: String,
    pub description: Option<String>,
    pub status: RecordStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl Specialty {
    pub fn new(name: String) -> Self {
        let now = now_stamp();
        Self {
            specialty_id: new_id(),
            name,
            description: None,
            status: RecordStatus::Active,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("veterinarian".parse::<UserRole>().unwrap(), UserRole::Veterinarian);
        assert!("owner".parse::<UserRole>().is_err());
    }

    #[test]
    fn test_user_serialization_hides_credentials() {
        let mut user = User::new(
            "jdoe".into(),
            "jdoe@example.com".into(),
            "Jane".into(),
            "Doe".into(),
            UserRole::Admin,
        );
        user.password_hash = "secret-digest".into();
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("secret-digest"));
        assert!(json.contains("\"role\":\"admin\""));
    }
}
