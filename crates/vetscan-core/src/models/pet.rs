//! Pet (patient) models.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{new_id, now_stamp, RecordStatus};

/// A pet registered at the clinic. Always belongs to exactly one owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Pet {
    /// Local UUID
    pub pet_id: String,
    /// Owning client
    pub owner_id: String,
    pub name: String,
    /// Species (e.g., "canine", "feline")
    pub species: String,
    pub breed: Option<String>,
    pub sex: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    /// Last known weight in kg
    pub weight_kg: Option<f64>,
    pub status: RecordStatus,
    pub created_at: String,
    pub updated_at: String,
}

impl Pet {
    /// Create a new active pet with required fields.
    pub fn new(owner_id: String, name: String, species: String) -> Self {
        let now = now_stamp();
        Self {
            pet_id: new_id(),
            owner_id,
            name,
            species,
            breed: None,
            sex: None,
            date_of_birth: None,
            weight_kg: None,
            status: RecordStatus::Active,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Age relative to `on`, or `None` when the date of birth is unknown
    /// or lies after `on`.
    pub fn age_on(&self, on: NaiveDate) -> Option<PetAge> {
        self.date_of_birth.and_then(|dob| PetAge::between(dob, on))
    }

    /// Human readable age, e.g. "2 years, 3 months".
    pub fn age_display(&self, on: NaiveDate) -> String {
        match self.age_on(on) {
            Some(age) => age.to_string(),
            None => "unknown".to_string(),
        }
    }

    /// Get the canonical species name (lowercase).
    pub fn canonical_species(&self) -> String {
        self.species.to_lowercase()
    }
}

/// Whole years and months elapsed since birth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PetAge {
    pub years: u32,
    pub months: u32,
}

impl PetAge {
    /// Completed months between `born` and `on`. A month only counts once the
    /// day of month has been reached.
    pub fn between(born: NaiveDate, on: NaiveDate) -> Option<Self> {
        if born > on {
            return None;
        }
        let mut total = (on.year() - born.year()) * 12 + on.month() as i32 - born.month() as i32;
        if on.day() < born.day() {
            total -= 1;
        }
        let total = u32::try_from(total).ok()?;
        Some(Self {
            years: total / 12,
            months: total % 12,
        })
    }
}

impl std::fmt::Display for PetAge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn unit(n: u32, word: &str) -> String {
            if n == 1 {
                format!("1 {}", word)
            } else {
                format!("{} {}s", n, word)
            }
        }

        match (self.years, self.months) {
            (0, 0) => f.write_str("less than a month"),
            (0, m) => f.write_str(&unit(m, "month")),
            (y, 0) => f.write_str(&unit(y, "year")),
            (y, m) => write!(f, "{}, {}", unit(y, "year"), unit(m, "month")),
        }
    }
}
