//! SQLite schema definition.

/// Complete database schema for VetScan.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Clinics
-- ============================================================================

CREATE TABLE IF NOT EXISTS clinics (
    clinic_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    address TEXT,
    phone TEXT,
    email TEXT,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'retired')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- ============================================================================
-- Owners and Pets
-- ============================================================================

CREATE TABLE IF NOT EXISTS owners (
    owner_id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    phone TEXT,
    address TEXT,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'retired')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_owners_last_name ON owners(last_name);

CREATE TABLE IF NOT EXISTS pets (
    pet_id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL REFERENCES owners(owner_id),
    name TEXT NOT NULL,
    species TEXT NOT NULL,
    breed TEXT,
    sex TEXT,
    date_of_birth TEXT,                          -- YYYY-MM-DD
    weight_kg REAL,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'retired')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_pets_owner ON pets(owner_id);
CREATE INDEX IF NOT EXISTS idx_pets_name ON pets(name);

-- ============================================================================
-- Staff
-- ============================================================================

CREATE TABLE IF NOT EXISTS specialties (
    specialty_id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE COLLATE NOCASE,
    description TEXT,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'retired')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS users (
    user_id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE COLLATE NOCASE,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,
    password_salt TEXT NOT NULL,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('admin', 'receptionist', 'veterinarian')),
    clinic_id TEXT REFERENCES clinics(clinic_id),
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'retired')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_clinic ON users(clinic_id);

-- Role specialization: one row per user with role 'veterinarian'
CREATE TABLE IF NOT EXISTS veterinarians (
    user_id TEXT PRIMARY KEY REFERENCES users(user_id),
    specialty_id TEXT REFERENCES specialties(specialty_id),
    license_number TEXT
);

CREATE INDEX IF NOT EXISTS idx_veterinarians_specialty ON veterinarians(specialty_id);

-- ============================================================================
-- Appointments
-- ============================================================================

-- No overlap constraint here: the scheduler checks overlaps inside an
-- IMMEDIATE transaction before every write.
CREATE TABLE IF NOT EXISTS appointments (
    appointment_id TEXT PRIMARY KEY,
    pet_id TEXT NOT NULL REFERENCES pets(pet_id),
    veterinarian_id TEXT NOT NULL REFERENCES veterinarians(user_id),
    start_time TEXT NOT NULL,
    duration_minutes INTEGER NOT NULL CHECK (duration_minutes > 0),
    appointment_type TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'scheduled',
    notes TEXT,
    estimated_cost_cents INTEGER,
    actual_cost_cents INTEGER,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_appointments_vet_start ON appointments(veterinarian_id, start_time);
CREATE INDEX IF NOT EXISTS idx_appointments_pet ON appointments(pet_id);

-- ============================================================================
-- Clinical Records
-- ============================================================================

CREATE TABLE IF NOT EXISTS medical_records (
    record_id TEXT PRIMARY KEY,
    pet_id TEXT NOT NULL UNIQUE REFERENCES pets(pet_id),
    record_number TEXT NOT NULL UNIQUE,
    opened_on TEXT NOT NULL,
    notes TEXT,
    status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active', 'retired')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS consultations (
    consultation_id TEXT PRIMARY KEY,
    record_id TEXT NOT NULL REFERENCES medical_records(record_id),
    veterinarian_id TEXT NOT NULL REFERENCES veterinarians(user_id),
    appointment_id TEXT REFERENCES appointments(appointment_id) ON DELETE SET NULL,
    consulted_at TEXT NOT NULL,
    reason TEXT NOT NULL,
    diagnosis TEXT,
    treatment TEXT,
    notes TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_consultations_record ON consultations(record_id);

CREATE TABLE IF NOT EXISTS vital_signs (
    vital_id TEXT PRIMARY KEY,
    consultation_id TEXT NOT NULL REFERENCES consultations(consultation_id) ON DELETE CASCADE,
    temperature_c REAL,
    heart_rate_bpm INTEGER,
    respiratory_rate INTEGER,
    weight_kg REAL,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_vital_signs_consultation ON vital_signs(consultation_id);

CREATE TABLE IF NOT EXISTS prescriptions (
    prescription_id TEXT PRIMARY KEY,
    consultation_id TEXT NOT NULL REFERENCES consultations(consultation_id) ON DELETE CASCADE,
    medication TEXT NOT NULL,
    dosage TEXT NOT NULL,
    frequency TEXT NOT NULL,
    duration_days INTEGER NOT NULL CHECK (duration_days > 0),
    instructions TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_prescriptions_consultation ON prescriptions(consultation_id);

CREATE TABLE IF NOT EXISTS vaccinations (
    vaccination_id TEXT PRIMARY KEY,
    pet_id TEXT NOT NULL REFERENCES pets(pet_id),
    veterinarian_id TEXT NOT NULL REFERENCES veterinarians(user_id),
    vaccine_name TEXT NOT NULL,
    batch_number TEXT,
    administered_on TEXT NOT NULL,
    next_due_on TEXT,
    notes TEXT,
    created_at TEXT NOT NULL,
    CHECK (next_due_on IS NULL OR next_due_on >= administered_on)
);

CREATE INDEX IF NOT EXISTS idx_vaccinations_pet ON vaccinations(pet_id);
CREATE INDEX IF NOT EXISTS idx_vaccinations_due ON vaccinations(next_due_on);

-- ============================================================================
-- Sessions
-- ============================================================================

-- Only the SHA-256 of a session token is stored.
CREATE TABLE IF NOT EXISTS sessions (
    token_hash TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(user_id),
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        assert!(conn.execute_batch(SCHEMA).is_ok());
    }

    #[test]
    fn test_zero_duration_rejected_by_check() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO owners (owner_id, first_name, last_name, email, created_at, updated_at)
            VALUES ('o1', 'Ana', 'Silva', 'ana@example.com', 'now', 'now');
            INSERT INTO pets (pet_id, owner_id, name, species, created_at, updated_at)
            VALUES ('p1', 'o1', 'Max', 'canine', 'now', 'now');
            INSERT INTO users (user_id, username, email, password_hash, password_salt,
                               first_name, last_name, role, created_at, updated_at)
            VALUES ('u1', 'vet', 'vet@example.com', 'h', 's', 'Jo', 'Vet', 'veterinarian', 'now', 'now');
            INSERT INTO veterinarians (user_id) VALUES ('u1');
            "#,
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO appointments (appointment_id, pet_id, veterinarian_id, start_time,
                duration_minutes, appointment_type, created_at, updated_at)
             VALUES ('a1', 'p1', 'u1', '2024-01-01T10:00:00Z', 0, 'checkup', 'now', 'now')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO users (user_id, username, email, password_hash, password_salt,
                first_name, last_name, role, created_at, updated_at)
             VALUES ('u1', 'x', 'x@example.com', 'h', 's', 'A', 'B', 'owner', 'now', 'now')",
            [],
        );
        assert!(result.is_err());
    }
}
