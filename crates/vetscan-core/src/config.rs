//! Runtime configuration.
//!
//! Loaded from TOML; every key is optional and falls back to the defaults
//! below.
//!
//! ```toml
//! database_path = "/var/lib/vetscan/clinic.db"
//! log_filter = "vetscan_core=debug"
//!
//! [scheduling]
//! max_duration_minutes = 240
//!
//! [auth]
//! session_ttl_minutes = 60
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

/// Longest appointment a configuration may allow, one day.
pub const MAX_APPOINTMENT_MINUTES: i64 = 24 * 60;
/// Longest session lifetime a configuration may allow, 30 days.
pub const MAX_SESSION_TTL_MINUTES: i64 = 30 * 24 * 60;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClinicConfig {
    /// SQLite file backing the clinic
    pub database_path: PathBuf,
    /// `tracing` filter directive used by [`crate::logging::init_tracing`]
    pub log_filter: String,
    pub scheduling: SchedulingConfig,
    pub auth: AuthConfig,
}

/// Appointment scheduling limits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Longest bookable appointment
    pub max_duration_minutes: i64,
    /// Duration used when a caller does not supply one
    pub default_duration_minutes: i64,
}

/// Authentication settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AuthConfig {
    pub session_ttl_minutes: i64,
    pub min_password_length: usize,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("vetscan.db"),
            log_filter: "info".to_string(),
            scheduling: SchedulingConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            max_duration_minutes: 480,
            default_duration_minutes: 30,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_minutes: 480,
            min_password_length: 8,
        }
    }
}

impl ClinicConfig {
    /// Parse configuration from a TOML document.
    pub fn from_toml_str(source: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(source).context("invalid configuration TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_toml_str(&source)
            .with_context(|| format!("failed to load config file {}", path.display()))
    }

    /// Reject settings the services cannot work with.
    pub fn validate(&self) -> anyhow::Result<()> {
        let scheduling = &self.scheduling;
        if !(1..=MAX_APPOINTMENT_MINUTES).contains(&scheduling.max_duration_minutes) {
            bail!(
                "scheduling.max_duration_minutes must be between 1 and {}",
                MAX_APPOINTMENT_MINUTES
            );
        }
        if scheduling.default_duration_minutes < 1
            || scheduling.default_duration_minutes > scheduling.max_duration_minutes
        {
            bail!("scheduling.default_duration_minutes must be between 1 and max_duration_minutes");
        }
        if !(1..=MAX_SESSION_TTL_MINUTES).contains(&self.auth.session_ttl_minutes) {
            bail!(
                "auth.session_ttl_minutes must be between 1 and {}",
                MAX_SESSION_TTL_MINUTES
            );
        }
        if self.auth.min_password_length == 0 {
            bail!("auth.min_password_length must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = ClinicConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClinicConfig::default());
        assert_eq!(config.scheduling.max_duration_minutes, 480);
        assert_eq!(config.auth.min_password_length, 8);
    }

    #[test]
    fn test_partial_override() {
        let config = ClinicConfig::from_toml_str(
            r#"
            database_path = "/tmp/clinic.db"

            [auth]
            session_ttl_minutes = 60
            "#,
        )
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/clinic.db"));
        assert_eq!(config.auth.session_ttl_minutes, 60);
        assert_eq!(config.auth.min_password_length, 8);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ClinicConfig::from_toml_str("[scheduling]\nmax_duration_minutes = 0\n");
        assert!(err.is_err());

        let err = ClinicConfig::from_toml_str(
            "[scheduling]\nmax_duration_minutes = 60\ndefault_duration_minutes = 90\n",
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_upper_bounds_rejected() {
        for source in [
            "[auth]\nsession_ttl_minutes = 9223372036854775807\n",
            "[auth]\nsession_ttl_minutes = 43201\n",
            "[scheduling]\nmax_duration_minutes = 1441\n",
        ] {
            assert!(ClinicConfig::from_toml_str(source).is_err(), "accepted {}", source);
        }
        let config = ClinicConfig::from_toml_str("[auth]\nsession_ttl_minutes = 43200\n").unwrap();
        assert_eq!(config.auth.session_ttl_minutes, MAX_SESSION_TTL_MINUTES);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vetscan.toml");
        std::fs::write(&path, "log_filter = \"debug\"\n").unwrap();

        let config = ClinicConfig::load(&path).unwrap();
        assert_eq!(config.log_filter, "debug");

        let missing = ClinicConfig::load(dir.path().join("missing.toml"));
        assert!(missing.is_err());
    }
}
