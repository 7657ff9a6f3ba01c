//! Database layer for VetScan.

mod appointments;
mod clinics;
mod owners;
mod pets;
mod records;
mod schema;
mod sessions;
mod staff;

pub use pets::PetDependents;
pub use schema::*;
pub use sessions::*;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::models::{AppointmentStatus, RecordStatus, UserRole};

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl DbError {
    /// True when SQLite rejected a write because of a UNIQUE or PRIMARY KEY
    /// constraint.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DbError::Sqlite(rusqlite::Error::SqliteFailure(e, _)) => {
                e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
            }
            _ => false,
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Default time a writer waits on a locked database file.
const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        tracing::debug!("schema initialized");
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a transaction that takes the write lock up front.
    ///
    /// Reads issued through `self` while the returned guard is alive run
    /// inside the transaction, so a read-check-write sequence cannot
    /// interleave with another writer. Dropping the guard rolls back.
    pub fn immediate_transaction(&self) -> DbResult<Transaction<'_>> {
        Ok(Transaction::new_unchecked(
            &self.conn,
            TransactionBehavior::Immediate,
        )?)
    }

    /// Set the lifecycle status on any soft-deletable table.
    fn update_status(
        &self,
        table: &str,
        key_column: &str,
        id: &str,
        status: RecordStatus,
    ) -> DbResult<bool> {
        let sql = format!(
            "UPDATE {} SET status = ?1, updated_at = ?2 WHERE {} = ?3",
            table, key_column
        );
        let rows_affected = self
            .conn
            .execute(&sql, rusqlite::params![status, crate::models::now_stamp(), id])?;
        Ok(rows_affected > 0)
    }
}

/// Enums stored as their lowercase text form.
macro_rules! text_column {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(self.as_str().into())
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse()
                        .map_err(|e: String| FromSqlError::Other(e.into()))
                }
            }
        )+
    };
}

text_column!(RecordStatus, UserRole, AppointmentStatus);
