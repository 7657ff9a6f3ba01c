//! Login session storage.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};

/// A stored session. The plaintext token never reaches the database.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    /// SHA-256 of the bearer token, hex encoded
    pub token_hash: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Database {
    /// Store a new session.
    pub fn insert_session(&self, session: &SessionRecord) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO sessions (token_hash, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                session.token_hash,
                session.user_id,
                session.created_at,
                session.expires_at,
            ],
        )?;
        Ok(())
    }

    /// Look up a session by token digest.
    pub fn get_session(&self, token_hash: &str) -> DbResult<Option<SessionRecord>> {
        self.conn
            .query_row(
                "SELECT token_hash, user_id, created_at, expires_at FROM sessions WHERE token_hash = ?",
                [token_hash],
                |row| {
                    Ok(SessionRecord {
                        token_hash: row.get(0)?,
                        user_id: row.get(1)?,
                        created_at: row.get(2)?,
                        expires_at: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Delete a single session.
    pub fn delete_session(&self, token_hash: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM sessions WHERE token_hash = ?", [token_hash])?;
        Ok(rows_affected > 0)
    }

    /// Delete every session of a user.
    pub fn delete_sessions_for_user(&self, user_id: &str) -> DbResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM sessions WHERE user_id = ?", [user_id])?)
    }

    /// Drop sessions that expired at or before `now`.
    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> DbResult<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM sessions WHERE expires_at <= ?", [now])?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{User, UserRole};
    use chrono::{Duration, TimeZone};

    fn user(db: &Database) -> User {
        let user = User::new(
            "desk".into(),
            "desk@clinic.example".into(),
            "Front".into(),
            "Desk".into(),
            UserRole::Receptionist,
        );
        db.insert_user(&user).unwrap();
        user
    }

    fn session(user_id: &str, token_hash: &str, expires_at: DateTime<Utc>) -> SessionRecord {
        SessionRecord {
            token_hash: token_hash.into(),
            user_id: user_id.into(),
            created_at: expires_at - Duration::hours(12),
            expires_at,
        }
    }

    #[test]
    fn test_insert_get_delete() {
        let db = Database::open_in_memory().unwrap();
        let user = user(&db);
        let expires = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
        let record = session(&user.user_id, "aa11", expires);
        db.insert_session(&record).unwrap();

        assert_eq!(db.get_session("aa11").unwrap(), Some(record));
        assert!(db.delete_session("aa11").unwrap());
        assert!(!db.delete_session("aa11").unwrap());
        assert!(db.get_session("aa11").unwrap().is_none());
    }

    #[test]
    fn test_purge_and_delete_for_user() {
        let db = Database::open_in_memory().unwrap();
        let user = user(&db);
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
        db.insert_session(&session(&user.user_id, "old", now - Duration::minutes(1)))
            .unwrap();
        db.insert_session(&session(&user.user_id, "edge", now)).unwrap();
        db.insert_session(&session(&user.user_id, "live", now + Duration::hours(1)))
            .unwrap();

        assert_eq!(db.purge_expired_sessions(now).unwrap(), 2);
        assert!(db.get_session("live").unwrap().is_some());
        assert_eq!(db.delete_sessions_for_user(&user.user_id).unwrap(), 1);
    }
}
