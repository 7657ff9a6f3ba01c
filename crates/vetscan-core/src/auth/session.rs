//! Login sessions and per-request authentication context.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{generate_salt, hash_password, hash_token, verify_password};
use crate::config::AuthConfig;
use crate::db::{Database, SessionRecord};
use crate::error::{ServiceError, ServiceResult};
use crate::models::UserRole;

/// Identity of the caller, resolved from a session token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthContext {
    pub user_id: String,
    pub username: String,
    pub role: UserRole,
}

impl AuthContext {
    /// Fail with `Forbidden` unless the caller holds one of `roles`.
    pub fn require_role(&self, roles: &[UserRole]) -> ServiceResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(ServiceError::Forbidden(format!(
                "role {} may not perform this action",
                self.role
            )))
        }
    }
}

/// A freshly issued session. The token is only ever returned here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub token: String,
    pub context: AuthContext,
    pub expires_at: DateTime<Utc>,
}

/// Issues and resolves session tokens.
pub struct Authenticator<'a> {
    db: &'a Database,
    config: AuthConfig,
}

impl<'a> Authenticator<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            config: AuthConfig::default(),
        }
    }

    pub fn with_config(mut self, config: AuthConfig) -> Self {
        self.config = config;
        self
    }

    /// Check a password against the configured policy.
    pub fn validate_password(&self, password: &str) -> ServiceResult<()> {
        if password.chars().count() < self.config.min_password_length {
            return Err(ServiceError::Validation(format!(
                "password must be at least {} characters",
                self.config.min_password_length
            )));
        }
        Ok(())
    }

    /// Validate a password and produce `(hash, salt)` for storage.
    pub fn digest_password(&self, password: &str) -> ServiceResult<(String, String)> {
        self.validate_password(password)?;
        let salt = generate_salt();
        Ok((hash_password(password, &salt), salt))
    }

    /// Exchange credentials for a session.
    ///
    /// Unknown users, wrong passwords and retired accounts all produce the
    /// same error.
    pub fn login(&self, username: &str, password: &str) -> ServiceResult<Session> {
        self.login_at(username, password, Utc::now())
    }

    pub(crate) fn login_at(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> ServiceResult<Session> {
        let denied = || ServiceError::Unauthorized("invalid username or password".into());

        let user = match self.db.find_user_by_username(username.trim())? {
            Some(user) => user,
            None => {
                tracing::warn!(username, "login rejected: unknown user");
                return Err(denied());
            }
        };
        if !user.status.is_active()
            || !verify_password(password, &user.password_salt, &user.password_hash)
        {
            tracing::warn!(user_id = %user.user_id, "login rejected");
            return Err(denied());
        }

        let ttl = self.config.session_ttl_minutes;
        let expires_at = Duration::try_minutes(ttl)
            .filter(|ttl| *ttl > Duration::zero())
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                ServiceError::Validation(format!("session_ttl_minutes {} is out of range", ttl))
            })?;
        let token = new_token();
        self.db.insert_session(&SessionRecord {
            token_hash: hash_token(&token),
            user_id: user.user_id.clone(),
            created_at: now,
            expires_at,
        })?;

        tracing::info!(user_id = %user.user_id, role = %user.role, "session opened");
        Ok(Session {
            token,
            context: AuthContext {
                user_id: user.user_id,
                username: user.username,
                role: user.role,
            },
            expires_at,
        })
    }

    /// Resolve a bearer token to the caller's identity.
    pub fn authenticate(&self, token: &str) -> ServiceResult<AuthContext> {
        self.authenticate_at(token, Utc::now())
    }

    pub(crate) fn authenticate_at(&self, token: &str, now: DateTime<Utc>) -> ServiceResult<AuthContext> {
        let invalid = || ServiceError::Unauthorized("session is invalid or expired".into());
        let token_hash = hash_token(token);

        let session = self.db.get_session(&token_hash)?.ok_or_else(invalid)?;
        if session.expires_at <= now {
            self.db.delete_session(&token_hash)?;
            return Err(invalid());
        }

        let user = self.db.get_user(&session.user_id)?.ok_or_else(invalid)?;
        if !user.status.is_active() {
            return Err(invalid());
        }

        Ok(AuthContext {
            user_id: user.user_id,
            username: user.username,
            role: user.role,
        })
    }

    /// End a session. Unknown tokens are ignored.
    pub fn logout(&self, token: &str) -> ServiceResult<()> {
        self.db.delete_session(&hash_token(token))?;
        Ok(())
    }

    /// Replace the caller's password after checking the current one. All
    /// sessions of the user are closed.
    pub fn change_password(
        &self,
        ctx: &AuthContext,
        current_password: &str,
        new_password: &str,
    ) -> ServiceResult<()> {
        let user = self
            .db
            .get_user(&ctx.user_id)?
            .ok_or_else(|| ServiceError::not_found("user", &ctx.user_id))?;
        if !verify_password(current_password, &user.password_salt, &user.password_hash) {
            return Err(ServiceError::Unauthorized("current password is incorrect".into()));
        }

        let (hash, salt) = self.digest_password(new_password)?;
        self.db.update_user_password(&user.user_id, &hash, &salt)?;
        let closed = self.db.delete_sessions_for_user(&user.user_id)?;
        tracing::info!(user_id = %user.user_id, closed_sessions = closed, "password changed");
        Ok(())
    }
}

/// 256 bits of randomness from two v4 UUIDs.
fn new_token() -> String {
    format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    )
}
