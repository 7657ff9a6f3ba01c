//! Password digests.

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Random per-user salt, hex encoded.
pub fn generate_salt() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// `hex(sha256(salt || password))`
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare a password against a stored digest without short-circuiting on
/// the first differing byte.
pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    hash_password(password, salt)
        .as_bytes()
        .ct_eq(expected_hash.as_bytes())
        .into()
}

/// Hex SHA-256 of a bearer token, the form stored in the sessions table.
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}
