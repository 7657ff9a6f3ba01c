//! Staff authentication.
//!
//! Login issues an opaque bearer token. Callers pass the token on every
//! request and resolve it to an [`AuthContext`]; there is no ambient session
//! state.

mod password;
mod session;

pub use password::*;
pub use session::*;
