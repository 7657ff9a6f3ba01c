//! Domain models for the VetScan clinic system.

mod appointment;
mod clinic;
mod lifecycle;
mod owner;
mod pet;
mod records;
mod staff;

pub use appointment::*;
pub use clinic::*;
pub use lifecycle::*;
pub use owner::*;
pub use pet::*;
pub use records::*;
pub use staff::*;

/// Current time as an RFC 3339 string, used for audit stamps.
pub(crate) fn now_stamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Fresh opaque identifier.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
