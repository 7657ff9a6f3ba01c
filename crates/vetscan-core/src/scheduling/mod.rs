//! Appointment scheduling.
//!
//! Every booking or edit goes through [`ConflictChecker`] before it is
//! written. A veterinarian is busy during the half-open window
//! `[start, start + duration)`, so back-to-back bookings are allowed.

mod checker;
mod interval;
mod scheduler;

pub use checker::*;
pub use interval::*;
pub use scheduler::*;
