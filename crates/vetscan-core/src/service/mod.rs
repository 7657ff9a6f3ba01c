//! Directory and clinical-record services.

mod directory;
mod records;
mod staff;

pub use directory::*;
pub use records::*;
pub use staff::*;
