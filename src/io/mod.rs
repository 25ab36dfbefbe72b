//! Input/output helpers.
//!
//! - CSV ingest + schema validation (`ingest`)
//! - TotalCharges repair (`clean`)
//! - predictions CSV export (`export`)

pub mod clean;
pub mod export;
pub mod ingest;

pub use clean::*;
pub use export::*;
pub use ingest::*;
