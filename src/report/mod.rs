//! Terminal reporting: driver rankings and formatted output.

pub mod format;

pub use format::*;
