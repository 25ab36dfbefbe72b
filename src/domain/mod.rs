//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - feature inputs (`FeatureValue`, `FeatureRow`)
//! - the raw uploaded table (`CustomerTable`) and its batch summary
//! - prediction outputs (`Prediction`) and the export column names

pub mod types;

pub use types::*;
