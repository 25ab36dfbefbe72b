//! Scoring against the fitted classifier.

pub mod pipeline;

pub use pipeline::{contributions, encode_row, predict_row, predict_table, Contribution};
