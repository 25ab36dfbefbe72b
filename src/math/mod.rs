//! Mathematical utilities: the logistic link function.

pub mod logistic;

pub use logistic::*;
