//! Model artifact loading and synthetic data generation.

pub mod bundle;
pub mod sample;

pub use bundle::{
    resolve_bundle_path, Bundle, CatColumn, ColumnKind, LogisticModel, NumColumn, UnknownCategory,
    BUNDLE_ENV, DEFAULT_BUNDLE_PATH,
};
pub use sample::{generate_sample, SampleConfig, SampleData};
