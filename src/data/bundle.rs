//! The fitted pipeline bundle: load-once model artifact plus column metadata.
//!
//! A bundle is a JSON file exported by the training side. It carries fitted
//! *parameters*, not code:
//!
//! - `feature_cols`: the exact input columns the model expects, in form order
//! - `cat_cols`: per categorical column, the fitted category list
//! - `num_cols`: per numerical column, standardization stats plus form
//!   metadata (range, default, display decimals)
//! - `classifier`: logistic-regression coefficients and intercept
//!
//! Encoded-vector layout (the contract with the exporter): for each
//! `cat_cols` entry in order, a one-hot block over its categories, followed by
//! each `num_cols` entry in order as `(x - mean) / scale`. The coefficient
//! vector must have exactly that length; `validate` enforces it at load time
//! so scoring code never has to re-check shapes.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Bundle file looked up in the working directory when nothing else is given.
pub const DEFAULT_BUNDLE_PATH: &str = "churn_pipeline.json";

/// Environment variable overriding the bundle path (a `.env` file works too).
pub const BUNDLE_ENV: &str = "CHURN_BUNDLE";

/// The one bundle schema this build understands.
pub const SCHEMA_VERSION: u32 = 1;

/// What to do when a batch value falls outside a categorical domain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCategory {
    /// Reject the table with an error naming row, column, and value.
    #[default]
    Error,
    /// Encode the value as an all-zero block (the "ignore" convention).
    Ignore,
}

/// A categorical feature column and its fitted domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatColumn {
    pub name: String,
    /// One-hot order; also the selection order offered by the form.
    pub categories: Vec<String>,
}

/// A numerical feature column: standardization stats plus form metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumColumn {
    pub name: String,
    /// Fitted mean used for standardization.
    pub mean: f64,
    /// Fitted scale (standard deviation); strictly positive.
    pub scale: f64,
    /// Lower slider bound in the form.
    pub min: f64,
    /// Upper slider bound in the form.
    pub max: f64,
    /// Initial form value.
    pub default: f64,
    /// Display decimals (0 for counts like tenure, 2 for money).
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

fn default_decimals() -> u8 {
    2
}

/// Fitted binary logistic regression over the encoded vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

/// The whole artifact. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
    pub schema_version: u32,
    /// Training date, if the exporter recorded one (shown in headers).
    #[serde(default)]
    pub trained_at: Option<NaiveDate>,
    pub feature_cols: Vec<String>,
    pub cat_cols: Vec<CatColumn>,
    pub num_cols: Vec<NumColumn>,
    pub classifier: LogisticModel,
    #[serde(default)]
    pub unknown_category: UnknownCategory,
}

/// A feature column resolved to its metadata.
#[derive(Debug, Clone, Copy)]
pub enum ColumnKind<'a> {
    Categorical(&'a CatColumn),
    Numerical(&'a NumColumn),
}

impl Bundle {
    /// Load and validate a bundle file.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::config(format!(
                    "Churn model bundle '{}' was not found. Place it in the working \
                     directory or point --bundle / {BUNDLE_ENV} at it.",
                    path.display()
                ))
            } else {
                AppError::config(format!(
                    "Failed to open model bundle '{}': {e}",
                    path.display()
                ))
            }
        })?;

        let bundle: Bundle = serde_json::from_reader(file).map_err(|e| {
            AppError::config(format!("Invalid model bundle '{}': {e}", path.display()))
        })?;

        bundle.validate()?;
        Ok(bundle)
    }

    /// Length of the encoded feature vector (and of `coefficients`).
    pub fn encoded_len(&self) -> usize {
        let cat: usize = self.cat_cols.iter().map(|c| c.categories.len()).sum();
        cat + self.num_cols.len()
    }

    pub fn n_features(&self) -> usize {
        self.feature_cols.len()
    }

    pub fn cat(&self, name: &str) -> Option<&CatColumn> {
        self.cat_cols.iter().find(|c| c.name == name)
    }

    pub fn num(&self, name: &str) -> Option<&NumColumn> {
        self.num_cols.iter().find(|c| c.name == name)
    }

    /// Resolve a feature column to its kind. `None` only for names outside
    /// `feature_cols` (validation ties the three lists together).
    pub fn column(&self, name: &str) -> Option<ColumnKind<'_>> {
        if let Some(c) = self.cat(name) {
            return Some(ColumnKind::Categorical(c));
        }
        self.num(name).map(ColumnKind::Numerical)
    }

    /// Structural validation run once at load time.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(AppError::config(format!(
                "Unsupported bundle schema_version {} (this build reads version {SCHEMA_VERSION}).",
                self.schema_version
            )));
        }
        if self.feature_cols.is_empty() {
            return Err(AppError::config("Bundle has an empty feature_cols list."));
        }

        for (i, name) in self.feature_cols.iter().enumerate() {
            if self.feature_cols[..i].contains(name) {
                return Err(AppError::config(format!(
                    "Bundle lists feature column `{name}` more than once."
                )));
            }
        }

        // Every feature column must be exactly one of categorical/numerical.
        for name in &self.feature_cols {
            match (self.cat(name).is_some(), self.num(name).is_some()) {
                (true, true) => {
                    return Err(AppError::config(format!(
                        "Bundle column `{name}` appears in both cat_cols and num_cols."
                    )));
                }
                (false, false) => {
                    return Err(AppError::config(format!(
                        "Bundle column `{name}` has no cat_cols/num_cols entry."
                    )));
                }
                _ => {}
            }
        }
        if self.cat_cols.len() + self.num_cols.len() != self.feature_cols.len() {
            return Err(AppError::config(
                "Bundle cat_cols/num_cols name columns outside feature_cols.",
            ));
        }

        for col in &self.cat_cols {
            if col.categories.is_empty() {
                return Err(AppError::config(format!(
                    "Categorical column `{}` has no categories.",
                    col.name
                )));
            }
            for (i, cat) in col.categories.iter().enumerate() {
                if col.categories[..i].contains(cat) {
                    return Err(AppError::config(format!(
                        "Categorical column `{}` repeats category `{cat}`.",
                        col.name
                    )));
                }
            }
        }

        for col in &self.num_cols {
            if !col.mean.is_finite() {
                return Err(AppError::config(format!(
                    "Numeric column `{}` has a non-finite mean.",
                    col.name
                )));
            }
            if !(col.scale.is_finite() && col.scale > 0.0) {
                return Err(AppError::config(format!(
                    "Numeric column `{}` has an invalid scale (must be finite and > 0).",
                    col.name
                )));
            }
            if !(col.min.is_finite() && col.max.is_finite() && col.min < col.max) {
                return Err(AppError::config(format!(
                    "Numeric column `{}` has an invalid range (need finite min < max).",
                    col.name
                )));
            }
            if !(col.default.is_finite() && col.default >= col.min && col.default <= col.max) {
                return Err(AppError::config(format!(
                    "Numeric column `{}` has a default outside its range.",
                    col.name
                )));
            }
        }

        let expected = self.encoded_len();
        if self.classifier.coefficients.len() != expected {
            return Err(AppError::config(format!(
                "Classifier has {} coefficients but the encoded layout needs {expected}.",
                self.classifier.coefficients.len()
            )));
        }
        if self.classifier.coefficients.iter().any(|c| !c.is_finite())
            || !self.classifier.intercept.is_finite()
        {
            return Err(AppError::config(
                "Classifier coefficients/intercept must all be finite.",
            ));
        }

        Ok(())
    }
}

/// Resolve the bundle path: `--bundle` flag, else `CHURN_BUNDLE` from the
/// environment (after loading `.env`), else the default file name.
pub fn resolve_bundle_path(flag: Option<&Path>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    dotenvy::dotenv().ok();
    if let Ok(value) = std::env::var(BUNDLE_ENV) {
        let trimmed = value.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    PathBuf::from(DEFAULT_BUNDLE_PATH)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A 2-category + 1-numeric bundle small enough to hand-check.
    pub(crate) fn tiny_bundle() -> Bundle {
        let json = r#"{
            "schema_version": 1,
            "trained_at": "2025-06-30",
            "feature_cols": ["Contract", "tenure"],
            "cat_cols": [
                {"name": "Contract", "categories": ["Month-to-month", "Two year"]}
            ],
            "num_cols": [
                {"name": "tenure", "mean": 30.0, "scale": 10.0,
                 "min": 0.0, "max": 72.0, "default": 30.0, "decimals": 0}
            ],
            "classifier": {"coefficients": [0.8, -0.6, -0.5], "intercept": 0.1}
        }"#;
        let bundle: Bundle = serde_json::from_str(json).unwrap();
        bundle.validate().unwrap();
        bundle
    }

    #[test]
    fn tiny_bundle_parses_with_defaults() {
        let bundle = tiny_bundle();
        assert_eq!(bundle.encoded_len(), 3);
        assert_eq!(bundle.n_features(), 2);
        assert_eq!(bundle.unknown_category, UnknownCategory::Error);
        assert_eq!(
            bundle.trained_at,
            NaiveDate::from_ymd_opt(2025, 6, 30)
        );
        assert!(matches!(
            bundle.column("Contract"),
            Some(ColumnKind::Categorical(_))
        ));
        assert!(matches!(
            bundle.column("tenure"),
            Some(ColumnKind::Numerical(_))
        ));
        assert!(bundle.column("nope").is_none());
    }

    #[test]
    fn validate_rejects_coefficient_length_mismatch() {
        let mut bundle = tiny_bundle();
        bundle.classifier.coefficients.pop();
        let err = bundle.validate().unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("coefficients"));
    }

    #[test]
    fn validate_rejects_unlisted_feature_column() {
        let mut bundle = tiny_bundle();
        bundle.feature_cols.push("MonthlyCharges".to_string());
        assert!(bundle.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_scale() {
        let mut bundle = tiny_bundle();
        bundle.num_cols[0].scale = 0.0;
        let err = bundle.validate().unwrap_err();
        assert!(err.to_string().contains("scale"));
    }

    #[test]
    fn validate_rejects_duplicate_categories() {
        let mut bundle = tiny_bundle();
        bundle.cat_cols[0]
            .categories
            .push("Month-to-month".to_string());
        // Keep the coefficient vector in step so only the duplicate trips.
        bundle.classifier.coefficients.push(0.0);
        let err = bundle.validate().unwrap_err();
        assert!(err.to_string().contains("repeats category"));
    }

    #[test]
    fn validate_rejects_cat_num_overlap() {
        let mut bundle = tiny_bundle();
        bundle.num_cols.push(NumColumn {
            name: "Contract".to_string(),
            mean: 0.0,
            scale: 1.0,
            min: 0.0,
            max: 1.0,
            default: 0.5,
            decimals: 2,
        });
        bundle.classifier.coefficients.push(0.0);
        let err = bundle.validate().unwrap_err();
        assert!(err.to_string().contains("both cat_cols and num_cols"));
    }

    #[test]
    fn validate_rejects_wrong_schema_version() {
        let mut bundle = tiny_bundle();
        bundle.schema_version = 2;
        let err = bundle.validate().unwrap_err();
        assert!(err.to_string().contains("schema_version"));
    }

    #[test]
    fn flag_wins_path_resolution() {
        let flag = PathBuf::from("custom/bundle.json");
        assert_eq!(resolve_bundle_path(Some(&flag)), flag);
    }
}
