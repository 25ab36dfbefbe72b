//! Shared scoring pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! read -> column check -> clean -> typed rows -> score -> stats
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::path::Path;

use crate::data::bundle::{Bundle, ColumnKind};
use crate::domain::{CustomerTable, FeatureRow, FeatureValue, Prediction, TableStats};
use crate::error::AppError;
use crate::io::clean::clean_total_charges;
use crate::io::ingest::{ensure_feature_columns, read_table, to_feature_rows, SourceEncoding};
use crate::model::{predict_row, predict_table};

/// All computed outputs of one batch scoring run.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    /// The cleaned input table (blanks already repaired).
    pub table: CustomerTable,
    pub predictions: Vec<Prediction>,
    pub stats: TableStats,
    pub encoding: SourceEncoding,
    pub blanks_replaced: usize,
}

/// A form row seeded with bundle defaults: the first category for
/// categoricals, the stored default for numericals.
pub fn default_row(bundle: &Bundle) -> FeatureRow {
    let mut row = FeatureRow::new();
    for name in &bundle.feature_cols {
        match bundle.column(name) {
            Some(ColumnKind::Categorical(col)) => {
                if let Some(first) = col.categories.first() {
                    row.insert(col.name.clone(), FeatureValue::Text(first.clone()));
                }
            }
            Some(ColumnKind::Numerical(col)) => {
                row.insert(col.name.clone(), FeatureValue::Number(col.default));
            }
            None => {}
        }
    }
    row
}

/// Overlay `--set` pairs on the default row, validated against the schema.
pub fn build_form_row(
    bundle: &Bundle,
    overrides: &[(String, String)],
) -> Result<FeatureRow, AppError> {
    let mut row = default_row(bundle);
    for (col, value) in overrides {
        match bundle.column(col) {
            Some(ColumnKind::Categorical(cat)) => {
                if !cat.categories.iter().any(|c| c == value) {
                    return Err(AppError::config(format!(
                        "Invalid {col} value `{value}` (expected one of: {}).",
                        cat.categories.join(", ")
                    )));
                }
                row.insert(cat.name.clone(), FeatureValue::Text(value.clone()));
            }
            Some(ColumnKind::Numerical(num)) => {
                let v = value.parse::<f64>().map_err(|_| {
                    AppError::config(format!("Invalid numeric value for {col}: `{value}`."))
                })?;
                row.insert(num.name.clone(), FeatureValue::Number(v));
            }
            None => {
                return Err(AppError::config(format!(
                    "Unknown column `{col}`. Run `churn columns` to list the schema."
                )));
            }
        }
    }
    Ok(row)
}

/// Score one customer row.
pub fn score_single(bundle: &Bundle, row: &FeatureRow) -> Result<Prediction, AppError> {
    predict_row(bundle, row)
}

/// Execute the full batch pipeline for a CSV on disk.
pub fn run_batch(bundle: &Bundle, path: &Path) -> Result<BatchOutput, AppError> {
    let ingested = read_table(path)?;
    if ingested.encoding == SourceEncoding::Latin1 {
        log::warn!(
            "'{}' is not valid UTF-8; decoded as Latin-1",
            path.display()
        );
    }
    run_batch_with_table(bundle, ingested.table, ingested.encoding)
}

/// Execute the batch pipeline with an already-ingested table.
///
/// This is useful for the TUI, which loads the table when the user picks a
/// file and scores it on demand.
pub fn run_batch_with_table(
    bundle: &Bundle,
    mut table: CustomerTable,
    encoding: SourceEncoding,
) -> Result<BatchOutput, AppError> {
    ensure_feature_columns(&table, bundle)?;

    let clean = clean_total_charges(&mut table)?;
    if clean.blanks_replaced > 0 {
        log::warn!(
            "{} blank TotalCharges cell(s) set to 0",
            clean.blanks_replaced
        );
    }

    let rows = to_feature_rows(&table, bundle)?;
    let predictions = predict_table(bundle, &rows)?;
    let stats = TableStats::from_predictions(&table, &predictions);
    log::info!(
        "scored {} rows: {} predicted churners",
        stats.n_rows,
        stats.churners
    );

    Ok(BatchOutput {
        table,
        predictions,
        stats,
        encoding,
        blanks_replaced: clean.blanks_replaced,
    })
}
