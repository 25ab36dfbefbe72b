//! Feature encoding and scoring against the loaded bundle.
//!
//! The encoded vector follows the bundle's layout contract: a one-hot block
//! per `cat_cols` entry (in order), then one standardized slot per `num_cols`
//! entry. A single row scores as a dot product; a table scores as one
//! design-matrix × coefficient product followed by a sigmoid per row.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use crate::data::bundle::{Bundle, UnknownCategory};
use crate::domain::{FeatureRow, FeatureValue, Prediction};
use crate::error::AppError;
use crate::math::sigmoid;

/// One feature's pull on the score: `coefficient × encoded value`, summed
/// over the column's block. Positive pushes toward churn.
#[derive(Debug, Clone, Serialize)]
pub struct Contribution {
    pub column: String,
    /// The value behind the term (chosen category or formatted number).
    pub label: String,
    pub delta: f64,
}

/// Encode one row into the bundle's feature-vector layout.
pub fn encode_row(bundle: &Bundle, row: &FeatureRow) -> Result<DVector<f64>, AppError> {
    let mut out = Vec::with_capacity(bundle.encoded_len());
    encode_into(bundle, row, &mut out)?;
    Ok(DVector::from_vec(out))
}

/// Score one row: encode, affine score, sigmoid, threshold.
pub fn predict_row(bundle: &Bundle, row: &FeatureRow) -> Result<Prediction, AppError> {
    let x = encode_row(bundle, row)?;
    let coef = DVector::from_row_slice(&bundle.classifier.coefficients);
    let score = x.dot(&coef) + bundle.classifier.intercept;
    Ok(Prediction::from_probability(sigmoid(score)))
}

/// Score a whole table with one matrix product.
///
/// Row numbers in errors are 1-based data rows (the header is row 0).
pub fn predict_table(bundle: &Bundle, rows: &[FeatureRow]) -> Result<Vec<Prediction>, AppError> {
    if rows.is_empty() {
        return Err(AppError::data("The table has no data rows to score."));
    }

    let ncols = bundle.encoded_len();
    let mut flat = Vec::with_capacity(rows.len() * ncols);
    for (i, row) in rows.iter().enumerate() {
        encode_into(bundle, row, &mut flat)
            .map_err(|e| AppError::new(e.exit_code(), format!("Row {}: {e}", i + 1)))?;
    }

    let design = DMatrix::from_row_slice(rows.len(), ncols, &flat);
    let coef = DVector::from_row_slice(&bundle.classifier.coefficients);
    let scores = (&design * &coef).add_scalar(bundle.classifier.intercept);

    Ok(scores
        .iter()
        .map(|&s| Prediction::from_probability(sigmoid(s)))
        .collect())
}

/// Per-column score terms for one row, in encoded-layout order.
///
/// The deltas sum to `score - intercept`, so ranking them by magnitude gives
/// the row's churn/retention drivers.
pub fn contributions(bundle: &Bundle, row: &FeatureRow) -> Result<Vec<Contribution>, AppError> {
    let x = encode_row(bundle, row)?;
    let coefs = &bundle.classifier.coefficients;

    let mut out = Vec::with_capacity(bundle.cat_cols.len() + bundle.num_cols.len());
    let mut offset = 0usize;

    for col in &bundle.cat_cols {
        let mut delta = 0.0;
        let mut label = String::new();
        for (j, cat) in col.categories.iter().enumerate() {
            if x[offset + j] != 0.0 {
                delta += coefs[offset + j] * x[offset + j];
                label = cat.clone();
            }
        }
        if label.is_empty() {
            // All-zero block: an unknown value under the ignore policy.
            label = row
                .get(&col.name)
                .map(|v| v.to_string())
                .unwrap_or_default();
        }
        out.push(Contribution {
            column: col.name.clone(),
            label,
            delta,
        });
        offset += col.categories.len();
    }

    for col in &bundle.num_cols {
        let delta = coefs[offset] * x[offset];
        let label = row
            .get(&col.name)
            .map(|v| v.display_with(col.decimals))
            .unwrap_or_default();
        out.push(Contribution {
            column: col.name.clone(),
            label,
            delta,
        });
        offset += 1;
    }

    Ok(out)
}

fn encode_into(bundle: &Bundle, row: &FeatureRow, out: &mut Vec<f64>) -> Result<(), AppError> {
    for col in &bundle.cat_cols {
        let value = row
            .get(&col.name)
            .ok_or_else(|| missing_value(&col.name))?;
        let text = match value {
            FeatureValue::Text(s) => s.trim().to_string(),
            // Numeric-looking categoricals (SeniorCitizen's 0/1) match on
            // their integer rendering.
            FeatureValue::Number(_) => value.to_string(),
        };

        match col.categories.iter().position(|c| *c == text) {
            Some(idx) => {
                for j in 0..col.categories.len() {
                    out.push(if j == idx { 1.0 } else { 0.0 });
                }
            }
            None => match bundle.unknown_category {
                UnknownCategory::Ignore => {
                    out.resize(out.len() + col.categories.len(), 0.0);
                }
                UnknownCategory::Error => {
                    return Err(AppError::data(format!(
                        "Unknown {} value `{text}` (expected one of: {}).",
                        col.name,
                        col.categories.join(", ")
                    )));
                }
            },
        }
    }

    for col in &bundle.num_cols {
        let value = row
            .get(&col.name)
            .ok_or_else(|| missing_value(&col.name))?;
        let v = match value {
            FeatureValue::Number(v) => *v,
            FeatureValue::Text(s) => {
                let token = s.trim();
                token.parse::<f64>().map_err(|_| {
                    AppError::data(format!(
                        "Column `{}` has a non-numeric value `{token}`.",
                        col.name
                    ))
                })?
            }
        };
        if !v.is_finite() {
            return Err(AppError::data(format!(
                "Column `{}` has a non-finite value.",
                col.name
            )));
        }
        out.push((v - col.mean) / col.scale);
    }

    Ok(())
}

fn missing_value(column: &str) -> AppError {
    AppError::data(format!("Missing value for column `{column}`."))
}
