//! TotalCharges repair.
//!
//! Telco exports leave `TotalCharges` blank (a lone space) for customers with
//! zero tenure. Scoring needs a float there, so blanks become `"0"` before
//! the column is parsed. Any other non-numeric token is a hard error; the
//! upstream data is wrong and silently guessing a value would skew scores.

use crate::domain::{CustomerTable, TOTAL_CHARGES_COL};
use crate::error::AppError;

/// What the cleaner did to the table.
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanReport {
    pub blanks_replaced: usize,
}

/// Replace blank `TotalCharges` cells with `"0"` and verify the column
/// parses as floats. Tables without the column pass through untouched
/// (the schema check decides whether that is acceptable).
pub fn clean_total_charges(table: &mut CustomerTable) -> Result<CleanReport, AppError> {
    let Some(col) = table.column_index(TOTAL_CHARGES_COL) else {
        return Ok(CleanReport::default());
    };

    let mut blanks_replaced = 0usize;
    for (i, row) in table.rows.iter_mut().enumerate() {
        let Some(cell) = row.get_mut(col) else {
            continue;
        };
        let token = cell.trim();
        if token.is_empty() {
            *cell = "0".to_string();
            blanks_replaced += 1;
            continue;
        }
        if token.parse::<f64>().is_err() {
            return Err(AppError::data(format!(
                "Line {}: {TOTAL_CHARGES_COL} has a non-numeric value `{token}`.",
                i + 2
            )));
        }
    }

    Ok(CleanReport { blanks_replaced })
}
