//! CSV ingest and schema validation.
//!
//! Turns an uploaded customer CSV into a rectangular `CustomerTable` that is
//! safe to clean and score.
//!
//! Design goals:
//! - **Two-step decode**: UTF-8 first, Latin-1 when the bytes are not valid
//!   UTF-8 (subscriber exports from older Windows tooling are common)
//! - **Strict schema** for required feature columns (clear errors + exit 2)
//! - **Cells preserved verbatim** so the export round-trips the input
//! - **Separation of concerns**: no cleaning or scoring logic here

use std::fs;
use std::path::Path;

use crate::data::bundle::Bundle;
use crate::domain::{CustomerTable, FeatureRow, FeatureValue};
use crate::error::AppError;

/// How the raw bytes were decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceEncoding {
    Utf8,
    Latin1,
}

impl SourceEncoding {
    pub fn label(&self) -> &'static str {
        match self {
            SourceEncoding::Utf8 => "UTF-8",
            SourceEncoding::Latin1 => "Latin-1",
        }
    }
}

/// Ingest output: the table plus how its bytes were decoded.
#[derive(Debug, Clone)]
pub struct IngestedTable {
    pub table: CustomerTable,
    pub encoding: SourceEncoding,
}

/// Read a customer CSV from disk.
pub fn read_table(path: &Path) -> Result<IngestedTable, AppError> {
    let bytes = fs::read(path)
        .map_err(|e| AppError::config(format!("Failed to open CSV '{}': {e}", path.display())))?;
    parse_table(bytes)
        .map_err(|e| AppError::new(e.exit_code(), format!("{}: {e}", path.display())))
}

/// Parse CSV bytes into a rectangular table.
pub fn parse_table(bytes: Vec<u8>) -> Result<IngestedTable, AppError> {
    let (text, encoding) = decode_bytes(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| AppError::config(format!("Failed to read CSV headers: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
        return Err(AppError::config("The CSV has no header row."));
    }

    let mut rows = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header row, CSV lines are 1-based.
        let line = idx + 2;
        let record =
            result.map_err(|e| AppError::data(format!("Line {line}: CSV parse error: {e}")))?;
        if record.len() != headers.len() {
            return Err(AppError::data(format!(
                "Line {line}: expected {} fields, found {}.",
                headers.len(),
                record.len()
            )));
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(IngestedTable {
        table: CustomerTable { headers, rows },
        encoding,
    })
}

/// Decode CSV bytes: valid UTF-8 as-is, anything else as Latin-1.
///
/// Latin-1 maps each byte to the code point of the same value, so the
/// fallback can never fail; it just reinterprets.
fn decode_bytes(bytes: Vec<u8>) -> (String, SourceEncoding) {
    match String::from_utf8(bytes) {
        Ok(text) => (text, SourceEncoding::Utf8),
        Err(e) => {
            let text = e.into_bytes().iter().map(|&b| b as char).collect();
            (text, SourceEncoding::Latin1)
        }
    }
}

/// Fail with the full list of feature columns the table is missing.
pub fn ensure_feature_columns(table: &CustomerTable, bundle: &Bundle) -> Result<(), AppError> {
    let missing = table.missing_columns(&bundle.feature_cols);
    if missing.is_empty() {
        return Ok(());
    }
    Err(AppError::config(format!(
        "The uploaded CSV is missing required columns: {}",
        missing.join(", ")
    )))
}

/// Project table rows onto the bundle's feature columns as typed rows.
///
/// Categorical cells stay text; numeric cells must parse as floats, with
/// errors naming the line and the offending token. Call after cleaning so
/// repaired blanks parse.
pub fn to_feature_rows(table: &CustomerTable, bundle: &Bundle) -> Result<Vec<FeatureRow>, AppError> {
    ensure_feature_columns(table, bundle)?;

    let mut cat_idx = Vec::with_capacity(bundle.cat_cols.len());
    for col in &bundle.cat_cols {
        if let Some(idx) = table.column_index(&col.name) {
            cat_idx.push((col.name.as_str(), idx));
        }
    }
    let mut num_idx = Vec::with_capacity(bundle.num_cols.len());
    for col in &bundle.num_cols {
        if let Some(idx) = table.column_index(&col.name) {
            num_idx.push((col.name.as_str(), idx));
        }
    }

    let mut out = Vec::with_capacity(table.n_rows());
    for (i, cells) in table.rows.iter().enumerate() {
        let line = i + 2;
        let mut row = FeatureRow::new();
        for &(name, idx) in &cat_idx {
            row.insert(name, FeatureValue::Text(cells[idx].clone()));
        }
        for &(name, idx) in &num_idx {
            let token = cells[idx].trim();
            let value = token.parse::<f64>().map_err(|_| {
                AppError::data(format!(
                    "Line {line}: column `{name}` has a non-numeric value `{token}`."
                ))
            })?;
            row.insert(name, FeatureValue::Number(value));
        }
        out.push(row);
    }
    Ok(out)
}
