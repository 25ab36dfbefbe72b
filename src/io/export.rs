//! Export scored tables to CSV.
//!
//! The export preserves every input column verbatim and appends the two
//! prediction columns, so downstream spreadsheets keep whatever identifiers
//! the upload carried. Cells go through a real CSV writer; uploaded data can
//! contain commas and quotes.

use std::path::Path;

use crate::domain::{CustomerTable, Prediction, PREDICTION_COL, PROBABILITY_COL};
use crate::error::AppError;

/// Write the input table plus `ChurnPrediction` (0/1) and `ChurnProbability`
/// (two decimals) columns.
pub fn write_predictions(
    table: &CustomerTable,
    predictions: &[Prediction],
    path: &Path,
) -> Result<(), AppError> {
    if predictions.len() != table.n_rows() {
        return Err(AppError::runtime(format!(
            "Prediction count {} does not match row count {}.",
            predictions.len(),
            table.n_rows()
        )));
    }

    let mut writer = open_writer(path)?;

    let mut header = table.headers.clone();
    header.push(PREDICTION_COL.to_string());
    header.push(PROBABILITY_COL.to_string());
    writer
        .write_record(&header)
        .map_err(|e| write_error(path, e))?;

    for (row, pred) in table.rows.iter().zip(predictions) {
        let mut record = row.clone();
        record.push(pred.class_index().to_string());
        record.push(format!("{:.2}", pred.probability));
        writer
            .write_record(&record)
            .map_err(|e| write_error(path, e))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::runtime(format!("Failed to flush '{}': {e}", path.display())))?;
    Ok(())
}

/// Write a table as-is (sample output).
pub fn write_table(table: &CustomerTable, path: &Path) -> Result<(), AppError> {
    let mut writer = open_writer(path)?;
    writer
        .write_record(&table.headers)
        .map_err(|e| write_error(path, e))?;
    for row in &table.rows {
        writer.write_record(row).map_err(|e| write_error(path, e))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::runtime(format!("Failed to flush '{}': {e}", path.display())))?;
    Ok(())
}

fn open_writer(path: &Path) -> Result<csv::Writer<std::fs::File>, AppError> {
    csv::Writer::from_path(path)
        .map_err(|e| AppError::runtime(format!("Failed to create '{}': {e}", path.display())))
}

fn write_error(path: &Path, e: csv::Error) -> AppError {
    AppError::runtime(format!("Failed to write '{}': {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scored_table() -> (CustomerTable, Vec<Prediction>) {
        let table = CustomerTable {
            headers: vec![
                "customerID".to_string(),
                "Contract".to_string(),
                "TotalCharges".to_string(),
            ],
            rows: vec![
                vec![
                    "7590-VHVEG".to_string(),
                    "Month-to-month".to_string(),
                    "29.85".to_string(),
                ],
                vec![
                    "5575-GNVDE".to_string(),
                    "One year, promo".to_string(),
                    "1889.5".to_string(),
                ],
            ],
        };
        let predictions = vec![
            Prediction::from_probability(0.731),
            Prediction::from_probability(0.065),
        ];
        (table, predictions)
    }

    #[test]
    fn export_appends_two_columns() {
        let (table, predictions) = scored_table();
        let path = std::env::temp_dir().join("churn_export_appends.csv");
        write_predictions(&table, &predictions, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.len(), table.n_cols() + 2);
        assert_eq!(&headers[3], PREDICTION_COL);
        assert_eq!(&headers[4], PROBABILITY_COL);

        let records: Vec<csv::StringRecord> =
            reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][3], "1");
        assert_eq!(&records[0][4], "0.73");
        assert_eq!(&records[1][3], "0");
        assert_eq!(&records[1][4], "0.07");
        // The comma-bearing cell survived quoting.
        assert_eq!(&records[1][1], "One year, promo");

        fs::remove_file(&path).ok();
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let (table, mut predictions) = scored_table();
        predictions.pop();
        let path = std::env::temp_dir().join("churn_export_mismatch.csv");
        let err = write_predictions(&table, &predictions, &path).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn plain_table_round_trips() {
        let (table, _) = scored_table();
        let path = std::env::temp_dir().join("churn_export_plain.csv");
        write_table(&table, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut reader = csv::Reader::from_reader(text.as_bytes());
        assert_eq!(reader.headers().unwrap().len(), 3);
        let records: Vec<csv::StringRecord> =
            reader.records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(&records[0][0], "7590-VHVEG");

        fs::remove_file(&path).ok();
    }
}
