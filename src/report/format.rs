//! Reporting utilities: driver rankings and formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - scoring code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::bundle::{Bundle, ColumnKind};
use crate::domain::{CustomerTable, Prediction, TableStats};
use crate::error::AppError;
use crate::model::Contribution;

/// Width of the probability bar in single-result output.
const BAR_WIDTH: usize = 30;

/// Preview rows shown after a batch run.
pub const PREVIEW_ROWS: usize = 5;

/// Top churn/retention drivers for one customer (top-N each side).
#[derive(Debug, Clone)]
pub struct Drivers {
    pub churn: Vec<Contribution>,
    pub retention: Vec<Contribution>,
}

/// Split contribution terms into the strongest churn-side (positive delta)
/// and retention-side (negative delta) drivers.
pub fn rank_drivers(terms: &[Contribution], top_n: usize) -> Drivers {
    let mut sorted = terms.to_vec();
    sorted.sort_by(|a, b| {
        b.delta
            .partial_cmp(&a.delta)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let churn = sorted
        .iter()
        .filter(|t| t.delta > 0.0)
        .take(top_n)
        .cloned()
        .collect();
    let retention = sorted
        .iter()
        .rev()
        .filter(|t| t.delta < 0.0)
        .take(top_n)
        .cloned()
        .collect();

    Drivers { churn, retention }
}

/// `[######....]` for a probability in `[0, 1]`.
pub fn probability_bar(probability: f64, width: usize) -> String {
    let filled = (probability.clamp(0.0, 1.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), ".".repeat(width - filled))
}

/// Format the single-customer result.
pub fn format_single_result(pred: &Prediction) -> String {
    let mut out = String::new();
    out.push_str("=== churn - Customer Churn Score ===\n");
    out.push_str(&format!(
        "Prediction : {}\n",
        if pred.churn { "Churn" } else { "No churn" }
    ));
    out.push_str(&format!(
        "Probability: {:.2}%  {}\n",
        pred.probability * 100.0,
        probability_bar(pred.probability, BAR_WIDTH)
    ));
    out
}

/// Format the driver tables for one customer.
pub fn format_drivers(drivers: &Drivers) -> String {
    let mut out = String::new();

    out.push_str("Pushing toward churn:\n");
    out.push_str(&format_driver_table(&drivers.churn));
    out.push('\n');

    out.push_str("Holding retention:\n");
    out.push_str(&format_driver_table(&drivers.retention));

    out
}

fn format_driver_table(rows: &[Contribution]) -> String {
    if rows.is_empty() {
        return "  (none)\n".to_string();
    }
    let mut out = String::new();
    for t in rows {
        out.push_str(&format!(
            "  {:<18} {:<22} {:>+8.3}\n",
            truncate(&t.column, 18),
            truncate(&t.label, 22),
            t.delta
        ));
    }
    out
}

/// Format the batch run summary.
pub fn format_batch_summary(
    source: &str,
    encoding: &str,
    stats: &TableStats,
    blanks_replaced: usize,
) -> String {
    let mut out = String::new();

    out.push_str("=== churn - Batch Churn Scoring ===\n");
    out.push_str(&format!("Source : {source} ({encoding})\n"));
    out.push_str(&format!(
        "Rows   : n={} | columns={}\n",
        stats.n_rows, stats.n_cols
    ));
    if blanks_replaced > 0 {
        out.push_str(&format!(
            "Cleaned: {blanks_replaced} blank TotalCharges set to 0\n"
        ));
    }
    out.push_str(&format!(
        "Predicted churners: {} ({:.1}%)\n",
        stats.churners,
        stats.churn_rate * 100.0
    ));
    out.push_str(&format!(
        "Mean churn probability: {:.1}%\n",
        stats.mean_probability * 100.0
    ));

    out
}

/// Format the first rows of a scored table.
pub fn format_preview(table: &CustomerTable, predictions: &[Prediction], limit: usize) -> String {
    let shown = table.n_rows().min(predictions.len()).min(limit);
    let mut out = String::new();

    out.push_str(&format!(
        "{:<24} {:>10} {:>12}\n",
        table.headers.first().map(String::as_str).unwrap_or("row"),
        "prediction",
        "probability"
    ));
    out.push_str(&format!("{:-<24} {:-<10} {:-<12}\n", "", "", ""));

    for i in 0..shown {
        let id = table.rows[i].first().map(String::as_str).unwrap_or("");
        let pred = &predictions[i];
        out.push_str(&format!(
            "{:<24} {:>10} {:>11.2}%\n",
            truncate(id, 24),
            pred.label(),
            pred.probability * 100.0
        ));
    }
    if table.n_rows() > shown {
        out.push_str(&format!("(+{} more rows)\n", table.n_rows() - shown));
    }

    out
}

/// Format the expected input schema.
pub fn format_schema(bundle: &Bundle) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Model expects {} feature columns",
        bundle.n_features()
    ));
    if let Some(date) = bundle.trained_at {
        out.push_str(&format!(" (trained {date})"));
    }
    out.push_str(":\n");

    for name in &bundle.feature_cols {
        match bundle.column(name) {
            Some(ColumnKind::Categorical(col)) => {
                out.push_str(&format!(
                    "  {:<18} categorical  {}\n",
                    col.name,
                    truncate(&col.categories.join(" | "), 48)
                ));
            }
            Some(ColumnKind::Numerical(col)) => {
                out.push_str(&format!(
                    "  {:<18} numerical    {}..{} (default {})\n",
                    col.name,
                    fmt_bound(col.min, col.decimals),
                    fmt_bound(col.max, col.decimals),
                    fmt_bound(col.default, col.decimals)
                ));
            }
            None => {}
        }
    }

    out
}

#[derive(Serialize)]
struct SingleReport<'a> {
    churn: bool,
    probability: f64,
    label: &'static str,
    drivers: &'a [Contribution],
}

/// Single-row result as JSON (for the `--json` flag).
pub fn single_report_json(pred: &Prediction, drivers: &[Contribution]) -> Result<String, AppError> {
    let report = SingleReport {
        churn: pred.churn,
        probability: pred.probability,
        label: pred.label(),
        drivers,
    };
    serde_json::to_string_pretty(&report)
        .map_err(|e| AppError::runtime(format!("Failed to serialize result: {e}")))
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum SchemaColumn<'a> {
    Categorical {
        name: &'a str,
        categories: &'a [String],
    },
    Numerical {
        name: &'a str,
        min: f64,
        max: f64,
        default: f64,
    },
}

#[derive(Serialize)]
struct SchemaReport<'a> {
    trained_at: Option<NaiveDate>,
    columns: Vec<SchemaColumn<'a>>,
}

/// Input schema as JSON (for `columns --json`).
pub fn schema_json(bundle: &Bundle) -> Result<String, AppError> {
    let columns = bundle
        .feature_cols
        .iter()
        .filter_map(|name| match bundle.column(name) {
            Some(ColumnKind::Categorical(col)) => Some(SchemaColumn::Categorical {
                name: &col.name,
                categories: &col.categories,
            }),
            Some(ColumnKind::Numerical(col)) => Some(SchemaColumn::Numerical {
                name: &col.name,
                min: col.min,
                max: col.max,
                default: col.default,
            }),
            None => None,
        })
        .collect();

    let report = SchemaReport {
        trained_at: bundle.trained_at,
        columns,
    };
    serde_json::to_string_pretty(&report)
        .map_err(|e| AppError::runtime(format!("Failed to serialize schema: {e}")))
}

fn fmt_bound(v: f64, decimals: u8) -> String {
    format!("{v:.prec$}", prec = decimals as usize)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    for (i, ch) in s.chars().enumerate() {
        if i + 1 >= max {
            break;
        }
        out.push(ch);
    }
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::bundle::tests::tiny_bundle;

    fn terms() -> Vec<Contribution> {
        vec![
            Contribution {
                column: "Contract".to_string(),
                label: "Month-to-month".to_string(),
                delta: 0.8,
            },
            Contribution {
                column: "tenure".to_string(),
                label: "2".to_string(),
                delta: 1.4,
            },
            Contribution {
                column: "OnlineSecurity".to_string(),
                label: "Yes".to_string(),
                delta: -0.6,
            },
            Contribution {
                column: "PaperlessBilling".to_string(),
                label: "No".to_string(),
                delta: 0.0,
            },
        ]
    }

    #[test]
    fn rank_drivers_splits_by_sign() {
        let drivers = rank_drivers(&terms(), 2);
        assert_eq!(drivers.churn.len(), 2);
        assert_eq!(drivers.churn[0].column, "tenure");
        assert_eq!(drivers.churn[1].column, "Contract");
        assert_eq!(drivers.retention.len(), 1);
        assert_eq!(drivers.retention[0].column, "OnlineSecurity");
    }

    #[test]
    fn probability_bar_spans_range() {
        assert_eq!(probability_bar(0.0, 10), "[..........]");
        assert_eq!(probability_bar(1.0, 10), "[##########]");
        assert_eq!(probability_bar(0.5, 10), "[#####.....]");
        // Out-of-range values clamp instead of panicking.
        assert_eq!(probability_bar(1.7, 10), "[##########]");
    }

    #[test]
    fn single_result_mentions_label_and_percent() {
        let text = format_single_result(&Prediction::from_probability(0.731));
        assert!(text.contains("Churn"));
        assert!(text.contains("73.10%"));
    }

    #[test]
    fn preview_truncates_and_counts_rest() {
        let table = CustomerTable {
            headers: vec!["customerID".to_string()],
            rows: (0..8).map(|i| vec![format!("C{i}")]).collect(),
        };
        let predictions: Vec<Prediction> =
            (0..8).map(|i| Prediction::from_probability(i as f64 / 10.0)).collect();
        let text = format_preview(&table, &predictions, 5);
        assert!(text.contains("C0"));
        assert!(text.contains("C4"));
        assert!(!text.contains("C5"));
        assert!(text.contains("(+3 more rows)"));
    }

    #[test]
    fn schema_text_lists_both_kinds() {
        let text = format_schema(&tiny_bundle());
        assert!(text.contains("Contract"));
        assert!(text.contains("categorical"));
        assert!(text.contains("Month-to-month | Two year"));
        assert!(text.contains("tenure"));
        assert!(text.contains("0..72 (default 30)"));
    }

    #[test]
    fn json_reports_round_trip() {
        let drivers = terms();
        let json = single_report_json(&Prediction::from_probability(0.6), &drivers).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["churn"], true);
        assert_eq!(value["label"], "Yes");
        assert_eq!(value["drivers"].as_array().unwrap().len(), 4);

        let schema = schema_json(&tiny_bundle()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&schema).unwrap();
        let cols = value["columns"].as_array().unwrap();
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0]["kind"], "categorical");
        assert_eq!(cols[1]["kind"], "numerical");
        assert_eq!(cols[1]["name"], "tenure");
    }

    #[test]
    fn batch_summary_reports_cleaning() {
        let stats = TableStats {
            n_rows: 100,
            n_cols: 21,
            churners: 27,
            churn_rate: 0.27,
            mean_probability: 0.31,
        };
        let text = format_batch_summary("data.csv", "Latin-1", &stats, 3);
        assert!(text.contains("data.csv (Latin-1)"));
        assert!(text.contains("n=100"));
        assert!(text.contains("3 blank TotalCharges"));
        assert!(text.contains("27 (27.0%)"));

        let none = format_batch_summary("data.csv", "UTF-8", &stats, 0);
        assert!(!none.contains("Cleaned"));
    }
}
