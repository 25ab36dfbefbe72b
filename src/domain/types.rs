//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can
//! be:
//!
//! - built from form/CLI inputs or from an uploaded CSV
//! - fed through the prediction pipeline
//! - exported back out as CSV/JSON

use std::collections::HashMap;

use serde::Serialize;

/// Probability threshold above which a customer is labeled a churner.
///
/// The comparison is inclusive: `probability >= CHURN_THRESHOLD` ⇒ churn.
pub const CHURN_THRESHOLD: f64 = 0.5;

/// The one column the cleaner rewrites (blank → "0") before parsing.
pub const TOTAL_CHARGES_COL: &str = "TotalCharges";

/// Name of the appended 0/1 prediction column in batch exports.
pub const PREDICTION_COL: &str = "ChurnPrediction";

/// Name of the appended probability column in batch exports.
pub const PROBABILITY_COL: &str = "ChurnProbability";

/// A single feature value: text for categoricals, a float for numericals.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Text(String),
    Number(f64),
}

impl FeatureValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(s) => Some(s),
            FeatureValue::Number(_) => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Text(_) => None,
            FeatureValue::Number(v) => Some(*v),
        }
    }

    /// Render a numeric value with a fixed number of decimals; text verbatim.
    pub fn display_with(&self, decimals: u8) -> String {
        match self {
            FeatureValue::Text(s) => s.clone(),
            FeatureValue::Number(v) => format!("{v:.prec$}", prec = decimals as usize),
        }
    }
}

impl std::fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureValue::Text(s) => write!(f, "{s}"),
            FeatureValue::Number(v) => {
                if v.fract() == 0.0 && v.abs() < 1e15 {
                    write!(f, "{v:.0}")
                } else {
                    write!(f, "{v}")
                }
            }
        }
    }
}

/// One customer's feature values, keyed by column name.
///
/// A row is complete when it contains exactly the bundle's feature columns;
/// the pipeline enforces this at encode time.
#[derive(Debug, Clone, Default)]
pub struct FeatureRow {
    values: HashMap<String, FeatureValue>,
}

impl FeatureRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: FeatureValue) {
        self.values.insert(column.into(), value);
    }

    pub fn get(&self, column: &str) -> Option<&FeatureValue> {
        self.values.get(column)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Outcome of scoring one customer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    /// True when `probability >= CHURN_THRESHOLD`.
    pub churn: bool,
    /// Positive-class (churn) probability in `[0, 1]`.
    pub probability: f64,
}

impl Prediction {
    pub fn from_probability(probability: f64) -> Self {
        Self {
            churn: probability >= CHURN_THRESHOLD,
            probability,
        }
    }

    /// 1 for churn, 0 otherwise (the exported encoding).
    pub fn class_index(&self) -> u8 {
        if self.churn { 1 } else { 0 }
    }

    /// Human-readable label for terminal output.
    pub fn label(&self) -> &'static str {
        if self.churn { "Yes" } else { "No" }
    }
}

/// An uploaded table, kept verbatim.
///
/// Headers and cells are stored exactly as read (minus CSV framing) so the
/// export can round-trip every original column and only append the two
/// prediction columns. Lookups normalize headers (BOM strip + trim) but never
/// rewrite them.
#[derive(Debug, Clone, Default)]
pub struct CustomerTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CustomerTable {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Find a column by name (case-sensitive, after BOM/whitespace cleanup).
    pub fn column_index(&self, name: &str) -> Option<usize> {
        let wanted = normalize_header(name);
        self.headers
            .iter()
            .position(|h| normalize_header(h) == wanted)
    }

    /// Which of `required` are absent, preserving `required` order.
    pub fn missing_columns(&self, required: &[String]) -> Vec<String> {
        required
            .iter()
            .filter(|name| self.column_index(name).is_none())
            .cloned()
            .collect()
    }
}

/// Canonical form used for header comparison.
///
/// Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
/// first header; without stripping it, column validation would falsely report
/// the first column missing. Matching stays case-sensitive: the bundle and
/// the training data share exact column names.
pub fn normalize_header(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_string()
}

/// Summary of a scored batch (drives the terminal summary and the TUI).
#[derive(Debug, Clone, Copy)]
pub struct TableStats {
    pub n_rows: usize,
    pub n_cols: usize,
    pub churners: usize,
    pub churn_rate: f64,
    pub mean_probability: f64,
}

impl TableStats {
    pub fn from_predictions(table: &CustomerTable, predictions: &[Prediction]) -> Self {
        let n_rows = predictions.len();
        let churners = predictions.iter().filter(|p| p.churn).count();
        let sum: f64 = predictions.iter().map(|p| p.probability).sum();
        let denom = n_rows.max(1) as f64;
        Self {
            n_rows,
            n_cols: table.n_cols(),
            churners,
            churn_rate: churners as f64 / denom,
            mean_probability: sum / denom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_threshold_is_inclusive() {
        assert!(Prediction::from_probability(0.5).churn);
        assert!(!Prediction::from_probability(0.4999).churn);
        assert_eq!(Prediction::from_probability(0.5).class_index(), 1);
        assert_eq!(Prediction::from_probability(0.0).class_index(), 0);
        assert_eq!(Prediction::from_probability(0.9).label(), "Yes");
        assert_eq!(Prediction::from_probability(0.1).label(), "No");
    }

    #[test]
    fn column_lookup_survives_bom_and_padding() {
        let table = CustomerTable {
            headers: vec!["\u{feff}customerID".to_string(), " tenure ".to_string()],
            rows: vec![],
        };
        assert_eq!(table.column_index("customerID"), Some(0));
        assert_eq!(table.column_index("tenure"), Some(1));
        assert_eq!(table.column_index("Tenure"), None);
    }

    #[test]
    fn missing_columns_preserve_required_order() {
        let table = CustomerTable {
            headers: vec!["tenure".to_string()],
            rows: vec![],
        };
        let required = vec![
            "Contract".to_string(),
            "tenure".to_string(),
            "MonthlyCharges".to_string(),
        ];
        assert_eq!(
            table.missing_columns(&required),
            vec!["Contract".to_string(), "MonthlyCharges".to_string()]
        );
    }

    #[test]
    fn stats_count_churners() {
        let table = CustomerTable {
            headers: vec!["a".to_string(), "b".to_string()],
            rows: vec![vec![String::new(); 2]; 4],
        };
        let preds = vec![
            Prediction::from_probability(0.9),
            Prediction::from_probability(0.1),
            Prediction::from_probability(0.6),
            Prediction::from_probability(0.2),
        ];
        let stats = TableStats::from_predictions(&table, &preds);
        assert_eq!(stats.n_rows, 4);
        assert_eq!(stats.n_cols, 2);
        assert_eq!(stats.churners, 2);
        assert!((stats.churn_rate - 0.5).abs() < 1e-12);
        assert!((stats.mean_probability - 0.45).abs() < 1e-12);
    }
}
