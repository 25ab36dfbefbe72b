//! Command-line parsing for the churn scoring front-end.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the scoring code.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::error::AppError;

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "churn", version, about = "Customer churn scoring front-end")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Score one customer from --set values; bundle defaults fill the rest.
    Predict(PredictArgs),
    /// Score a customer CSV and export predictions.
    Batch(BatchArgs),
    /// Print the feature columns the model expects.
    Columns(ColumnsArgs),
    /// Generate a synthetic customer CSV for trying the tool.
    Sample(SampleArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same scoring pipeline as `churn predict` and
    /// `churn batch`, but renders an interactive form using Ratatui.
    Tui(TuiArgs),
}

/// Options for single-customer scoring.
#[derive(Debug, Parser, Clone)]
pub struct PredictArgs {
    /// Model bundle JSON (default: $CHURN_BUNDLE, then churn_pipeline.json).
    #[arg(short = 'b', long, value_name = "JSON")]
    pub bundle: Option<PathBuf>,

    /// Set a feature value (repeatable), e.g. --set Contract="Two year".
    #[arg(long = "set", value_name = "COL=VALUE")]
    pub set: Vec<String>,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,

    /// Show the top churn/retention drivers.
    #[arg(long)]
    pub explain: bool,

    /// Driver rows per side with --explain.
    #[arg(long, default_value_t = 5)]
    pub top: usize,
}

/// Options for batch scoring.
#[derive(Debug, Parser, Clone)]
pub struct BatchArgs {
    /// Model bundle JSON (default: $CHURN_BUNDLE, then churn_pipeline.json).
    #[arg(short = 'b', long, value_name = "JSON")]
    pub bundle: Option<PathBuf>,

    /// Customer CSV to score. Prompts with discovered files when omitted.
    #[arg(short = 'f', long, value_name = "CSV")]
    pub file: Option<PathBuf>,

    /// Output CSV path.
    #[arg(short = 'o', long, default_value = "predictions.csv")]
    pub output: PathBuf,

    /// Preview rows printed after scoring (0 disables the preview).
    #[arg(long, default_value_t = 5)]
    pub preview: usize,
}

/// Options for the schema listing.
#[derive(Debug, Parser, Clone)]
pub struct ColumnsArgs {
    /// Model bundle JSON (default: $CHURN_BUNDLE, then churn_pipeline.json).
    #[arg(short = 'b', long, value_name = "JSON")]
    pub bundle: Option<PathBuf>,

    /// Print the schema as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Options for synthetic sample generation.
#[derive(Debug, Parser, Clone)]
pub struct SampleArgs {
    /// Model bundle JSON (default: $CHURN_BUNDLE, then churn_pipeline.json).
    #[arg(short = 'b', long, value_name = "JSON")]
    pub bundle: Option<PathBuf>,

    /// Number of rows to generate.
    #[arg(short = 'n', long, default_value_t = 100)]
    pub count: usize,

    /// Random seed for sample generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Fraction of rows written with a blank TotalCharges.
    #[arg(long, default_value_t = 0.02)]
    pub blank_rate: f64,

    /// Output CSV path.
    #[arg(short = 'o', long, default_value = "sample_customers.csv")]
    pub output: PathBuf,
}

/// Options for the TUI.
#[derive(Debug, Parser, Clone)]
pub struct TuiArgs {
    /// Model bundle JSON (default: $CHURN_BUNDLE, then churn_pipeline.json).
    #[arg(short = 'b', long, value_name = "JSON")]
    pub bundle: Option<PathBuf>,
}

/// Split `--set COL=VALUE` pairs. The first `=` separates the column from
/// the value, so values may themselves contain `=`.
pub fn parse_set_pairs(raw: &[String]) -> Result<Vec<(String, String)>, AppError> {
    let mut out = Vec::with_capacity(raw.len());
    for item in raw {
        let Some((col, value)) = item.split_once('=') else {
            return Err(AppError::config(format!(
                "Invalid --set `{item}` (expected COL=VALUE)."
            )));
        };
        let col = col.trim();
        if col.is_empty() {
            return Err(AppError::config(format!(
                "Invalid --set `{item}` (empty column name)."
            )));
        }
        out.push((col.to_string(), value.trim().to_string()));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_pairs_split_on_first_equals() {
        let raw = vec![
            "Contract=Two year".to_string(),
            "note=a=b".to_string(),
            " tenure = 12 ".to_string(),
        ];
        let pairs = parse_set_pairs(&raw).unwrap();
        assert_eq!(pairs[0], ("Contract".to_string(), "Two year".to_string()));
        assert_eq!(pairs[1], ("note".to_string(), "a=b".to_string()));
        assert_eq!(pairs[2], ("tenure".to_string(), "12".to_string()));
    }

    #[test]
    fn set_without_equals_is_rejected() {
        let err = parse_set_pairs(&["Contract".to_string()]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("COL=VALUE"));
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["churn", "predict", "--set", "tenure=5", "--json"]).unwrap();
        match cli.command {
            Command::Predict(args) => {
                assert_eq!(args.set, vec!["tenure=5".to_string()]);
                assert!(args.json);
                assert!(!args.explain);
            }
            _ => panic!("expected predict"),
        }

        let cli = Cli::try_parse_from(["churn", "batch", "-f", "data.csv"]).unwrap();
        match cli.command {
            Command::Batch(args) => {
                assert_eq!(args.file, Some(PathBuf::from("data.csv")));
                assert_eq!(args.output, PathBuf::from("predictions.csv"));
            }
            _ => panic!("expected batch"),
        }
    }
}
