//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the model bundle
//! - runs single/batch scoring via the shared pipeline
//! - prints reports and writes exports

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{self, BatchArgs, Cli, ColumnsArgs, Command, PredictArgs, SampleArgs, TuiArgs};
use crate::data::bundle::{resolve_bundle_path, Bundle};
use crate::data::sample::{generate_sample, SampleConfig};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `churn` binary.
pub fn run() -> Result<(), AppError> {
    // We want bare `churn` (and `churn -b bundle.json`) to behave like
    // `churn tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of
    // the argv list before parsing. This preserves a clean clap structure
    // while retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    let cli = Cli::parse_from(argv);

    // The TUI owns the terminal; RUST_LOG output would scribble over it.
    if !matches!(cli.command, Command::Tui(_)) {
        env_logger::init();
    }

    match cli.command {
        Command::Predict(args) => handle_predict(args),
        Command::Batch(args) => handle_batch(args),
        Command::Columns(args) => handle_columns(args),
        Command::Sample(args) => handle_sample(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn load_bundle(flag: Option<&PathBuf>) -> Result<Bundle, AppError> {
    let path = resolve_bundle_path(flag.map(PathBuf::as_path));
    let bundle = Bundle::load(&path)?;
    log::info!(
        "loaded model bundle '{}' ({} feature columns)",
        path.display(),
        bundle.n_features()
    );
    Ok(bundle)
}

fn handle_predict(args: PredictArgs) -> Result<(), AppError> {
    let bundle = load_bundle(args.bundle.as_ref())?;
    let pairs = cli::parse_set_pairs(&args.set)?;
    let row = pipeline::build_form_row(&bundle, &pairs)?;

    let pred = pipeline::score_single(&bundle, &row)?;
    let terms = crate::model::contributions(&bundle, &row)?;

    if args.json {
        println!("{}", crate::report::single_report_json(&pred, &terms)?);
        return Ok(());
    }

    print!("{}", crate::report::format_single_result(&pred));
    if args.explain {
        let drivers = crate::report::rank_drivers(&terms, args.top);
        println!();
        print!("{}", crate::report::format_drivers(&drivers));
    }
    Ok(())
}

fn handle_batch(args: BatchArgs) -> Result<(), AppError> {
    let bundle = load_bundle(args.bundle.as_ref())?;
    let path = match &args.file {
        Some(path) => cli::picker::validate_csv_path(path)?,
        None => cli::picker::prompt_for_csv_path()?,
    };

    let run = pipeline::run_batch(&bundle, &path)?;
    crate::io::export::write_predictions(&run.table, &run.predictions, &args.output)?;
    log::info!(
        "wrote {} predictions to '{}'",
        run.predictions.len(),
        args.output.display()
    );

    print!(
        "{}",
        crate::report::format_batch_summary(
            &path.display().to_string(),
            run.encoding.label(),
            &run.stats,
            run.blanks_replaced,
        )
    );
    if args.preview > 0 {
        println!();
        print!(
            "{}",
            crate::report::format_preview(&run.table, &run.predictions, args.preview)
        );
    }
    println!("\nSaved: {}", args.output.display());
    Ok(())
}

fn handle_columns(args: ColumnsArgs) -> Result<(), AppError> {
    let bundle = load_bundle(args.bundle.as_ref())?;
    if args.json {
        println!("{}", crate::report::schema_json(&bundle)?);
    } else {
        print!("{}", crate::report::format_schema(&bundle));
    }
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let bundle = load_bundle(args.bundle.as_ref())?;
    let config = SampleConfig {
        count: args.count,
        seed: args.seed,
        blank_rate: args.blank_rate,
    };
    let sample = generate_sample(&bundle, &config)?;
    crate::io::export::write_table(&sample.table, &args.output)?;
    println!(
        "Wrote {} rows to '{}' ({} with blank TotalCharges).",
        sample.table.n_rows(),
        args.output.display(),
        sample.blank_rows
    );
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    crate::tui::run(args)
}

/// Rewrite argv so `churn` defaults to `churn tui`.
///
/// Rules:
/// - `churn`                      -> `churn tui`
/// - `churn -b bundle.json`       -> `churn tui -b bundle.json`
/// - `churn --help/--version/-h`  -> unchanged (top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version =
        matches!(arg1.as_str(), "-h" | "--help" | "-V" | "--version" | "help");
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(
        arg1.as_str(),
        "predict" | "batch" | "columns" | "sample" | "tui"
    );
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_the_tui() {
        assert_eq!(rewrite_args(v(&["churn"])), v(&["churn", "tui"]));
        assert_eq!(
            rewrite_args(v(&["churn", "-b", "x.json"])),
            v(&["churn", "tui", "-b", "x.json"])
        );
    }

    #[test]
    fn subcommands_and_help_pass_through() {
        assert_eq!(
            rewrite_args(v(&["churn", "batch", "-f", "a.csv"])),
            v(&["churn", "batch", "-f", "a.csv"])
        );
        assert_eq!(rewrite_args(v(&["churn", "--help"])), v(&["churn", "--help"]));
        assert_eq!(rewrite_args(v(&["churn", "-V"])), v(&["churn", "-V"]));
    }
}
