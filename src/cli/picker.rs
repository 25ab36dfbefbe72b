//! Interactive CSV picker.
//!
//! Kept separate from clap parsing: clap handles structured flags, the
//! picker covers the "run `churn batch` and choose an upload" flow. The
//! same discovery list feeds the TUI's batch tab.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// Directory recursion depth when searching for uploads.
const SEARCH_DEPTH: usize = 3;

/// Prompt for a customer CSV from the current directory tree.
///
/// Accepts a number from the discovered list or an explicit path; `q`
/// cancels.
pub fn prompt_for_csv_path() -> Result<PathBuf, AppError> {
    let files = discover_csv_files();
    if files.is_empty() {
        return Err(AppError::config(
            "No .csv files found here. Provide one with `churn batch -f <file.csv>`.",
        ));
    }

    println!("Found {} CSV file(s):", files.len());
    for (idx, path) in files.iter().enumerate() {
        println!("{:>3}) {}", idx + 1, pretty_path(path));
    }

    loop {
        print!(
            "Select a file by number (1-{}) or type a path (q to quit): ",
            files.len()
        );
        io::stdout()
            .flush()
            .map_err(|e| AppError::runtime(format!("Failed to write prompt: {e}")))?;

        let mut input = String::new();
        let bytes = io::stdin()
            .read_line(&mut input)
            .map_err(|e| AppError::runtime(format!("Failed to read input: {e}")))?;
        if bytes == 0 {
            return Err(AppError::config(
                "No input received. Provide a CSV path with `churn batch -f <file.csv>`.",
            ));
        }

        let input = input.trim();
        if input.eq_ignore_ascii_case("q") {
            return Err(AppError::config("Canceled."));
        }

        if let Ok(choice) = input.parse::<usize>() {
            if (1..=files.len()).contains(&choice) {
                return Ok(files[choice - 1].clone());
            }
            println!(
                "Invalid choice: {choice}. Enter a number between 1 and {}.",
                files.len()
            );
            continue;
        }

        match validate_csv_path(Path::new(input)) {
            Ok(path) => return Ok(path),
            Err(err) => {
                println!("{err}");
                continue;
            }
        }
    }
}

/// Check that a user-supplied path points at a CSV file.
pub fn validate_csv_path(path: &Path) -> Result<PathBuf, AppError> {
    if !path.exists() {
        return Err(AppError::config(format!(
            "CSV file not found: {}",
            path.display()
        )));
    }
    if path.is_dir() {
        return Err(AppError::config(format!(
            "Expected a file, got a directory: {}",
            path.display()
        )));
    }
    if !has_csv_extension(path) {
        return Err(AppError::config(format!(
            "Expected a .csv file (got: {}).",
            path.display()
        )));
    }
    Ok(path.to_path_buf())
}

/// `*.csv` files under the current directory, in a deterministic order.
///
/// Shared by the text prompt and the TUI batch tab.
pub fn discover_csv_files() -> Vec<PathBuf> {
    let mut out = Vec::new();
    walk(Path::new("."), 0, &mut out);
    out.sort_by_key(|p| pretty_path(p));
    out
}

fn walk(dir: &Path, depth: usize, out: &mut Vec<PathBuf>) {
    if depth > SEARCH_DEPTH {
        return;
    }
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(file_type) = entry.file_type() else {
            continue;
        };

        if file_type.is_dir() {
            if skip_dir(&path) {
                continue;
            }
            walk(&path, depth + 1, out);
        } else if file_type.is_file() && has_csv_extension(&path) {
            out.push(path);
        }
    }
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("csv"))
        == Some(true)
}

fn skip_dir(path: &Path) -> bool {
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    name.starts_with('.') || matches!(name, "target" | "node_modules")
}

fn pretty_path(path: &Path) -> String {
    path.strip_prefix("./").unwrap_or(path).display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_check_is_case_insensitive() {
        assert!(has_csv_extension(Path::new("data.csv")));
        assert!(has_csv_extension(Path::new("DATA.CSV")));
        assert!(!has_csv_extension(Path::new("data.tsv")));
        assert!(!has_csv_extension(Path::new("csv")));
    }

    #[test]
    fn missing_path_is_a_config_error() {
        let err = validate_csv_path(Path::new("definitely_not_here_12345.csv")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
