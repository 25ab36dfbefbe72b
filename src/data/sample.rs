//! Synthetic customer generation driven by the bundle's column metadata.
//!
//! Categorical cells are drawn uniformly from the fitted category list;
//! numeric cells are drawn from Normal(mean, scale) and clamped to the
//! column's form range, so samples resemble the training distribution.
//! A configurable fraction of rows mimics the classic dirty-data case:
//! a brand-new customer with tenure 0 and a blank TotalCharges cell.

use std::collections::HashMap;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::data::bundle::{Bundle, ColumnKind, NumColumn};
use crate::domain::{CustomerTable, TOTAL_CHARGES_COL};
use crate::error::AppError;

const TENURE_COL: &str = "tenure";
const MONTHLY_CHARGES_COL: &str = "MonthlyCharges";
const ID_COL: &str = "customerID";

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub count: usize,
    pub seed: u64,
    /// Fraction of rows written with a blank TotalCharges (and tenure 0).
    pub blank_rate: f64,
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub table: CustomerTable,
    pub blank_rows: usize,
}

pub fn generate_sample(bundle: &Bundle, config: &SampleConfig) -> Result<SampleData, AppError> {
    if config.count == 0 {
        return Err(AppError::config("Sample count must be > 0."));
    }
    if !(config.blank_rate.is_finite() && (0.0..1.0).contains(&config.blank_rate)) {
        return Err(AppError::config("Blank rate must lie in [0, 1)."));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);

    let mut headers = Vec::with_capacity(bundle.n_features() + 1);
    headers.push(ID_COL.to_string());
    headers.extend(bundle.feature_cols.iter().cloned());

    let mut rows = Vec::with_capacity(config.count);
    let mut blank_rows = 0usize;

    for _ in 0..config.count {
        let blank = rng.r#gen::<f64>() < config.blank_rate
            && bundle.num(TOTAL_CHARGES_COL).is_some()
            && bundle.num(TENURE_COL).is_some();
        if blank {
            blank_rows += 1;
        }
        rows.push(generate_row(bundle, &mut rng, blank)?);
    }

    Ok(SampleData {
        table: CustomerTable { headers, rows },
        blank_rows,
    })
}

fn generate_row(bundle: &Bundle, rng: &mut StdRng, blank: bool) -> Result<Vec<String>, AppError> {
    let mut cells = Vec::with_capacity(bundle.n_features() + 1);
    cells.push(customer_id(rng));

    // Raw numeric draws, kept around so TotalCharges can be recomposed.
    let mut numerics: HashMap<String, f64> = HashMap::new();

    for name in &bundle.feature_cols {
        let kind = bundle.column(name).ok_or_else(|| {
            AppError::runtime(format!("Bundle column `{name}` lost its metadata."))
        })?;
        let cell = match kind {
            ColumnKind::Categorical(col) => {
                col.categories[rng.gen_range(0..col.categories.len())].clone()
            }
            ColumnKind::Numerical(col) => {
                let value = draw_numeric(col, rng)?;
                numerics.insert(col.name.clone(), value);
                format_numeric(col, value)
            }
        };
        cells.push(cell);
    }

    // Make TotalCharges track tenure * MonthlyCharges when all three exist,
    // the way real billing data hangs together.
    if let (Some(total_col), Some(&tenure), Some(&monthly)) = (
        bundle.num(TOTAL_CHARGES_COL),
        numerics.get(TENURE_COL),
        numerics.get(MONTHLY_CHARGES_COL),
    ) {
        if let Some(idx) = column_cell_index(bundle, TOTAL_CHARGES_COL) {
            let jitter = rng.gen_range(0.9..1.1);
            let total = (tenure * monthly * jitter).clamp(total_col.min, total_col.max);
            cells[idx] = format_numeric(total_col, total);
        }
    }

    if blank {
        if let Some(idx) = column_cell_index(bundle, TENURE_COL) {
            cells[idx] = "0".to_string();
        }
        if let Some(idx) = column_cell_index(bundle, TOTAL_CHARGES_COL) {
            // A lone space, the shape these blanks take in the wild.
            cells[idx] = " ".to_string();
        }
    }

    Ok(cells)
}

/// Cell index of a feature column, offset by the leading customerID cell.
fn column_cell_index(bundle: &Bundle, name: &str) -> Option<usize> {
    bundle
        .feature_cols
        .iter()
        .position(|c| c == name)
        .map(|i| i + 1)
}

fn draw_numeric(col: &NumColumn, rng: &mut StdRng) -> Result<f64, AppError> {
    let normal = Normal::new(col.mean, col.scale)
        .map_err(|e| AppError::runtime(format!("Noise distribution error: {e}")))?;
    Ok(normal.sample(rng).clamp(col.min, col.max))
}

fn format_numeric(col: &NumColumn, value: f64) -> String {
    format!("{value:.prec$}", prec = col.decimals as usize)
}

/// Telco-style id: four digits, a dash, five uppercase letters.
fn customer_id(rng: &mut StdRng) -> String {
    let digits: u32 = rng.gen_range(0..10_000);
    let letters: String = (0..5)
        .map(|_| char::from(b'A' + rng.gen_range(0..26u8)))
        .collect();
    format!("{digits:04}-{letters}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::bundle::LogisticModel;
    use crate::data::bundle::CatColumn;

    fn sample_bundle() -> Bundle {
        let bundle = Bundle {
            schema_version: 1,
            trained_at: None,
            feature_cols: vec![
                "Contract".to_string(),
                "tenure".to_string(),
                "MonthlyCharges".to_string(),
                "TotalCharges".to_string(),
            ],
            cat_cols: vec![CatColumn {
                name: "Contract".to_string(),
                categories: vec![
                    "Month-to-month".to_string(),
                    "One year".to_string(),
                    "Two year".to_string(),
                ],
            }],
            num_cols: vec![
                NumColumn {
                    name: "tenure".to_string(),
                    mean: 32.0,
                    scale: 24.0,
                    min: 0.0,
                    max: 72.0,
                    default: 30.0,
                    decimals: 0,
                },
                NumColumn {
                    name: "MonthlyCharges".to_string(),
                    mean: 65.0,
                    scale: 30.0,
                    min: 0.0,
                    max: 120.0,
                    default: 60.0,
                    decimals: 2,
                },
                NumColumn {
                    name: "TotalCharges".to_string(),
                    mean: 2280.0,
                    scale: 2260.0,
                    min: 0.0,
                    max: 8700.0,
                    default: 4000.0,
                    decimals: 2,
                },
            ],
            classifier: LogisticModel {
                coefficients: vec![0.6, -0.1, -0.7, -0.4, 0.3, 0.2],
                intercept: -0.2,
            },
            unknown_category: Default::default(),
        };
        bundle.validate().unwrap();
        bundle
    }

    #[test]
    fn same_seed_reproduces_table() {
        let bundle = sample_bundle();
        let config = SampleConfig {
            count: 20,
            seed: 7,
            blank_rate: 0.2,
        };
        let a = generate_sample(&bundle, &config).unwrap();
        let b = generate_sample(&bundle, &config).unwrap();
        assert_eq!(a.table.rows, b.table.rows);
        assert_eq!(a.blank_rows, b.blank_rows);
    }

    #[test]
    fn cells_respect_bundle_domains() {
        let bundle = sample_bundle();
        let config = SampleConfig {
            count: 50,
            seed: 42,
            blank_rate: 0.0,
        };
        let sample = generate_sample(&bundle, &config).unwrap();
        assert_eq!(sample.blank_rows, 0);
        assert_eq!(
            sample.table.headers,
            vec![
                "customerID",
                "Contract",
                "tenure",
                "MonthlyCharges",
                "TotalCharges"
            ]
        );

        let contract = bundle.cat("Contract").unwrap();
        for row in &sample.table.rows {
            assert!(contract.categories.contains(&row[1]));
            let tenure: f64 = row[2].parse().unwrap();
            assert!((0.0..=72.0).contains(&tenure));
            let monthly: f64 = row[3].parse().unwrap();
            assert!((0.0..=120.0).contains(&monthly));
            let total: f64 = row[4].parse().unwrap();
            assert!((0.0..=8700.0).contains(&total));
        }
    }

    #[test]
    fn blank_rows_zero_tenure_and_blank_total() {
        let bundle = sample_bundle();
        let config = SampleConfig {
            count: 40,
            seed: 3,
            blank_rate: 0.5,
        };
        let sample = generate_sample(&bundle, &config).unwrap();
        assert!(sample.blank_rows > 0);

        let mut seen_blank = 0;
        for row in &sample.table.rows {
            if row[4].trim().is_empty() {
                seen_blank += 1;
                assert_eq!(row[2], "0");
                assert_eq!(row[4], " ");
            }
        }
        assert_eq!(seen_blank, sample.blank_rows);
    }

    #[test]
    fn customer_ids_match_pattern() {
        let bundle = sample_bundle();
        let config = SampleConfig {
            count: 10,
            seed: 1,
            blank_rate: 0.0,
        };
        let sample = generate_sample(&bundle, &config).unwrap();
        for row in &sample.table.rows {
            let id = &row[0];
            let (digits, letters) = id.split_once('-').unwrap();
            assert_eq!(digits.len(), 4);
            assert!(digits.chars().all(|c| c.is_ascii_digit()));
            assert_eq!(letters.len(), 5);
            assert!(letters.chars().all(|c| c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn rejects_bad_config() {
        let bundle = sample_bundle();
        let err = generate_sample(
            &bundle,
            &SampleConfig {
                count: 0,
                seed: 1,
                blank_rate: 0.0,
            },
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = generate_sample(
            &bundle,
            &SampleConfig {
                count: 5,
                seed: 1,
                blank_rate: 1.5,
            },
        )
        .unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
