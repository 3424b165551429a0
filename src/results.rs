//! Per-building simulation output.
//!
//! Each building's simulation writes its output CSV into its own directory
//! under a results directory. These helpers turn those outputs into hourly
//! temperature matrices and annual comparisons.

use crate::comfort::matrix::TemperatureMatrix;
use crate::comfort::summary::describe;
use crate::comfort::ComfortError;
use crate::config::ResultsOptions;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Error types for reading simulation output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResultsError {
    /// The building directory holds no output CSV.
    #[error("no simulation output at {0}")]
    MissingOutput(String),

    /// The output CSV has no column matching the temperature pattern.
    #[error("no columns matching '{pattern}' in {path}")]
    NoTemperatureColumns {
        /// Output CSV path
        path: String,
        /// Pattern that was searched for
        pattern: String,
    },

    /// A temperature cell could not be parsed.
    #[error("malformed value '{value}' in {path} at row {row}, column '{column}'")]
    MalformedValue {
        /// Output CSV path
        path: String,
        /// 1-based data row
        row: usize,
        /// Column header
        column: String,
        /// Raw cell text
        value: String,
    },

    /// Buildings in one results directory report different numbers of hours.
    #[error("building '{building}' has {found} hours, expected {expected}")]
    LengthMismatch {
        building: String,
        expected: usize,
        found: usize,
    },

    /// No building in the results directory produced usable output.
    #[error("no building output found under {0}")]
    NoBuildings(String),

    /// CSV decoding or encoding failure.
    #[error("CSV error in {path}: {message}")]
    Csv { path: String, message: String },

    /// Input/output error.
    #[error("IO error on {path}: {message}")]
    Io { path: String, message: String },

    /// The assembled matrix was rejected.
    #[error(transparent)]
    Comfort(#[from] ComfortError),
}

fn io_error(path: &Path, e: std::io::Error) -> ResultsError {
    ResultsError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

fn csv_error(path: &Path, e: csv::Error) -> ResultsError {
    ResultsError::Csv {
        path: path.display().to_string(),
        message: e.to_string(),
    }
}

/// Hourly zone temperature of one building: the mean across every output
/// column whose header contains `temperature_column_pattern`.
///
/// Empty cells are skipped; a row with no values yields NaN.
pub fn extract_zone_temperatures<P: AsRef<Path>>(
    result_dir: P,
    options: &ResultsOptions,
) -> Result<Vec<f64>, ResultsError> {
    let path = result_dir.as_ref().join(&options.output_csv_name);
    if !path.is_file() {
        return Err(ResultsError::MissingOutput(path.display().to_string()));
    }

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(&path)
        .map_err(|e| csv_error(&path, e))?;

    let headers = rdr.headers().map_err(|e| csv_error(&path, e))?.clone();
    let temp_idx: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.contains(&options.temperature_column_pattern))
        .map(|(i, _)| i)
        .collect();

    if temp_idx.is_empty() {
        return Err(ResultsError::NoTemperatureColumns {
            path: path.display().to_string(),
            pattern: options.temperature_column_pattern.clone(),
        });
    }

    let mut temps = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record.map_err(|e| csv_error(&path, e))?;
        let mut sum = 0.0;
        let mut count = 0usize;
        for &idx in &temp_idx {
            let raw = record.get(idx).unwrap_or_default();
            if raw.is_empty() {
                continue;
            }
            let value = raw.parse::<f64>().map_err(|_| ResultsError::MalformedValue {
                path: path.display().to_string(),
                row: row + 1,
                column: headers[idx].to_string(),
                value: raw.to_string(),
            })?;
            sum += value;
            count += 1;
        }
        temps.push(if count > 0 { sum / count as f64 } else { f64::NAN });
    }

    debug!(
        path = %path.display(),
        zones = temp_idx.len(),
        hours = temps.len(),
        "extracted zone temperatures"
    );
    Ok(temps)
}

/// Building sub-directories of a results directory, sorted by name.
fn building_dirs(results_dir: &Path) -> Result<Vec<(String, PathBuf)>, ResultsError> {
    let entries = std::fs::read_dir(results_dir).map_err(|e| io_error(results_dir, e))?;

    let mut dirs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| io_error(results_dir, e))?;
        let path = entry.path();
        if path.is_dir() {
            dirs.push((entry.file_name().to_string_lossy().into_owned(), path));
        }
    }
    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(dirs)
}

/// Builds an hourly temperature matrix with one column per building
/// sub-directory. Rows are numbered 1..=H.
///
/// Buildings whose output is missing or unreadable are skipped with a
/// warning. All remaining buildings must report the same number of hours.
pub fn build_hourly_matrix<P: AsRef<Path>>(
    results_dir: P,
    options: &ResultsOptions,
) -> Result<TemperatureMatrix, ResultsError> {
    let results_dir = results_dir.as_ref();
    let dirs = building_dirs(results_dir)?;

    let extracted: Vec<(String, Result<Vec<f64>, ResultsError>)> = dirs
        .into_par_iter()
        .map(|(name, dir)| {
            let temps = extract_zone_temperatures(&dir, options);
            (name, temps)
        })
        .collect();

    let mut columns: Vec<(String, Vec<f64>)> = Vec::with_capacity(extracted.len());
    for (name, temps) in extracted {
        match temps {
            Ok(temps) => {
                if let Some((first, expected)) = columns.first().map(|(n, v)| (n, v.len())) {
                    if temps.len() != expected {
                        debug!(reference = %first, "hour count differs from first building");
                        return Err(ResultsError::LengthMismatch {
                            building: name,
                            expected,
                            found: temps.len(),
                        });
                    }
                }
                columns.push((name, temps));
            }
            Err(e) => warn!(building = %name, error = %e, "skipping building"),
        }
    }

    if columns.is_empty() {
        return Err(ResultsError::NoBuildings(results_dir.display().to_string()));
    }

    let matrix = TemperatureMatrix::with_sequential_hours(results_dir.display().to_string(), columns)?;
    info!(
        dir = %results_dir.display(),
        buildings = matrix.building_count(),
        hours = matrix.row_count(),
        "built hourly temperature matrix"
    );
    Ok(matrix)
}

/// Writes a matrix as CSV with `time_column` first, then one column per
/// building.
pub fn write_matrix_csv<P: AsRef<Path>>(
    matrix: &TemperatureMatrix,
    path: P,
    time_column: &str,
) -> Result<(), ResultsError> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;

    let mut header = vec![time_column.to_string()];
    header.extend(matrix.columns().iter().cloned());
    wtr.write_record(&header).map_err(|e| csv_error(path, e))?;

    for (row, hour) in matrix.hours().iter().enumerate() {
        let mut record = vec![hour.to_string()];
        record.extend(matrix.row(row).iter().map(f64::to_string));
        wtr.write_record(&record).map_err(|e| csv_error(path, e))?;
    }

    wtr.flush().map_err(|e| io_error(path, e))
}

/// Annual averages of one building in both scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingComparison {
    pub building: String,
    /// Annual mean baseline temperature (°C)
    pub baseline_avg: Option<f64>,
    /// Annual mean modified temperature (°C)
    pub modified_avg: Option<f64>,
    /// `modified_avg - baseline_avg`, when both exist
    pub increase: Option<f64>,
}

/// Distribution of the per-building temperature increases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IncreaseStatistics {
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; 0 for a single building
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

/// Annual comparison across all buildings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnualComparison {
    pub buildings: Vec<BuildingComparison>,
    /// Number of buildings with both averages
    pub valid_comparisons: usize,
    /// `None` when no building could be compared
    pub statistics: Option<IncreaseStatistics>,
}

fn finite_mean(values: &[f64]) -> Option<f64> {
    let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        None
    } else {
        Some(finite.iter().sum::<f64>() / finite.len() as f64)
    }
}

fn annual_average(dir: &Path, options: &ResultsOptions) -> Option<f64> {
    match extract_zone_temperatures(dir, options) {
        Ok(temps) => finite_mean(&temps),
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "no annual average");
            None
        }
    }
}

fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

/// Compares annual mean temperatures building by building. Buildings are
/// taken from the baseline directory; a building missing on either side
/// has no increase.
pub fn compare_annual_averages<P: AsRef<Path>, Q: AsRef<Path>>(
    baseline_dir: P,
    modified_dir: Q,
    options: &ResultsOptions,
) -> Result<AnnualComparison, ResultsError> {
    let modified_dir = modified_dir.as_ref();
    let dirs = building_dirs(baseline_dir.as_ref())?;

    let buildings: Vec<BuildingComparison> = dirs
        .into_par_iter()
        .map(|(building, dir)| {
            let baseline_avg = annual_average(&dir, options);
            let modified_path = modified_dir.join(&building);
            let modified_avg = if modified_path.is_dir() {
                annual_average(&modified_path, options)
            } else {
                None
            };
            let increase = match (baseline_avg, modified_avg) {
                (Some(b), Some(m)) => Some(m - b),
                _ => None,
            };
            BuildingComparison {
                building,
                baseline_avg,
                modified_avg,
                increase,
            }
        })
        .collect();

    let mut increases: Vec<f64> = buildings.iter().filter_map(|b| b.increase).collect();
    increases.sort_by(f64::total_cmp);

    let statistics = if increases.is_empty() {
        None
    } else {
        let stats = describe(&increases);
        Some(IncreaseStatistics {
            mean: stats.mean,
            median: median(&increases),
            std: stats.std,
            min: stats.min,
            max: stats.max,
        })
    };

    info!(
        buildings = buildings.len(),
        valid = increases.len(),
        "compared annual averages"
    );

    Ok(AnnualComparison {
        valid_comparisons: increases.len(),
        buildings,
        statistics,
    })
}

fn rounded(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_default()
}

/// Writes the per-building comparison, values rounded to 2 decimals and
/// missing values left empty.
pub fn write_comparison_csv<P: AsRef<Path>>(
    comparison: &AnnualComparison,
    path: P,
) -> Result<(), ResultsError> {
    let path = path.as_ref();
    let mut wtr = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;

    wtr.write_record([
        "Building",
        "Baseline_Annual_Avg_Temp_C",
        "Modified_Annual_Avg_Temp_C",
        "Temperature_Increase_C",
    ])
    .map_err(|e| csv_error(path, e))?;

    for b in &comparison.buildings {
        wtr.write_record([
            b.building.clone(),
            rounded(b.baseline_avg),
            rounded(b.modified_avg),
            rounded(b.increase),
        ])
        .map_err(|e| csv_error(path, e))?;
    }

    wtr.flush().map_err(|e| io_error(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_output(root: &Path, building: &str, rows: &[(f64, f64)]) {
        let dir = root.join(building);
        fs::create_dir_all(&dir).unwrap();
        let mut content = String::from(
            "Date/Time,ZONE1:Zone Mean Air Temperature [C](Hourly),ZONE2:Zone Mean Air Temperature [C](Hourly),Environment:Site Outdoor Air Drybulb Temperature [C](Hourly)\n",
        );
        for (i, (a, b)) in rows.iter().enumerate() {
            content.push_str(&format!(" 01/01  {:02}:00:00,{},{},5.0\n", i + 1, a, b));
        }
        fs::write(dir.join("eplusout.csv"), content).unwrap();
    }

    #[test]
    fn test_extract_zone_temperatures() {
        let root = TempDir::new().unwrap();
        write_output(root.path(), "b1", &[(20.0, 22.0), (24.0, 26.0)]);

        let temps =
            extract_zone_temperatures(root.path().join("b1"), &ResultsOptions::default()).unwrap();
        assert_eq!(temps, vec![21.0, 25.0]);
    }

    #[test]
    fn test_extract_missing_output() {
        let root = TempDir::new().unwrap();
        let err = extract_zone_temperatures(root.path(), &ResultsOptions::default()).unwrap_err();
        assert!(matches!(err, ResultsError::MissingOutput(_)));
    }

    #[test]
    fn test_extract_no_matching_columns() {
        let root = TempDir::new().unwrap();
        write_output(root.path(), "b1", &[(20.0, 22.0)]);
        let options = ResultsOptions {
            temperature_column_pattern: "Operative Temperature".to_string(),
            ..ResultsOptions::default()
        };

        let err = extract_zone_temperatures(root.path().join("b1"), &options).unwrap_err();
        assert!(matches!(err, ResultsError::NoTemperatureColumns { .. }));
    }

    #[test]
    fn test_build_hourly_matrix_skips_missing_buildings() {
        let root = TempDir::new().unwrap();
        write_output(root.path(), "city_0_2", &[(20.0, 20.0), (21.0, 21.0)]);
        write_output(root.path(), "city_0_1", &[(18.0, 20.0), (19.0, 21.0)]);
        fs::create_dir_all(root.path().join("city_0_3")).unwrap();

        let matrix = build_hourly_matrix(root.path(), &ResultsOptions::default()).unwrap();
        assert_eq!(matrix.columns(), &["city_0_1".to_string(), "city_0_2".to_string()]);
        assert_eq!(matrix.hours(), &[1, 2]);
        assert_eq!(matrix.column("city_0_1").unwrap(), &[19.0, 20.0]);
    }

    #[test]
    fn test_build_hourly_matrix_rejects_ragged_output() {
        let root = TempDir::new().unwrap();
        write_output(root.path(), "a", &[(20.0, 20.0), (21.0, 21.0)]);
        write_output(root.path(), "b", &[(20.0, 20.0)]);

        let err = build_hourly_matrix(root.path(), &ResultsOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ResultsError::LengthMismatch { expected: 2, found: 1, .. }
        ));
    }

    #[test]
    fn test_build_hourly_matrix_without_buildings() {
        let root = TempDir::new().unwrap();
        let err = build_hourly_matrix(root.path(), &ResultsOptions::default()).unwrap_err();
        assert!(matches!(err, ResultsError::NoBuildings(_)));
    }

    #[test]
    fn test_written_matrix_loads_back() {
        let root = TempDir::new().unwrap();
        write_output(root.path(), "x", &[(20.5, 20.5), (21.25, 21.25)]);
        let matrix = build_hourly_matrix(root.path(), &ResultsOptions::default()).unwrap();

        let csv_path = root.path().join("hourly.csv");
        write_matrix_csv(&matrix, &csv_path, "Hour").unwrap();

        let content = fs::read_to_string(&csv_path).unwrap();
        assert!(content.starts_with("Hour,x\n1,20.5\n2,21.25"));

        let loaded = TemperatureMatrix::from_csv_path(&csv_path, "Hour").unwrap();
        assert_eq!(loaded.column("x").unwrap(), &[20.5, 21.25]);
    }

    #[test]
    fn test_compare_annual_averages() {
        let baseline = TempDir::new().unwrap();
        let modified = TempDir::new().unwrap();
        write_output(baseline.path(), "a", &[(20.0, 20.0), (22.0, 22.0)]);
        write_output(baseline.path(), "b", &[(20.0, 20.0), (20.0, 20.0)]);
        write_output(baseline.path(), "c", &[(25.0, 25.0)]);
        write_output(modified.path(), "a", &[(23.0, 23.0), (25.0, 25.0)]);
        write_output(modified.path(), "b", &[(21.0, 21.0), (21.0, 21.0)]);

        let comparison =
            compare_annual_averages(baseline.path(), modified.path(), &ResultsOptions::default())
                .unwrap();

        assert_eq!(comparison.buildings.len(), 3);
        assert_eq!(comparison.valid_comparisons, 2);
        assert_eq!(comparison.buildings[0].increase, Some(3.0));
        assert_eq!(comparison.buildings[1].increase, Some(1.0));
        assert_eq!(comparison.buildings[2].baseline_avg, Some(25.0));
        assert_eq!(comparison.buildings[2].increase, None);

        let stats = comparison.statistics.unwrap();
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.median, 2.0);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 3.0);

        let out = baseline.path().join("comparison.csv");
        write_comparison_csv(&comparison, &out).unwrap();
        let content = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[1], "a,21.00,24.00,3.00");
        assert_eq!(lines[3], "c,25.00,,");
    }

    #[test]
    fn test_median() {
        assert_eq!(median(&[1.0, 2.0, 10.0]), 2.0);
        assert_eq!(median(&[1.0, 2.0, 4.0, 10.0]), 3.0);
    }
}
