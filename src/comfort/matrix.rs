//! Hourly temperature matrices.
//!
//! A [`TemperatureMatrix`] holds one row per simulated hour and one column per
//! building. Column order is preserved from the source and names are unique.
//! Values are stored column-major since every analysis walks one building at a
//! time.

use crate::comfort::summary::{describe, TemperatureStats};
use crate::comfort::ComfortError;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Default name of the hourly index column.
pub const DEFAULT_TIME_COLUMN: &str = "Hour";

/// Derived timestamp column written by some tools; never a building.
const DATETIME_COLUMN: &str = "DateTime";

/// Year used to turn row positions into timestamps when none is configured.
pub const DEFAULT_BASE_YEAR: i32 = 2020;

/// Hourly temperatures for a set of buildings.
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureMatrix {
    /// File name or description, used in error messages
    name: String,
    /// Hourly index per row (1-based)
    hours: Vec<usize>,
    /// Building identifiers in source order
    columns: Vec<String>,
    /// Column-major values: `values[column][row]`
    values: Vec<Vec<f64>>,
    /// Timestamp of row 0
    origin: NaiveDateTime,
}

fn year_origin(year: i32) -> Result<NaiveDateTime, ComfortError> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| ComfortError::InvalidMatrix {
            source_name: "timestamp origin".to_string(),
            reason: format!("year {} is not representable", year),
        })
}

impl TemperatureMatrix {
    /// Creates a matrix from an hourly index and named building columns.
    ///
    /// # Errors
    ///
    /// - [`ComfortError::EmptyMatrix`] if there are no columns or no rows
    /// - [`ComfortError::InvalidMatrix`] if a column name repeats or a column's
    ///   length differs from the hourly index
    pub fn new(
        name: impl Into<String>,
        hours: Vec<usize>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, ComfortError> {
        let name = name.into();
        if columns.is_empty() || hours.is_empty() {
            return Err(ComfortError::EmptyMatrix(name));
        }

        let mut seen = HashSet::new();
        let mut names = Vec::with_capacity(columns.len());
        let mut values = Vec::with_capacity(columns.len());
        for (column, data) in columns {
            if !seen.insert(column.clone()) {
                return Err(ComfortError::InvalidMatrix {
                    source_name: name,
                    reason: format!("duplicate column '{}'", column),
                });
            }
            if data.len() != hours.len() {
                return Err(ComfortError::InvalidMatrix {
                    source_name: name,
                    reason: format!(
                        "column '{}' has {} rows, expected {}",
                        column,
                        data.len(),
                        hours.len()
                    ),
                });
            }
            names.push(column);
            values.push(data);
        }

        Ok(TemperatureMatrix {
            name,
            hours,
            columns: names,
            values,
            origin: year_origin(DEFAULT_BASE_YEAR)?,
        })
    }

    /// Creates a matrix whose rows are numbered 1..=H.
    pub fn with_sequential_hours(
        name: impl Into<String>,
        columns: Vec<(String, Vec<f64>)>,
    ) -> Result<Self, ComfortError> {
        let rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        Self::new(name, (1..=rows).collect(), columns)
    }

    /// Sets the calendar year that row 0 falls on (January 1, 00:00).
    pub fn with_base_year(mut self, year: i32) -> Result<Self, ComfortError> {
        self.origin = year_origin(year)?;
        Ok(self)
    }

    /// Loads a matrix from a CSV file.
    ///
    /// See [`TemperatureMatrix::from_csv_reader`] for the expected layout.
    pub fn from_csv_path<P: AsRef<Path>>(path: P, time_column: &str) -> Result<Self, ComfortError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| ComfortError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_csv_reader(file, path.display().to_string(), time_column)
    }

    /// Loads a matrix from CSV content.
    ///
    /// The first row is the header. The `time_column` (usually `Hour`) gives
    /// the hourly index of each row; without it rows are numbered from 1. A
    /// `DateTime` column is ignored. Every other column is a building.
    pub fn from_csv_reader<R: Read>(
        reader: R,
        name: impl Into<String>,
        time_column: &str,
    ) -> Result<Self, ComfortError> {
        let name = name.into();
        let csv_error = |e: csv::Error| ComfortError::Csv {
            source_name: name.clone(),
            message: e.to_string(),
        };

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(csv_error)?
            .iter()
            .map(str::to_string)
            .collect();

        let time_idx = headers.iter().position(|h| h == time_column);
        let building_idx: Vec<usize> = (0..headers.len())
            .filter(|&i| Some(i) != time_idx && headers[i] != DATETIME_COLUMN)
            .collect();

        let mut hours = Vec::new();
        let mut values: Vec<Vec<f64>> = vec![Vec::new(); building_idx.len()];

        for (row, record) in rdr.records().enumerate() {
            let record = record.map_err(csv_error)?;
            let row_number = row + 1;

            let hour = match time_idx {
                Some(idx) => {
                    let raw = record.get(idx).unwrap_or_default();
                    raw.parse::<usize>().map_err(|_| ComfortError::MalformedCell {
                        source_name: name.clone(),
                        row: row_number,
                        column: time_column.to_string(),
                        value: raw.to_string(),
                    })?
                }
                None => row_number,
            };
            hours.push(hour);

            for (slot, &col) in building_idx.iter().enumerate() {
                let raw = record.get(col).unwrap_or_default();
                let temp = raw.parse::<f64>().map_err(|_| ComfortError::MalformedCell {
                    source_name: name.clone(),
                    row: row_number,
                    column: headers[col].clone(),
                    value: raw.to_string(),
                })?;
                values[slot].push(temp);
            }
        }

        debug!(
            source = %name,
            rows = hours.len(),
            buildings = building_idx.len(),
            "loaded temperature matrix"
        );

        let columns = building_idx
            .iter()
            .map(|&i| headers[i].clone())
            .zip(values)
            .collect();
        Self::new(name, hours, columns)
    }

    /// File name or description of the matrix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of hourly rows.
    pub fn row_count(&self) -> usize {
        self.hours.len()
    }

    /// Number of building columns.
    pub fn building_count(&self) -> usize {
        self.columns.len()
    }

    /// Building identifiers in source order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Hourly index of every row.
    pub fn hours(&self) -> &[usize] {
        &self.hours
    }

    /// All hourly values of the building at `index`.
    pub fn column_values(&self, index: usize) -> &[f64] {
        &self.values[index]
    }

    /// All hourly values of a building by name.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.values[i].as_slice())
    }

    /// Iterates over `(building, values)` pairs.
    pub fn iter_columns(&self) -> impl Iterator<Item = (&str, &[f64])> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().map(Vec::as_slice))
    }

    /// Values of every building at one row.
    pub fn row(&self, row: usize) -> Vec<f64> {
        self.values.iter().map(|col| col[row]).collect()
    }

    /// Timestamp of a row: January 1 of the base year plus `row` hours.
    pub fn timestamp(&self, row: usize) -> NaiveDateTime {
        self.origin + Duration::hours(row as i64)
    }

    /// Row positions whose hourly index is at or after `start_hour`.
    pub fn event_rows(&self, start_hour: usize) -> Vec<usize> {
        self.hours
            .iter()
            .enumerate()
            .filter(|(_, h)| **h >= start_hour)
            .map(|(i, _)| i)
            .collect()
    }

    /// Cross-building statistics for each row.
    pub fn hourly_stats(&self) -> Vec<TemperatureStats> {
        (0..self.row_count()).map(|r| describe(&self.row(r))).collect()
    }

    /// Mean across buildings for each row, over the finite cells only. A row
    /// with no finite cell is NaN.
    pub fn hourly_mean(&self) -> Vec<f64> {
        (0..self.row_count())
            .map(|r| {
                let (sum, count) = self
                    .values
                    .iter()
                    .map(|col| col[r])
                    .filter(|v| v.is_finite())
                    .fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
                if count > 0 {
                    sum / count as f64
                } else {
                    f64::NAN
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn columns(data: &[(&str, &[f64])]) -> Vec<(String, Vec<f64>)> {
        data.iter()
            .map(|(n, v)| (n.to_string(), v.to_vec()))
            .collect()
    }

    #[test]
    fn test_new_preserves_column_order() {
        let m = TemperatureMatrix::with_sequential_hours(
            "test",
            columns(&[("b", &[1.0, 2.0]), ("a", &[3.0, 4.0])]),
        )
        .unwrap();

        assert_eq!(m.columns(), &["b".to_string(), "a".to_string()]);
        assert_eq!(m.hours(), &[1, 2]);
        assert_eq!(m.column("a"), Some(&[3.0, 4.0][..]));
        assert_eq!(m.row(1), vec![2.0, 4.0]);
    }

    #[test]
    fn test_new_rejects_duplicates_and_ragged() {
        let dup = TemperatureMatrix::with_sequential_hours(
            "dup",
            columns(&[("a", &[1.0]), ("a", &[2.0])]),
        );
        assert!(matches!(dup, Err(ComfortError::InvalidMatrix { .. })));

        let ragged = TemperatureMatrix::new(
            "ragged",
            vec![1, 2],
            columns(&[("a", &[1.0, 2.0]), ("b", &[2.0])]),
        );
        assert!(matches!(ragged, Err(ComfortError::InvalidMatrix { .. })));
    }

    #[test]
    fn test_new_rejects_empty() {
        assert_eq!(
            TemperatureMatrix::new("empty", vec![1, 2], vec![]),
            Err(ComfortError::EmptyMatrix("empty".to_string()))
        );
    }

    #[test]
    fn test_from_csv_with_hour_column() {
        let csv = "Hour,city_0_1_1980,city_4_2_1990\n1,20.5,21.0\n2,22.0,23.5\n3,24.0,25.0\n";
        let m = TemperatureMatrix::from_csv_reader(Cursor::new(csv), "baseline.csv", "Hour")
            .unwrap();

        assert_eq!(m.row_count(), 3);
        assert_eq!(m.building_count(), 2);
        assert_eq!(m.hours(), &[1, 2, 3]);
        assert_eq!(m.column("city_4_2_1990"), Some(&[21.0, 23.5, 25.0][..]));
    }

    #[test]
    fn test_from_csv_without_hour_column_ignores_datetime() {
        let csv = "DateTime,a\n2020-01-01 00:00,20.0\n2020-01-01 01:00,21.0\n";
        let m = TemperatureMatrix::from_csv_reader(Cursor::new(csv), "x.csv", "Hour").unwrap();

        assert_eq!(m.columns(), &["a".to_string()]);
        assert_eq!(m.hours(), &[1, 2]);
    }

    #[test]
    fn test_from_csv_malformed_cell() {
        let csv = "Hour,a,b\n1,20.0,21.0\n2,hot,21.0\n";
        let err = TemperatureMatrix::from_csv_reader(Cursor::new(csv), "m.csv", "Hour")
            .unwrap_err();
        assert_eq!(
            err,
            ComfortError::MalformedCell {
                source_name: "m.csv".to_string(),
                row: 2,
                column: "a".to_string(),
                value: "hot".to_string(),
            }
        );
    }

    #[test]
    fn test_from_csv_ragged_row() {
        let csv = "Hour,a,b\n1,20.0,21.0\n2,21.0\n";
        let err = TemperatureMatrix::from_csv_reader(Cursor::new(csv), "m.csv", "Hour")
            .unwrap_err();
        assert!(matches!(err, ComfortError::Csv { .. }));
    }

    #[test]
    fn test_timestamps() {
        let m = TemperatureMatrix::with_sequential_hours("t", columns(&[("a", &[0.0; 30])]))
            .unwrap();
        assert_eq!(m.timestamp(0).to_string(), "2020-01-01 00:00:00");
        assert_eq!(m.timestamp(25).to_string(), "2020-01-02 01:00:00");

        let m = m.with_base_year(2021).unwrap();
        assert_eq!(m.timestamp(24).to_string(), "2021-01-02 00:00:00");
    }

    #[test]
    fn test_event_rows() {
        let m = TemperatureMatrix::with_sequential_hours("t", columns(&[("a", &[0.0; 5])]))
            .unwrap();
        assert_eq!(m.event_rows(3), vec![2, 3, 4]);
        assert_eq!(m.event_rows(1), vec![0, 1, 2, 3, 4]);
        assert!(m.event_rows(6).is_empty());
    }

    #[test]
    fn test_hourly_mean_and_stats() {
        let m = TemperatureMatrix::with_sequential_hours(
            "t",
            columns(&[("a", &[20.0, 30.0]), ("b", &[22.0, 34.0])]),
        )
        .unwrap();

        assert_eq!(m.hourly_mean(), vec![21.0, 32.0]);

        let stats = m.hourly_stats();
        assert_eq!(stats[1].min, 30.0);
        assert_eq!(stats[1].max, 34.0);
        assert!((stats[0].std - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_hourly_mean_skips_missing_cells() {
        let m = TemperatureMatrix::with_sequential_hours(
            "t",
            columns(&[("a", &[20.0, f64::NAN]), ("b", &[f64::NAN, f64::NAN]), ("c", &[24.0, 30.0])]),
        )
        .unwrap();

        let mean = m.hourly_mean();
        assert_eq!(mean[0], 22.0);
        assert_eq!(mean[1], 30.0);

        let stats = m.hourly_stats();
        assert_eq!(stats[0].max, 24.0);
        assert_eq!(stats[1].min, 30.0);
    }
}
