//! Comfort threshold breach analysis.
//!
//! For every labelled threshold the analyzer reports the share of event-window
//! hours above the threshold in each scenario, and the first hour at which a
//! majority of buildings in the modified scenario are above it.
//!
//! The scenario breach ratio is the mean of the per-building percentages, not
//! the pooled share of all building-hours.

use crate::comfort::matrix::TemperatureMatrix;
use crate::comfort::thresholds::ComfortThresholdSet;
use crate::comfort::{ComfortError, Mismatch};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};

/// Share of buildings that must be above a threshold for a majority breach.
pub const MAJORITY_FRACTION: f64 = 0.5;

/// First hour at which more than half of the buildings breach a threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MajorityBreach {
    /// Timestamp of the breaching hour
    pub time: NaiveDateTime,
    /// Row offset from the first event-window row
    pub hours_after_event_start: usize,
    /// Number of buildings above the threshold at that hour
    pub buildings_breaching: usize,
}

/// Breach statistics for one threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreachResult {
    /// Threshold label
    pub label: String,
    /// Threshold temperature (°C)
    pub threshold_temp: f64,
    /// Mean per-building breach percentage in the baseline scenario
    pub baseline_breach_ratio: f64,
    /// Mean per-building breach percentage in the modified scenario
    pub modified_breach_ratio: f64,
    /// `modified_breach_ratio - baseline_breach_ratio` in percentage points
    pub increase: f64,
    /// First majority breach in the modified scenario, if any
    pub first_breach: Option<MajorityBreach>,
}

impl BreachResult {
    /// Timestamp of the first majority breach.
    pub fn first_breach_time(&self) -> Option<NaiveDateTime> {
        self.first_breach.as_ref().map(|b| b.time)
    }

    /// Offset of the first majority breach from the event start, in hours.
    pub fn hours_after_event_start(&self) -> Option<usize> {
        self.first_breach.as_ref().map(|b| b.hours_after_event_start)
    }
}

/// Breach results for every configured threshold, in threshold order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreachAnalysis {
    /// Event start hour the window was built from
    pub event_start_hour: usize,
    /// Number of rows in the event window
    pub event_hours: usize,
    /// Number of buildings analysed
    pub building_count: usize,
    /// One entry per threshold label
    pub results: Vec<BreachResult>,
}

impl BreachAnalysis {
    /// Result for a threshold label.
    pub fn get(&self, label: &str) -> Option<&BreachResult> {
        self.results.iter().find(|r| r.label == label)
    }
}

/// Fails unless both matrices have the same columns in the same order and the
/// same number of rows.
pub fn check_alignment(
    baseline: &TemperatureMatrix,
    modified: &TemperatureMatrix,
) -> Result<(), ComfortError> {
    if baseline.columns() != modified.columns() {
        let base: HashSet<&String> = baseline.columns().iter().collect();
        let modi: HashSet<&String> = modified.columns().iter().collect();

        let only_in_baseline: Vec<String> = baseline
            .columns()
            .iter()
            .filter(|c| !modi.contains(c))
            .cloned()
            .collect();
        let only_in_modified: Vec<String> = modified
            .columns()
            .iter()
            .filter(|c| !base.contains(c))
            .cloned()
            .collect();

        let mismatch = if only_in_baseline.is_empty() && only_in_modified.is_empty() {
            Mismatch::Order
        } else {
            Mismatch::Columns {
                only_in_baseline,
                only_in_modified,
            }
        };
        return Err(ComfortError::ColumnMismatch(mismatch));
    }

    if baseline.row_count() != modified.row_count() {
        return Err(ComfortError::ColumnMismatch(Mismatch::RowCount {
            baseline: baseline.row_count(),
            modified: modified.row_count(),
        }));
    }

    Ok(())
}

/// Row positions of the event window, taken from the matrix's hourly index.
pub fn event_window(
    matrix: &TemperatureMatrix,
    event_start_hour: usize,
) -> Result<Vec<usize>, ComfortError> {
    if event_start_hour == 0 {
        return Err(ComfortError::EventStartOutOfRange(event_start_hour));
    }

    let rows = matrix.event_rows(event_start_hour);
    if rows.is_empty() {
        return Err(ComfortError::EmptyWindow {
            start_hour: event_start_hour,
            total_rows: matrix.row_count(),
        });
    }
    Ok(rows)
}

/// Percentage of `rows` in which `values` exceed `threshold`.
fn building_breach_ratio(values: &[f64], rows: &[usize], threshold: f64) -> f64 {
    let breaches = rows.iter().filter(|&&r| values[r] > threshold).count();
    breaches as f64 / rows.len() as f64 * 100.0
}

/// Mean over buildings of each building's breach percentage.
fn scenario_breach_ratio(matrix: &TemperatureMatrix, rows: &[usize], threshold: f64) -> f64 {
    let total: f64 = matrix
        .iter_columns()
        .map(|(_, values)| building_breach_ratio(values, rows, threshold))
        .sum();
    total / matrix.building_count() as f64
}

/// First event-window row where more than half of the buildings exceed
/// `threshold`.
fn first_majority_breach(
    matrix: &TemperatureMatrix,
    rows: &[usize],
    threshold: f64,
) -> Option<MajorityBreach> {
    let required = matrix.building_count() as f64 * MAJORITY_FRACTION;
    let first_row = *rows.first()?;

    rows.iter().find_map(|&row| {
        let count = matrix
            .iter_columns()
            .filter(|(_, values)| values[row] > threshold)
            .count();
        (count as f64 > required).then(|| MajorityBreach {
            time: matrix.timestamp(row),
            hours_after_event_start: row - first_row,
            buildings_breaching: count,
        })
    })
}

/// Computes breach statistics for every threshold over the event window.
///
/// The event window is every row whose hourly index is at or after
/// `event_start_hour`. Inputs are not modified.
///
/// # Errors
///
/// - [`ComfortError::ColumnMismatch`] if the matrices do not line up
/// - [`ComfortError::EventStartOutOfRange`] if `event_start_hour` is 0
/// - [`ComfortError::EmptyWindow`] if no row falls in the event window
/// - [`ComfortError::InvalidThreshold`] if a threshold is not a finite number
///
/// # Example
///
/// ```
/// use heatwave_comfort::comfort::breach::analyze_breaches;
/// use heatwave_comfort::comfort::matrix::TemperatureMatrix;
/// use heatwave_comfort::comfort::thresholds::ComfortThresholdSet;
///
/// let baseline = TemperatureMatrix::with_sequential_hours(
///     "baseline",
///     vec![("a".to_string(), vec![22.0, 23.0, 24.0, 24.0])],
/// ).unwrap();
/// let modified = TemperatureMatrix::with_sequential_hours(
///     "modified",
///     vec![("a".to_string(), vec![22.0, 27.0, 29.0, 31.0])],
/// ).unwrap();
/// let thresholds = ComfortThresholdSet::empty().with("comfort_limit", 26.0).unwrap();
///
/// let analysis = analyze_breaches(&baseline, &modified, &thresholds, 1).unwrap();
/// let result = analysis.get("comfort_limit").unwrap();
/// assert_eq!(result.modified_breach_ratio, 75.0);
/// assert_eq!(result.hours_after_event_start(), Some(1));
/// ```
pub fn analyze_breaches(
    baseline: &TemperatureMatrix,
    modified: &TemperatureMatrix,
    thresholds: &ComfortThresholdSet,
    event_start_hour: usize,
) -> Result<BreachAnalysis, ComfortError> {
    check_alignment(baseline, modified)?;
    thresholds.validate()?;
    let rows = event_window(baseline, event_start_hour)?;

    debug!(
        event_start_hour,
        event_hours = rows.len(),
        buildings = baseline.building_count(),
        thresholds = thresholds.len(),
        "analysing comfort threshold breaches"
    );

    let results: Vec<BreachResult> = thresholds
        .iter()
        .map(|t| {
            let baseline_ratio = scenario_breach_ratio(baseline, &rows, t.temperature);
            let modified_ratio = scenario_breach_ratio(modified, &rows, t.temperature);
            let first_breach = first_majority_breach(modified, &rows, t.temperature);

            info!(
                label = %t.label,
                threshold = t.temperature,
                baseline = baseline_ratio,
                modified = modified_ratio,
                first_breach = first_breach.as_ref().map(|b| b.hours_after_event_start),
                "threshold breach ratios"
            );

            BreachResult {
                label: t.label.clone(),
                threshold_temp: t.temperature,
                baseline_breach_ratio: baseline_ratio,
                modified_breach_ratio: modified_ratio,
                increase: modified_ratio - baseline_ratio,
                first_breach,
            }
        })
        .collect();

    Ok(BreachAnalysis {
        event_start_hour,
        event_hours: rows.len(),
        building_count: baseline.building_count(),
        results,
    })
}
