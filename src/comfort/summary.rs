//! Event-window temperature statistics.

use crate::comfort::breach::{check_alignment, event_window};
use crate::comfort::matrix::TemperatureMatrix;
use crate::comfort::ComfortError;
use serde::{Deserialize, Serialize};

/// Descriptive statistics of a temperature series (°C).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureStats {
    /// Arithmetic mean
    pub mean: f64,
    /// Minimum
    pub min: f64,
    /// Maximum
    pub max: f64,
    /// Sample standard deviation (n - 1); 0 for fewer than two values
    pub std: f64,
}

/// Computes [`TemperatureStats`] for a series. Non-finite values (empty
/// cells read as NaN) are skipped; a series with no finite values yields NaN
/// mean, min and max.
pub fn describe(values: &[f64]) -> TemperatureStats {
    let values: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    let n = values.len();
    if n == 0 {
        return TemperatureStats {
            mean: f64::NAN,
            min: f64::NAN,
            max: f64::NAN,
            std: 0.0,
        };
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let std = if n > 1 {
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        var.sqrt()
    } else {
        0.0
    };

    TemperatureStats {
        mean,
        min,
        max,
        std,
    }
}

/// Modified-minus-baseline change of the building-average temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureChange {
    /// Difference of the event-window means (°C)
    pub average: f64,
    /// Difference of the event-window maxima (°C)
    pub peak: f64,
}

/// Temperature statistics of both scenarios over the event window.
///
/// The statistics are taken over the hourly building-average series, not over
/// individual buildings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventSummary {
    /// Number of buildings
    pub building_count: usize,
    /// Number of hours in the event window
    pub event_hours: usize,
    /// Baseline statistics
    pub baseline: TemperatureStats,
    /// Modified statistics
    pub modified: TemperatureStats,
    /// Change between the scenarios
    pub change: TemperatureChange,
}

/// Summarises both scenarios over the hours at or after `event_start_hour`.
pub fn summarize_event_window(
    baseline: &TemperatureMatrix,
    modified: &TemperatureMatrix,
    event_start_hour: usize,
) -> Result<EventSummary, ComfortError> {
    check_alignment(baseline, modified)?;
    let rows = event_window(baseline, event_start_hour)?;

    let baseline_mean = baseline.hourly_mean();
    let modified_mean = modified.hourly_mean();

    let pick = |series: &[f64]| rows.iter().map(|&r| series[r]).collect::<Vec<f64>>();
    let baseline_stats = describe(&pick(&baseline_mean));
    let modified_stats = describe(&pick(&modified_mean));

    Ok(EventSummary {
        building_count: baseline.building_count(),
        event_hours: rows.len(),
        baseline: baseline_stats,
        modified: modified_stats,
        change: TemperatureChange {
            average: modified_stats.mean - baseline_stats.mean,
            peak: modified_stats.max - baseline_stats.max,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix(name: &str, data: &[(&str, &[f64])]) -> TemperatureMatrix {
        TemperatureMatrix::with_sequential_hours(
            name,
            data.iter()
                .map(|(n, v)| (n.to_string(), v.to_vec()))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_describe() {
        let stats = describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert!((stats.std - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_describe_single_value() {
        let stats = describe(&[21.5]);
        assert_eq!(stats.mean, 21.5);
        assert_eq!(stats.std, 0.0);
    }

    #[test]
    fn test_describe_skips_missing_values() {
        let stats = describe(&[20.0, f64::NAN, 24.0]);
        assert_eq!(stats.mean, 22.0);
        assert_eq!(stats.min, 20.0);
        assert_eq!(stats.max, 24.0);
        assert!((stats.std - 8.0_f64.sqrt()).abs() < 1e-12);

        assert!(describe(&[f64::NAN, f64::NAN]).mean.is_nan());
    }

    #[test]
    fn test_summary_with_missing_cell() {
        let baseline = matrix("b", &[("a", &[22.0, 22.0]), ("b", &[f64::NAN, 24.0])]);
        let modified = matrix("m", &[("a", &[26.0, 26.0]), ("b", &[28.0, 28.0])]);

        let summary = summarize_event_window(&baseline, &modified, 1).unwrap();
        assert_eq!(summary.baseline.mean, 22.5);
        assert_eq!(summary.baseline.max, 23.0);
        assert!(summary.change.average.is_finite());
        assert_eq!(summary.change.average, 4.5);
    }

    #[test]
    fn test_summary_over_event_window() {
        let baseline = matrix("b", &[("a", &[10.0, 20.0, 22.0]), ("b", &[10.0, 22.0, 24.0])]);
        let modified = matrix("m", &[("a", &[10.0, 25.0, 29.0]), ("b", &[10.0, 27.0, 31.0])]);

        let summary = summarize_event_window(&baseline, &modified, 2).unwrap();
        assert_eq!(summary.building_count, 2);
        assert_eq!(summary.event_hours, 2);
        assert_eq!(summary.baseline.mean, 22.0);
        assert_eq!(summary.baseline.max, 23.0);
        assert_eq!(summary.modified.mean, 28.0);
        assert_eq!(summary.modified.max, 30.0);
        assert_eq!(summary.change.average, 6.0);
        assert_eq!(summary.change.peak, 7.0);
    }
}
