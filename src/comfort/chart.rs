//! Chart data contract.
//!
//! Rendering happens outside this crate. [`ChartData`] carries every series a
//! renderer needs for the two standard figures: the time-series comparison
//! (full year, event window, difference) and the per-building daily heatmap.

use crate::comfort::breach::{check_alignment, event_window};
use crate::comfort::matrix::TemperatureMatrix;
use crate::comfort::ComfortError;
use crate::config::{BuildingTypeMap, ComfortRanges};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Event rows between heatmap samples (one sample per day).
pub const HEATMAP_SAMPLE_STRIDE: usize = 24;

/// A timestamped series of building-average temperatures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    /// Timestamp of each point
    pub times: Vec<NaiveDateTime>,
    /// Building-average baseline temperature (°C) at each time
    pub baseline: Vec<f64>,
    /// Building-average modified temperature (°C) at each time
    pub modified: Vec<f64>,
}

/// A horizontal reference line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuideLine {
    /// Legend text, e.g. `Comfort limit (26°C)`
    pub label: String,
    /// Height of the line (°C)
    pub temperature: f64,
}

/// Daily-sampled temperatures per building over the event window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    /// Readable building labels, one per heatmap row
    pub building_labels: Vec<String>,
    /// `baseline[building][sample]`
    pub baseline: Vec<Vec<f64>>,
    /// `modified[building][sample]`
    pub modified: Vec<Vec<f64>>,
    /// Row index and name of the first building of each type
    pub type_ticks: Vec<(usize, String)>,
    /// Row indices after which a type group ends (excluding the final row)
    pub type_separators: Vec<usize>,
}

/// Everything a chart renderer needs for one comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    /// Name of the event, used in chart titles
    pub event_name: String,
    /// Number of buildings averaged into each series
    pub building_count: usize,
    /// Timestamp of the first event-window row
    pub event_start: NaiveDateTime,
    /// Whole-year building-average series
    pub annual: TimeSeries,
    /// Event-window building-average series
    pub event: TimeSeries,
    /// Modified minus baseline over the event window
    pub difference: Vec<f64>,
    /// Comfort guide lines drawn over the temperature plots
    pub guides: Vec<GuideLine>,
    /// Per-building event-window heatmap
    pub heatmap: Heatmap,
}

impl ChartData {
    /// Builds the chart series for a baseline/modified pair.
    pub fn build(
        baseline: &TemperatureMatrix,
        modified: &TemperatureMatrix,
        event_start_hour: usize,
        event_name: &str,
        ranges: &ComfortRanges,
        building_types: &BuildingTypeMap,
    ) -> Result<Self, ComfortError> {
        check_alignment(baseline, modified)?;
        let rows = event_window(baseline, event_start_hour)?;

        let baseline_mean = baseline.hourly_mean();
        let modified_mean = modified.hourly_mean();

        let annual = TimeSeries {
            times: (0..baseline.row_count()).map(|r| baseline.timestamp(r)).collect(),
            baseline: baseline_mean.clone(),
            modified: modified_mean.clone(),
        };

        let event = TimeSeries {
            times: rows.iter().map(|&r| baseline.timestamp(r)).collect(),
            baseline: rows.iter().map(|&r| baseline_mean[r]).collect(),
            modified: rows.iter().map(|&r| modified_mean[r]).collect(),
        };

        let difference = event
            .modified
            .iter()
            .zip(&event.baseline)
            .map(|(m, b)| m - b)
            .collect();

        let guides = vec![
            GuideLine {
                label: format!("Comfort limit ({}°C)", ranges.comfort_limit()),
                temperature: ranges.comfort_limit(),
            },
            GuideLine {
                label: format!("Acceptable limit ({}°C)", ranges.acceptable_limit()),
                temperature: ranges.acceptable_limit(),
            },
            GuideLine {
                label: format!("Health risk ({}°C)", ranges.health_risk_limit()),
                temperature: ranges.health_risk_limit(),
            },
        ];

        Ok(ChartData {
            event_name: event_name.to_string(),
            building_count: baseline.building_count(),
            event_start: baseline.timestamp(rows[0]),
            annual,
            event,
            difference,
            guides,
            heatmap: Self::heatmap(baseline, modified, &rows, building_types),
        })
    }

    fn heatmap(
        baseline: &TemperatureMatrix,
        modified: &TemperatureMatrix,
        rows: &[usize],
        building_types: &BuildingTypeMap,
    ) -> Heatmap {
        let sampled: Vec<usize> = rows.iter().copied().step_by(HEATMAP_SAMPLE_STRIDE).collect();
        let sample = |m: &TemperatureMatrix| -> Vec<Vec<f64>> {
            m.iter_columns()
                .map(|(_, values)| sampled.iter().map(|&r| values[r]).collect())
                .collect()
        };

        let building_labels: Vec<String> = baseline
            .columns()
            .iter()
            .map(|c| building_types.label_for(c))
            .collect();

        let mut type_ticks: Vec<(usize, String)> = Vec::new();
        let mut last_position: Vec<(String, usize)> = Vec::new();
        for (i, label) in building_labels.iter().enumerate() {
            let building_type = label.split('_').next().unwrap_or(label).to_string();
            match last_position.iter_mut().find(|(t, _)| *t == building_type) {
                Some(entry) => entry.1 = i,
                None => {
                    type_ticks.push((i, building_type.clone()));
                    last_position.push((building_type, i));
                }
            }
        }

        let type_separators = last_position
            .into_iter()
            .map(|(_, last)| last)
            .filter(|&last| last + 1 < building_labels.len())
            .collect();

        Heatmap {
            baseline: sample(baseline),
            modified: sample(modified),
            building_labels,
            type_ticks,
            type_separators,
        }
    }

    /// Writes the chart data as pretty-printed JSON for an external renderer.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}
