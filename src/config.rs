//! Analysis configuration.
//!
//! Every default the analysis relies on (comfort ranges, thresholds, building
//! type names, project layout) lives in an explicit struct that is passed to
//! the components that need it.
//!
//! # Usage
//!
//! ```rust,ignore
//! use heatwave_comfort::config::AnalysisConfig;
//!
//! // Project layout from HEATWAVE_PROJECT_ROOT / HEATWAVE_WEATHER_FILE
//! let config = AnalysisConfig::from_env();
//!
//! // Or from a JSON file
//! let config = AnalysisConfig::from_json_file("analysis.json")?;
//! ```

use crate::comfort::matrix::{DEFAULT_BASE_YEAR, DEFAULT_TIME_COLUMN};
use crate::comfort::thresholds::ComfortThresholdSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable naming the project root directory.
pub const PROJECT_ROOT_ENV: &str = "HEATWAVE_PROJECT_ROOT";
/// Environment variable overriding the weather file path.
pub const WEATHER_FILE_ENV: &str = "HEATWAVE_WEATHER_FILE";

/// Indoor temperature bands (°C) used for chart guides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComfortRanges {
    pub optimal: (f64, f64),
    pub acceptable: (f64, f64),
    pub slight_warm: (f64, f64),
    pub moderate_warm: (f64, f64),
    pub hot: (f64, f64),
    pub extreme_hot: (f64, f64),
}

impl Default for ComfortRanges {
    fn default() -> Self {
        Self {
            optimal: (20.0, 26.0),
            acceptable: (18.0, 28.0),
            slight_warm: (28.0, 30.0),
            moderate_warm: (30.0, 32.0),
            hot: (32.0, 35.0),
            extreme_hot: (35.0, 100.0),
        }
    }
}

impl ComfortRanges {
    /// Upper bound of the optimal band.
    pub fn comfort_limit(&self) -> f64 {
        self.optimal.1
    }

    /// Upper bound of the acceptable band.
    pub fn acceptable_limit(&self) -> f64 {
        self.acceptable.1
    }

    /// Upper bound of the slight-warm band, where health risk begins.
    pub fn health_risk_limit(&self) -> f64 {
        self.slight_warm.1
    }
}

/// Maps building type ids embedded in column names to readable type names.
///
/// Columns follow `<prefix>_<type id>_<building number>_...`, e.g.
/// `city_0_10_1980_S0_Idealload` is building 10 of type 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingTypeMap {
    pub types: BTreeMap<String, String>,
}

impl Default for BuildingTypeMap {
    fn default() -> Self {
        let types = [
            ("0", "Lowrise_Domestic"),
            ("1", "Midrise_Domestic"),
            ("2", "Highrise_Domestic"),
            ("3", "Commercial"),
            ("4", "Office"),
            ("5", "Industry"),
            ("6", "Transport"),
            ("7", "Administration"),
        ]
        .into_iter()
        .map(|(id, name)| (id.to_string(), name.to_string()))
        .collect();

        Self { types }
    }
}

impl BuildingTypeMap {
    /// Readable label for a building column, e.g. `Lowrise_Domestic_10`.
    ///
    /// Columns with fewer than three `_`-separated parts are returned as-is.
    /// Unknown type ids become `Type<id>`.
    ///
    /// # Example
    ///
    /// ```
    /// use heatwave_comfort::config::BuildingTypeMap;
    ///
    /// let map = BuildingTypeMap::default();
    /// assert_eq!(map.label_for("city_0_10_1980_S0_Idealload"), "Lowrise_Domestic_10");
    /// assert_eq!(map.label_for("city_9_3"), "Type9_3");
    /// assert_eq!(map.label_for("zone1"), "zone1");
    /// ```
    pub fn label_for(&self, column: &str) -> String {
        let parts: Vec<&str> = column.split('_').collect();
        if parts.len() < 3 {
            return column.to_string();
        }

        let type_id = parts[1];
        let building_type = self
            .types
            .get(type_id)
            .cloned()
            .unwrap_or_else(|| format!("Type{}", type_id));
        format!("{}_{}", building_type, parts[2])
    }
}

/// How per-building simulation output is located and read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsOptions {
    /// Name of the output CSV inside each building's result directory
    pub output_csv_name: String,
    /// Substring selecting zone temperature columns
    pub temperature_column_pattern: String,
    /// Name of the hourly index column in generated matrices
    pub time_column_name: String,
}

impl Default for ResultsOptions {
    fn default() -> Self {
        Self {
            output_csv_name: "eplusout.csv".to_string(),
            temperature_column_pattern: "Zone Mean Air Temperature".to_string(),
            time_column_name: DEFAULT_TIME_COLUMN.to_string(),
        }
    }
}

/// Top-level configuration for an analysis run.
///
/// When deserialized, paths left out of the input are laid out under
/// `project_root` the same way [`AnalysisConfig::with_root`] does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ConfigFile")]
pub struct AnalysisConfig {
    pub project_root: PathBuf,
    pub weather_file: PathBuf,
    pub results_baseline_dir: PathBuf,
    pub results_modified_dir: PathBuf,
    pub hourly_baseline_csv: PathBuf,
    pub hourly_modified_csv: PathBuf,
    pub temperature_comparison_csv: PathBuf,
    /// Length of the heatwave window in days
    pub heatwave_days: usize,
    /// Year that row 0 of hourly matrices falls on
    pub base_year: i32,
    pub thresholds: ComfortThresholdSet,
    pub comfort_ranges: ComfortRanges,
    pub building_types: BuildingTypeMap,
    pub results: ResultsOptions,
}

/// On-disk form of [`AnalysisConfig`]; every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    project_root: Option<PathBuf>,
    weather_file: Option<PathBuf>,
    results_baseline_dir: Option<PathBuf>,
    results_modified_dir: Option<PathBuf>,
    hourly_baseline_csv: Option<PathBuf>,
    hourly_modified_csv: Option<PathBuf>,
    temperature_comparison_csv: Option<PathBuf>,
    heatwave_days: Option<usize>,
    base_year: Option<i32>,
    thresholds: Option<ComfortThresholdSet>,
    comfort_ranges: Option<ComfortRanges>,
    building_types: Option<BuildingTypeMap>,
    results: Option<ResultsOptions>,
}

impl From<ConfigFile> for AnalysisConfig {
    fn from(file: ConfigFile) -> Self {
        let defaults = Self::with_root(file.project_root.unwrap_or_else(|| PathBuf::from(".")));
        Self {
            weather_file: file.weather_file.unwrap_or(defaults.weather_file),
            results_baseline_dir: file.results_baseline_dir.unwrap_or(defaults.results_baseline_dir),
            results_modified_dir: file.results_modified_dir.unwrap_or(defaults.results_modified_dir),
            hourly_baseline_csv: file.hourly_baseline_csv.unwrap_or(defaults.hourly_baseline_csv),
            hourly_modified_csv: file.hourly_modified_csv.unwrap_or(defaults.hourly_modified_csv),
            temperature_comparison_csv: file
                .temperature_comparison_csv
                .unwrap_or(defaults.temperature_comparison_csv),
            heatwave_days: file.heatwave_days.unwrap_or(defaults.heatwave_days),
            base_year: file.base_year.unwrap_or(defaults.base_year),
            thresholds: file.thresholds.unwrap_or(defaults.thresholds),
            comfort_ranges: file.comfort_ranges.unwrap_or(defaults.comfort_ranges),
            building_types: file.building_types.unwrap_or(defaults.building_types),
            results: file.results.unwrap_or(defaults.results),
            project_root: defaults.project_root,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::with_root(".")
    }
}

impl AnalysisConfig {
    /// Standard project layout under `root`.
    pub fn with_root<P: AsRef<Path>>(root: P) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            weather_file: root.join("weather").join("weather_file.epw"),
            results_baseline_dir: root.join("simulation_results_baseline"),
            results_modified_dir: root.join("simulation_results_modified"),
            hourly_baseline_csv: root.join("hourly_temperatures_baseline.csv"),
            hourly_modified_csv: root.join("hourly_temperatures_modified.csv"),
            temperature_comparison_csv: root.join("temperature_comparison.csv"),
            heatwave_days: 3,
            base_year: DEFAULT_BASE_YEAR,
            thresholds: ComfortThresholdSet::default(),
            comfort_ranges: ComfortRanges::default(),
            building_types: BuildingTypeMap::default(),
            results: ResultsOptions::default(),
            project_root: root,
        }
    }

    /// Layout rooted at `HEATWAVE_PROJECT_ROOT` (default: current directory),
    /// with the weather file optionally overridden by `HEATWAVE_WEATHER_FILE`.
    pub fn from_env() -> Self {
        let root = std::env::var_os(PROJECT_ROOT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut config = Self::with_root(root);

        if let Some(weather) = std::env::var_os(WEATHER_FILE_ENV) {
            config.weather_file = PathBuf::from(weather);
        }
        config
    }

    /// Loads a configuration from a JSON file. Missing fields take their
    /// default values, with default paths placed under `project_root`.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;

        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_comfort_ranges() {
        let ranges = ComfortRanges::default();
        assert_eq!(ranges.comfort_limit(), 26.0);
        assert_eq!(ranges.acceptable_limit(), 28.0);
        assert_eq!(ranges.health_risk_limit(), 30.0);
        assert_eq!(ranges.extreme_hot, (35.0, 100.0));
    }

    #[test]
    fn test_building_labels() {
        let map = BuildingTypeMap::default();
        assert_eq!(map.label_for("city_4_22_1990_S0_Idealload"), "Office_22");
        assert_eq!(map.label_for("city_7_1"), "Administration_1");
        assert_eq!(map.label_for("a_b"), "a_b");
    }

    #[test]
    fn test_with_root_layout() {
        let config = AnalysisConfig::with_root("/data/project");
        assert_eq!(
            config.weather_file,
            PathBuf::from("/data/project/weather/weather_file.epw")
        );
        assert_eq!(
            config.hourly_modified_csv,
            PathBuf::from("/data/project/hourly_temperatures_modified.csv")
        );
        assert_eq!(config.heatwave_days, 3);
        assert_eq!(config.thresholds, ComfortThresholdSet::default());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"heatwave_days": 5, "base_year": 2019}"#).unwrap();
        assert_eq!(config.heatwave_days, 5);
        assert_eq!(config.base_year, 2019);
        assert_eq!(config.results, ResultsOptions::default());
    }

    #[test]
    fn test_json_project_root_places_default_paths() {
        let config: AnalysisConfig = serde_json::from_str(r#"{"project_root": "/data/proj"}"#).unwrap();
        assert_eq!(config.project_root, PathBuf::from("/data/proj"));
        assert_eq!(
            config.weather_file,
            PathBuf::from("/data/proj/weather/weather_file.epw")
        );
        assert_eq!(
            config.results_baseline_dir,
            PathBuf::from("/data/proj/simulation_results_baseline")
        );
        assert_eq!(config, AnalysisConfig::with_root("/data/proj"));
    }

    #[test]
    fn test_json_explicit_path_wins_over_project_root() {
        let config: AnalysisConfig = serde_json::from_str(
            r#"{"project_root": "/data/proj", "weather_file": "/weather/london.epw"}"#,
        )
        .unwrap();
        assert_eq!(config.weather_file, PathBuf::from("/weather/london.epw"));
        assert_eq!(
            config.temperature_comparison_csv,
            PathBuf::from("/data/proj/temperature_comparison.csv")
        );
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = AnalysisConfig::with_root(dir.path());
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = AnalysisConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
