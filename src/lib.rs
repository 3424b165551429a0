//! Heatwave detection and indoor thermal-comfort breach analysis for urban
//! building energy simulations.
//!
//! - [`weather`] reads hourly weather records and finds the hottest run of
//!   consecutive days.
//! - [`comfort`] compares baseline and modified hourly building temperatures
//!   against labelled comfort thresholds.
//! - [`results`] turns per-building simulation output into hourly matrices.
//! - [`report`] renders comparison reports.

pub mod comfort;
pub mod config;
pub mod report;
pub mod results;
pub mod weather;

pub use comfort::breach::{analyze_breaches, BreachAnalysis, BreachResult};
pub use comfort::matrix::TemperatureMatrix;
pub use comfort::thresholds::ComfortThresholdSet;
pub use comfort::ComfortError;
pub use config::AnalysisConfig;
pub use report::ComfortReport;
pub use weather::epw::EpwWeatherFile;
pub use weather::heatwave::{find_hottest_consecutive_window, hottest_period, ConsecutiveWindow};
pub use weather::{HourlySample, WeatherError};
