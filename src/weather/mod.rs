//! Weather data module for heatwave analysis.
//!
//! This module provides the hourly weather records consumed by the heat period
//! detector, along with the calendar helpers used to place each record within a
//! fixed 365-day year.
//!
//! # Overview
//!
//! - [`HourlySample`]: One hourly dry-bulb observation keyed by month, day and hour
//! - [`WeatherRecordSource`]: Trait for anything that yields a year of hourly samples
//! - [`WeatherError`]: Error types for weather parsing and heat period detection
//!
//! # Supported Sources
//!
//! - **EPW Files**: EnergyPlus Weather files via [`epw::EpwWeatherFile`]
//! - **In-memory**: Any `Vec<HourlySample>` implements [`WeatherRecordSource`]

pub mod epw;
pub mod heatwave;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Month lengths of a non-leap year.
///
/// February is always 28 days, whatever year the source data was recorded in.
pub const DAYS_IN_MONTH: [u16; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Number of days in the fixed calendar.
pub const DAYS_PER_YEAR: u16 = 365;

/// A single hourly dry-bulb temperature observation.
///
/// Samples are immutable and kept in source order. A full year contains 8760
/// samples (8784 for leap-year files).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlySample {
    /// Month (1-12)
    pub month: u8,
    /// Day of month (1-31)
    pub day: u8,
    /// Hour as written by the source (EPW uses 1-24)
    pub hour: u8,
    /// Dry bulb temperature (°C)
    pub dry_bulb_temp: f64,
}

impl HourlySample {
    /// Creates a new [`HourlySample`].
    ///
    /// # Example
    ///
    /// ```
    /// use heatwave_comfort::weather::HourlySample;
    ///
    /// let sample = HourlySample::new(7, 15, 14, 33.5);
    /// assert_eq!(sample.month, 7);
    /// assert_eq!(sample.dry_bulb_temp, 33.5);
    /// ```
    pub fn new(month: u8, day: u8, hour: u8, dry_bulb_temp: f64) -> Self {
        HourlySample {
            month,
            day,
            hour,
            dry_bulb_temp,
        }
    }

    /// Returns the 1-based day of year for this sample.
    pub fn day_of_year(&self) -> Result<u16, WeatherError> {
        day_of_year(self.month, self.day)
    }
}

/// Error types for weather data operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeatherError {
    /// A record field could not be parsed as the required numeric type.
    #[error("malformed record on line {line}: invalid {field} value '{value}'")]
    MalformedRecord {
        /// 1-based line number in the source
        line: usize,
        /// Name of the offending field
        field: &'static str,
        /// Raw field text
        value: String,
    },

    /// No contiguous window of the requested length exists in the data.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// The requested window length is not usable.
    #[error("invalid window length: {0} days (must be at least 1)")]
    InvalidWindow(usize),

    /// Input/output error reading weather data.
    #[error("IO error reading {path}: {message}")]
    Io {
        /// Path of the weather file
        path: String,
        /// Underlying error text
        message: String,
    },
}

/// Computes the 1-based day of year for a calendar date.
///
/// Uses the fixed non-leap [`DAYS_IN_MONTH`] table. Days are accepted up to 31
/// for every month, so February 29 maps onto the same value as March 1.
///
/// # Example
///
/// ```
/// use heatwave_comfort::weather::day_of_year;
///
/// assert_eq!(day_of_year(1, 1).unwrap(), 1);
/// assert_eq!(day_of_year(3, 1).unwrap(), 60);
/// assert_eq!(day_of_year(12, 31).unwrap(), 365);
/// ```
pub fn day_of_year(month: u8, day: u8) -> Result<u16, WeatherError> {
    if !(1..=12).contains(&month) {
        return Err(WeatherError::MalformedRecord {
            line: 0,
            field: "month",
            value: month.to_string(),
        });
    }
    if !(1..=31).contains(&day) {
        return Err(WeatherError::MalformedRecord {
            line: 0,
            field: "day",
            value: day.to_string(),
        });
    }

    let preceding: u16 = DAYS_IN_MONTH[..(month as usize - 1)].iter().sum();
    Ok(preceding + day as u16)
}

/// Converts a 1-based day of year back into `(month, day)`.
///
/// Values past the end of the fixed calendar saturate to December 31.
pub fn month_day_from_doy(doy: u16) -> (u8, u8) {
    let mut remaining = doy;
    for (idx, &days) in DAYS_IN_MONTH.iter().enumerate() {
        if remaining <= days {
            return ((idx + 1) as u8, remaining.max(1) as u8);
        }
        remaining -= days;
    }
    (12, 31)
}

/// Trait for sources that yield the ordered hourly samples of one year.
///
/// The heat period detector only needs the samples; where they come from (an
/// EPW file, a database, a synthetic generator) is up to the implementor.
pub trait WeatherRecordSource {
    /// Returns the location description (e.g., "Denver, USA") if available.
    fn location(&self) -> Option<String> {
        None
    }

    /// Returns the hourly samples in source order.
    fn samples(&self) -> &[HourlySample];
}

impl WeatherRecordSource for Vec<HourlySample> {
    fn samples(&self) -> &[HourlySample] {
        self.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_of_year_month_starts() {
        assert_eq!(day_of_year(1, 1).unwrap(), 1);
        assert_eq!(day_of_year(2, 1).unwrap(), 32);
        assert_eq!(day_of_year(3, 1).unwrap(), 60);
        assert_eq!(day_of_year(7, 1).unwrap(), 182);
        assert_eq!(day_of_year(12, 1).unwrap(), 335);
        assert_eq!(day_of_year(12, 31).unwrap(), DAYS_PER_YEAR);
    }

    #[test]
    fn test_day_of_year_ignores_leap_years() {
        // Feb 29 collides with Mar 1 under the fixed table
        assert_eq!(day_of_year(2, 29).unwrap(), day_of_year(3, 1).unwrap());
    }

    #[test]
    fn test_day_of_year_rejects_out_of_range() {
        assert!(matches!(
            day_of_year(13, 1),
            Err(WeatherError::MalformedRecord { field: "month", .. })
        ));
        assert!(matches!(
            day_of_year(0, 1),
            Err(WeatherError::MalformedRecord { field: "month", .. })
        ));
        assert!(matches!(
            day_of_year(5, 0),
            Err(WeatherError::MalformedRecord { field: "day", .. })
        ));
    }

    #[test]
    fn test_month_day_round_trip_over_year() {
        for doy in 1..=DAYS_PER_YEAR {
            let (month, day) = month_day_from_doy(doy);
            assert_eq!(day_of_year(month, day).unwrap(), doy);
        }
    }

    #[test]
    fn test_month_day_saturates() {
        assert_eq!(month_day_from_doy(400), (12, 31));
    }

    #[test]
    fn test_vec_is_record_source() {
        let samples = vec![HourlySample::new(1, 1, 1, 5.0)];
        assert_eq!(samples.samples().len(), 1);
        assert_eq!(WeatherRecordSource::location(&samples), None);
    }

    #[test]
    fn test_weather_error_display() {
        let err = WeatherError::MalformedRecord {
            line: 12,
            field: "dry bulb temperature",
            value: "abc".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("line 12"));
        assert!(msg.contains("abc"));

        let err = WeatherError::InsufficientData("no 3-day window".to_string());
        assert!(err.to_string().contains("no 3-day window"));

        let err = WeatherError::Io {
            path: "weather.epw".to_string(),
            message: "not found".to_string(),
        };
        assert!(err.to_string().contains("weather.epw"));
    }
}
