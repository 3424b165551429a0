//! EPW (EnergyPlus Weather) file reader.
//!
//! EPW files consist of:
//! - Header lines (1-8): Location, design conditions, typical/extreme periods
//! - Data lines (9-8768): Hourly weather data for one year
//!
//! Only the fields needed for heatwave detection are extracted from each data
//! line: month, day, hour and dry bulb temperature.

use crate::weather::{HourlySample, WeatherError, WeatherRecordSource};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// Number of header lines preceding the hourly records.
pub const HEADER_LINES: usize = 8;

/// 0-based column of the month field.
const MONTH_COLUMN: usize = 1;
/// 0-based column of the day field.
const DAY_COLUMN: usize = 2;
/// 0-based column of the hour field.
const HOUR_COLUMN: usize = 3;
/// 0-based column of the dry bulb temperature field.
const DRY_BULB_COLUMN: usize = 6;

/// Hourly records loaded from an EPW weather file.
///
/// # Example
///
/// ```no_run
/// use heatwave_comfort::weather::epw::EpwWeatherFile;
/// use heatwave_comfort::weather::WeatherRecordSource;
///
/// let weather = EpwWeatherFile::from_file("weather/weather_file.epw")
///     .expect("Failed to load EPW file");
///
/// println!("{} hourly records", weather.samples().len());
/// ```
#[derive(Debug, Clone)]
pub struct EpwWeatherFile {
    /// Location extracted from the EPW header (e.g., "Denver, CO")
    location: Option<String>,
    /// Hourly samples in file order
    samples: Vec<HourlySample>,
}

impl EpwWeatherFile {
    /// Loads an EPW file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`WeatherError::Io`] if the file cannot be opened or read, and
    /// [`WeatherError::MalformedRecord`] if a data line cannot be parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WeatherError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| WeatherError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        Self::parse(BufReader::new(file)).map_err(|err| match err {
            WeatherError::Io { message, .. } => WeatherError::Io {
                path: path.display().to_string(),
                message,
            },
            other => other,
        })
    }

    /// Parses EPW content from a reader.
    ///
    /// Comment lines (starting with `!`) and blank lines in the data section
    /// are skipped.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, WeatherError> {
        let mut lines = reader.lines();

        let location_line = lines
            .next()
            .ok_or_else(|| {
                WeatherError::InsufficientData("missing EPW location header".to_string())
            })?
            .map_err(io_error)?;
        let location = Self::parse_location(&location_line);

        for _ in 1..HEADER_LINES {
            match lines.next() {
                Some(line) => {
                    line.map_err(io_error)?;
                }
                None => {
                    return Err(WeatherError::InsufficientData(
                        "unexpected end of file before data section".to_string(),
                    ))
                }
            }
        }

        let mut samples = Vec::with_capacity(8760);
        for (idx, line_result) in lines.enumerate() {
            let line = line_result.map_err(io_error)?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('!') {
                continue;
            }

            let line_number = HEADER_LINES + idx + 1;
            samples.push(Self::parse_data_line(trimmed, line_number)?);
        }

        debug!(records = samples.len(), ?location, "parsed EPW weather data");

        Ok(EpwWeatherFile { location, samples })
    }

    /// Parses the location header line.
    ///
    /// The location line has the format:
    /// `LOCATION,City,StateProv,Country,DataSource,WMO,Latitude,Longitude,TimeZone,Elevation`
    fn parse_location(line: &str) -> Option<String> {
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() < 3 {
            return None;
        }

        let city = parts[1].trim();
        let state = parts[2].trim();
        if city.is_empty() && state.is_empty() {
            return None;
        }

        Some(format!("{}, {}", city, state))
    }

    /// Parses a single hourly data line.
    fn parse_data_line(line: &str, line_number: usize) -> Result<HourlySample, WeatherError> {
        let fields: Vec<&str> = line.split(',').collect();

        fn field<'a>(
            fields: &[&'a str],
            column: usize,
            name: &'static str,
            line: usize,
        ) -> Result<&'a str, WeatherError> {
            fields
                .get(column)
                .map(|f| f.trim())
                .ok_or_else(|| WeatherError::MalformedRecord {
                    line,
                    field: name,
                    value: String::new(),
                })
        }

        fn parse_bounded(
            raw: &str,
            name: &'static str,
            line: usize,
            range: std::ops::RangeInclusive<u8>,
        ) -> Result<u8, WeatherError> {
            raw.parse::<u8>()
                .ok()
                .filter(|v| range.contains(v))
                .ok_or_else(|| WeatherError::MalformedRecord {
                    line,
                    field: name,
                    value: raw.to_string(),
                })
        }

        let month = parse_bounded(
            field(&fields, MONTH_COLUMN, "month", line_number)?,
            "month",
            line_number,
            1..=12,
        )?;
        let day = parse_bounded(
            field(&fields, DAY_COLUMN, "day", line_number)?,
            "day",
            line_number,
            1..=31,
        )?;
        let hour = parse_bounded(
            field(&fields, HOUR_COLUMN, "hour", line_number)?,
            "hour",
            line_number,
            0..=24,
        )?;

        let raw_temp = field(&fields, DRY_BULB_COLUMN, "dry bulb temperature", line_number)?;
        let dry_bulb_temp = raw_temp
            .parse::<f64>()
            .ok()
            .filter(|t| t.is_finite())
            .ok_or_else(|| WeatherError::MalformedRecord {
                line: line_number,
                field: "dry bulb temperature",
                value: raw_temp.to_string(),
            })?;

        Ok(HourlySample {
            month,
            day,
            hour,
            dry_bulb_temp,
        })
    }

    /// Returns the number of hourly records loaded.
    pub fn record_count(&self) -> usize {
        self.samples.len()
    }

    /// Returns the maximum dry bulb temperature in the dataset.
    pub fn max_temperature(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| s.dry_bulb_temp)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Returns the minimum dry bulb temperature in the dataset.
    pub fn min_temperature(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| s.dry_bulb_temp)
            .fold(f64::INFINITY, f64::min)
    }

    /// Returns the average dry bulb temperature in the dataset.
    pub fn average_temperature(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }

        let sum: f64 = self.samples.iter().map(|s| s.dry_bulb_temp).sum();
        sum / self.samples.len() as f64
    }
}

fn io_error(e: std::io::Error) -> WeatherError {
    WeatherError::Io {
        path: "<reader>".to_string(),
        message: e.to_string(),
    }
}

impl WeatherRecordSource for EpwWeatherFile {
    fn location(&self) -> Option<String> {
        self.location.clone()
    }

    fn samples(&self) -> &[HourlySample] {
        &self.samples
    }
}
