//! Hottest consecutive period detection.
//!
//! Hourly samples are collapsed into one [`DailyAggregate`] per calendar day,
//! ordered by day of year, and a window of `window_days` days is slid over the
//! ordered sequence. Only windows whose days are exactly contiguous are
//! considered, so gaps in the source data never produce a window that spans
//! them. The window with the highest mean of daily means wins; on ties the
//! earliest window is kept.
//!
//! This is intentionally not a top-N selection of individually hot days: the
//! result is always a run of consecutive days.

use crate::weather::{month_day_from_doy, HourlySample, WeatherError, WeatherRecordSource};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, info};

/// Hours per day in the hourly index used by the comfort analyzer.
const HOURS_PER_DAY: usize = 24;

/// A calendar day in the fixed 365-day year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CalendarDay {
    /// Month (1-12)
    pub month: u8,
    /// Day of month (1-31)
    pub day: u8,
}

impl CalendarDay {
    /// Builds a calendar day from a 1-based day of year.
    pub fn from_doy(doy: u16) -> Self {
        let (month, day) = month_day_from_doy(doy);
        CalendarDay { month, day }
    }
}

impl fmt::Display for CalendarDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:02}", self.month, self.day)
    }
}

/// Daily statistics derived from all hourly samples sharing a `(month, day)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyAggregate {
    /// Calendar day
    pub date: CalendarDay,
    /// 1-based day of year (fixed non-leap table)
    pub doy: u16,
    /// Mean dry bulb temperature of the day (°C)
    pub mean_temp: f64,
    /// Maximum dry bulb temperature of the day (°C)
    pub max_temp: f64,
    /// Number of hourly samples that contributed
    pub sample_count: usize,
}

/// One day of the selected window, ranked by position in the window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotDay {
    /// 1-based position within the window (not a temperature ranking)
    pub rank: usize,
    /// Month (1-12)
    pub month: u8,
    /// Day of month (1-31)
    pub day: u8,
    /// Date formatted as `MM/DD`
    pub date: String,
    /// 1-based day of year
    pub doy: u16,
    /// Mean dry bulb temperature of the day (°C)
    pub average_temperature: f64,
    /// Maximum dry bulb temperature of the day (°C)
    pub maximum_temperature: f64,
}

/// The hottest run of consecutive days found in a year of weather data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsecutiveWindow {
    /// Requested window length in days
    pub consecutive_days: usize,
    /// Days of the window in calendar order
    pub days: Vec<HotDay>,
    /// Mean of the daily mean temperatures over the window (°C)
    pub window_mean_temp: f64,
    /// First day of the window
    pub earliest_hot_day: CalendarDay,
}

impl ConsecutiveWindow {
    /// Day of year of the first day in the window.
    pub fn start_doy(&self) -> u16 {
        self.days.first().map(|d| d.doy).unwrap_or(1)
    }

    /// 1-based hourly index of the first hour of the earliest hot day.
    ///
    /// This is the value hourly temperature matrices use in their `Hour`
    /// column, so it can be passed straight to the comfort analyzer as the
    /// event start.
    ///
    /// # Example
    ///
    /// ```
    /// use heatwave_comfort::weather::HourlySample;
    /// use heatwave_comfort::weather::heatwave::find_hottest_consecutive_window;
    ///
    /// let mut samples = Vec::new();
    /// for day in 1..=5u8 {
    ///     let temp = if day == 2 { 30.0 } else { 20.0 };
    ///     for hour in 1..=24u8 {
    ///         samples.push(HourlySample::new(1, day, hour, temp));
    ///     }
    /// }
    ///
    /// let window = find_hottest_consecutive_window(&samples, 1).unwrap();
    /// assert_eq!(window.event_start_hour(), 25);
    /// ```
    pub fn event_start_hour(&self) -> usize {
        (self.start_doy() as usize - 1) * HOURS_PER_DAY + 1
    }
}

/// Groups hourly samples into daily aggregates ordered by day of year.
///
/// Days sharing the same day of year (February 29 and March 1 in leap-year
/// files) keep calendar order. A non-finite temperature is a
/// [`WeatherError::MalformedRecord`].
pub fn daily_aggregates(samples: &[HourlySample]) -> Result<Vec<DailyAggregate>, WeatherError> {
    let mut groups: HashMap<CalendarDay, (f64, f64, usize)> = HashMap::new();

    for sample in samples {
        if !sample.dry_bulb_temp.is_finite() {
            return Err(WeatherError::MalformedRecord {
                line: 0,
                field: "dry bulb temperature",
                value: sample.dry_bulb_temp.to_string(),
            });
        }
        let key = CalendarDay {
            month: sample.month,
            day: sample.day,
        };
        let entry = groups
            .entry(key)
            .or_insert((0.0, f64::NEG_INFINITY, 0));
        entry.0 += sample.dry_bulb_temp;
        entry.1 = entry.1.max(sample.dry_bulb_temp);
        entry.2 += 1;
    }

    let mut days = groups
        .into_iter()
        .map(|(date, (sum, max, count))| {
            let doy = crate::weather::day_of_year(date.month, date.day)?;
            Ok(DailyAggregate {
                date,
                doy,
                mean_temp: sum / count as f64,
                max_temp: max,
                sample_count: count,
            })
        })
        .collect::<Result<Vec<_>, WeatherError>>()?;

    days.sort_by_key(|d| (d.doy, d.date.month, d.date.day));
    Ok(days)
}

/// Finds the run of `window_days` consecutive days with the highest mean
/// temperature.
///
/// # Errors
///
/// - [`WeatherError::InvalidWindow`] if `window_days` is zero
/// - [`WeatherError::InsufficientData`] if `samples` is empty or no contiguous
///   window of the requested length exists
/// - [`WeatherError::MalformedRecord`] if a sample carries an impossible date
pub fn find_hottest_consecutive_window(
    samples: &[HourlySample],
    window_days: usize,
) -> Result<ConsecutiveWindow, WeatherError> {
    if window_days == 0 {
        return Err(WeatherError::InvalidWindow(window_days));
    }
    if samples.is_empty() {
        return Err(WeatherError::InsufficientData(
            "no hourly samples provided".to_string(),
        ));
    }

    let days = daily_aggregates(samples)?;
    debug!(days = days.len(), window_days, "aggregated hourly samples");

    if days.len() < window_days {
        return Err(WeatherError::InsufficientData(format!(
            "{} distinct days available, {} requested",
            days.len(),
            window_days
        )));
    }

    let mut best: Option<(usize, f64)> = None;
    let mut skipped = 0usize;

    for (start, window) in days.windows(window_days).enumerate() {
        let contiguous = window.windows(2).all(|pair| pair[1].doy == pair[0].doy + 1);
        if !contiguous {
            skipped += 1;
            continue;
        }

        let mean = window.iter().map(|d| d.mean_temp).sum::<f64>() / window_days as f64;
        let hotter = match best {
            Some((_, best_mean)) => mean > best_mean,
            None => true,
        };
        if hotter {
            best = Some((start, mean));
        }
    }

    let (start, window_mean_temp) = best.ok_or_else(|| {
        WeatherError::InsufficientData(format!(
            "no run of {} consecutive days in the weather data",
            window_days
        ))
    })?;

    if skipped > 0 {
        debug!(skipped, "skipped windows spanning gaps in the weather data");
    }

    let hot_days: Vec<HotDay> = days[start..start + window_days]
        .iter()
        .enumerate()
        .map(|(idx, d)| HotDay {
            rank: idx + 1,
            month: d.date.month,
            day: d.date.day,
            date: d.date.to_string(),
            doy: d.doy,
            average_temperature: d.mean_temp,
            maximum_temperature: d.max_temp,
        })
        .collect();

    let earliest_hot_day = days[start].date;
    info!(
        start = %earliest_hot_day,
        window_days,
        mean = window_mean_temp,
        "selected hottest consecutive window"
    );

    Ok(ConsecutiveWindow {
        consecutive_days: window_days,
        days: hot_days,
        window_mean_temp,
        earliest_hot_day,
    })
}

/// Convenience wrapper running the detector over any [`WeatherRecordSource`].
pub fn hottest_period<S: WeatherRecordSource + ?Sized>(
    source: &S,
    window_days: usize,
) -> Result<ConsecutiveWindow, WeatherError> {
    find_hottest_consecutive_window(source.samples(), window_days)
}
