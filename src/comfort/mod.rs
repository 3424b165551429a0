//! Indoor thermal-comfort analysis over hourly building temperatures.
//!
//! The analysis compares a baseline scenario against a modified one (for
//! example an HVAC outage during a heatwave), both given as
//! [`matrix::TemperatureMatrix`] values with one column per building.
//!
//! - [`breach`]: per-threshold breach ratios and majority-breach detection
//! - [`summary`]: event-window temperature statistics
//! - [`chart`]: plain data series for an external chart renderer
//! - [`thresholds`]: the labelled comfort thresholds evaluated by the analyzer

pub mod breach;
pub mod chart;
pub mod matrix;
pub mod summary;
pub mod thresholds;

use std::fmt;
use thiserror::Error;

/// Ways in which a baseline and modified matrix can fail to line up.
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    /// Column sets differ.
    Columns {
        /// Columns present only in the baseline matrix
        only_in_baseline: Vec<String>,
        /// Columns present only in the modified matrix
        only_in_modified: Vec<String>,
    },
    /// Same columns, different order.
    Order,
    /// Different number of hourly rows.
    RowCount {
        /// Rows in the baseline matrix
        baseline: usize,
        /// Rows in the modified matrix
        modified: usize,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Columns {
                only_in_baseline,
                only_in_modified,
            } => write!(
                f,
                "only in baseline: [{}]; only in modified: [{}]",
                only_in_baseline.join(", "),
                only_in_modified.join(", ")
            ),
            Mismatch::Order => write!(f, "columns appear in a different order"),
            Mismatch::RowCount { baseline, modified } => write!(
                f,
                "baseline has {} rows, modified has {} rows",
                baseline, modified
            ),
        }
    }
}

/// Error types for comfort analysis.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ComfortError {
    /// Baseline and modified matrices do not share columns or row counts.
    #[error("column mismatch between baseline and modified data: {0}")]
    ColumnMismatch(Mismatch),

    /// The event window selected no rows.
    #[error("event window starting at hour {start_hour} is empty ({total_rows} rows available)")]
    EmptyWindow {
        /// Requested event start hour
        start_hour: usize,
        /// Rows in the matrix
        total_rows: usize,
    },

    /// A threshold carried a non-numeric or non-finite value, or a bad label.
    #[error("invalid threshold '{label}': {reason}")]
    InvalidThreshold {
        /// Threshold label
        label: String,
        /// What was wrong with it
        reason: String,
    },

    /// Event start hour outside the 1-based hourly index.
    #[error("event start hour {0} is out of range (hours are 1-based)")]
    EventStartOutOfRange(usize),

    /// A matrix without building columns or rows.
    #[error("temperature matrix '{0}' has no building data")]
    EmptyMatrix(String),

    /// Invalid matrix structure (duplicate or ragged columns).
    #[error("invalid temperature matrix '{source_name}': {reason}")]
    InvalidMatrix {
        /// File or description of the matrix
        source_name: String,
        /// What was wrong with it
        reason: String,
    },

    /// A matrix cell could not be parsed as a temperature.
    #[error("malformed value '{value}' in {source_name} at row {row}, column '{column}'")]
    MalformedCell {
        /// File or description of the matrix
        source_name: String,
        /// 1-based data row
        row: usize,
        /// Column header
        column: String,
        /// Raw cell text
        value: String,
    },

    /// CSV decoding failure.
    #[error("CSV error in {source_name}: {message}")]
    Csv {
        /// File or description of the matrix
        source_name: String,
        /// Underlying error text
        message: String,
    },

    /// Input/output error.
    #[error("IO error on {path}: {message}")]
    Io {
        /// Path involved
        path: String,
        /// Underlying error text
        message: String,
    },
}
