//! Labelled comfort thresholds.
//!
//! Each label is evaluated independently by the breach analyzer. Insertion
//! order is kept so reports list thresholds the way they were configured.

use crate::comfort::ComfortError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A single labelled temperature threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComfortThreshold {
    /// Label such as `comfort_limit` or `health_risk`
    pub label: String,
    /// Temperature above which an hour counts as a breach (°C)
    pub temperature: f64,
}

/// An ordered set of uniquely labelled comfort thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ComfortThreshold>", into = "Vec<ComfortThreshold>")]
pub struct ComfortThresholdSet {
    thresholds: Vec<ComfortThreshold>,
}

impl Default for ComfortThresholdSet {
    /// `comfort_limit` 26°C, `acceptable_limit` 28°C, `health_risk` 30°C,
    /// `severe_risk` 35°C.
    fn default() -> Self {
        let thresholds = [
            ("comfort_limit", 26.0),
            ("acceptable_limit", 28.0),
            ("health_risk", 30.0),
            ("severe_risk", 35.0),
        ]
        .into_iter()
        .map(|(label, temperature)| ComfortThreshold {
            label: label.to_string(),
            temperature,
        })
        .collect();

        ComfortThresholdSet { thresholds }
    }
}

impl ComfortThresholdSet {
    /// Creates an empty set.
    pub fn empty() -> Self {
        ComfortThresholdSet {
            thresholds: Vec::new(),
        }
    }

    /// Adds a threshold, rejecting empty or duplicate labels and non-finite
    /// temperatures.
    pub fn insert(&mut self, label: impl Into<String>, temperature: f64) -> Result<(), ComfortError> {
        let label = label.into();
        validate(&label, temperature)?;
        if self.get(&label).is_some() {
            return Err(ComfortError::InvalidThreshold {
                label,
                reason: "label appears more than once".to_string(),
            });
        }

        self.thresholds.push(ComfortThreshold { label, temperature });
        Ok(())
    }

    /// Builder-style [`ComfortThresholdSet::insert`].
    pub fn with(mut self, label: impl Into<String>, temperature: f64) -> Result<Self, ComfortError> {
        self.insert(label, temperature)?;
        Ok(self)
    }

    /// Parses `label=temperature` specifications, e.g. `health_risk=30`.
    ///
    /// # Example
    ///
    /// ```
    /// use heatwave_comfort::comfort::thresholds::ComfortThresholdSet;
    ///
    /// let set = ComfortThresholdSet::parse_specs(["comfort_limit=26", "health_risk=30.5"]).unwrap();
    /// assert_eq!(set.get("health_risk"), Some(30.5));
    ///
    /// assert!(ComfortThresholdSet::parse_specs(["health_risk=warm"]).is_err());
    /// ```
    pub fn parse_specs<I, S>(specs: I) -> Result<Self, ComfortError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::empty();
        for spec in specs {
            let ComfortThreshold { label, temperature } = spec.as_ref().parse()?;
            set.insert(label, temperature)?;
        }
        Ok(set)
    }

    /// Temperature configured for `label`.
    pub fn get(&self, label: &str) -> Option<f64> {
        self.thresholds
            .iter()
            .find(|t| t.label == label)
            .map(|t| t.temperature)
    }

    /// Iterates thresholds in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &ComfortThreshold> {
        self.thresholds.iter()
    }

    /// Number of thresholds.
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    /// True if no thresholds are configured.
    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// Re-checks every entry; used before analysis since fields are public.
    pub fn validate(&self) -> Result<(), ComfortError> {
        for t in &self.thresholds {
            validate(&t.label, t.temperature)?;
        }
        Ok(())
    }
}

fn validate(label: &str, temperature: f64) -> Result<(), ComfortError> {
    if label.trim().is_empty() {
        return Err(ComfortError::InvalidThreshold {
            label: label.to_string(),
            reason: "label is empty".to_string(),
        });
    }
    if !temperature.is_finite() {
        return Err(ComfortError::InvalidThreshold {
            label: label.to_string(),
            reason: format!("temperature {} is not a finite number", temperature),
        });
    }
    Ok(())
}

impl FromStr for ComfortThreshold {
    type Err = ComfortError;

    fn from_str(spec: &str) -> Result<Self, Self::Err> {
        let (label, raw) = spec
            .split_once('=')
            .ok_or_else(|| ComfortError::InvalidThreshold {
                label: spec.to_string(),
                reason: "expected label=temperature".to_string(),
            })?;
        let label = label.trim();
        let temperature = raw
            .trim()
            .parse::<f64>()
            .map_err(|_| ComfortError::InvalidThreshold {
                label: label.to_string(),
                reason: format!("'{}' is not a number", raw.trim()),
            })?;
        validate(label, temperature)?;

        Ok(ComfortThreshold {
            label: label.to_string(),
            temperature,
        })
    }
}

impl TryFrom<Vec<ComfortThreshold>> for ComfortThresholdSet {
    type Error = ComfortError;

    fn try_from(thresholds: Vec<ComfortThreshold>) -> Result<Self, Self::Error> {
        let mut set = Self::empty();
        for t in thresholds {
            set.insert(t.label, t.temperature)?;
        }
        Ok(set)
    }
}

impl From<ComfortThresholdSet> for Vec<ComfortThreshold> {
    fn from(set: ComfortThresholdSet) -> Self {
        set.thresholds
    }
}
