//! Thermal comfort impact reports.
//!
//! A [`ComfortReport`] bundles the event-window summary and the breach
//! analysis of one baseline/modified comparison and renders it as plain text,
//! Markdown, CSV or JSON.

use crate::comfort::breach::{BreachAnalysis, BreachResult};
use crate::comfort::summary::{EventSummary, TemperatureStats};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::Path;

const RULE_WIDTH: usize = 80;
/// First-breach times are reported to the hour.
const BREACH_TIME_FORMAT: &str = "%Y-%m-%d %H:00";

/// Report for one comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComfortReport {
    /// Name of the event, e.g. `Heatwave` or `Power outage`
    pub event_name: String,
    /// When the analysis was run
    pub generated_at: NaiveDateTime,
    /// Event-window temperature statistics
    pub summary: EventSummary,
    /// Breach results per threshold
    pub analysis: BreachAnalysis,
}

impl ComfortReport {
    pub fn new(
        event_name: impl Into<String>,
        generated_at: NaiveDateTime,
        summary: EventSummary,
        analysis: BreachAnalysis,
    ) -> Self {
        Self {
            event_name: event_name.into(),
            generated_at,
            summary,
            analysis,
        }
    }

    /// Number of buildings compared.
    pub fn building_count(&self) -> usize {
        self.summary.building_count
    }

    /// Length of the event window in hours.
    pub fn event_hours(&self) -> usize {
        self.summary.event_hours
    }

    /// Generates the plain-text report.
    pub fn to_text(&self) -> String {
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);
        let mut lines: Vec<String> = Vec::new();

        lines.push(heavy.clone());
        lines.push(format!(
            "Thermal Comfort Impact Assessment Report - {}",
            self.event_name
        ));
        lines.push(heavy.clone());
        lines.push(String::new());
        lines.push(format!(
            "Analysis time: {}",
            self.generated_at.format("%Y-%m-%d %H:%M:%S")
        ));
        lines.push(format!("Number of buildings: {}", self.building_count()));
        lines.push(format!("Event period: {} hours", self.event_hours()));
        lines.push(String::new());

        lines.push(light.clone());
        lines.push("1. Temperature Statistics".to_string());
        lines.push(light.clone());
        push_stats(&mut lines, "Baseline", &self.summary.baseline);
        lines.push(String::new());
        push_stats(&mut lines, "Modified", &self.summary.modified);
        lines.push(String::new());
        lines.push("  Changes:".to_string());
        lines.push(format!(
            "    Average increase: {:.2}°C",
            self.summary.change.average
        ));
        lines.push(format!("    Peak increase: {:.2}°C", self.summary.change.peak));
        lines.push(String::new());

        lines.push(light.clone());
        lines.push("2. Threshold Breach Analysis".to_string());
        lines.push(light);
        for result in &self.analysis.results {
            push_breach(&mut lines, result);
            lines.push(String::new());
        }

        lines.push(heavy.clone());
        lines.push("End of Report".to_string());
        lines.push(heavy);

        lines.join("\n")
    }

    /// Generates a Markdown report.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "# Thermal Comfort Impact Assessment: {}\n\n",
            self.event_name
        ));
        output.push_str(&format!(
            "Generated {}. {} buildings, {} event hours.\n\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S"),
            self.building_count(),
            self.event_hours()
        ));

        output.push_str("## Temperature Statistics\n\n");
        output.push_str("| Scenario | Mean (°C) | Min (°C) | Max (°C) | Std Dev (°C) |\n");
        output.push_str("|----------|-----------|----------|----------|--------------|\n");
        for (name, stats) in [
            ("Baseline", &self.summary.baseline),
            ("Modified", &self.summary.modified),
        ] {
            output.push_str(&format!(
                "| {} | {:.2} | {:.2} | {:.2} | {:.2} |\n",
                name, stats.mean, stats.min, stats.max, stats.std
            ));
        }
        output.push('\n');
        output.push_str(&format!(
            "Average increase: {:.2}°C, peak increase: {:.2}°C\n\n",
            self.summary.change.average, self.summary.change.peak
        ));

        output.push_str("## Threshold Breaches\n\n");
        output.push_str(
            "| Threshold | Temp (°C) | Baseline (%) | Modified (%) | Increase (pp) | First Breach | Hours After Start |\n",
        );
        output.push_str(
            "|-----------|-----------|--------------|--------------|---------------|--------------|-------------------|\n",
        );
        for r in &self.analysis.results {
            let (time, offset) = breach_cells(r);
            output.push_str(&format!(
                "| {} | {:.1} | {:.2} | {:.2} | {:.2} | {} | {} |\n",
                r.label,
                r.threshold_temp,
                r.baseline_breach_ratio,
                r.modified_breach_ratio,
                r.increase,
                if time.is_empty() { "-" } else { time.as_str() },
                if offset.is_empty() { "-" } else { offset.as_str() },
            ));
        }

        output
    }

    /// Generates a CSV report with one row per threshold.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();

        csv.push_str("Threshold,Threshold Temp,Baseline Breach %,Modified Breach %,Increase,First Breach Time,Hours After Event Start\n");
        for r in &self.analysis.results {
            let (time, offset) = breach_cells(r);
            csv.push_str(&format!(
                "{},{:.1},{:.2},{:.2},{:.2},{},{}\n",
                r.label,
                r.threshold_temp,
                r.baseline_breach_ratio,
                r.modified_breach_ratio,
                r.increase,
                time,
                offset
            ));
        }

        csv
    }

    /// Serializes the full report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Saves the report to a file based on the extension.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|e| e.to_str()) {
            Some("txt") => self.to_text(),
            Some("md") => self.to_markdown(),
            Some("csv") => self.to_csv(),
            Some("json") => self.to_json().map_err(std::io::Error::other)?,
            _ => {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "Unsupported file extension. Use .txt, .md, .csv or .json",
                ))
            }
        };

        std::fs::write(path, content)
    }
}

fn push_stats(lines: &mut Vec<String>, name: &str, stats: &TemperatureStats) {
    lines.push(format!("  {}:", name));
    lines.push(format!("    Average: {:.2}°C", stats.mean));
    lines.push(format!(
        "    Range: {:.2}°C - {:.2}°C",
        stats.min, stats.max
    ));
    lines.push(format!("    Std Dev: {:.2}°C", stats.std));
}

fn push_breach(lines: &mut Vec<String>, result: &BreachResult) {
    lines.push(format!(
        "  {} ({}°C):",
        result.label, result.threshold_temp
    ));
    lines.push(format!(
        "    Baseline breach: {:.2}%",
        result.baseline_breach_ratio
    ));
    lines.push(format!(
        "    Modified breach: {:.2}%",
        result.modified_breach_ratio
    ));
    lines.push(format!(
        "    Increase: {:.2} percentage points",
        result.increase
    ));
    if let Some(breach) = &result.first_breach {
        lines.push(format!(
            "    First breach: {}",
            breach.time.format(BREACH_TIME_FORMAT)
        ));
        lines.push(format!(
            "    Time after event start: {} hours",
            breach.hours_after_event_start
        ));
    }
}

/// First-breach time and offset as cell text; empty when there was none.
fn breach_cells(result: &BreachResult) -> (String, String) {
    match &result.first_breach {
        Some(b) => (
            b.time.format(BREACH_TIME_FORMAT).to_string(),
            b.hours_after_event_start.to_string(),
        ),
        None => (String::new(), String::new()),
    }
}
