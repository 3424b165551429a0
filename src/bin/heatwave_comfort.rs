use anyhow::Context;
use clap::{Parser, Subcommand};
use heatwave_comfort::comfort::chart::ChartData;
use heatwave_comfort::comfort::summary::summarize_event_window;
use heatwave_comfort::results::{
    build_hourly_matrix, compare_annual_averages, write_comparison_csv, write_matrix_csv,
};
use heatwave_comfort::weather::heatwave::ConsecutiveWindow;
use heatwave_comfort::weather::WeatherRecordSource;
use heatwave_comfort::{
    analyze_breaches, hottest_period, AnalysisConfig, ComfortReport, ComfortThresholdSet,
    EpwWeatherFile, TemperatureMatrix,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "heatwave-comfort")]
#[command(about = "Heatwave detection and thermal comfort breach analysis", long_about = None)]
struct Cli {
    /// JSON configuration file (defaults come from HEATWAVE_PROJECT_ROOT)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Finds the hottest run of consecutive days in an EPW weather file
    HottestDays {
        /// EPW weather file
        #[arg(long)]
        epw: Option<PathBuf>,

        /// Number of consecutive days
        #[arg(short, long)]
        days: Option<usize>,

        /// Output format (text or json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Compares baseline and modified hourly temperatures against comfort thresholds
    Comfort {
        /// Baseline hourly temperature CSV
        #[arg(long)]
        baseline: Option<PathBuf>,

        /// Modified hourly temperature CSV
        #[arg(long)]
        modified: Option<PathBuf>,

        /// First hour of the event window (1-based)
        #[arg(long, conflicts_with = "epw")]
        start_hour: Option<usize>,

        /// Derive the event start from the hottest period of this EPW file
        #[arg(long)]
        epw: Option<PathBuf>,

        /// Heatwave length when deriving the event start
        #[arg(short, long)]
        days: Option<usize>,

        /// Threshold as label=temperature; repeatable, replaces the defaults
        #[arg(short, long)]
        threshold: Vec<String>,

        /// Event name used in the report title
        #[arg(long, default_value = "Heatwave")]
        event_name: String,

        /// Output format (text, markdown, csv or json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Output file path
        #[arg(short, long)]
        output_file: Option<PathBuf>,

        /// Write chart series as JSON to this path
        #[arg(long)]
        chart_data: Option<PathBuf>,
    },

    /// Builds an hourly temperature CSV from per-building simulation output
    HourlyMatrix {
        /// Directory with one sub-directory per building
        #[arg(long)]
        results_dir: PathBuf,

        /// Output CSV path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Compares annual average temperatures between two result sets
    Compare {
        #[arg(long)]
        baseline_dir: Option<PathBuf>,

        #[arg(long)]
        modified_dir: Option<PathBuf>,

        /// Output CSV path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("heatwave_comfort=info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AnalysisConfig> {
    match path {
        Some(path) => AnalysisConfig::from_json_file(path),
        None => Ok(AnalysisConfig::from_env()),
    }
}

fn detect_heatwave(epw: &Path, days: usize) -> anyhow::Result<(EpwWeatherFile, ConsecutiveWindow)> {
    let weather = EpwWeatherFile::from_file(epw)?;
    let window = hottest_period(&weather, days)
        .with_context(|| format!("detecting heatwave in {}", epw.display()))?;
    Ok((weather, window))
}

fn window_text(weather: &EpwWeatherFile, window: &ConsecutiveWindow) -> String {
    let mut out = String::new();
    if let Some(location) = weather.location() {
        out.push_str(&format!("Location: {}\n", location));
    }
    out.push_str(&format!(
        "Hottest {} consecutive days (mean {:.2}°C):\n",
        window.consecutive_days, window.window_mean_temp
    ));
    for day in &window.days {
        out.push_str(&format!(
            "  {}. {}  avg {:.2}°C  max {:.2}°C\n",
            day.rank, day.date, day.average_temperature, day.maximum_temperature
        ));
    }
    out.push_str(&format!(
        "Event start: {} (hour {})",
        window.earliest_hot_day,
        window.event_start_hour()
    ));
    out
}

fn emit(output: &str, output_file: Option<&Path>) -> anyhow::Result<()> {
    match output_file {
        Some(path) => {
            std::fs::write(path, output)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Report saved to {:?}", path);
        }
        None => println!("{}", output),
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::HottestDays { epw, days, format } => {
            let epw = epw.unwrap_or_else(|| config.weather_file.clone());
            let (weather, window) = detect_heatwave(&epw, days.unwrap_or(config.heatwave_days))?;

            let output = match format.as_str() {
                "text" => window_text(&weather, &window),
                "json" => serde_json::to_string_pretty(&window)?,
                _ => anyhow::bail!("Unsupported format: {}", format),
            };
            println!("{}", output);
        }
        Commands::Comfort {
            baseline,
            modified,
            start_hour,
            epw,
            days,
            threshold,
            event_name,
            format,
            output_file,
            chart_data,
        } => {
            let time_column = config.results.time_column_name.as_str();
            let baseline_path = baseline.unwrap_or_else(|| config.hourly_baseline_csv.clone());
            let modified_path = modified.unwrap_or_else(|| config.hourly_modified_csv.clone());
            let baseline = TemperatureMatrix::from_csv_path(&baseline_path, time_column)?
                .with_base_year(config.base_year)?;
            let modified = TemperatureMatrix::from_csv_path(&modified_path, time_column)?
                .with_base_year(config.base_year)?;

            let event_start_hour = match start_hour {
                Some(hour) => hour,
                None => {
                    let epw = epw.unwrap_or_else(|| config.weather_file.clone());
                    let (_, window) = detect_heatwave(&epw, days.unwrap_or(config.heatwave_days))?;
                    window.event_start_hour()
                }
            };

            let thresholds = if threshold.is_empty() {
                config.thresholds.clone()
            } else {
                ComfortThresholdSet::parse_specs(&threshold)?
            };

            let summary = summarize_event_window(&baseline, &modified, event_start_hour)?;
            let analysis = analyze_breaches(&baseline, &modified, &thresholds, event_start_hour)?;
            let report = ComfortReport::new(
                event_name.as_str(),
                chrono::Local::now().naive_local(),
                summary,
                analysis,
            );

            if let Some(path) = chart_data {
                let chart = ChartData::build(
                    &baseline,
                    &modified,
                    event_start_hour,
                    &event_name,
                    &config.comfort_ranges,
                    &config.building_types,
                )?;
                chart
                    .save_json(&path)
                    .with_context(|| format!("writing chart data {}", path.display()))?;
            }

            let output = match format.as_str() {
                "text" => report.to_text(),
                "markdown" => report.to_markdown(),
                "csv" => report.to_csv(),
                "json" => report.to_json()?,
                _ => anyhow::bail!("Unsupported format: {}", format),
            };
            emit(&output, output_file.as_deref())?;
        }
        Commands::HourlyMatrix {
            results_dir,
            output,
        } => {
            let matrix = build_hourly_matrix(&results_dir, &config.results)?;
            write_matrix_csv(&matrix, &output, &config.results.time_column_name)?;
            println!(
                "Wrote {} hours x {} buildings to {:?}",
                matrix.row_count(),
                matrix.building_count(),
                output
            );
        }
        Commands::Compare {
            baseline_dir,
            modified_dir,
            output,
        } => {
            let baseline_dir = baseline_dir.unwrap_or_else(|| config.results_baseline_dir.clone());
            let modified_dir = modified_dir.unwrap_or_else(|| config.results_modified_dir.clone());
            let output = output.unwrap_or_else(|| config.temperature_comparison_csv.clone());

            let comparison = compare_annual_averages(&baseline_dir, &modified_dir, &config.results)?;
            write_comparison_csv(&comparison, &output)?;

            println!(
                "Compared {} buildings ({} valid) -> {:?}",
                comparison.buildings.len(),
                comparison.valid_comparisons,
                output
            );
            if let Some(stats) = comparison.statistics {
                println!(
                    "  Increase: mean {:.2}°C, median {:.2}°C, std {:.2}°C, range {:.2}°C - {:.2}°C",
                    stats.mean, stats.median, stats.std, stats.min, stats.max
                );
            }
        }
    }

    Ok(())
}
