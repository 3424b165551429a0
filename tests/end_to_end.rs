//! Weather file to comfort report, going through per-building simulation
//! output and hourly matrix CSVs on disk.

use heatwave_comfort::comfort::chart::ChartData;
use heatwave_comfort::comfort::summary::summarize_event_window;
use heatwave_comfort::config::{AnalysisConfig, ResultsOptions};
use heatwave_comfort::results::{build_hourly_matrix, write_matrix_csv};
use heatwave_comfort::{
    analyze_breaches, hottest_period, ComfortReport, EpwWeatherFile, TemperatureMatrix,
};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const DAYS: usize = 10;
const HOURS: usize = DAYS * 24;

fn write_epw(path: &Path) {
    let mut content = String::from("LOCATION,Testville,TS,USA,TMY3,999999,40.0,-105.0,-7.0,1600.0\n");
    for _ in 1..8 {
        content.push_str("HEADER,0\n");
    }
    for day in 1..=DAYS {
        let temp = if (4..=6).contains(&day) { 36.0 } else { 18.0 };
        for hour in 1..=24 {
            content.push_str(&format!("2020,1,{},{},60,?9?9,{:.1},5.0\n", day, hour, temp));
        }
    }
    fs::write(path, content).unwrap();
}

/// One building's simulation output with two zones reading the same value.
fn write_building(results_dir: &Path, building: &str, temp_at: impl Fn(usize) -> f64) {
    let dir = results_dir.join(building);
    fs::create_dir_all(&dir).unwrap();
    let mut content = String::from(
        "Date/Time,LIVING:Zone Mean Air Temperature [C](Hourly),BED:Zone Mean Air Temperature [C](Hourly)\n",
    );
    for hour in 1..=HOURS {
        let t = temp_at(hour);
        content.push_str(&format!("01/01 {:02}:00:00,{},{}\n", hour % 24, t, t));
    }
    fs::write(dir.join("eplusout.csv"), content).unwrap();
}

#[test]
fn test_heatwave_to_report() {
    let root = TempDir::new().unwrap();
    let config = AnalysisConfig::with_root(root.path());

    fs::create_dir_all(config.weather_file.parent().unwrap()).unwrap();
    write_epw(&config.weather_file);

    for building in ["city_0_1", "city_0_2", "city_4_3"] {
        write_building(&config.results_baseline_dir, building, |_| 22.0);
    }
    write_building(&config.results_modified_dir, "city_0_1", |h| if h >= 73 { 30.0 } else { 22.0 });
    write_building(&config.results_modified_dir, "city_0_2", |h| if h >= 81 { 27.0 } else { 22.0 });
    write_building(&config.results_modified_dir, "city_4_3", |_| 22.0);

    let options = ResultsOptions::default();
    let baseline = build_hourly_matrix(&config.results_baseline_dir, &options).unwrap();
    let modified = build_hourly_matrix(&config.results_modified_dir, &options).unwrap();
    write_matrix_csv(&baseline, &config.hourly_baseline_csv, "Hour").unwrap();
    write_matrix_csv(&modified, &config.hourly_modified_csv, "Hour").unwrap();

    let weather = EpwWeatherFile::from_file(&config.weather_file).unwrap();
    let window = hottest_period(&weather, config.heatwave_days).unwrap();
    let start = window.event_start_hour();
    assert_eq!(start, 73);

    let baseline = TemperatureMatrix::from_csv_path(&config.hourly_baseline_csv, "Hour")
        .unwrap()
        .with_base_year(config.base_year)
        .unwrap();
    let modified = TemperatureMatrix::from_csv_path(&config.hourly_modified_csv, "Hour")
        .unwrap()
        .with_base_year(config.base_year)
        .unwrap();
    assert_eq!(baseline.row_count(), HOURS);
    assert_eq!(modified.building_count(), 3);

    let analysis = analyze_breaches(&baseline, &modified, &config.thresholds, start).unwrap();
    assert_eq!(analysis.event_hours, HOURS - 72);

    let comfort = analysis.get("comfort_limit").unwrap();
    assert_eq!(comfort.baseline_breach_ratio, 0.0);
    let expected = (100.0 + 160.0 / 168.0 * 100.0 + 0.0) / 3.0;
    assert!((comfort.modified_breach_ratio - expected).abs() < 1e-9);
    assert_eq!(comfort.hours_after_event_start(), Some(8));
    assert_eq!(
        comfort.first_breach_time().unwrap().to_string(),
        "2020-01-04 08:00:00"
    );

    // 30°C is not above the 30°C health-risk threshold
    let health = analysis.get("health_risk").unwrap();
    assert_eq!(health.modified_breach_ratio, 0.0);
    assert!(health.first_breach.is_none());

    let summary = summarize_event_window(&baseline, &modified, start).unwrap();
    assert_eq!(summary.baseline.mean, 22.0);
    assert_eq!(summary.change.peak, (30.0 + 27.0 + 22.0) / 3.0 - 22.0);

    let chart = ChartData::build(
        &baseline,
        &modified,
        start,
        "Heatwave",
        &config.comfort_ranges,
        &config.building_types,
    )
    .unwrap();
    assert_eq!(chart.heatmap.building_labels, vec![
        "Lowrise_Domestic_1".to_string(),
        "Lowrise_Domestic_2".to_string(),
        "Office_3".to_string(),
    ]);
    assert_eq!(chart.heatmap.baseline[0].len(), 7);
    assert_eq!(chart.heatmap.type_separators, vec![1]);

    let generated_at = chrono::NaiveDate::from_ymd_opt(2024, 8, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap();
    let report = ComfortReport::new("Heatwave", generated_at, summary, analysis);
    let report_path = root.path().join("comfort_report.txt");
    report.save_to_file(&report_path).unwrap();

    let text = fs::read_to_string(&report_path).unwrap();
    assert!(text.contains("Number of buildings: 3"));
    assert!(text.contains("Event period: 168 hours"));
    assert!(text.contains("First breach: 2020-01-04 08:00\n"));
    assert!(text.contains("Time after event start: 8 hours"));
}
