//! Sensor Integrity Tests
//!
//! Compares target anemometers against turbine and metmast references
//! through `AnalysisSession::analyze_sensor`, covering severity buckets,
//! insufficient references, time windows and direction checks.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use turbine_insight::types::SampleStatus;
use turbine_insight::{
    AnalysisSession, FarmConfig, ReferenceId, ScadaDataset, Severity, TimeRange, TurbineReading,
};

fn at(step: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 10)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
        + Duration::minutes(10 * step)
}

fn row(station: &str, step: i64, wind: Option<f64>) -> TurbineReading {
    let mut r = TurbineReading::new(station, at(step));
    r.active_power_mean = Some(800.0);
    r.wind_speed_mean = wind;
    r
}

fn session(rows: Vec<TurbineReading>) -> AnalysisSession {
    AnalysisSession::new(ScadaDataset::from_readings(rows, 10), None, FarmConfig::default())
}

fn turbine(id: &str) -> ReferenceId {
    ReferenceId::Turbine(id.to_string())
}

#[test]
fn deviation_of_two_and_a_half_is_low_severity() {
    let s = session(vec![row("T1", 0, Some(8.0)), row("T2", 0, Some(5.5))]);
    let report = s.analyze_sensor("T1", Some(vec![turbine("T2")]), None);

    let sample = &report.samples[0];
    assert_eq!(sample.status, SampleStatus::Evaluated);
    assert!((sample.deviation.unwrap() - 2.5).abs() < 1e-9);
    assert_eq!(sample.severity, Severity::Low);
    assert!(sample.anomaly_flag);
    assert_eq!(report.summary.low_count, 1);
    assert_eq!(report.aggregator, "median");
}

#[test]
fn severity_grows_with_deviation() {
    let rows = vec![
        row("T1", 0, Some(6.0)),
        row("T1", 1, Some(8.0)),
        row("T1", 2, Some(10.0)),
        row("T1", 3, Some(12.0)),
        row("T2", 0, Some(5.0)),
        row("T2", 1, Some(5.0)),
        row("T2", 2, Some(5.0)),
        row("T2", 3, Some(5.0)),
    ];
    let report = session(rows).analyze_sensor("T1", Some(vec![turbine("T2")]), None);

    let severities: Vec<Severity> = report.samples.iter().map(|s| s.severity).collect();
    assert_eq!(
        severities,
        vec![Severity::None, Severity::Low, Severity::Moderate, Severity::High]
    );
    assert!(severities.windows(2).all(|w| w[0] < w[1]));

    let summary = &report.summary;
    assert_eq!(summary.evaluated_count, 4);
    assert_eq!(summary.anomaly_count, 3);
    assert_eq!(summary.count_for(Severity::None), 1);
    assert!((summary.mean_deviation.unwrap() - 4.0).abs() < 1e-9);
    assert!((summary.max_absolute_deviation.unwrap() - 7.0).abs() < 1e-9);
    assert!((summary.anomaly_rate_pct().unwrap() - 75.0).abs() < 1e-9);
}

#[test]
fn reference_without_data_is_insufficient() {
    let s = session(vec![row("T1", 0, Some(7.0)), row("T2", 0, None)]);
    let report = s.analyze_sensor("T1", Some(vec![turbine("T2")]), None);

    let sample = &report.samples[0];
    assert_eq!(sample.status, SampleStatus::InsufficientReference);
    assert!(sample.deviation.is_none());
    assert!(!sample.anomaly_flag);
    assert_eq!(report.summary.insufficient_reference_count, 1);
    assert!(report.summary.anomaly_rate_pct().is_none());
}

#[test]
fn target_without_wind_is_reported_as_missing() {
    let s = session(vec![row("T1", 0, None), row("T2", 0, Some(7.0))]);
    let report = s.analyze_sensor("T1", Some(vec![turbine("T2")]), None);
    assert_eq!(report.samples[0].status, SampleStatus::TargetMissing);
    assert_eq!(report.summary.target_missing_count, 1);
}

#[test]
fn out_of_range_target_reading_is_a_high_anomaly() {
    let s = session(vec![
        row("T1", 0, Some(55.0)),
        row("T1", 1, Some(-3.0)),
        row("T2", 0, Some(8.0)),
        row("T2", 1, Some(8.0)),
    ]);
    let report = s.analyze_sensor("T1", Some(vec![turbine("T2")]), None);

    let deviations: Vec<f64> = report.samples.iter().filter_map(|sample| sample.deviation).collect();
    assert_eq!(deviations, vec![47.0, -11.0]);
    for sample in &report.samples {
        assert_eq!(sample.status, SampleStatus::Evaluated);
        assert_eq!(sample.severity, Severity::High);
        assert!(sample.anomaly_flag);
    }
    assert_eq!(report.samples[0].target_wind_speed, Some(55.0));

    let summary = &report.summary;
    assert_eq!(summary.anomaly_count, 2);
    assert_eq!(summary.high_count, 2);
    assert_eq!(summary.target_missing_count, 0);
}

#[test]
fn metmast_reference_is_read_from_the_target_row() {
    let mut target = row("T1", 0, Some(4.0));
    target.metmast_wind_speed.insert("38".into(), 9.0);
    let s = session(vec![target]);

    let report = s.analyze_sensor("T1", Some(vec![ReferenceId::Metmast("38".into())]), None);
    let sample = &report.samples[0];
    assert_eq!(sample.reference_aggregate_wind_speed, Some(9.0));
    assert_eq!(sample.severity, Severity::Moderate);
}

#[test]
fn time_range_limits_the_samples() {
    let rows: Vec<TurbineReading> = (0..6)
        .flat_map(|step| [row("T1", step, Some(7.0)), row("T2", step, Some(7.2))])
        .collect();
    let s = session(rows);
    let range = TimeRange::new(at(1), at(3));

    let report = s.analyze_sensor("T1", Some(vec![turbine("T2")]), Some(range));
    assert_eq!(report.samples.len(), 3);
    assert!(report.samples.iter().all(|sample| range.contains(sample.timestamp)));
    assert_eq!(report.summary.anomaly_count, 0);
}

#[test]
fn direction_flag_uses_circular_difference() {
    let mut target = row("T1", 0, Some(8.0));
    target.wind_direction_mean = Some(355.0);
    let mut near = row("T2", 0, Some(8.0));
    near.wind_direction_mean = Some(10.0);
    let mut target_off = row("T1", 1, Some(8.0));
    target_off.wind_direction_mean = Some(90.0);
    let mut near_off = row("T2", 1, Some(8.0));
    near_off.wind_direction_mean = Some(10.0);

    let s = session(vec![target, near, target_off, near_off]);
    let report = s.analyze_sensor("T1", Some(vec![turbine("T2")]), None);

    assert!((report.samples[0].direction_deviation.unwrap() + 15.0).abs() < 1e-6);
    assert!(!report.samples[0].direction_flag);
    assert!(report.samples[1].direction_flag);
    assert_eq!(report.summary.direction_flag_count, 1);
}

#[test]
fn report_serializes_to_json() {
    let s = session(vec![row("T1", 0, Some(8.0)), row("T2", 0, Some(5.5))]);
    let report = s.analyze_sensor("T1", Some(vec![turbine("T2")]), None);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["target_id"], "T1");
    assert_eq!(json["samples"][0]["status"], "evaluated");
}
