//! Classification Regression Tests
//!
//! Drives full classification passes through `AnalysisSession` on small
//! hand-built farms and pins the reason codes the rule order produces.
//! Every test builds its own dataset so the cases stay independent.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use turbine_insight::types::{MetmastLocation, TurbineLocation};
use turbine_insight::{
    AnalysisSession, FarmConfig, Layout, OperationalState, ReasonCode, ScadaDataset,
    TurbineReading,
};

// ============================================================================
// Fixtures
// ============================================================================

fn at(step: i64) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        + Duration::minutes(10 * step)
}

fn row(station: &str, step: i64, power: f64, wind: f64) -> TurbineReading {
    let mut r = TurbineReading::new(station, at(step));
    r.active_power_mean = Some(power);
    r.wind_speed_mean = Some(wind);
    r.effective_alarm_seconds = Some(0.0);
    r.internal_curtailment_seconds = Some(0.0);
    r.external_curtailment_seconds = Some(0.0);
    r
}

/// Two turbines 300 m apart: each is the other's only reference.
fn pair_layout() -> Layout {
    Layout::new(
        vec![
            TurbineLocation { station_id: "WTG_01".into(), x: 0.0, y: 0.0 },
            TurbineLocation { station_id: "WTG_02".into(), x: 300.0, y: 0.0 },
        ],
        vec![],
    )
}

fn session(rows: Vec<TurbineReading>) -> AnalysisSession {
    AnalysisSession::new(
        ScadaDataset::from_readings(rows, 10),
        Some(pair_layout()),
        FarmConfig::default(),
    )
}

fn reasons(session: &AnalysisSession, station: &str) -> Vec<ReasonCode> {
    session
        .classify_station(station)
        .iter()
        .map(|c| c.reason_code)
        .collect()
}

// ============================================================================
// Worked Cases
// ============================================================================

#[test]
fn low_turbine_wind_confirmed_by_low_reference() {
    let s = session(vec![row("WTG_01", 0, 0.5, 1.0), row("WTG_02", 0, 0.0, 1.2)]);
    let out = s.classify_station("WTG_01");
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].reason_code, ReasonCode::ConfirmedLowWind);
    assert_eq!(out[0].state, OperationalState::NotProducingExplained);
    assert_eq!(out[0].reference_wind_speed, Some(1.2));
    assert!(out[0].reason_text.contains("Sensor consistent"));
}

#[test]
fn low_turbine_wind_with_windy_reference_is_sensor_error() {
    let s = session(vec![row("WTG_01", 0, 0.5, 1.0), row("WTG_02", 0, 1500.0, 6.0)]);
    let out = s.classify_station("WTG_01");
    assert_eq!(out[0].reason_code, ReasonCode::SensorErrorLow);
    assert_eq!(out[0].state, OperationalState::NotProducingUnexpected);
    assert!(out[0].reason_text.starts_with("Sensor error (low)"));
}

#[test]
fn row_without_power_is_data_missing_and_excluded_from_availability() {
    let mut missing = row("WTG_01", 1, 0.0, 8.0);
    missing.active_power_mean = None;
    let s = session(vec![
        row("WTG_01", 0, 1200.0, 8.0),
        missing,
        row("WTG_02", 0, 1200.0, 8.0),
        row("WTG_02", 1, 1150.0, 8.0),
    ]);

    let out = s.classify_station("WTG_01");
    assert_eq!(out[1].reason_code, ReasonCode::DataMissingNoAlarm);
    assert_eq!(out[1].state, OperationalState::DataMissing);
    assert!(out[1].reason_text.starts_with("Missing:"));

    let availability = s.availability();
    assert_eq!(availability.total_rows, 4);
    assert_eq!(availability.data_missing_rows, 1);
    assert_eq!(availability.classified_rows, 3);
    assert!((availability.availability_pct - 100.0).abs() < 1e-9);
}

#[test]
fn missing_power_with_alarm_keeps_alarm_context() {
    let mut r = row("WTG_01", 0, 0.0, 8.0);
    r.active_power_mean = None;
    r.effective_alarm_seconds = Some(600.0);
    let s = session(vec![r, row("WTG_02", 0, 1200.0, 8.0)]);
    assert_eq!(reasons(&s, "WTG_01"), vec![ReasonCode::DataMissingWithAlarm]);
}

#[test]
fn alarm_outranks_curtailment_and_low_wind() {
    let mut r = row("WTG_01", 0, 0.0, 1.0);
    r.effective_alarm_seconds = Some(420.0);
    r.external_curtailment_seconds = Some(600.0);
    r.alarm_text = Some("Pitch system fault|Converter trip".into());
    let s = session(vec![r, row("WTG_02", 0, 0.0, 1.1)]);

    let out = s.classify_station("WTG_01");
    assert_eq!(out[0].reason_code, ReasonCode::AlarmActive);
    assert!(out[0].reason_text.contains("Pitch system fault | Converter trip"));
}

#[test]
fn oem_curtailment_code_is_explained() {
    let mut r = row("WTG_01", 0, 0.0, 9.0);
    r.internal_curtailment_seconds = Some(600.0);
    let s = session(vec![r, row("WTG_02", 0, 1800.0, 9.0)]);
    let out = s.classify_station("WTG_01");
    assert_eq!(out[0].reason_code, ReasonCode::CurtailmentActive);
    assert_eq!(out[0].state, OperationalState::NotProducingExplained);
}

#[test]
fn standing_still_in_good_wind_is_mechanical() {
    let s = session(vec![row("WTG_01", 0, 0.0, 8.0), row("WTG_02", 0, 1400.0, 8.3)]);
    assert_eq!(reasons(&s, "WTG_01"), vec![ReasonCode::MechanicalOrControlIssue]);
}

#[test]
fn restart_after_alarm_is_startup_sequence() {
    let mut alarm = row("WTG_01", 0, 0.0, 8.0);
    alarm.effective_alarm_seconds = Some(600.0);
    let s = session(vec![
        alarm,
        row("WTG_01", 1, 0.0, 8.0),
        row("WTG_02", 0, 1400.0, 8.0),
        row("WTG_02", 1, 1400.0, 8.0),
    ]);

    let out = s.classify_station("WTG_01");
    assert_eq!(out[0].reason_code, ReasonCode::AlarmActive);
    assert_eq!(out[1].reason_code, ReasonCode::StartupPostAlarm);
    assert_eq!(out[1].reason_text, "Startup: 10 min after alarm");
}

#[test]
fn restart_after_low_wind_is_startup_sequence() {
    let s = session(vec![
        row("WTG_01", 0, 0.0, 1.5),
        row("WTG_01", 1, 0.0, 4.5),
        row("WTG_02", 0, 0.0, 1.4),
        row("WTG_02", 1, 50.0, 4.4),
    ]);
    assert_eq!(
        reasons(&s, "WTG_01"),
        vec![ReasonCode::ConfirmedLowWind, ReasonCode::StartupPostLowWind]
    );
}

#[test]
fn metmast_reference_from_the_same_row() {
    let layout = Layout::new(
        vec![TurbineLocation { station_id: "WTG_01".into(), x: 0.0, y: 0.0 }],
        vec![MetmastLocation { metmast_id: "38".into(), x: 250.0, y: 100.0 }],
    );
    let mut r = row("WTG_01", 0, 0.0, 0.8);
    r.metmast_wind_speed.insert("38".into(), 1.0);
    let s = AnalysisSession::new(
        ScadaDataset::from_readings(vec![r], 10),
        Some(layout),
        FarmConfig::default(),
    );

    let out = s.classify_station("WTG_01");
    assert_eq!(out[0].reason_code, ReasonCode::ConfirmedLowWind);
    assert_eq!(out[0].reference_count, 1);
}

// ============================================================================
// Pass-wide Properties
// ============================================================================

#[test]
fn every_row_gets_exactly_one_consistent_classification() {
    let mut rows = Vec::new();
    for step in 0..12 {
        let wind = 2.0 + step as f64;
        let mut a = row("WTG_01", step, if step % 3 == 0 { 0.0 } else { 200.0 * wind }, wind);
        if step == 4 {
            a.effective_alarm_seconds = Some(300.0);
            a.active_power_mean = Some(0.0);
        }
        if step == 7 {
            a.wind_speed_mean = None;
        }
        rows.push(a);
        rows.push(row("WTG_02", step, 150.0 * wind, wind + 0.3));
    }
    let s = session(rows);

    let all = s.classify();
    assert_eq!(all.len(), 24);
    for c in &all {
        assert_eq!(c.reason_code.state(), c.state, "{} at {}", c.station_id(), c.timestamp());
        assert!(!c.reason_text.is_empty());
        if c.reading.active_power_mean.is_some_and(|p| p > 1.0) {
            assert_eq!(c.state, OperationalState::Producing);
        }
    }

    // Deterministic: a second pass gives identical output
    assert_eq!(s.classify(), all);
}

#[test]
fn unknown_station_classifies_to_nothing() {
    let s = session(vec![row("WTG_01", 0, 0.0, 1.0)]);
    assert!(s.classify_station("WTG_99").is_empty());
}
