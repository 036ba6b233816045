//! CSV Ingest Integration Tests
//!
//! Writes small SCADA and layout exports to a temp directory, loads them
//! through `AnalysisSession::load` and checks schema errors, missing-value
//! handling, metmast columns and the no-layout fallback.

use std::fs;
use std::path::{Path, PathBuf};

use turbine_insight::acquisition::{read_layout_csv, read_scada_csv};
use turbine_insight::types::columns;
use turbine_insight::{AnalysisSession, DatasetError, FarmConfig, LayoutError, ReasonCode};

fn header() -> String {
    let mut cols: Vec<String> = columns::REQUIRED_COLUMNS.iter().map(|c| (*c).to_string()).collect();
    cols.push(format!("{}38", columns::METMAST_WIND_SPEED_PREFIX));
    cols.push(format!("{}38", columns::METMAST_WIND_DIRECTION_PREFIX));
    cols.join(",")
}

/// One SCADA line in `REQUIRED_COLUMNS` order plus the metmast pair.
fn line(station: &str, ts: &str, alarm: &str, text: &str, power: &str, wind: &str, met: &str) -> String {
    format!("{station},{ts},{alarm},{text},0,125000,{power},{power},{power},{wind},250,0,{met},248")
}

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn scada_fixture() -> String {
    [
        header(),
        line("WTG_01", "2024-03-01 00:00:00", "0", "", "0.5", "1.0", "1.1"),
        line("WTG_02", "2024-03-01 00:00:00", "0", "", "0.0", "1.2", "1.1"),
        line("WTG_01", "2024-03-01 00:10:00", "600", "Pitch system fault|Yaw motor overload", "0.0", "7.5", "7.9"),
        line("WTG_02", "2024-03-01 00:10:00", "0", "", "1450.0", "7.8", "7.9"),
        line("WTG_01", "2024-03-01 00:20:00", "0", "", "", "8.1", "8.0"),
        line("WTG_02", "2024-03-01 00:20:00", "0", "", "1500.0", "8.2", "8.0"),
    ]
    .join("\n")
}

const LAYOUT: &str = "StationId,X-Coordinate,Y-Coordinate,Type
WTG_01,0,0,turbine
WTG_02,350,0,turbine
38,150,200,metmast
";

#[test]
fn loads_and_classifies_a_small_farm() {
    let dir = tempfile::tempdir().unwrap();
    let data = write(dir.path(), "scada.csv", &scada_fixture());
    let layout = write(dir.path(), "layout.csv", LAYOUT);

    let session = AnalysisSession::load(&data, Some(&layout), FarmConfig::default()).unwrap();
    assert_eq!(session.dataset().len(), 6);
    assert_eq!(session.dataset().metmast_ids(), ["38".to_string()]);
    assert_eq!(session.adjacency()["WTG_01"].len(), 2);

    let out = session.classify_station("WTG_01");
    let codes: Vec<ReasonCode> = out.iter().map(|c| c.reason_code).collect();
    assert_eq!(
        codes,
        vec![
            ReasonCode::ConfirmedLowWind,
            ReasonCode::AlarmActive,
            ReasonCode::DataMissingNoAlarm,
        ]
    );
    assert_eq!(out[0].reference_count, 2);
    assert!(out[1].reason_text.contains("Pitch system fault | Yaw motor overload"));
}

#[test]
fn missing_required_column_is_a_schema_error() {
    let csv = "StationId,TimeStamp,wtc_ActPower_mean\nWTG_01,2024-03-01 00:00:00,10.0\n";
    match read_scada_csv(csv.as_bytes()) {
        Err(DatasetError::MissingColumns(missing)) => {
            assert!(missing.contains(&columns::WIND_SPEED_MEAN.to_string()));
            assert!(!missing.contains(&columns::ACTIVE_POWER_MEAN.to_string()));
        }
        other => panic!("expected MissingColumns, got {other:?}"),
    }
}

#[test]
fn non_numeric_cell_is_a_type_error() {
    let csv = [header(), line("WTG_01", "2024-03-01 00:00:00", "0", "", "lots", "5.0", "5.0")].join("\n");
    match read_scada_csv(csv.as_bytes()) {
        Err(DatasetError::WrongType { column, value, .. }) => {
            assert_eq!(column, columns::ACTIVE_POWER_MEAN);
            assert_eq!(value, "lots");
        }
        other => panic!("expected WrongType, got {other:?}"),
    }
}

#[test]
fn missing_value_tokens_become_none() {
    let csv = [header(), line("WTG_01", "2024-03-01 00:00:00", "NaN", "N/A", "12.5", "null", "")].join("\n");
    let table = read_scada_csv(csv.as_bytes()).unwrap();
    let reading = &table.readings[0];
    assert_eq!(reading.active_power_mean, Some(12.5));
    assert!(reading.effective_alarm_seconds.is_none());
    assert!(reading.wind_speed_mean.is_none());
    assert!(reading.alarm_text.is_none());
    assert!(!reading.metmast_wind_speed.contains_key("38"));
}

#[test]
fn header_only_file_is_empty() {
    assert!(matches!(read_scada_csv(header().as_bytes()), Err(DatasetError::Empty)));
}

#[test]
fn missing_data_file_reports_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = AnalysisSession::load(&dir.path().join("absent.csv"), None, FarmConfig::default());
    assert!(matches!(result, Err(DatasetError::Io(..))));
}

#[test]
fn broken_layout_degrades_to_no_adjacency() {
    let dir = tempfile::tempdir().unwrap();
    let data = write(dir.path(), "scada.csv", &scada_fixture());
    let layout = write(dir.path(), "layout.csv", "Name,East,North\nWTG_01,0,0\n");

    let session = AnalysisSession::load(&data, Some(&layout), FarmConfig::default()).unwrap();
    assert!(session.layout().is_none());
    assert!(session.adjacency().values().all(|entry| entry.is_empty()));

    // Only the unlocated metmast remains as a reference
    let refs = session.reference_set("WTG_01");
    assert_eq!(refs.len(), 1);
}

#[test]
fn layout_rejects_unknown_station_type() {
    let csv = "StationId,X-Coordinate,Y-Coordinate,Type\nWTG_01,0,0,substation\n";
    assert!(matches!(read_layout_csv(csv.as_bytes()), Err(LayoutError::InvalidType { .. })));
}

#[test]
fn layout_without_type_column_is_all_turbines() {
    let csv = "StationId,X-Coordinate,Y-Coordinate\nWTG_01,0,0\nWTG_02,400,0\nWTG_03,,\n";
    let layout = read_layout_csv(csv.as_bytes()).unwrap();
    assert_eq!(layout.turbines.len(), 2);
    assert!(layout.metmasts.is_empty());
}
