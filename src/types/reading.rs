//! SCADA rows and their classification

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::columns;
use super::state::{OperationalState, ReasonCode};
use crate::config::defaults::ALARM_TEXT_SEPARATOR;

// ============================================================================
// Turbine Reading
// ============================================================================

/// One 10-minute SCADA row for a single turbine.
///
/// Numeric fields are `None` when the export left the cell empty or NaN.
/// Metmast maps are keyed by metmast id and copied onto every turbine row
/// of the same timestamp by the export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurbineReading {
    pub station_id: String,
    pub timestamp: NaiveDateTime,
    /// Mean active power (kW)
    pub active_power_mean: Option<f64>,
    pub active_power_min: Option<f64>,
    pub active_power_max: Option<f64>,
    /// Nacelle anemometer mean wind speed (m/s)
    pub wind_speed_mean: Option<f64>,
    /// Mean wind direction (degrees)
    pub wind_direction_mean: Option<f64>,
    /// Cumulative exported energy counter (kWh)
    pub exported_energy: Option<f64>,
    pub effective_alarm_seconds: Option<f64>,
    /// Seconds alarm code 2006 (OEM internal curtailment) was active
    pub internal_curtailment_seconds: Option<f64>,
    /// Seconds of grid-operator curtailment
    pub external_curtailment_seconds: Option<f64>,
    /// Pipe-separated alarm descriptions
    pub alarm_text: Option<String>,
    #[serde(default)]
    pub metmast_wind_speed: BTreeMap<String, f64>,
    #[serde(default)]
    pub metmast_wind_direction: BTreeMap<String, f64>,
}

impl TurbineReading {
    /// An empty row for `station_id` at `timestamp`; every value missing.
    pub fn new(station_id: impl Into<String>, timestamp: NaiveDateTime) -> Self {
        Self {
            station_id: station_id.into(),
            timestamp,
            active_power_mean: None,
            active_power_min: None,
            active_power_max: None,
            wind_speed_mean: None,
            wind_direction_mean: None,
            exported_energy: None,
            effective_alarm_seconds: None,
            internal_curtailment_seconds: None,
            external_curtailment_seconds: None,
            alarm_text: None,
            metmast_wind_speed: BTreeMap::new(),
            metmast_wind_direction: BTreeMap::new(),
        }
    }

    /// Columns whose values are required to classify the row but are absent.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.station_id.trim().is_empty() {
            missing.push(columns::STATION_ID);
        }
        if !self.active_power_mean.is_some_and(f64::is_finite) {
            missing.push(columns::ACTIVE_POWER_MEAN);
        }
        missing
    }

    pub fn has_required_values(&self) -> bool {
        self.missing_fields().is_empty()
    }

    /// Alarm duration, missing treated as no alarm.
    pub fn alarm_seconds(&self) -> f64 {
        self.effective_alarm_seconds.unwrap_or(0.0)
    }

    pub fn internal_curtailment(&self) -> f64 {
        self.internal_curtailment_seconds.unwrap_or(0.0)
    }

    pub fn external_curtailment(&self) -> f64 {
        self.external_curtailment_seconds.unwrap_or(0.0)
    }

    /// Individual alarm descriptions from the pipe-separated text.
    pub fn alarm_descriptions(&self) -> Vec<&str> {
        self.alarm_text
            .as_deref()
            .map(|text| {
                text.split(ALARM_TEXT_SEPARATOR)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ============================================================================
// Classified Reading
// ============================================================================

/// A reading with its operational state, reason code and explanation.
///
/// Derived data: recomputed on every classification pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedReading {
    pub reading: TurbineReading,
    pub state: OperationalState,
    pub reason_code: ReasonCode,
    pub reason_text: String,
    /// Reference wind speed aggregate consulted, if any
    pub reference_wind_speed: Option<f64>,
    /// Number of references that had data at this timestamp
    pub reference_count: usize,
}

impl ClassifiedReading {
    pub fn station_id(&self) -> &str {
        &self.reading.station_id
    }

    pub fn timestamp(&self) -> NaiveDateTime {
        self.reading.timestamp
    }

    pub fn is_producing(&self) -> bool {
        self.state == OperationalState::Producing
    }
}

/// Flat row for CSV export of a classification pass.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedRecord<'a> {
    #[serde(rename = "StationId")]
    pub station_id: &'a str,
    #[serde(rename = "TimeStamp")]
    pub timestamp: String,
    pub active_power_mean: Option<f64>,
    pub wind_speed_mean: Option<f64>,
    pub reference_wind_speed: Option<f64>,
    pub reference_count: usize,
    pub state_code: u8,
    pub operational_state: &'static str,
    pub state_category: &'static str,
    pub reason_code: &'static str,
    pub state_subcategory: &'static str,
    pub state_reason: &'a str,
}

impl<'a> From<&'a ClassifiedReading> for ClassifiedRecord<'a> {
    fn from(c: &'a ClassifiedReading) -> Self {
        Self {
            station_id: &c.reading.station_id,
            timestamp: c.reading.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            active_power_mean: c.reading.active_power_mean,
            wind_speed_mean: c.reading.wind_speed_mean,
            reference_wind_speed: c.reference_wind_speed,
            reference_count: c.reference_count,
            state_code: c.state.code(),
            operational_state: c.state.short_code(),
            state_category: c.state.display_name(),
            reason_code: c.reason_code.short_code(),
            state_subcategory: c.reason_code.display_name(),
            state_reason: &c.reason_text,
        }
    }
}
