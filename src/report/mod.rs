//! Availability metrics and per-turbine reports over classified rows
//!
//! Data-missing rows are counted but never enter the producing /
//! non-producing denominators.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fmt;

use crate::config::defaults::SECONDS_PER_HOUR;
use crate::types::{ClassifiedReading, OperationalState, ReasonCode, TimeRange};

// ============================================================================
// Availability
// ============================================================================

/// State counts and percentages for one station or the whole farm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AvailabilitySummary {
    pub total_rows: usize,
    /// Rows with a decidable state (data-missing excluded)
    pub classified_rows: usize,
    pub data_missing_rows: usize,
    pub producing: usize,
    pub explained: usize,
    pub verification_pending: usize,
    pub unexpected: usize,
    pub producing_pct: f64,
    pub explained_pct: f64,
    pub verification_pending_pct: f64,
    pub unexpected_pct: f64,
    /// (producing + explained) / classified
    pub availability_pct: f64,
    /// (pending + unexpected) / classified
    pub unexplained_loss_pct: f64,
    pub reason_distribution: BTreeMap<ReasonCode, usize>,
}

impl AvailabilitySummary {
    /// Summarize an arbitrary set of classified rows.
    pub fn from_rows<'a>(rows: impl IntoIterator<Item = &'a ClassifiedReading>) -> Self {
        let mut summary = Self::default();
        for row in rows {
            summary.total_rows += 1;
            *summary.reason_distribution.entry(row.reason_code).or_insert(0) += 1;
            match row.state {
                OperationalState::Producing => summary.producing += 1,
                OperationalState::NotProducingExplained => summary.explained += 1,
                OperationalState::NotProducingVerificationPending => summary.verification_pending += 1,
                OperationalState::NotProducingUnexpected => summary.unexpected += 1,
                OperationalState::DataMissing => summary.data_missing_rows += 1,
            }
        }
        summary.classified_rows = summary.total_rows - summary.data_missing_rows;

        let classified = summary.classified_rows;
        let pct = |n: usize| percentage(n, classified);
        summary.producing_pct = pct(summary.producing);
        summary.explained_pct = pct(summary.explained);
        summary.verification_pending_pct = pct(summary.verification_pending);
        summary.unexpected_pct = pct(summary.unexpected);
        summary.availability_pct = pct(summary.producing + summary.explained);
        summary.unexplained_loss_pct = pct(summary.verification_pending + summary.unexpected);
        summary
    }

    /// Summary restricted to one station.
    pub fn for_station(rows: &[ClassifiedReading], station_id: &str) -> Self {
        Self::from_rows(rows.iter().filter(|r| r.station_id() == station_id))
    }

    pub fn count_for(&self, reason: ReasonCode) -> usize {
        self.reason_distribution.get(&reason).copied().unwrap_or(0)
    }
}

#[allow(clippy::cast_precision_loss)]
fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

// ============================================================================
// Turbine Report
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LatestStatus {
    pub timestamp: NaiveDateTime,
    pub state: OperationalState,
    pub reason_code: ReasonCode,
    pub reason_text: String,
    pub active_power_kw: Option<f64>,
    pub wind_speed_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlarmAnalysis {
    pub rows_with_alarm: usize,
    pub total_alarm_hours: f64,
    pub alarm_pct: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurtailmentAnalysis {
    pub external_hours: f64,
    /// Alarm code 2006 only
    pub internal_hours: f64,
    pub total_hours: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductionAnalysis {
    pub producing_rows: usize,
    pub production_pct: f64,
    pub avg_power_when_producing_kw: Option<f64>,
}

/// Everything known about one turbine over the loaded window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurbineReport {
    pub station_id: String,
    pub time_range: TimeRange,
    pub total_rows: usize,
    pub latest: LatestStatus,
    pub availability: AvailabilitySummary,
    pub alarms: AlarmAnalysis,
    pub curtailment: CurtailmentAnalysis,
    pub production: ProductionAnalysis,
    pub avg_wind_speed_ms: Option<f64>,
}

impl TurbineReport {
    /// Build from one station's classified rows in time order.
    ///
    /// `None` when the station has no rows.
    pub fn build(station_id: &str, rows: &[ClassifiedReading]) -> Option<Self> {
        let rows: Vec<&ClassifiedReading> = rows.iter().filter(|r| r.station_id() == station_id).collect();
        let first = rows.first()?;
        let last = rows.last()?;
        let total = rows.len();

        let alarm_rows = rows.iter().filter(|r| r.reading.alarm_seconds() > 0.0).count();
        let alarm_seconds: f64 = rows.iter().map(|r| r.reading.alarm_seconds()).sum();
        let external: f64 = rows.iter().map(|r| r.reading.external_curtailment()).sum();
        let internal: f64 = rows.iter().map(|r| r.reading.internal_curtailment()).sum();

        let producing_power: Vec<f64> = rows
            .iter()
            .filter(|r| r.is_producing())
            .filter_map(|r| r.reading.active_power_mean)
            .collect();
        let producing_rows = rows.iter().filter(|r| r.is_producing()).count();
        let wind: Vec<f64> = rows
            .iter()
            .filter_map(|r| r.reading.wind_speed_mean)
            .filter(|ws| ws.is_finite())
            .collect();
        let availability = AvailabilitySummary::from_rows(rows.iter().copied());

        Some(Self {
            station_id: station_id.to_string(),
            time_range: TimeRange::new(first.timestamp(), last.timestamp()),
            total_rows: total,
            latest: LatestStatus {
                timestamp: last.timestamp(),
                state: last.state,
                reason_code: last.reason_code,
                reason_text: last.reason_text.clone(),
                active_power_kw: last.reading.active_power_mean,
                wind_speed_ms: last.reading.wind_speed_mean,
            },
            alarms: AlarmAnalysis {
                rows_with_alarm: alarm_rows,
                total_alarm_hours: alarm_seconds / SECONDS_PER_HOUR,
                alarm_pct: percentage(alarm_rows, total),
            },
            curtailment: CurtailmentAnalysis {
                external_hours: external / SECONDS_PER_HOUR,
                internal_hours: internal / SECONDS_PER_HOUR,
                total_hours: (external + internal) / SECONDS_PER_HOUR,
            },
            production: ProductionAnalysis {
                producing_rows,
                production_pct: percentage(producing_rows, availability.classified_rows),
                avg_power_when_producing_kw: mean(&producing_power),
            },
            avg_wind_speed_ms: mean(&wind),
            availability,
        })
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().mean())
}

impl fmt::Display for TurbineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Turbine {}", self.station_id)?;
        writeln!(
            f,
            "  Window:        {} to {} ({} rows)",
            self.time_range.start.format("%Y-%m-%d %H:%M"),
            self.time_range.end.format("%Y-%m-%d %H:%M"),
            self.total_rows
        )?;
        writeln!(
            f,
            "  Latest:        {} [{}] {}",
            self.latest.state, self.latest.reason_code.short_code(), self.latest.reason_text
        )?;
        writeln!(
            f,
            "  Availability:  {:.1}% (unexplained loss {:.1}%, {} data-missing rows)",
            self.availability.availability_pct,
            self.availability.unexplained_loss_pct,
            self.availability.data_missing_rows
        )?;
        writeln!(
            f,
            "  Alarms:        {} rows, {} ({:.1}%)",
            self.alarms.rows_with_alarm,
            format_duration(self.alarms.total_alarm_hours * SECONDS_PER_HOUR),
            self.alarms.alarm_pct
        )?;
        writeln!(
            f,
            "  Curtailment:   external {:.1}h, internal (2006) {:.1}h",
            self.curtailment.external_hours, self.curtailment.internal_hours
        )?;
        match self.production.avg_power_when_producing_kw {
            Some(avg) => writeln!(
                f,
                "  Production:    {:.1}% of rows, avg {avg:.1} kW when producing",
                self.production.production_pct
            )?,
            None => writeln!(f, "  Production:    none")?,
        }
        for (reason, count) in &self.availability.reason_distribution {
            writeln!(f, "    {:<45} {count}", reason.display_name())?;
        }
        Ok(())
    }
}

/// Seconds as `45s`, `12.5m` or `3.2h`.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        "0s".to_string()
    } else if seconds < 60.0 {
        format!("{seconds:.0}s")
    } else if seconds < SECONDS_PER_HOUR {
        format!("{:.1}m", seconds / 60.0)
    } else {
        format!("{:.1}h", seconds / SECONDS_PER_HOUR)
    }
}

// ============================================================================
// Farm Overview
// ============================================================================

/// One line of the farm overview table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationOverview {
    pub station_id: String,
    pub current_state: OperationalState,
    pub current_power_kw: Option<f64>,
    pub current_wind_ms: Option<f64>,
    pub availability_pct: f64,
    pub producing_pct: f64,
    pub unexplained_loss_pct: f64,
    pub total_rows: usize,
    pub last_update: NaiveDateTime,
}

/// Per-station overview rows from a full classification pass.
pub fn farm_overview(rows: &[ClassifiedReading]) -> Vec<StationOverview> {
    let mut by_station: BTreeMap<&str, Vec<&ClassifiedReading>> = BTreeMap::new();
    for row in rows {
        by_station.entry(row.station_id()).or_default().push(row);
    }
    by_station
        .into_iter()
        .filter_map(|(station, rows)| {
            let latest = rows.iter().max_by_key(|r| r.timestamp())?;
            let availability = AvailabilitySummary::from_rows(rows.iter().copied());
            Some(StationOverview {
                station_id: station.to_string(),
                current_state: latest.state,
                current_power_kw: latest.reading.active_power_mean,
                current_wind_ms: latest.reading.wind_speed_mean,
                availability_pct: availability.availability_pct,
                producing_pct: availability.producing_pct,
                unexplained_loss_pct: availability.unexplained_loss_pct,
                total_rows: rows.len(),
                last_update: latest.timestamp(),
            })
        })
        .collect()
}
