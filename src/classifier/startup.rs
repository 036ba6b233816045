//! Startup-sequence detection
//!
//! Looks back through a station's recent history to explain why a turbine
//! that was not producing is now coming back: an alarm that just cleared,
//! low wind that just ended, or a power ramp with no attributable trigger.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::history::{HistoryEntry, StationHistory};
use crate::config::FarmConfig;
use crate::types::{ReasonCode, TurbineReading};

/// Outcome of startup detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StartupTrigger {
    /// Alarm seen this many minutes before the current row
    PostAlarm { minutes: i64 },
    /// Low wind seen this many minutes before the current row
    PostLowWind { minutes: i64 },
    /// Transition detected, cause not attributable
    Unclear,
    /// No startup sequence
    None,
}

impl StartupTrigger {
    pub fn reason_code(&self) -> Option<ReasonCode> {
        match self {
            Self::PostAlarm { .. } => Some(ReasonCode::StartupPostAlarm),
            Self::PostLowWind { .. } => Some(ReasonCode::StartupPostLowWind),
            Self::Unclear => Some(ReasonCode::StartupUnclear),
            Self::None => None,
        }
    }
}

/// Classify a transition toward producing from the trailing history.
///
/// Empty history gives `Unclear`. Otherwise, in order: a recent alarm
/// within the alarm grace window, recent low wind within the low-wind grace
/// window, then power rising over `rising_power_intervals` consecutive grid
/// intervals.
pub fn detect_startup(current: &TurbineReading, history: &StationHistory, config: &FarmConfig) -> StartupTrigger {
    if history.is_empty() {
        return StartupTrigger::Unclear;
    }
    let startup = &config.thresholds.startup;

    let alarm_window = i64::from(startup.alarm_grace_minutes);
    if let Some(minutes) = minutes_since(current.timestamp, history, |e| is_alarm(e, config)) {
        if minutes > 0 && minutes <= alarm_window {
            return StartupTrigger::PostAlarm { minutes };
        }
    }

    let low_wind_window = i64::from(startup.low_wind_grace_minutes);
    if let Some(minutes) = minutes_since(current.timestamp, history, |e| is_low_wind(e, config)) {
        if minutes > 0 && minutes <= low_wind_window {
            return StartupTrigger::PostLowWind { minutes };
        }
    }

    let interval = Duration::minutes(i64::from(config.analysis.interval_minutes));
    if power_rising(current, history, startup.rising_power_intervals, interval) {
        return StartupTrigger::Unclear;
    }

    StartupTrigger::None
}

/// Minutes between `now` and the most recent entry matching `pred`.
fn minutes_since(
    now: NaiveDateTime,
    history: &StationHistory,
    pred: impl Fn(&HistoryEntry) -> bool,
) -> Option<i64> {
    history
        .recent()
        .find(|e| pred(e))
        .map(|e| (now - e.timestamp).num_minutes())
}

fn is_alarm(entry: &HistoryEntry, config: &FarmConfig) -> bool {
    entry.reason_code == ReasonCode::AlarmActive
        || entry.alarm_seconds > config.thresholds.production.alarm_threshold_seconds
}

fn is_low_wind(entry: &HistoryEntry, config: &FarmConfig) -> bool {
    let wind = &config.thresholds.wind;
    entry.reason_code.is_low_wind()
        || (wind.is_plausible(entry.wind_speed_mean)
            && entry.wind_speed_mean.is_some_and(|ws| ws < wind.cut_in_wind_speed))
}

/// Strictly increasing power over the last `intervals` steps ending at
/// `current`, each step exactly one grid interval apart.
fn power_rising(current: &TurbineReading, history: &StationHistory, intervals: usize, interval: Duration) -> bool {
    if intervals == 0 || history.len() < intervals {
        return false;
    }
    let Some(mut later_power) = current.active_power_mean else {
        return false;
    };
    let mut later_ts = current.timestamp;
    for entry in history.recent().take(intervals) {
        let Some(power) = entry.active_power_mean else {
            return false;
        };
        if later_ts - entry.timestamp != interval || power >= later_power {
            return false;
        }
        later_power = power;
        later_ts = entry.timestamp;
    }
    true
}
