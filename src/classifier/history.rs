//! Bounded per-station history for startup detection

use chrono::NaiveDateTime;
use std::collections::VecDeque;

use crate::types::{ClassifiedReading, OperationalState, ReasonCode};

/// What the startup detector needs to remember about a classified row.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub timestamp: NaiveDateTime,
    pub state: OperationalState,
    pub reason_code: ReasonCode,
    pub active_power_mean: Option<f64>,
    pub wind_speed_mean: Option<f64>,
    pub alarm_seconds: f64,
}

impl From<&ClassifiedReading> for HistoryEntry {
    fn from(c: &ClassifiedReading) -> Self {
        Self {
            timestamp: c.reading.timestamp,
            state: c.state,
            reason_code: c.reason_code,
            active_power_mean: c.reading.active_power_mean,
            wind_speed_mean: c.reading.wind_speed_mean,
            alarm_seconds: c.reading.alarm_seconds(),
        }
    }
}

/// Ring buffer of the last N classified rows of one station, oldest first.
#[derive(Debug, Clone)]
pub struct StationHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl StationHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a classified row, evicting the oldest when full.
    pub fn push(&mut self, classified: &ClassifiedReading) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry::from(classified));
    }

    /// Most recent entry.
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Entries newest first.
    pub fn recent(&self) -> impl Iterator<Item = &HistoryEntry> + '_ {
        self.entries.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
