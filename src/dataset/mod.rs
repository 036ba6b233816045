//! Immutable SCADA dataset snapshot
//!
//! Rows are sorted by `(station, timestamp)` once at construction. Each
//! station occupies one contiguous slice, so lookups are a map hit plus a
//! binary search. Duplicated keys, rows off the interval grid and gaps in a
//! station's sequence are recorded in a [`DataQualityReport`]; nothing is
//! interpolated and nothing is dropped without a flag.

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use tracing::{info, warn};

use crate::acquisition::ScadaTable;
use crate::types::{TimeRange, TurbineReading};

// ============================================================================
// Data Quality
// ============================================================================

/// A flagged `(station, timestamp)` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFlag {
    pub station_id: String,
    pub timestamp: NaiveDateTime,
}

/// A break in a station's interval sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GapFlag {
    pub station_id: String,
    /// Last timestamp before the gap
    pub from: NaiveDateTime,
    /// First timestamp after the gap
    pub to: NaiveDateTime,
    /// Whole intervals absent between the two
    pub missing_intervals: i64,
}

/// Everything the snapshot noticed while indexing the rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataQualityReport {
    /// Later rows repeating an existing `(station, timestamp)`; not indexed
    pub duplicates: Vec<RowFlag>,
    /// Rows whose timestamp is not on the interval grid; kept
    pub off_grid: Vec<RowFlag>,
    pub gaps: Vec<GapFlag>,
    /// Rows kept but lacking values required for classification
    pub rows_missing_required: usize,
    /// Source lines that had no station id or timestamp
    pub unidentified_lines: Vec<u64>,
}

impl DataQualityReport {
    pub fn is_clean(&self) -> bool {
        self.issue_count() == 0
    }

    pub fn issue_count(&self) -> usize {
        self.duplicates.len()
            + self.off_grid.len()
            + self.gaps.len()
            + self.rows_missing_required
            + self.unidentified_lines.len()
    }
}

// ============================================================================
// Dataset
// ============================================================================

/// Sorted, de-duplicated SCADA rows with per-station indexing.
#[derive(Debug, Clone)]
pub struct ScadaDataset {
    readings: Vec<TurbineReading>,
    station_ranges: BTreeMap<String, Range<usize>>,
    metmast_ids: Vec<String>,
    interval: Duration,
    quality: DataQualityReport,
}

impl ScadaDataset {
    /// Build a snapshot from raw readings on an `interval_minutes` grid.
    pub fn from_readings(mut readings: Vec<TurbineReading>, interval_minutes: u32) -> Self {
        let interval = Duration::minutes(i64::from(interval_minutes.max(1)));
        let mut quality = DataQualityReport::default();

        // Stable sort keeps file order among duplicates, so the first wins
        readings.sort_by(|a, b| {
            a.station_id
                .cmp(&b.station_id)
                .then(a.timestamp.cmp(&b.timestamp))
        });

        let mut kept: Vec<TurbineReading> = Vec::with_capacity(readings.len());
        for reading in readings {
            let duplicate = kept.last().is_some_and(|prev| {
                prev.station_id == reading.station_id && prev.timestamp == reading.timestamp
            });
            if duplicate {
                quality.duplicates.push(RowFlag {
                    station_id: reading.station_id,
                    timestamp: reading.timestamp,
                });
                continue;
            }
            if !on_grid(reading.timestamp, interval_minutes) {
                quality.off_grid.push(RowFlag {
                    station_id: reading.station_id.clone(),
                    timestamp: reading.timestamp,
                });
            }
            if !reading.has_required_values() {
                quality.rows_missing_required += 1;
            }
            kept.push(reading);
        }

        let mut station_ranges: BTreeMap<String, Range<usize>> = BTreeMap::new();
        let mut start = 0;
        for i in 1..=kept.len() {
            if i == kept.len() || kept[i].station_id != kept[start].station_id {
                station_ranges.insert(kept[start].station_id.clone(), start..i);
                start = i;
            }
        }

        for (station, range) in &station_ranges {
            for pair in kept[range.clone()].windows(2) {
                let step = pair[1].timestamp - pair[0].timestamp;
                if step > interval {
                    quality.gaps.push(GapFlag {
                        station_id: station.clone(),
                        from: pair[0].timestamp,
                        to: pair[1].timestamp,
                        missing_intervals: step.num_minutes() / interval.num_minutes() - 1,
                    });
                }
            }
        }

        let metmast_ids: Vec<String> = kept
            .iter()
            .flat_map(|r| r.metmast_wind_speed.keys().chain(r.metmast_wind_direction.keys()))
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if !quality.duplicates.is_empty() {
            warn!(count = quality.duplicates.len(), "Duplicate (station, timestamp) rows flagged, first occurrence kept");
        }
        if !quality.off_grid.is_empty() {
            warn!(count = quality.off_grid.len(), interval_minutes, "Rows off the interval grid flagged");
        }
        if !quality.gaps.is_empty() {
            warn!(count = quality.gaps.len(), "Gaps in station sequences flagged");
        }
        if quality.rows_missing_required > 0 {
            warn!(count = quality.rows_missing_required, "Rows missing required values will be classified as data missing");
        }
        info!(
            rows = kept.len(),
            stations = station_ranges.len(),
            metmasts = metmast_ids.len(),
            "Dataset snapshot built"
        );

        Self {
            readings: kept,
            station_ranges,
            metmast_ids,
            interval,
            quality,
        }
    }

    /// Build a snapshot from a loaded CSV table, carrying its header metmasts
    /// and unidentified lines.
    pub fn from_table(table: ScadaTable, interval_minutes: u32) -> Self {
        let ScadaTable {
            readings,
            metmast_ids,
            unidentified_lines,
        } = table;
        let mut dataset = Self::from_readings(readings, interval_minutes);
        if !unidentified_lines.is_empty() {
            warn!(count = unidentified_lines.len(), "Rows without station id or timestamp flagged");
        }
        dataset.quality.unidentified_lines = unidentified_lines;
        let merged: BTreeSet<String> = dataset.metmast_ids.drain(..).chain(metmast_ids).collect();
        dataset.metmast_ids = merged.into_iter().collect();
        dataset
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// All indexed rows, sorted by station then timestamp.
    pub fn readings(&self) -> &[TurbineReading] {
        &self.readings
    }

    /// Station ids in ascending order.
    pub fn stations(&self) -> impl Iterator<Item = &str> + '_ {
        self.station_ranges.keys().map(String::as_str)
    }

    pub fn has_station(&self, station_id: &str) -> bool {
        self.station_ranges.contains_key(station_id)
    }

    /// Rows of one station in time order; empty for an unknown station.
    pub fn station_rows(&self, station_id: &str) -> &[TurbineReading] {
        match self.station_ranges.get(station_id) {
            Some(range) => &self.readings[range.clone()],
            None => &[],
        }
    }

    /// Rows of one station inside an inclusive time range.
    pub fn station_rows_in(&self, station_id: &str, range: Option<&TimeRange>) -> &[TurbineReading] {
        let rows = self.station_rows(station_id);
        let Some(range) = range else {
            return rows;
        };
        let lo = rows.partition_point(|r| r.timestamp < range.start);
        let hi = rows.partition_point(|r| r.timestamp <= range.end);
        &rows[lo..hi.max(lo)]
    }

    /// The row for `station_id` at exactly `timestamp`.
    pub fn reading(&self, station_id: &str, timestamp: NaiveDateTime) -> Option<&TurbineReading> {
        let rows = self.station_rows(station_id);
        rows.binary_search_by_key(&timestamp, |r| r.timestamp)
            .ok()
            .map(|i| &rows[i])
    }

    /// Metmast ids seen in headers or values.
    pub fn metmast_ids(&self) -> &[String] {
        &self.metmast_ids
    }

    /// Earliest and latest timestamp over all stations.
    pub fn time_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let first = self.readings.iter().map(|r| r.timestamp).min()?;
        let last = self.readings.iter().map(|r| r.timestamp).max()?;
        Some((first, last))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn quality(&self) -> &DataQualityReport {
        &self.quality
    }
}

fn on_grid(ts: NaiveDateTime, interval_minutes: u32) -> bool {
    ts.second() == 0 && ts.nanosecond() == 0 && ts.minute() % interval_minutes.max(1) == 0
}
