//! Wind sensor integrity output types

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::layout::ReferenceId;

/// Deviation severity bucket, ordered from none to high.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    None,
    Low,
    Moderate,
    High,
}

impl Severity {
    pub const ALL: [Self; 4] = [Self::None, Self::Low, Self::Moderate, Self::High];

    /// Bucket a deviation against the configured threshold:
    /// below 1x is none, below 2x low, below 3x moderate, otherwise high.
    pub fn from_deviation(deviation: f64, threshold: f64) -> Self {
        let magnitude = deviation.abs();
        if magnitude.is_nan() || magnitude < threshold {
            Self::None
        } else if magnitude < 2.0 * threshold {
            Self::Low
        } else if magnitude < 3.0 * threshold {
            Self::Moderate
        } else {
            Self::High
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::High => "High",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Whether a sample could be evaluated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SampleStatus {
    Evaluated,
    /// Fewer references with data than the configured minimum
    InsufficientReference,
    /// The target's own wind speed is absent at this timestamp
    TargetMissing,
}

/// Inclusive time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, ts: NaiveDateTime) -> bool {
        ts >= self.start && ts <= self.end
    }
}

/// Target-vs-reference comparison at one timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorDeviationSample {
    pub timestamp: NaiveDateTime,
    pub target_wind_speed: Option<f64>,
    pub reference_aggregate_wind_speed: Option<f64>,
    pub reference_count: usize,
    /// `target - reference_aggregate` when evaluated
    pub deviation: Option<f64>,
    pub anomaly_flag: bool,
    pub severity: Severity,
    pub status: SampleStatus,
    /// Signed circular difference in degrees, wrapped to [-180, 180]
    pub direction_deviation: Option<f64>,
    pub direction_flag: bool,
}

/// Aggregate statistics over one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorIntegritySummary {
    pub sample_count: usize,
    pub evaluated_count: usize,
    pub insufficient_reference_count: usize,
    pub target_missing_count: usize,
    pub anomaly_count: usize,
    pub low_count: usize,
    pub moderate_count: usize,
    pub high_count: usize,
    pub direction_flag_count: usize,
    /// Mean signed deviation (sensor bias), m/s
    pub mean_deviation: Option<f64>,
    pub mean_absolute_deviation: Option<f64>,
    pub max_absolute_deviation: Option<f64>,
    /// Sample standard deviation of the deviations
    pub deviation_std_dev: Option<f64>,
}

impl SensorIntegritySummary {
    /// Anomalies at a given severity.
    pub fn count_for(&self, severity: Severity) -> usize {
        match severity {
            Severity::None => self.evaluated_count - self.anomaly_count,
            Severity::Low => self.low_count,
            Severity::Moderate => self.moderate_count,
            Severity::High => self.high_count,
        }
    }

    /// Share of evaluated samples flagged as anomalous, in percent.
    pub fn anomaly_rate_pct(&self) -> Option<f64> {
        (self.evaluated_count > 0)
            .then(|| self.anomaly_count as f64 / self.evaluated_count as f64 * 100.0)
    }
}

/// Full result of a sensor integrity analysis for one target turbine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorIntegrityReport {
    pub target_id: String,
    pub references: Vec<ReferenceId>,
    pub aggregator: String,
    pub time_range: Option<TimeRange>,
    pub samples: Vec<SensorDeviationSample>,
    pub summary: SensorIntegritySummary,
}
