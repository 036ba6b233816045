//! Fixed constants that are not operator-tunable.
//!
//! Grouped by subsystem for easy discovery. Tunable thresholds live in
//! `FarmConfig`; everything here is a property of the data format or of
//! the physics.

// ============================================================================
// Ingestion
// ============================================================================

/// Timestamp layouts accepted in the SCADA `TimeStamp` column, tried in order.
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Cell contents read as a missing value (compared case-insensitively).
pub const MISSING_VALUE_TOKENS: &[&str] = &["", "nan", "null", "none", "na", "n/a"];

/// Separator between alarm descriptions in the `UK Text` column.
pub const ALARM_TEXT_SEPARATOR: char = '|';

// ============================================================================
// Geometry
// ============================================================================

/// Degrees in a full circle.
pub const FULL_CIRCLE_DEG: f64 = 360.0;

/// Largest magnitude of a wrapped direction difference.
pub const HALF_CIRCLE_DEG: f64 = 180.0;

// ============================================================================
// Reporting
// ============================================================================

pub const SECONDS_PER_HOUR: f64 = 3_600.0;

/// Reason-text placeholder when a row carries no alarm description.
pub const NO_ALARM_TEXT: &str = "N/A";
