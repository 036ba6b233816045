//! Config validation: unknown-key detection with "did you mean" suggestions
//! and physical range checks on wind-farm thresholds.
//!
//! The raw TOML is first parsed into a `toml::Value` tree and every dotted
//! key is compared against the known field names. Unknown keys produce
//! warnings only, so a typo never stops an analysis from running; serde then
//! deserializes the document as usual and fills in defaults.

use std::collections::HashSet;

use super::FarmConfig;

/// Largest edit distance at which a known key is offered as a suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `FarmConfig`.
///
/// Maintained by hand to match the struct hierarchy in farm_config.rs.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [farm]
        "farm",
        "farm.name",
        "farm.operator",
        // [thresholds]
        "thresholds",
        // [thresholds.production]
        "thresholds.production",
        "thresholds.production.production_threshold_kw",
        "thresholds.production.alarm_threshold_seconds",
        "thresholds.production.curtailment_threshold_seconds",
        // [thresholds.wind]
        "thresholds.wind",
        "thresholds.wind.cut_in_wind_speed",
        "thresholds.wind.min_plausible_wind_speed",
        "thresholds.wind.max_plausible_wind_speed",
        // [thresholds.startup]
        "thresholds.startup",
        "thresholds.startup.history_window_rows",
        "thresholds.startup.alarm_grace_minutes",
        "thresholds.startup.low_wind_grace_minutes",
        "thresholds.startup.rising_power_intervals",
        // [thresholds.sensor]
        "thresholds.sensor",
        "thresholds.sensor.wind_speed_deviation_threshold",
        "thresholds.sensor.wind_direction_deviation_threshold",
        "thresholds.sensor.min_reference_count",
        // [adjacency]
        "adjacency",
        "adjacency.max_adjacent_turbines",
        "adjacency.distance_threshold_m",
        "adjacency.fallback",
        "adjacency.include_unlocated_metmasts",
        // [analysis]
        "analysis",
        "analysis.aggregator",
        "analysis.trim_fraction",
        "analysis.interval_minutes",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Collect every dotted key path in a `toml::Value` tree.
///
/// `{ a = { b = 1, c = 2 } }` yields `["a", "a.b", "a.c"]`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let Some(table) = value.as_table() else {
        return Vec::new();
    };
    let mut keys = Vec::new();
    for (k, v) in table {
        let path = if prefix.is_empty() {
            k.clone()
        } else {
            format!("{prefix}.{k}")
        };
        if v.is_table() {
            let nested = walk_toml_keys(v, &path);
            keys.push(path);
            keys.extend(nested);
        } else {
            keys.push(path);
        }
    }
    keys
}

// ============================================================================
// Suggestions
// ============================================================================

/// Levenshtein edit distance, counted in chars.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = prev[j] + usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(substitution);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Closest known key for an unknown one, if any is within
/// `MAX_SUGGESTION_DISTANCE` edits. Ties go to the alphabetically first key.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|k| (levenshtein(unknown, k), *k))
        .filter(|(dist, _)| *dist <= MAX_SUGGESTION_DISTANCE)
        .min()
        .map(|(_, k)| k.to_string())
}

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// Parse errors are left to serde and reported there.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

// ============================================================================
// Physical Range Validation
// ============================================================================

/// Physical sanity checks on a parsed `FarmConfig`.
///
/// Returns (errors, warnings): errors are impossible values that must stop
/// the analysis, warnings are unusual but legal settings.
pub fn validate_physical_ranges(config: &FarmConfig) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let wind = &config.thresholds.wind;
    let sensor = &config.thresholds.sensor;

    // Anemometers cannot report negative speeds
    if wind.min_plausible_wind_speed < 0.0 {
        errors.push(format!(
            "wind.min_plausible_wind_speed = {:.2} cannot be negative",
            wind.min_plausible_wind_speed
        ));
    }

    // Circular differences never exceed 180 degrees
    if sensor.wind_direction_deviation_threshold >= 180.0 {
        errors.push(format!(
            "sensor.wind_direction_deviation_threshold = {:.1} must be below 180 degrees",
            sensor.wind_direction_deviation_threshold
        ));
    }

    if config.thresholds.production.production_threshold_kw < 0.0 {
        errors.push(format!(
            "production.production_threshold_kw = {:.2} cannot be negative",
            config.thresholds.production.production_threshold_kw
        ));
    }

    // Utility-scale cut-in speeds sit between 2 and 5 m/s
    if !(1.0..=6.0).contains(&wind.cut_in_wind_speed) {
        warnings.push(ValidationWarning {
            field: "thresholds.wind.cut_in_wind_speed".to_string(),
            message: format!(
                "cut_in_wind_speed = {:.1} is outside the typical range (1-6 m/s)",
                wind.cut_in_wind_speed
            ),
            suggestion: None,
        });
    }

    if wind.max_plausible_wind_speed > 75.0 {
        warnings.push(ValidationWarning {
            field: "thresholds.wind.max_plausible_wind_speed".to_string(),
            message: format!(
                "max_plausible_wind_speed = {:.1} exceeds any recorded 10-minute mean (75 m/s)",
                wind.max_plausible_wind_speed
            ),
            suggestion: None,
        });
    }

    if config.thresholds.production.production_threshold_kw > 500.0 {
        warnings.push(ValidationWarning {
            field: "thresholds.production.production_threshold_kw".to_string(),
            message: format!(
                "production_threshold_kw = {:.0} would count partial-load operation as not producing",
                config.thresholds.production.production_threshold_kw
            ),
            suggestion: None,
        });
    }

    // Rows within a park are normally at least 3 rotor diameters apart
    if config.adjacency.distance_threshold_m < 100.0 {
        warnings.push(ValidationWarning {
            field: "adjacency.distance_threshold_m".to_string(),
            message: format!(
                "distance_threshold_m = {:.0} is below typical turbine spacing, most stations will have no references",
                config.adjacency.distance_threshold_m
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
