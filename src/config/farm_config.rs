//! Farm Configuration - classification and sensor-check thresholds as TOML values
//!
//! Every threshold the classifier, the adjacency resolver and the sensor
//! integrity analyzer consult lives in this module. Each struct implements
//! `Default` with the standard values, so running without a config file
//! gives the documented behavior.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "TURBINE_INSIGHT_CONFIG";

/// Config file looked up in the current working directory.
pub const LOCAL_CONFIG_FILE: &str = "farm_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one wind farm analysis.
///
/// Load with `FarmConfig::load()` which searches:
/// 1. `$TURBINE_INSIGHT_CONFIG` env var
/// 2. `./farm_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmConfig {
    /// Farm identification
    #[serde(default)]
    pub farm: FarmInfo,

    /// Classification and sensor thresholds
    #[serde(default)]
    pub thresholds: ThresholdConfig,

    /// Spatial adjacency limits and no-layout fallback
    #[serde(default)]
    pub adjacency: AdjacencyConfig,

    /// Reference aggregation and time grid
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            farm: FarmInfo::default(),
            thresholds: ThresholdConfig::default(),
            adjacency: AdjacencyConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl FarmConfig {
    /// Load configuration using the standard search order:
    /// 1. `$TURBINE_INSIGHT_CONFIG` environment variable
    /// 2. `./farm_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), farm = %config.farm.name, "Loaded farm config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        // 2. Check ./farm_config.toml
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(farm = %config.farm.name, "Loaded farm config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        // 3. Defaults
        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    ///
    /// Unknown keys are reported as warnings; out-of-range values fail
    /// validation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, err) => ConfigError::Parse(path.to_path_buf(), err),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        // Two-pass: check for unknown keys first (warnings only)
        for w in &super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::from("<inline>"), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Save config to a file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Farm config saved");
        Ok(())
    }

    /// Validate all thresholds for internal consistency.
    ///
    /// Rules:
    /// - All numeric values must be finite
    /// - Cut-in wind speed must sit inside the plausible wind range
    /// - Deviation thresholds must be positive (severity buckets are multiples)
    /// - Counts and window sizes must be non-zero
    /// - `trim_fraction` must be in `[0, 0.5)`
    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.thresholds;
        let mut errors: Vec<String> = Vec::new();

        // Finite checks first; comparisons against NaN silently pass
        let finite_fields = [
            ("production.production_threshold_kw", t.production.production_threshold_kw),
            ("production.alarm_threshold_seconds", t.production.alarm_threshold_seconds),
            ("production.curtailment_threshold_seconds", t.production.curtailment_threshold_seconds),
            ("wind.cut_in_wind_speed", t.wind.cut_in_wind_speed),
            ("wind.min_plausible_wind_speed", t.wind.min_plausible_wind_speed),
            ("wind.max_plausible_wind_speed", t.wind.max_plausible_wind_speed),
            ("sensor.wind_speed_deviation_threshold", t.sensor.wind_speed_deviation_threshold),
            ("sensor.wind_direction_deviation_threshold", t.sensor.wind_direction_deviation_threshold),
            ("adjacency.distance_threshold_m", self.adjacency.distance_threshold_m),
            ("analysis.trim_fraction", self.analysis.trim_fraction),
        ];
        for (name, value) in finite_fields {
            if !value.is_finite() {
                errors.push(format!("{name} must be a finite number (got {value})"));
            }
        }

        // Durations
        if t.production.alarm_threshold_seconds < 0.0 {
            errors.push("production.alarm_threshold_seconds cannot be negative".to_string());
        }
        if t.production.curtailment_threshold_seconds < 0.0 {
            errors.push("production.curtailment_threshold_seconds cannot be negative".to_string());
        }

        // Wind: min < max, cut-in inside the plausible band
        Self::check_range(
            t.wind.min_plausible_wind_speed,
            t.wind.max_plausible_wind_speed,
            "wind.plausible_wind_speed",
            &mut errors,
        );
        if t.wind.cut_in_wind_speed < t.wind.min_plausible_wind_speed
            || t.wind.cut_in_wind_speed > t.wind.max_plausible_wind_speed
        {
            errors.push(format!(
                "wind.cut_in_wind_speed ({:.2}) must lie within the plausible range [{:.2}, {:.2}]",
                t.wind.cut_in_wind_speed,
                t.wind.min_plausible_wind_speed,
                t.wind.max_plausible_wind_speed
            ));
        }

        // Sensor
        if t.sensor.wind_speed_deviation_threshold <= 0.0 {
            errors.push("sensor.wind_speed_deviation_threshold must be > 0".to_string());
        }
        if t.sensor.wind_direction_deviation_threshold <= 0.0 {
            errors.push("sensor.wind_direction_deviation_threshold must be > 0".to_string());
        }
        if t.sensor.min_reference_count == 0 {
            errors.push("sensor.min_reference_count must be > 0".to_string());
        }

        // Startup window
        let s = &t.startup;
        if s.history_window_rows == 0 {
            errors.push("startup.history_window_rows must be > 0".to_string());
        }
        if s.rising_power_intervals == 0 {
            errors.push("startup.rising_power_intervals must be > 0".to_string());
        }
        if s.rising_power_intervals > s.history_window_rows {
            errors.push(format!(
                "startup.rising_power_intervals ({}) cannot exceed history_window_rows ({})",
                s.rising_power_intervals, s.history_window_rows
            ));
        }

        // Adjacency
        if self.adjacency.max_adjacent_turbines == 0 {
            errors.push("adjacency.max_adjacent_turbines must be > 0".to_string());
        }
        if self.adjacency.distance_threshold_m <= 0.0 {
            errors.push("adjacency.distance_threshold_m must be > 0".to_string());
        }

        // Analysis
        let a = &self.analysis;
        if !(0.0..0.5).contains(&a.trim_fraction) {
            errors.push(format!(
                "analysis.trim_fraction ({:.3}) must be in [0, 0.5)",
                a.trim_fraction
            ));
        }
        if a.interval_minutes == 0 || 60 % a.interval_minutes != 0 {
            errors.push(format!(
                "analysis.interval_minutes ({}) must be a non-zero divisor of 60",
                a.interval_minutes
            ));
        }

        // Physical range validation
        let (range_errors, range_warnings) = super::validation::validate_physical_ranges(self);
        errors.extend(range_errors);
        for w in &range_warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_range(low: f64, high: f64, name: &str, errors: &mut Vec<String>) {
        if !low.is_finite() || !high.is_finite() {
            return;
        }
        if high <= low {
            errors.push(format!("{name}: max ({high:.3}) must be > min ({low:.3})"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            Self::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            Self::Serialize(e) => write!(f, "Config serialization error: {e}"),
            Self::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {e}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Farm Info
// ============================================================================

/// Identification metadata, shown in logs and reports only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmInfo {
    /// Farm name / identifier
    #[serde(default = "default_farm_name")]
    pub name: String,

    /// Operating company
    #[serde(default)]
    pub operator: String,
}

fn default_farm_name() -> String {
    "DEFAULT".to_string()
}

impl Default for FarmInfo {
    fn default() -> Self {
        Self {
            name: default_farm_name(),
            operator: String::new(),
        }
    }
}

// ============================================================================
// Threshold Config (master container)
// ============================================================================

/// All classification thresholds, grouped by concern.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdConfig {
    #[serde(default)]
    pub production: ProductionThresholds,

    #[serde(default)]
    pub wind: WindThresholds,

    #[serde(default)]
    pub startup: StartupThresholds,

    #[serde(default)]
    pub sensor: SensorThresholds,
}

// ============================================================================
// Production
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductionThresholds {
    /// Mean active power above which the interval counts as producing (kW)
    #[serde(default = "default_production_threshold_kw")]
    pub production_threshold_kw: f64,

    /// Alarm duration above which an alarm is considered active (seconds)
    #[serde(default = "default_alarm_threshold_seconds")]
    pub alarm_threshold_seconds: f64,

    /// Curtailment duration above which curtailment is considered active (seconds)
    #[serde(default = "default_curtailment_threshold_seconds")]
    pub curtailment_threshold_seconds: f64,
}

fn default_production_threshold_kw() -> f64 {
    1.0
}
fn default_alarm_threshold_seconds() -> f64 {
    0.0
}
fn default_curtailment_threshold_seconds() -> f64 {
    0.0
}

impl Default for ProductionThresholds {
    fn default() -> Self {
        Self {
            production_threshold_kw: default_production_threshold_kw(),
            alarm_threshold_seconds: default_alarm_threshold_seconds(),
            curtailment_threshold_seconds: default_curtailment_threshold_seconds(),
        }
    }
}

// ============================================================================
// Wind
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindThresholds {
    /// Minimum wind speed at which the turbine can produce (m/s)
    #[serde(default = "default_cut_in_wind_speed")]
    pub cut_in_wind_speed: f64,

    /// Readings below this are physically implausible (m/s)
    #[serde(default = "default_min_plausible_wind_speed")]
    pub min_plausible_wind_speed: f64,

    /// Readings above this are physically implausible (m/s)
    #[serde(default = "default_max_plausible_wind_speed")]
    pub max_plausible_wind_speed: f64,
}

fn default_cut_in_wind_speed() -> f64 {
    3.0
}
fn default_min_plausible_wind_speed() -> f64 {
    0.0
}
fn default_max_plausible_wind_speed() -> f64 {
    40.0
}

impl Default for WindThresholds {
    fn default() -> Self {
        Self {
            cut_in_wind_speed: default_cut_in_wind_speed(),
            min_plausible_wind_speed: default_min_plausible_wind_speed(),
            max_plausible_wind_speed: default_max_plausible_wind_speed(),
        }
    }
}

impl WindThresholds {
    /// Whether a wind speed reading is present and physically plausible.
    pub fn is_plausible(&self, wind_speed: Option<f64>) -> bool {
        wind_speed.is_some_and(|ws| {
            ws.is_finite()
                && ws >= self.min_plausible_wind_speed
                && ws <= self.max_plausible_wind_speed
        })
    }
}

// ============================================================================
// Startup
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartupThresholds {
    /// Trailing classified rows kept per station for startup detection
    #[serde(default = "default_history_window_rows")]
    pub history_window_rows: usize,

    /// A restart within this many minutes of an alarm counts as post-alarm
    #[serde(default = "default_alarm_grace_minutes")]
    pub alarm_grace_minutes: u32,

    /// A restart within this many minutes of low wind counts as post-low-wind
    #[serde(default = "default_low_wind_grace_minutes")]
    pub low_wind_grace_minutes: u32,

    /// Consecutive rising-power intervals that mark an unattributed restart
    #[serde(default = "default_rising_power_intervals")]
    pub rising_power_intervals: usize,
}

fn default_history_window_rows() -> usize {
    6
}
fn default_alarm_grace_minutes() -> u32 {
    15
}
fn default_low_wind_grace_minutes() -> u32 {
    20
}
fn default_rising_power_intervals() -> usize {
    2
}

impl Default for StartupThresholds {
    fn default() -> Self {
        Self {
            history_window_rows: default_history_window_rows(),
            alarm_grace_minutes: default_alarm_grace_minutes(),
            low_wind_grace_minutes: default_low_wind_grace_minutes(),
            rising_power_intervals: default_rising_power_intervals(),
        }
    }
}

// ============================================================================
// Sensor
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorThresholds {
    /// Wind speed disagreement against references that counts as a deviation (m/s)
    #[serde(default = "default_wind_speed_deviation_threshold")]
    pub wind_speed_deviation_threshold: f64,

    /// Wind direction disagreement that raises the direction flag (degrees)
    #[serde(default = "default_wind_direction_deviation_threshold")]
    pub wind_direction_deviation_threshold: f64,

    /// References with data needed before an aggregate is trusted
    #[serde(default = "default_min_reference_count")]
    pub min_reference_count: usize,
}

fn default_wind_speed_deviation_threshold() -> f64 {
    2.0
}
fn default_wind_direction_deviation_threshold() -> f64 {
    30.0
}
fn default_min_reference_count() -> usize {
    1
}

impl Default for SensorThresholds {
    fn default() -> Self {
        Self {
            wind_speed_deviation_threshold: default_wind_speed_deviation_threshold(),
            wind_direction_deviation_threshold: default_wind_direction_deviation_threshold(),
            min_reference_count: default_min_reference_count(),
        }
    }
}

// ============================================================================
// Adjacency
// ============================================================================

/// Reference selection for stations that have no layout position.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AdjacencyFallback {
    /// No turbine references (metmasts may still apply)
    #[default]
    None,
    /// Every other turbine in the dataset, by station id, up to the cap
    AllTurbines,
    /// Turbines whose numeric id is close to the station's own
    NumericId,
}

impl std::fmt::Display for AdjacencyFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::AllTurbines => write!(f, "all_turbines"),
            Self::NumericId => write!(f, "numeric_id"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjacencyConfig {
    /// Maximum references kept per station
    #[serde(default = "default_max_adjacent_turbines")]
    pub max_adjacent_turbines: usize,

    /// References further away than this are ignored (meters)
    #[serde(default = "default_distance_threshold_m")]
    pub distance_threshold_m: f64,

    /// Reference selection when a station has no coordinates
    #[serde(default)]
    pub fallback: AdjacencyFallback,

    /// Add metmasts without layout coordinates to every reference set
    #[serde(default = "default_include_unlocated_metmasts")]
    pub include_unlocated_metmasts: bool,
}

fn default_max_adjacent_turbines() -> usize {
    5
}
fn default_distance_threshold_m() -> f64 {
    1000.0
}
fn default_include_unlocated_metmasts() -> bool {
    true
}

impl Default for AdjacencyConfig {
    fn default() -> Self {
        Self {
            max_adjacent_turbines: default_max_adjacent_turbines(),
            distance_threshold_m: default_distance_threshold_m(),
            fallback: AdjacencyFallback::default(),
            include_unlocated_metmasts: default_include_unlocated_metmasts(),
        }
    }
}

// ============================================================================
// Analysis
// ============================================================================

/// Strategy used to collapse reference wind speeds into one value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AggregatorKind {
    #[default]
    Median,
    Mean,
    TrimmedMean,
}

impl std::fmt::Display for AggregatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Median => write!(f, "median"),
            Self::Mean => write!(f, "mean"),
            Self::TrimmedMean => write!(f, "trimmed_mean"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Reference aggregation strategy
    #[serde(default)]
    pub aggregator: AggregatorKind,

    /// Fraction trimmed from each end by the trimmed-mean aggregator
    #[serde(default = "default_trim_fraction")]
    pub trim_fraction: f64,

    /// SCADA grid spacing (minutes)
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,
}

fn default_trim_fraction() -> f64 {
    0.1
}
fn default_interval_minutes() -> u32 {
    10
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            aggregator: AggregatorKind::default(),
            trim_fraction: default_trim_fraction(),
            interval_minutes: default_interval_minutes(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = FarmConfig::default();
        assert!(config.validate().is_ok(), "Defaults must pass validation");
    }

    #[test]
    fn test_default_values() {
        let config = FarmConfig::default();
        let t = &config.thresholds;
        assert_eq!(t.production.production_threshold_kw, 1.0);
        assert_eq!(t.wind.cut_in_wind_speed, 3.0);
        assert_eq!(t.sensor.wind_speed_deviation_threshold, 2.0);
        assert_eq!(t.sensor.wind_direction_deviation_threshold, 30.0);
        assert_eq!(config.adjacency.max_adjacent_turbines, 5);
        assert_eq!(config.adjacency.distance_threshold_m, 1000.0);
        assert_eq!(config.adjacency.fallback, AdjacencyFallback::None);
        assert_eq!(config.analysis.aggregator, AggregatorKind::Median);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_str = r#"
[farm]
name = "Test-Farm"

[thresholds.wind]
cut_in_wind_speed = 3.5

[adjacency]
fallback = "numeric_id"
"#;
        let config = FarmConfig::from_toml_str(toml_str).expect("should parse");
        assert_eq!(config.farm.name, "Test-Farm");
        assert_eq!(config.thresholds.wind.cut_in_wind_speed, 3.5);
        assert_eq!(config.adjacency.fallback, AdjacencyFallback::NumericId);
        // Non-overridden values retain defaults
        assert_eq!(config.thresholds.production.production_threshold_kw, 1.0);
        assert_eq!(config.adjacency.max_adjacent_turbines, 5);
    }

    #[test]
    fn test_validation_catches_cut_in_outside_plausible_range() {
        let mut config = FarmConfig::default();
        config.thresholds.wind.cut_in_wind_speed = 45.0;
        let result = config.validate();
        assert!(result.is_err());
        if let Err(ConfigError::Validation(errors)) = result {
            assert!(errors.iter().any(|e| e.contains("cut_in_wind_speed")));
        }
    }

    #[test]
    fn test_validation_catches_inverted_plausible_range() {
        let mut config = FarmConfig::default();
        config.thresholds.wind.min_plausible_wind_speed = 10.0;
        config.thresholds.wind.max_plausible_wind_speed = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_catches_zero_counts() {
        let mut config = FarmConfig::default();
        config.thresholds.sensor.min_reference_count = 0;
        config.adjacency.max_adjacent_turbines = 0;
        let Err(ConfigError::Validation(errors)) = config.validate() else {
            panic!("zero counts should fail validation");
        };
        assert!(errors.iter().any(|e| e.contains("min_reference_count")));
        assert!(errors.iter().any(|e| e.contains("max_adjacent_turbines")));
    }

    #[test]
    fn test_validation_catches_nan() {
        let mut config = FarmConfig::default();
        config.thresholds.sensor.wind_speed_deviation_threshold = f64::NAN;
        let Err(ConfigError::Validation(errors)) = config.validate() else {
            panic!("NaN threshold should fail validation");
        };
        assert!(errors.iter().any(|e| e.contains("finite")));
    }

    #[test]
    fn test_validation_catches_bad_trim_fraction() {
        let mut config = FarmConfig::default();
        config.analysis.trim_fraction = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_catches_interval_off_hour_grid() {
        let mut config = FarmConfig::default();
        config.analysis.interval_minutes = 7;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_roundtrip_toml() {
        let mut original = FarmConfig::default();
        original.adjacency.fallback = AdjacencyFallback::AllTurbines;
        original.analysis.aggregator = AggregatorKind::TrimmedMean;
        let toml_str = original.to_toml().expect("serialization should work");
        let roundtripped: FarmConfig = toml::from_str(&toml_str).expect("deserialization should work");
        assert_eq!(roundtripped.adjacency.fallback, AdjacencyFallback::AllTurbines);
        assert_eq!(roundtripped.analysis.aggregator, AggregatorKind::TrimmedMean);
        assert_eq!(
            original.thresholds.wind.cut_in_wind_speed,
            roundtripped.thresholds.wind.cut_in_wind_speed
        );
    }

    #[test]
    fn test_all_sections_serialize() {
        let toml_str = FarmConfig::default().to_toml().expect("serialization should work");
        assert!(toml_str.contains("[farm]"), "Missing [farm] section");
        assert!(toml_str.contains("[thresholds.production]"), "Missing production section");
        assert!(toml_str.contains("[thresholds.wind]"), "Missing wind section");
        assert!(toml_str.contains("[thresholds.startup]"), "Missing startup section");
        assert!(toml_str.contains("[thresholds.sensor]"), "Missing sensor section");
        assert!(toml_str.contains("[adjacency]"), "Missing adjacency section");
        assert!(toml_str.contains("[analysis]"), "Missing analysis section");
    }

    #[test]
    fn test_plausible_wind() {
        let wind = WindThresholds::default();
        assert!(wind.is_plausible(Some(0.0)));
        assert!(wind.is_plausible(Some(12.5)));
        assert!(!wind.is_plausible(Some(-0.5)));
        assert!(!wind.is_plausible(Some(55.0)));
        assert!(!wind.is_plausible(Some(f64::INFINITY)));
        assert!(!wind.is_plausible(None));
    }
}
