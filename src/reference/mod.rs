//! Reference wind assessment
//!
//! Shared by the state classifier (low-wind confirmation, sensor-error and
//! mechanical rules) and by the sensor integrity analyzer:
//!
//! - [`Aggregator`]: collapses reference wind speeds into one value
//!   (median by default, mean or trimmed mean by config)
//! - [`ReferenceSet`]: which turbines and metmasts a station is checked against
//! - [`ReferenceContext`]: reads those references at one timestamp and
//!   decides whether there are enough of them

use regex::Regex;
use statrs::statistics::{Data, Median, Statistics};
use std::sync::OnceLock;
use tracing::debug;

use crate::config::defaults::FULL_CIRCLE_DEG;
use crate::config::{AdjacencyConfig, AdjacencyFallback, AggregatorKind, FarmConfig, WindThresholds};
use crate::dataset::ScadaDataset;
use crate::types::{AdjacencyMap, Layout, ReferenceId, TurbineReading};

// ============================================================================
// Aggregators
// ============================================================================

/// Strategy for collapsing reference wind speeds into one value.
pub trait Aggregator: Send + Sync + std::fmt::Debug {
    /// Name used in reports (e.g., "median")
    fn name(&self) -> &'static str;

    /// Aggregate finite values; `None` for an empty slice.
    fn aggregate(&self, values: &[f64]) -> Option<f64>;
}

/// Median of the references; one broken sensor cannot drag it.
#[derive(Debug, Clone, Copy, Default)]
pub struct MedianAggregator;

impl Aggregator for MedianAggregator {
    fn name(&self) -> &'static str {
        "median"
    }

    fn aggregate(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(Data::new(values.to_vec()).median())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MeanAggregator;

impl Aggregator for MeanAggregator {
    fn name(&self) -> &'static str {
        "mean"
    }

    fn aggregate(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(values.iter().mean())
    }
}

/// Mean after dropping `fraction` of the values from each end.
///
/// Falls back to the median when trimming would leave nothing.
#[derive(Debug, Clone, Copy)]
pub struct TrimmedMeanAggregator {
    pub fraction: f64,
}

impl Aggregator for TrimmedMeanAggregator {
    fn name(&self) -> &'static str {
        "trimmed_mean"
    }

    fn aggregate(&self, values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let cut = (sorted.len() as f64 * self.fraction.clamp(0.0, 0.5)).floor() as usize;
        let kept = &sorted[cut..sorted.len() - cut];
        if kept.is_empty() {
            return MedianAggregator.aggregate(values);
        }
        Some(kept.iter().mean())
    }
}

/// Build the aggregator selected in `[analysis]`.
pub fn aggregator_for(kind: AggregatorKind, trim_fraction: f64) -> Box<dyn Aggregator> {
    match kind {
        AggregatorKind::Median => Box::new(MedianAggregator),
        AggregatorKind::Mean => Box::new(MeanAggregator),
        AggregatorKind::TrimmedMean => Box::new(TrimmedMeanAggregator {
            fraction: trim_fraction,
        }),
    }
}

// ============================================================================
// Reference Set
// ============================================================================

/// The references a station's wind reading is compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceSet {
    pub station_id: String,
    pub references: Vec<ReferenceId>,
}

impl ReferenceSet {
    /// A caller-chosen reference set.
    pub fn explicit(station_id: impl Into<String>, references: Vec<ReferenceId>) -> Self {
        Self {
            station_id: station_id.into(),
            references,
        }
    }

    /// Default references of a station.
    ///
    /// Geometric adjacency first. A station without a layout position uses
    /// the configured fallback instead. With `include_unlocated_metmasts`,
    /// every metmast in the dataset that has no layout position is appended.
    pub fn for_station(
        station_id: &str,
        adjacency: &AdjacencyMap,
        layout: Option<&Layout>,
        dataset: &ScadaDataset,
        config: &AdjacencyConfig,
    ) -> Self {
        let mut references: Vec<ReferenceId> = adjacency
            .get(station_id)
            .map(|entry| entry.reference_ids().collect())
            .unwrap_or_default();

        let located = layout.is_some_and(|l| l.turbine(station_id).is_some());
        if !located {
            references.extend(fallback_turbines(station_id, dataset, config));
        }

        if config.include_unlocated_metmasts {
            for metmast in dataset.metmast_ids() {
                let has_position = layout.is_some_and(|l| l.has_metmast(metmast));
                let id = ReferenceId::Metmast(metmast.clone());
                if !has_position && !references.contains(&id) {
                    references.push(id);
                }
            }
        }

        Self {
            station_id: station_id.to_string(),
            references,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }
}

fn fallback_turbines(station_id: &str, dataset: &ScadaDataset, config: &AdjacencyConfig) -> Vec<ReferenceId> {
    let others = dataset.stations().filter(|s| *s != station_id);
    let chosen: Vec<&str> = match config.fallback {
        AdjacencyFallback::None => Vec::new(),
        AdjacencyFallback::AllTurbines => others.take(config.max_adjacent_turbines).collect(),
        AdjacencyFallback::NumericId => {
            let Some(own) = numeric_id(station_id) else {
                debug!(station = station_id, "No numeric part in station id, no fallback references");
                return Vec::new();
            };
            let max_gap = config.max_adjacent_turbines as u64;
            let mut close: Vec<(u64, &str)> = others
                .filter_map(|s| numeric_id(s).map(|n| (n.abs_diff(own), s)))
                .filter(|(gap, _)| *gap <= max_gap)
                .collect();
            close.sort_unstable();
            close
                .into_iter()
                .take(config.max_adjacent_turbines)
                .map(|(_, s)| s)
                .collect()
        }
    };
    chosen
        .into_iter()
        .map(|s| ReferenceId::Turbine(s.to_string()))
        .collect()
}

/// First run of digits in a station id (`WTG_012` is 12).
fn numeric_id(station_id: &str) -> Option<u64> {
    static DIGITS: OnceLock<Option<Regex>> = OnceLock::new();
    let re = DIGITS.get_or_init(|| Regex::new(r"\d+").ok()).as_ref()?;
    re.find(station_id)?.as_str().parse().ok()
}

// ============================================================================
// Reference Assessment
// ============================================================================

/// Reference wind at one timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceAssessment {
    /// References that had a plausible reading, with that reading (m/s)
    pub wind_speeds: Vec<(ReferenceId, f64)>,
    pub aggregate: Option<f64>,
    sufficient: bool,
}

impl ReferenceAssessment {
    pub fn count(&self) -> usize {
        self.wind_speeds.len()
    }

    /// Enough references had data to trust the aggregate.
    pub fn is_sufficient(&self) -> bool {
        self.sufficient && self.aggregate.is_some()
    }

    /// The aggregate, only when it can be trusted.
    pub fn trusted_aggregate(&self) -> Option<f64> {
        self.aggregate.filter(|_| self.is_sufficient())
    }
}

/// Read-only view used to assess references against the dataset.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceContext<'a> {
    pub dataset: &'a ScadaDataset,
    pub aggregator: &'a dyn Aggregator,
    pub wind: &'a WindThresholds,
    pub min_reference_count: usize,
}

impl<'a> ReferenceContext<'a> {
    pub fn new(dataset: &'a ScadaDataset, aggregator: &'a dyn Aggregator, config: &'a FarmConfig) -> Self {
        Self {
            dataset,
            aggregator,
            wind: &config.thresholds.wind,
            min_reference_count: config.thresholds.sensor.min_reference_count,
        }
    }

    /// Reference wind speeds at the target row's timestamp.
    ///
    /// Turbine references are read from their own rows; metmast values come
    /// from the target row. Missing or implausible readings are left out.
    pub fn assess(&self, references: &[ReferenceId], target: &TurbineReading) -> ReferenceAssessment {
        let wind_speeds: Vec<(ReferenceId, f64)> = references
            .iter()
            .filter_map(|r| self.wind_speed(r, target).map(|ws| (r.clone(), ws)))
            .collect();
        let values: Vec<f64> = wind_speeds.iter().map(|(_, ws)| *ws).collect();
        let aggregate = self.aggregator.aggregate(&values);
        ReferenceAssessment {
            sufficient: values.len() >= self.min_reference_count.max(1),
            wind_speeds,
            aggregate,
        }
    }

    /// Circular mean of the reference wind directions, degrees in [0, 360).
    pub fn direction(&self, references: &[ReferenceId], target: &TurbineReading) -> Option<f64> {
        let directions: Vec<f64> = references
            .iter()
            .filter_map(|r| self.wind_direction(r, target))
            .collect();
        circular_mean_deg(&directions)
    }

    fn wind_speed(&self, reference: &ReferenceId, target: &TurbineReading) -> Option<f64> {
        let value = match reference {
            ReferenceId::Turbine(id) => self
                .dataset
                .reading(id, target.timestamp)
                .and_then(|r| r.wind_speed_mean),
            ReferenceId::Metmast(id) => target.metmast_wind_speed.get(id).copied(),
        };
        value.filter(|ws| self.wind.is_plausible(Some(*ws)))
    }

    fn wind_direction(&self, reference: &ReferenceId, target: &TurbineReading) -> Option<f64> {
        let value = match reference {
            ReferenceId::Turbine(id) => self
                .dataset
                .reading(id, target.timestamp)
                .and_then(|r| r.wind_direction_mean),
            ReferenceId::Metmast(id) => target.metmast_wind_direction.get(id).copied(),
        };
        value.filter(|d| d.is_finite())
    }
}

/// Mean direction of a set of angles in degrees; `None` when empty or when
/// the angles cancel out.
pub fn circular_mean_deg(directions: &[f64]) -> Option<f64> {
    if directions.is_empty() {
        return None;
    }
    let (sin_sum, cos_sum) = directions.iter().fold((0.0_f64, 0.0_f64), |(s, c), d| {
        let rad = d.to_radians();
        (s + rad.sin(), c + rad.cos())
    });
    if sin_sum.hypot(cos_sum) < 1e-9 {
        return None;
    }
    Some(sin_sum.atan2(cos_sum).to_degrees().rem_euclid(FULL_CIRCLE_DEG))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adjacency::resolve_adjacency;
    use crate::types::{MetmastLocation, TurbineLocation};
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn reading(station: &str, wind: Option<f64>) -> TurbineReading {
        let mut r = TurbineReading::new(station, ts());
        r.active_power_mean = Some(0.0);
        r.wind_speed_mean = wind;
        r
    }

    fn dataset(rows: Vec<TurbineReading>) -> ScadaDataset {
        ScadaDataset::from_readings(rows, 10)
    }

    #[test]
    fn test_median_resists_outlier() {
        let median = MedianAggregator.aggregate(&[5.0, 5.5, 60.0]).unwrap();
        assert!((median - 5.5).abs() < 1e-9);
        let mean = MeanAggregator.aggregate(&[5.0, 5.5, 60.0]).unwrap();
        assert!(mean > 20.0);
        assert_eq!(MedianAggregator.aggregate(&[]), None);
    }

    #[test]
    fn test_median_even_count_averages_middle() {
        let median = MedianAggregator.aggregate(&[1.0, 4.0, 2.0, 3.0]).unwrap();
        assert!((median - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_trimmed_mean() {
        let agg = TrimmedMeanAggregator { fraction: 0.2 };
        // 5 values, cut 1 each side: mean of 2, 3, 4
        let v = agg.aggregate(&[100.0, 3.0, 2.0, 4.0, -50.0]).unwrap();
        assert!((v - 3.0).abs() < 1e-9);
        assert_eq!(agg.name(), "trimmed_mean");
    }

    #[test]
    fn test_aggregator_for_kind() {
        assert_eq!(aggregator_for(AggregatorKind::Median, 0.1).name(), "median");
        assert_eq!(aggregator_for(AggregatorKind::Mean, 0.1).name(), "mean");
        assert_eq!(aggregator_for(AggregatorKind::TrimmedMean, 0.1).name(), "trimmed_mean");
    }

    #[test]
    fn test_assess_collects_turbines_and_metmasts() {
        let mut target = reading("T1", Some(1.0));
        target.metmast_wind_speed.insert("38".into(), 1.4);
        let ds = dataset(vec![
            target.clone(),
            reading("T2", Some(1.2)),
            reading("T3", None),
            reading("T4", Some(-7.0)),
        ]);
        let config = FarmConfig::default();
        let ctx = ReferenceContext::new(&ds, &MedianAggregator, &config);
        let refs = vec![
            ReferenceId::Turbine("T2".into()),
            ReferenceId::Turbine("T3".into()),
            ReferenceId::Turbine("T4".into()),
            ReferenceId::Metmast("38".into()),
        ];
        let a = ctx.assess(&refs, &target);
        assert_eq!(a.count(), 2, "missing and implausible readings are excluded");
        assert!(a.is_sufficient());
        assert!((a.aggregate.unwrap() - 1.3).abs() < 1e-9);
    }

    #[test]
    fn test_insufficient_when_below_minimum() {
        let target = reading("T1", Some(1.0));
        let ds = dataset(vec![target.clone(), reading("T2", Some(1.2))]);
        let mut config = FarmConfig::default();
        config.thresholds.sensor.min_reference_count = 2;
        let ctx = ReferenceContext::new(&ds, &MedianAggregator, &config);
        let a = ctx.assess(&[ReferenceId::Turbine("T2".into())], &target);
        assert_eq!(a.count(), 1);
        assert!(!a.is_sufficient());
        assert_eq!(a.trusted_aggregate(), None);
    }

    #[test]
    fn test_reference_set_from_layout_plus_unlocated_metmast() {
        let mut target = reading("T1", Some(5.0));
        target.metmast_wind_speed.insert("38".into(), 5.0);
        target.metmast_wind_speed.insert("39".into(), 5.0);
        let ds = dataset(vec![target, reading("T2", Some(5.0))]);
        let layout = Layout::new(
            vec![
                TurbineLocation { station_id: "T1".into(), x: 0.0, y: 0.0 },
                TurbineLocation { station_id: "T2".into(), x: 300.0, y: 0.0 },
            ],
            vec![MetmastLocation { metmast_id: "38".into(), x: 5000.0, y: 0.0 }],
        );
        let config = AdjacencyConfig::default();
        let adjacency = resolve_adjacency(Some(&layout), ds.stations(), &config);
        let set = ReferenceSet::for_station("T1", &adjacency, Some(&layout), &ds, &config);
        // 38 is located but out of range; 39 has no position and is always consulted
        assert_eq!(
            set.references,
            vec![ReferenceId::Turbine("T2".into()), ReferenceId::Metmast("39".into())]
        );
    }

    #[test]
    fn test_numeric_id_fallback() {
        let rows = ["WTG_001", "WTG_002", "WTG_003", "WTG_009", "WTG_020"]
            .iter()
            .map(|s| reading(s, Some(5.0)))
            .collect();
        let ds = dataset(rows);
        let config = AdjacencyConfig {
            fallback: AdjacencyFallback::NumericId,
            ..AdjacencyConfig::default()
        };
        let adjacency = resolve_adjacency(None, ds.stations(), &config);
        let set = ReferenceSet::for_station("WTG_003", &adjacency, None, &ds, &config);
        assert_eq!(
            set.references,
            vec![
                ReferenceId::Turbine("WTG_002".into()),
                ReferenceId::Turbine("WTG_001".into()),
            ]
        );
    }

    #[test]
    fn test_no_fallback_by_default() {
        let ds = dataset(vec![reading("T1", Some(5.0)), reading("T2", Some(5.0))]);
        let config = AdjacencyConfig::default();
        let adjacency = resolve_adjacency(None, ds.stations(), &config);
        assert!(ReferenceSet::for_station("T1", &adjacency, None, &ds, &config).is_empty());

        let all = AdjacencyConfig {
            fallback: AdjacencyFallback::AllTurbines,
            ..AdjacencyConfig::default()
        };
        let set = ReferenceSet::for_station("T1", &adjacency, None, &ds, &all);
        assert_eq!(set.references, vec![ReferenceId::Turbine("T2".into())]);
    }

    #[test]
    fn test_circular_mean_wraps_north() {
        let mean = circular_mean_deg(&[350.0, 10.0]).unwrap();
        assert!(mean < 1e-6 || (FULL_CIRCLE_DEG - mean) < 1e-6, "got {mean}");
        let east = circular_mean_deg(&[80.0, 100.0]).unwrap();
        assert!((east - 90.0).abs() < 1e-9);
        assert_eq!(circular_mean_deg(&[0.0, 180.0]), None);
        assert_eq!(circular_mean_deg(&[]), None);
    }
}
