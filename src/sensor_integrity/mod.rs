//! Wind Sensor Integrity Analyzer
//!
//! Compares one turbine's nacelle anemometer against its references over a
//! time window. Each timestamp yields a [`SensorDeviationSample`]:
//!
//! - reference aggregate through the configured [`Aggregator`]
//! - `deviation = target - aggregate`, bucketed into a [`Severity`]
//! - circular direction difference against the reference mean direction
//!
//! Timestamps with too few references are marked
//! [`SampleStatus::InsufficientReference`] and never counted as anomalies.
//! Target readings outside the plausible range are still evaluated; only an
//! absent target value yields [`SampleStatus::TargetMissing`].
//! The analysis is a pure function of its inputs.

use statrs::statistics::Statistics;
use tracing::{debug, info};

use crate::config::defaults::{FULL_CIRCLE_DEG, HALF_CIRCLE_DEG};
use crate::config::FarmConfig;
use crate::dataset::ScadaDataset;
use crate::reference::{Aggregator, ReferenceContext};
use crate::types::{
    ReferenceId, SampleStatus, SensorDeviationSample, SensorIntegrityReport, SensorIntegritySummary,
    Severity, TimeRange, TurbineReading,
};

/// Signed smallest angle from `reference` to `target`, in [-180, 180].
pub fn circular_difference_deg(target: f64, reference: f64) -> f64 {
    let diff = (target - reference).rem_euclid(FULL_CIRCLE_DEG);
    if diff > HALF_CIRCLE_DEG {
        diff - FULL_CIRCLE_DEG
    } else {
        diff
    }
}

/// Analyzer bound to one dataset snapshot, aggregator and configuration.
#[derive(Debug, Clone, Copy)]
pub struct SensorIntegrityAnalyzer<'a> {
    references: ReferenceContext<'a>,
    config: &'a FarmConfig,
}

impl<'a> SensorIntegrityAnalyzer<'a> {
    pub fn new(dataset: &'a ScadaDataset, aggregator: &'a dyn Aggregator, config: &'a FarmConfig) -> Self {
        Self {
            references: ReferenceContext::new(dataset, aggregator, config),
            config,
        }
    }

    /// Analyze `target_id` against `references` over `time_range`
    /// (inclusive; `None` covers the whole dataset).
    pub fn analyze(
        &self,
        target_id: &str,
        references: &[ReferenceId],
        time_range: Option<TimeRange>,
    ) -> SensorIntegrityReport {
        let rows = self
            .references
            .dataset
            .station_rows_in(target_id, time_range.as_ref());
        let samples: Vec<SensorDeviationSample> = rows
            .iter()
            .map(|row| self.sample(row, references))
            .collect();
        let summary = summarize(&samples);

        info!(
            target = target_id,
            references = references.len(),
            samples = summary.sample_count,
            evaluated = summary.evaluated_count,
            anomalies = summary.anomaly_count,
            "Sensor integrity analysis complete"
        );

        SensorIntegrityReport {
            target_id: target_id.to_string(),
            references: references.to_vec(),
            aggregator: self.references.aggregator.name().to_string(),
            time_range,
            samples,
            summary,
        }
    }

    /// One target row against its references.
    pub fn sample(&self, target: &TurbineReading, references: &[ReferenceId]) -> SensorDeviationSample {
        let sensor = &self.config.thresholds.sensor;
        let assessment = self.references.assess(references, target);
        let target_ws = target.wind_speed_mean.filter(|ws| ws.is_finite());

        let mut sample = SensorDeviationSample {
            timestamp: target.timestamp,
            target_wind_speed: target.wind_speed_mean,
            reference_aggregate_wind_speed: assessment.aggregate,
            reference_count: assessment.count(),
            deviation: None,
            anomaly_flag: false,
            severity: Severity::None,
            status: SampleStatus::Evaluated,
            direction_deviation: None,
            direction_flag: false,
        };

        let Some(target_ws) = target_ws else {
            sample.status = SampleStatus::TargetMissing;
            return sample;
        };
        let Some(reference) = assessment.trusted_aggregate() else {
            debug!(
                target = %target.station_id,
                timestamp = %target.timestamp,
                with_data = assessment.count(),
                "Insufficient references"
            );
            sample.status = SampleStatus::InsufficientReference;
            return sample;
        };

        let deviation = target_ws - reference;
        sample.deviation = Some(deviation);
        sample.severity = Severity::from_deviation(deviation, sensor.wind_speed_deviation_threshold);
        sample.anomaly_flag = sample.severity != Severity::None;

        let target_dir = target.wind_direction_mean.filter(|d| d.is_finite());
        if let (Some(dir), Some(ref_dir)) = (target_dir, self.references.direction(references, target)) {
            let diff = circular_difference_deg(dir, ref_dir);
            sample.direction_deviation = Some(diff);
            sample.direction_flag = diff.abs() > sensor.wind_direction_deviation_threshold;
        }
        sample
    }
}

/// Counts and deviation statistics over a run's samples.
pub fn summarize(samples: &[SensorDeviationSample]) -> SensorIntegritySummary {
    let mut summary = SensorIntegritySummary {
        sample_count: samples.len(),
        ..SensorIntegritySummary::default()
    };

    let mut deviations = Vec::with_capacity(samples.len());
    for sample in samples {
        match sample.status {
            SampleStatus::Evaluated => summary.evaluated_count += 1,
            SampleStatus::InsufficientReference => summary.insufficient_reference_count += 1,
            SampleStatus::TargetMissing => summary.target_missing_count += 1,
        }
        if sample.anomaly_flag {
            summary.anomaly_count += 1;
        }
        match sample.severity {
            Severity::None => {}
            Severity::Low => summary.low_count += 1,
            Severity::Moderate => summary.moderate_count += 1,
            Severity::High => summary.high_count += 1,
        }
        if sample.direction_flag {
            summary.direction_flag_count += 1;
        }
        if let Some(d) = sample.deviation {
            deviations.push(d);
        }
    }

    if !deviations.is_empty() {
        let absolute: Vec<f64> = deviations.iter().map(|d| d.abs()).collect();
        summary.mean_deviation = Some(deviations.iter().mean());
        summary.mean_absolute_deviation = Some(absolute.iter().mean());
        summary.max_absolute_deviation = Some(Statistics::max(absolute.iter()));
        if deviations.len() > 1 {
            summary.deviation_std_dev = Some(deviations.iter().std_dev());
        }
    }
    summary
}
