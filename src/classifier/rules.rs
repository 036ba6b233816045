//! Classification rules, evaluated in priority order
//!
//! Each rule is a pure predicate over one row, its reference assessment and
//! the station's trailing history. The first rule returning a [`Verdict`]
//! decides the row; rows no rule claims fall back to
//! [`ReasonCode::UnknownNonProduction`].
//!
//! ## Priority
//!
//! 1. **DataMissing** - required values absent
//! 2. **Producing** - power above the production threshold
//! 3. **Alarm** - effective alarm time (outranks curtailment)
//! 4. **Curtailment** - OEM (code 2006) or grid-operator curtailment
//! 5. **LowWind** - below cut-in, confirmed or suspected by the references
//! 6. **Startup** - recovery after a non-producing interval
//! 7. **SensorError** - wind reading contradicts the references or is implausible
//! 8. **Mechanical** - wind corroborated, no production, nothing else explains it

use super::history::StationHistory;
use super::startup::{detect_startup, StartupTrigger};
use crate::config::defaults::NO_ALARM_TEXT;
use crate::config::FarmConfig;
use crate::reference::ReferenceAssessment;
use crate::types::{ReasonCode, TurbineReading};

/// Everything a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct RuleInput<'a> {
    pub reading: &'a TurbineReading,
    pub references: &'a ReferenceAssessment,
    pub history: &'a StationHistory,
    pub config: &'a FarmConfig,
}

impl RuleInput<'_> {
    /// Turbine wind speed when present and physically plausible.
    fn plausible_wind(&self) -> Option<f64> {
        let ws = self.reading.wind_speed_mean?;
        self.config.thresholds.wind.is_plausible(Some(ws)).then_some(ws)
    }

    fn cut_in(&self) -> f64 {
        self.config.thresholds.wind.cut_in_wind_speed
    }

    fn deviation_threshold(&self) -> f64 {
        self.config.thresholds.sensor.wind_speed_deviation_threshold
    }
}

/// A rule's decision for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub reason: ReasonCode,
    pub text: String,
}

impl Verdict {
    pub fn new(reason: ReasonCode, text: impl Into<String>) -> Self {
        Self {
            reason,
            text: text.into(),
        }
    }
}

/// One step of the decision list.
pub trait StateRule: Send + Sync {
    /// Rule name (e.g., "Alarm", "LowWind")
    fn name(&self) -> &'static str;

    /// `Some` when this rule decides the row.
    fn evaluate(&self, input: &RuleInput<'_>) -> Option<Verdict>;
}

/// The default rule list, highest priority first.
pub fn default_rules() -> Vec<Box<dyn StateRule>> {
    vec![
        Box::new(DataMissingRule),
        Box::new(ProducingRule),
        Box::new(AlarmRule),
        Box::new(CurtailmentRule),
        Box::new(LowWindRule),
        Box::new(StartupRule),
        Box::new(SensorErrorRule),
        Box::new(MechanicalRule),
    ]
}

/// Verdict for rows no rule claimed.
pub fn unknown_verdict(input: &RuleInput<'_>) -> Verdict {
    let wind = fmt_speed(input.reading.wind_speed_mean);
    let refs = fmt_speed(input.references.aggregate);
    let assessment = if input.references.is_sufficient() {
        format!("turbine {wind}, refs {refs} ({} refs)", input.references.count())
    } else {
        format!("turbine {wind}, references insufficient")
    };
    Verdict::new(
        ReasonCode::UnknownNonProduction,
        format!("Unknown non-production. Assessment: {assessment}"),
    )
}

fn fmt_speed(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.1} m/s"))
}

// ============================================================================
// Rules
// ============================================================================

pub struct DataMissingRule;

impl StateRule for DataMissingRule {
    fn name(&self) -> &'static str {
        "DataMissing"
    }

    fn evaluate(&self, input: &RuleInput<'_>) -> Option<Verdict> {
        let missing = input.reading.missing_fields();
        if missing.is_empty() {
            return None;
        }
        let alarm = input.reading.alarm_seconds();
        let reason = if alarm > input.config.thresholds.production.alarm_threshold_seconds {
            ReasonCode::DataMissingWithAlarm
        } else {
            ReasonCode::DataMissingNoAlarm
        };
        Some(Verdict::new(reason, format!("Missing: {}", missing.join(", "))))
    }
}

pub struct ProducingRule;

impl StateRule for ProducingRule {
    fn name(&self) -> &'static str {
        "Producing"
    }

    fn evaluate(&self, input: &RuleInput<'_>) -> Option<Verdict> {
        let power = input.reading.active_power_mean?;
        (power > input.config.thresholds.production.production_threshold_kw).then(|| {
            Verdict::new(
                ReasonCode::NormalOperation,
                format!("Producing {power:.1} kW"),
            )
        })
    }
}

pub struct AlarmRule;

impl StateRule for AlarmRule {
    fn name(&self) -> &'static str {
        "Alarm"
    }

    fn evaluate(&self, input: &RuleInput<'_>) -> Option<Verdict> {
        let seconds = input.reading.alarm_seconds();
        if seconds <= input.config.thresholds.production.alarm_threshold_seconds {
            return None;
        }
        let descriptions = input.reading.alarm_descriptions();
        let text = if descriptions.is_empty() {
            NO_ALARM_TEXT.to_string()
        } else {
            descriptions.join(" | ")
        };
        Some(Verdict::new(
            ReasonCode::AlarmActive,
            format!("Active alarm: {seconds:.0}s - {text}"),
        ))
    }
}

pub struct CurtailmentRule;

impl StateRule for CurtailmentRule {
    fn name(&self) -> &'static str {
        "Curtailment"
    }

    fn evaluate(&self, input: &RuleInput<'_>) -> Option<Verdict> {
        let limit = input.config.thresholds.production.curtailment_threshold_seconds;
        let external = input.reading.external_curtailment();
        let internal = input.reading.internal_curtailment();
        let text = match (external > limit, internal > limit) {
            (true, true) => format!(
                "External curtailment {external:.0}s and internal (OEM) curtailment {internal:.0}s active"
            ),
            (true, false) => format!("External curtailment active: {external:.0}s"),
            (false, true) => format!("Internal (OEM) curtailment active: {internal:.0}s"),
            (false, false) => return None,
        };
        Some(Verdict::new(ReasonCode::CurtailmentActive, text))
    }
}

pub struct LowWindRule;

impl StateRule for LowWindRule {
    fn name(&self) -> &'static str {
        "LowWind"
    }

    fn evaluate(&self, input: &RuleInput<'_>) -> Option<Verdict> {
        let ws = input.plausible_wind()?;
        let cut_in = input.cut_in();
        if ws >= cut_in {
            return None;
        }

        let Some(reference) = input.references.trusted_aggregate() else {
            return Some(Verdict::new(
                ReasonCode::SuspectedLowWind,
                format!(
                    "Low wind: Turbine {ws:.1} m/s, references insufficient ({} with data)",
                    input.references.count()
                ),
            ));
        };

        let threshold = input.deviation_threshold();
        let diff = reference - ws;
        if reference < cut_in && diff.abs() <= threshold {
            return Some(Verdict::new(
                ReasonCode::ConfirmedLowWind,
                format!("Low wind: Turbine {ws:.1} m/s, refs {reference:.1} m/s. Sensor consistent."),
            ));
        }
        if reference >= cut_in && diff > threshold {
            // Sufficient wind at the references: a sensor problem, not low wind
            return None;
        }
        Some(Verdict::new(
            ReasonCode::SuspectedLowWind,
            format!("Low wind: Turbine {ws:.1} m/s, refs {reference:.1} m/s. Inconclusive."),
        ))
    }
}

pub struct StartupRule;

impl StateRule for StartupRule {
    fn name(&self) -> &'static str {
        "Startup"
    }

    fn evaluate(&self, input: &RuleInput<'_>) -> Option<Verdict> {
        let previous_non_producing = input
            .history
            .last()
            .is_some_and(|e| e.state.is_non_producing());
        if !previous_non_producing {
            return None;
        }
        let ws = input.plausible_wind()?;
        if ws < input.cut_in() {
            return None;
        }

        let trigger = detect_startup(input.reading, input.history, input.config);
        let text = match trigger {
            StartupTrigger::PostAlarm { minutes } => format!("Startup: {minutes} min after alarm"),
            StartupTrigger::PostLowWind { minutes } => format!("Startup: {minutes} min after low wind"),
            StartupTrigger::Unclear => format!("Startup: trigger unclear, wind {ws:.1} m/s"),
            StartupTrigger::None => return None,
        };
        trigger.reason_code().map(|reason| Verdict::new(reason, text))
    }
}

pub struct SensorErrorRule;

impl StateRule for SensorErrorRule {
    fn name(&self) -> &'static str {
        "SensorError"
    }

    fn evaluate(&self, input: &RuleInput<'_>) -> Option<Verdict> {
        let Some(ws) = input.plausible_wind() else {
            let shown = fmt_speed(input.reading.wind_speed_mean);
            return Some(Verdict::new(
                ReasonCode::SensorErrorAnomalous,
                format!("Sensor error (anomalous): wind reading {shown} missing or implausible"),
            ));
        };

        let reference = input.references.trusted_aggregate()?;
        let threshold = input.deviation_threshold();
        let cut_in = input.cut_in();

        if reference >= cut_in && ws <= cut_in && reference - ws > threshold {
            return Some(Verdict::new(
                ReasonCode::SensorErrorLow,
                format!("Sensor error (low): Turbine {ws:.1} vs refs {reference:.1}."),
            ));
        }
        if ws - reference > threshold {
            return Some(Verdict::new(
                ReasonCode::SensorErrorAnomalous,
                format!("Sensor error (anomalous high): Turbine {ws:.1} vs refs {reference:.1}."),
            ));
        }
        None
    }
}

pub struct MechanicalRule;

impl StateRule for MechanicalRule {
    fn name(&self) -> &'static str {
        "Mechanical"
    }

    fn evaluate(&self, input: &RuleInput<'_>) -> Option<Verdict> {
        let ws = input.plausible_wind()?;
        let reference = input.references.trusted_aggregate()?;
        let cut_in = input.cut_in();
        if ws < cut_in || reference < cut_in {
            return None;
        }
        Some(Verdict::new(
            ReasonCode::MechanicalOrControlIssue,
            format!(
                "Not producing despite sufficient wind: Turbine {ws:.1} m/s, refs {reference:.1} m/s ({} refs)",
                input.references.count()
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ScadaDataset;
    use crate::reference::{MedianAggregator, ReferenceContext};
    use crate::types::ReferenceId;
    use chrono::{NaiveDate, NaiveDateTime};

    fn ts() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn idle(wind: Option<f64>) -> TurbineReading {
        let mut r = TurbineReading::new("T1", ts());
        r.active_power_mean = Some(0.5);
        r.wind_speed_mean = wind;
        r
    }

    /// Assessment with the given reference wind speeds, read through a dataset.
    fn assessment(reading: &TurbineReading, refs: &[f64], config: &FarmConfig) -> ReferenceAssessment {
        let mut rows = vec![reading.clone()];
        let mut ids = Vec::new();
        for (i, ws) in refs.iter().enumerate() {
            let id = format!("R{i}");
            let mut r = TurbineReading::new(id.as_str(), ts());
            r.active_power_mean = Some(100.0);
            r.wind_speed_mean = Some(*ws);
            rows.push(r);
            ids.push(ReferenceId::Turbine(id));
        }
        let dataset = ScadaDataset::from_readings(rows, 10);
        ReferenceContext::new(&dataset, &MedianAggregator, config).assess(&ids, reading)
    }

    fn first_verdict(reading: &TurbineReading, refs: &[f64]) -> Option<(&'static str, Verdict)> {
        let config = FarmConfig::default();
        let references = assessment(reading, refs, &config);
        let history = StationHistory::new(6);
        let input = RuleInput {
            reading,
            references: &references,
            history: &history,
            config: &config,
        };
        default_rules()
            .iter()
            .find_map(|rule| rule.evaluate(&input).map(|v| (rule.name(), v)))
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let names: Vec<&str> = default_rules().iter().map(|r| r.name()).collect();
        assert_eq!(
            names,
            vec![
                "DataMissing",
                "Producing",
                "Alarm",
                "Curtailment",
                "LowWind",
                "Startup",
                "SensorError",
                "Mechanical"
            ]
        );
    }

    #[test]
    fn test_confirmed_low_wind() {
        let (rule, verdict) = first_verdict(&idle(Some(1.0)), &[1.2]).unwrap();
        assert_eq!(rule, "LowWind");
        assert_eq!(verdict.reason, ReasonCode::ConfirmedLowWind);
        assert!(verdict.text.contains("Sensor consistent"));
    }

    #[test]
    fn test_low_reading_against_windy_refs_is_sensor_error() {
        let (rule, verdict) = first_verdict(&idle(Some(1.0)), &[6.0]).unwrap();
        assert_eq!(rule, "SensorError");
        assert_eq!(verdict.reason, ReasonCode::SensorErrorLow);
    }

    #[test]
    fn test_low_wind_without_references_is_suspected() {
        let (_, verdict) = first_verdict(&idle(Some(1.0)), &[]).unwrap();
        assert_eq!(verdict.reason, ReasonCode::SuspectedLowWind);
        assert!(verdict.text.contains("insufficient"));
    }

    #[test]
    fn test_low_wind_inconclusive_refs_are_suspected() {
        // Refs above cut-in but within the threshold
        let (_, verdict) = first_verdict(&idle(Some(2.5)), &[3.5]).unwrap();
        assert_eq!(verdict.reason, ReasonCode::SuspectedLowWind);
        // Refs below cut-in but disagreeing by more than the threshold
        let (_, verdict) = first_verdict(&idle(Some(0.2)), &[2.9]).unwrap();
        assert_eq!(verdict.reason, ReasonCode::SuspectedLowWind);
    }

    #[test]
    fn test_high_reading_against_calm_refs_is_anomalous() {
        let (_, verdict) = first_verdict(&idle(Some(9.0)), &[4.0]).unwrap();
        assert_eq!(verdict.reason, ReasonCode::SensorErrorAnomalous);
        assert!(verdict.text.contains("high"));
    }

    #[test]
    fn test_implausible_wind_is_anomalous() {
        for wind in [Some(-3.0), Some(85.0), None] {
            let (_, verdict) = first_verdict(&idle(wind), &[5.0]).unwrap();
            assert_eq!(verdict.reason, ReasonCode::SensorErrorAnomalous, "wind {wind:?}");
        }
    }

    #[test]
    fn test_corroborated_wind_without_power_is_mechanical() {
        let (rule, verdict) = first_verdict(&idle(Some(7.0)), &[7.4, 6.8]).unwrap();
        assert_eq!(rule, "Mechanical");
        assert_eq!(verdict.reason, ReasonCode::MechanicalOrControlIssue);
    }

    #[test]
    fn test_uncorroborated_wind_is_unclaimed() {
        assert!(first_verdict(&idle(Some(7.0)), &[]).is_none());
    }

    #[test]
    fn test_alarm_outranks_curtailment() {
        let mut reading = idle(Some(7.0));
        reading.effective_alarm_seconds = Some(600.0);
        reading.external_curtailment_seconds = Some(600.0);
        reading.alarm_text = Some("Pitch fault|Yaw error".into());
        let (_, verdict) = first_verdict(&reading, &[7.0]).unwrap();
        assert_eq!(verdict.reason, ReasonCode::AlarmActive);
        assert_eq!(verdict.text, "Active alarm: 600s - Pitch fault | Yaw error");
    }

    #[test]
    fn test_alarm_without_text() {
        let mut reading = idle(Some(7.0));
        reading.effective_alarm_seconds = Some(120.0);
        let (_, verdict) = first_verdict(&reading, &[]).unwrap();
        assert_eq!(verdict.text, "Active alarm: 120s - N/A");
    }

    #[test]
    fn test_internal_curtailment() {
        let mut reading = idle(Some(7.0));
        reading.internal_curtailment_seconds = Some(300.0);
        let (_, verdict) = first_verdict(&reading, &[7.0]).unwrap();
        assert_eq!(verdict.reason, ReasonCode::CurtailmentActive);
        assert!(verdict.text.contains("Internal (OEM)"));
    }

    #[test]
    fn test_missing_power_with_alarm() {
        let mut reading = idle(Some(7.0));
        reading.active_power_mean = None;
        reading.effective_alarm_seconds = Some(60.0);
        let (_, verdict) = first_verdict(&reading, &[7.0]).unwrap();
        assert_eq!(verdict.reason, ReasonCode::DataMissingWithAlarm);
    }

    #[test]
    fn test_unknown_verdict_text() {
        let config = FarmConfig::default();
        let reading = idle(Some(7.0));
        let references = assessment(&reading, &[], &config);
        let history = StationHistory::new(6);
        let input = RuleInput {
            reading: &reading,
            references: &references,
            history: &history,
            config: &config,
        };
        let verdict = unknown_verdict(&input);
        assert_eq!(verdict.reason, ReasonCode::UnknownNonProduction);
        assert!(verdict.text.starts_with("Unknown non-production. Assessment:"));
    }
}
