//! Operational State Classifier
//!
//! Assigns every (turbine, timestamp) row one [`OperationalState`] with a
//! reason code and a readable explanation. Classification runs the ordered
//! [`StateRule`] list over the row, its reference assessment, and the
//! station's bounded [`StationHistory`]; the first matching rule wins.
//!
//! The classifier owns no mutable state: the caller passes history in, and
//! a station pass builds its own history from scratch every time.

pub mod history;
pub mod rules;
pub mod startup;

pub use history::{HistoryEntry, StationHistory};
pub use rules::{default_rules, RuleInput, StateRule, Verdict};
pub use startup::{detect_startup, StartupTrigger};

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use crate::config::FarmConfig;
use crate::dataset::ScadaDataset;
use crate::reference::{Aggregator, ReferenceAssessment, ReferenceContext, ReferenceSet};
use crate::types::{ClassifiedReading, OperationalState, TurbineReading};

/// Runs the rule list over rows of one dataset snapshot.
pub struct StateClassifier<'a> {
    config: &'a FarmConfig,
    rules: Vec<Box<dyn StateRule>>,
    references: ReferenceContext<'a>,
}

impl<'a> StateClassifier<'a> {
    pub fn new(dataset: &'a ScadaDataset, aggregator: &'a dyn Aggregator, config: &'a FarmConfig) -> Self {
        Self {
            config,
            rules: default_rules(),
            references: ReferenceContext::new(dataset, aggregator, config),
        }
    }

    /// Replace the rule list (first match still wins).
    #[must_use]
    pub fn with_rules(mut self, rules: Vec<Box<dyn StateRule>>) -> Self {
        self.rules = rules;
        self
    }

    /// Names of the active rules in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Classify one row given an already computed reference assessment.
    pub fn evaluate(
        &self,
        reading: &TurbineReading,
        references: &ReferenceAssessment,
        history: &StationHistory,
    ) -> ClassifiedReading {
        let input = RuleInput {
            reading,
            references,
            history,
            config: self.config,
        };
        let verdict = self
            .rules
            .iter()
            .find_map(|rule| rule.evaluate(&input))
            .unwrap_or_else(|| rules::unknown_verdict(&input));

        ClassifiedReading {
            reading: reading.clone(),
            state: verdict.reason.state(),
            reason_code: verdict.reason,
            reason_text: verdict.text,
            reference_wind_speed: references.aggregate,
            reference_count: references.count(),
        }
    }

    /// Classify one row against its reference set.
    pub fn classify(
        &self,
        reading: &TurbineReading,
        references: &ReferenceSet,
        history: &StationHistory,
    ) -> ClassifiedReading {
        let assessment = self.references.assess(&references.references, reading);
        self.evaluate(reading, &assessment, history)
    }

    /// Classify every row of one station in time order.
    pub fn classify_station(&self, references: &ReferenceSet) -> Vec<ClassifiedReading> {
        let rows = self.references.dataset.station_rows(&references.station_id);
        let mut history = StationHistory::new(self.config.thresholds.startup.history_window_rows);
        let mut out = Vec::with_capacity(rows.len());
        for reading in rows {
            let classified = self.classify(reading, references, &history);
            history.push(&classified);
            out.push(classified);
        }
        debug!(
            station = %references.station_id,
            rows = out.len(),
            references = references.len(),
            "Station classified"
        );
        out
    }

    /// Classify the whole dataset, station by station.
    ///
    /// Stations without an entry in `reference_sets` are classified with no
    /// references.
    pub fn classify_all(&self, reference_sets: &BTreeMap<String, ReferenceSet>) -> Vec<ClassifiedReading> {
        let mut out = Vec::with_capacity(self.references.dataset.len());
        for station in self.references.dataset.stations() {
            let classified = match reference_sets.get(station) {
                Some(set) => self.classify_station(set),
                None => self.classify_station(&ReferenceSet::explicit(station, Vec::new())),
            };
            out.extend(classified);
        }

        let counts = state_counts(&out);
        let count = |s: OperationalState| counts.get(&s).copied().unwrap_or(0);
        info!(
            rows = out.len(),
            producing = count(OperationalState::Producing),
            explained = count(OperationalState::NotProducingExplained),
            pending = count(OperationalState::NotProducingVerificationPending),
            unexpected = count(OperationalState::NotProducingUnexpected),
            data_missing = count(OperationalState::DataMissing),
            "Classification pass complete"
        );
        out
    }
}

/// Rows per operational state.
pub fn state_counts(classified: &[ClassifiedReading]) -> HashMap<OperationalState, usize> {
    let mut counts = HashMap::new();
    for c in classified {
        *counts.entry(c.state).or_insert(0) += 1;
    }
    counts
}
