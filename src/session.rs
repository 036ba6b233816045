//! Analysis session: the entry point for callers
//!
//! Holds the loaded dataset and layout as read-only snapshots plus the
//! per-layout adjacency cache. Every analysis call recomputes its outputs
//! from those snapshots, so concurrent callers holding an `Arc` to an
//! earlier dataset or adjacency map never see them change.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::acquisition::{load_layout_csv, load_scada_csv, DatasetError};
use crate::adjacency::AdjacencyCache;
use crate::classifier::StateClassifier;
use crate::config::FarmConfig;
use crate::dataset::ScadaDataset;
use crate::reference::{aggregator_for, Aggregator, ReferenceSet};
use crate::report::{farm_overview, AvailabilitySummary, StationOverview, TurbineReport};
use crate::sensor_integrity::SensorIntegrityAnalyzer;
use crate::types::{AdjacencyMap, ClassifiedReading, Layout, ReferenceId, SensorIntegrityReport, TimeRange};

pub struct AnalysisSession {
    dataset: Arc<ScadaDataset>,
    layout: Option<Arc<Layout>>,
    adjacency: AdjacencyCache,
    config: Arc<FarmConfig>,
    aggregator: Box<dyn Aggregator>,
}

impl AnalysisSession {
    pub fn new(dataset: ScadaDataset, layout: Option<Layout>, config: FarmConfig) -> Self {
        let adjacency = AdjacencyCache::resolve(layout.as_ref(), dataset.stations(), &config.adjacency);
        let aggregator = aggregator_for(config.analysis.aggregator, config.analysis.trim_fraction);
        info!(
            rows = dataset.len(),
            has_layout = layout.is_some(),
            aggregator = aggregator.name(),
            "Analysis session ready"
        );
        Self {
            dataset: Arc::new(dataset),
            layout: layout.map(Arc::new),
            adjacency,
            config: Arc::new(config),
            aggregator,
        }
    }

    /// Load the SCADA CSV and an optional layout CSV.
    ///
    /// Schema problems in the SCADA table are fatal. A layout that fails to
    /// load degrades to no layout.
    pub fn load(data_path: &Path, layout_path: Option<&Path>, config: FarmConfig) -> Result<Self, DatasetError> {
        let table = load_scada_csv(data_path)?;
        let dataset = ScadaDataset::from_table(table, config.analysis.interval_minutes);
        let layout = layout_path.and_then(|path| match load_layout_csv(path) {
            Ok(layout) => Some(layout),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Layout unusable, continuing without adjacency");
                None
            }
        });
        Ok(Self::new(dataset, layout, config))
    }

    /// Swap in a new layout; the adjacency is recomputed only if it changed.
    pub fn replace_layout(&mut self, layout: Option<Layout>) {
        let recomputed = self
            .adjacency
            .refresh(layout.as_ref(), self.dataset.stations(), &self.config.adjacency);
        info!(recomputed, "Layout replaced");
        self.layout = layout.map(Arc::new);
    }

    pub fn dataset(&self) -> Arc<ScadaDataset> {
        Arc::clone(&self.dataset)
    }

    pub fn layout(&self) -> Option<Arc<Layout>> {
        self.layout.clone()
    }

    pub fn config(&self) -> &FarmConfig {
        &self.config
    }

    /// Current adjacency snapshot.
    pub fn adjacency(&self) -> Arc<AdjacencyMap> {
        self.adjacency.map()
    }

    /// Default references for one station.
    pub fn reference_set(&self, station_id: &str) -> ReferenceSet {
        ReferenceSet::for_station(
            station_id,
            &self.adjacency.map(),
            self.layout.as_deref(),
            &self.dataset,
            &self.config.adjacency,
        )
    }

    fn classifier(&self) -> StateClassifier<'_> {
        StateClassifier::new(&self.dataset, self.aggregator.as_ref(), &self.config)
    }

    /// Classify every row of the dataset.
    pub fn classify(&self) -> Vec<ClassifiedReading> {
        let sets: BTreeMap<String, ReferenceSet> = self
            .dataset
            .stations()
            .map(|s| (s.to_string(), self.reference_set(s)))
            .collect();
        self.classifier().classify_all(&sets)
    }

    /// Classify one station; empty when the station is unknown.
    pub fn classify_station(&self, station_id: &str) -> Vec<ClassifiedReading> {
        if !self.dataset.has_station(station_id) {
            warn!(station = station_id, "Unknown station");
            return Vec::new();
        }
        self.classifier().classify_station(&self.reference_set(station_id))
    }

    /// Sensor integrity of `target_id`. `references = None` uses the
    /// station's default reference set.
    pub fn analyze_sensor(
        &self,
        target_id: &str,
        references: Option<Vec<ReferenceId>>,
        time_range: Option<TimeRange>,
    ) -> SensorIntegrityReport {
        let references = references.unwrap_or_else(|| self.reference_set(target_id).references);
        SensorIntegrityAnalyzer::new(&self.dataset, self.aggregator.as_ref(), &self.config)
            .analyze(target_id, &references, time_range)
    }

    /// Farm-wide availability over a fresh classification pass.
    pub fn availability(&self) -> AvailabilitySummary {
        AvailabilitySummary::from_rows(&self.classify())
    }

    /// Per-station overview over a fresh classification pass.
    pub fn overview(&self) -> Vec<StationOverview> {
        farm_overview(&self.classify())
    }

    /// Full report for one station.
    pub fn report(&self, station_id: &str) -> Option<TurbineReport> {
        TurbineReport::build(station_id, &self.classify_station(station_id))
    }
}
