//! turbine-insight: Wind Farm SCADA Investigation
//!
//! Explains, for every turbine and every 10-minute interval, why it is or is
//! not producing, and checks each turbine's anemometer against its
//! neighbours.
//!
//! ## Architecture
//!
//! - **Acquisition**: CSV ingestion of the SCADA export and the farm layout
//! - **Dataset**: immutable, indexed snapshot with data-quality flags
//! - **Adjacency**: nearest turbines and metmasts within a distance bound
//! - **Classifier**: ordered rule list with startup-sequence detection
//! - **Sensor Integrity**: deviation and severity against reference wind
//! - **Report**: availability and per-turbine summaries

pub mod acquisition;
pub mod adjacency;
pub mod classifier;
pub mod config;
pub mod dataset;
pub mod reference;
pub mod report;
pub mod sensor_integrity;
pub mod session;
pub mod types;

// Re-export farm configuration
pub use config::FarmConfig;

// Re-export commonly used types
pub use types::{
    AdjacencyEntry, AdjacencyMap, ClassifiedReading, Layout, OperationalState, ReasonCode,
    ReferenceId, SensorDeviationSample, SensorIntegrityReport, Severity, TimeRange, TurbineReading,
};

pub use acquisition::{DatasetError, LayoutError};
pub use adjacency::{resolve_adjacency, AdjacencyCache};
pub use classifier::{detect_startup, StartupTrigger, StateClassifier, StationHistory};
pub use dataset::ScadaDataset;
pub use reference::{Aggregator, ReferenceSet};
pub use report::{AvailabilitySummary, TurbineReport};
pub use sensor_integrity::SensorIntegrityAnalyzer;
pub use session::AnalysisSession;
