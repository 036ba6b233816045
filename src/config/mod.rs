//! Farm Configuration Module
//!
//! Provides per-farm configuration loaded from TOML files: production and
//! wind thresholds, startup grace windows, sensor deviation limits, adjacency
//! bounds and the reference aggregator.
//!
//! ## Loading Order
//!
//! 1. `TURBINE_INSIGHT_CONFIG` environment variable (path to TOML file)
//! 2. `farm_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! The CLI calls `config::init()` once at startup. Library code takes a
//! `&FarmConfig` explicitly so every analysis is a pure function of its
//! inputs:
//!
//! ```ignore
//! config::init(FarmConfig::load());
//! let session = AnalysisSession::new(dataset, layout, config::get().clone());
//! ```

mod farm_config;
pub mod defaults;
pub mod validation;

pub use farm_config::*;

use std::sync::OnceLock;

/// Global farm configuration, initialized once at startup.
static FARM_CONFIG: OnceLock<FarmConfig> = OnceLock::new();

/// Initialize the global farm configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: FarmConfig) {
    if FARM_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global farm configuration.
///
/// Panics if `init()` has not been called; that is a startup bug.
pub fn get() -> &'static FarmConfig {
    FARM_CONFIG
        .get()
        .expect("config::get() called before config::init()")
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    FARM_CONFIG.get().is_some()
}
