//! Shared value types for turbine operational-state investigation
//!
//! - [`TurbineReading`] / [`ClassifiedReading`]: one SCADA row and its verdict
//! - [`OperationalState`] / [`ReasonCode`]: the state taxonomy
//! - [`Layout`] / [`AdjacencyEntry`]: farm geometry and reference neighborhoods
//! - [`SensorDeviationSample`] / [`Severity`]: wind sensor integrity output
//! - [`columns`]: the SCADA and layout column-name contract

pub mod columns;
mod layout;
mod reading;
mod sensor;
mod state;

pub use layout::*;
pub use reading::*;
pub use sensor::*;
pub use state::*;
