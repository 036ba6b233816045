//! Data acquisition module
//!
//! Loads the two inputs of an analysis from CSV exports:
//! - `scada_csv`: the 10-minute SCADA table (schema-checked, row-level
//!   missing values preserved)
//! - `layout_csv`: turbine and metmast coordinates

pub mod layout_csv;
pub mod scada_csv;

pub use layout_csv::{load_layout_csv, read_layout_csv, LayoutError};
pub use scada_csv::{load_scada_csv, parse_timestamp, read_scada_csv, DatasetError, ScadaTable};
