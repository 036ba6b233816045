//! Farm layout CSV ingestion
//!
//! Columns: `StationId`, `X-Coordinate`, `Y-Coordinate` and an optional
//! `Type` (`turbine` or `metmast`). A row with empty coordinates is skipped
//! with a warning, so that station simply gets no geometric adjacency.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::types::{columns, Layout, MetmastLocation, ReferenceType, TurbineLocation};

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Layout is missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Invalid {column} '{value}' on layout line {line}")]
    InvalidCoordinate {
        column: String,
        line: u64,
        value: String,
    },

    #[error("Unknown layout Type '{value}' on line {line}")]
    InvalidType { line: u64, value: String },

    #[error("I/O error reading {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Load a layout table from disk.
pub fn load_layout_csv(path: &Path) -> Result<Layout, LayoutError> {
    let file = File::open(path).map_err(|e| LayoutError::Io(path.to_path_buf(), e))?;
    let layout = read_layout_csv(file)?;
    info!(
        path = %path.display(),
        turbines = layout.turbines.len(),
        metmasts = layout.metmasts.len(),
        "Loaded farm layout"
    );
    Ok(layout)
}

/// Read a layout table from any reader.
pub fn read_layout_csv<R: Read>(reader: R) -> Result<Layout, LayoutError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let index: HashMap<&str, usize> = headers.iter().enumerate().map(|(i, h)| (h, i)).collect();
    let missing: Vec<String> = columns::REQUIRED_LAYOUT_COLUMNS
        .iter()
        .filter(|c| !index.contains_key(*c))
        .map(|c| (*c).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(LayoutError::MissingColumns(missing));
    }
    let id_col = index[columns::LAYOUT_STATION_ID];
    let x_col = index[columns::LAYOUT_X];
    let y_col = index[columns::LAYOUT_Y];
    let type_col = index.get(columns::LAYOUT_TYPE).copied();

    let mut layout = Layout::default();
    let mut seen: HashSet<(ReferenceType, String)> = HashSet::new();

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, csv::Position::line);
        let id = record.get(id_col).unwrap_or("");
        if id.is_empty() {
            warn!(line, "Layout row without StationId, skipped");
            continue;
        }

        let kind = match type_col.and_then(|c| record.get(c)).unwrap_or("") {
            "" => ReferenceType::Turbine,
            t if t.eq_ignore_ascii_case("turbine") || t.eq_ignore_ascii_case("wtg") => {
                ReferenceType::Turbine
            }
            t if t.eq_ignore_ascii_case("metmast") || t.eq_ignore_ascii_case("met") => {
                ReferenceType::Metmast
            }
            other => {
                return Err(LayoutError::InvalidType {
                    line,
                    value: other.to_string(),
                })
            }
        };

        let (Some(x), Some(y)) = (
            coordinate(record.get(x_col).unwrap_or(""), columns::LAYOUT_X, line)?,
            coordinate(record.get(y_col).unwrap_or(""), columns::LAYOUT_Y, line)?,
        ) else {
            warn!(line, station = id, "Layout row without coordinates, station gets no adjacency");
            continue;
        };

        if !seen.insert((kind, id.to_string())) {
            warn!(line, station = id, "Duplicate layout entry, keeping the first");
            continue;
        }

        match kind {
            ReferenceType::Turbine => layout.turbines.push(TurbineLocation {
                station_id: id.to_string(),
                x,
                y,
            }),
            ReferenceType::Metmast => layout.metmasts.push(MetmastLocation {
                metmast_id: id.to_string(),
                x,
                y,
            }),
        }
    }

    Ok(layout)
}

fn coordinate(raw: &str, column: &str, line: u64) -> Result<Option<f64>, LayoutError> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(LayoutError::InvalidCoordinate {
            column: column.to_string(),
            line,
            value: raw.to_string(),
        }),
    }
}
