//! SCADA CSV ingestion
//!
//! Header names must match the column contract exactly. A missing column or
//! a non-numeric value in a numeric column is a schema error that aborts the
//! load. Empty cells and NaN/NULL tokens are missing values and flow through
//! as `None`, so a single incomplete row is classified instead of dropped.

use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::defaults::{MISSING_VALUE_TOKENS, TIMESTAMP_FORMATS};
use crate::types::{columns, TurbineReading};

/// Schema-level failures. Any of these aborts the dataset load.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Column '{column}' has non-numeric value '{value}' on line {line}")]
    WrongType {
        column: String,
        line: u64,
        value: String,
    },

    #[error("Unparseable timestamp '{value}' on line {line}")]
    InvalidTimestamp { line: u64, value: String },

    #[error("Dataset contains no rows")]
    Empty,

    #[error("I/O error reading {}: {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Raw result of reading one SCADA export.
#[derive(Debug, Clone, Default)]
pub struct ScadaTable {
    pub readings: Vec<TurbineReading>,
    /// Metmast ids announced by `met_*` column headers
    pub metmast_ids: Vec<String>,
    /// Lines with no station id or no timestamp; they cannot be keyed
    pub unidentified_lines: Vec<u64>,
}

/// A metmast column: the metmast id, the header text and its position.
struct MetmastColumn {
    id: String,
    header: String,
    index: usize,
}

/// Header positions resolved once per file.
struct ScadaColumns {
    station_id: usize,
    timestamp: usize,
    alarm_seconds: usize,
    alarm_text: usize,
    internal_curtailment: usize,
    exported_energy: usize,
    power_mean: usize,
    power_min: usize,
    power_max: usize,
    wind_speed: usize,
    wind_direction: usize,
    external_curtailment: usize,
    metmast_speed: Vec<MetmastColumn>,
    metmast_direction: Vec<MetmastColumn>,
}

impl ScadaColumns {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, DatasetError> {
        let index: HashMap<&str, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| (h.trim(), i))
            .collect();

        let missing: Vec<String> = columns::REQUIRED_COLUMNS
            .iter()
            .filter(|c| !index.contains_key(*c))
            .map(|c| (*c).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(DatasetError::MissingColumns(missing));
        }

        let position = |name: &str| index.get(name).copied().unwrap_or_default();

        let mut metmast_speed = Vec::new();
        let mut metmast_direction = Vec::new();
        for (i, header) in headers.iter().enumerate() {
            let header = header.trim();
            if let Some(id) = columns::metmast_speed_id(header) {
                metmast_speed.push(MetmastColumn {
                    id: id.to_string(),
                    header: header.to_string(),
                    index: i,
                });
            } else if let Some(id) = columns::metmast_direction_id(header) {
                metmast_direction.push(MetmastColumn {
                    id: id.to_string(),
                    header: header.to_string(),
                    index: i,
                });
            }
        }

        Ok(Self {
            station_id: position(columns::STATION_ID),
            timestamp: position(columns::TIMESTAMP),
            alarm_seconds: position(columns::EFFECTIVE_ALARM_TIME),
            alarm_text: position(columns::ALARM_TEXT),
            internal_curtailment: position(columns::INTERNAL_CURTAILMENT_2006),
            exported_energy: position(columns::EXPORTED_ENERGY),
            power_mean: position(columns::ACTIVE_POWER_MEAN),
            power_min: position(columns::ACTIVE_POWER_MIN),
            power_max: position(columns::ACTIVE_POWER_MAX),
            wind_speed: position(columns::WIND_SPEED_MEAN),
            wind_direction: position(columns::WIND_DIRECTION_MEAN),
            external_curtailment: position(columns::EXTERNAL_CURTAILMENT),
            metmast_speed,
            metmast_direction,
        })
    }

    fn metmast_ids(&self) -> Vec<String> {
        self.metmast_speed
            .iter()
            .chain(&self.metmast_direction)
            .map(|c| c.id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Load a SCADA export from disk.
pub fn load_scada_csv(path: &Path) -> Result<ScadaTable, DatasetError> {
    let file = File::open(path).map_err(|e| DatasetError::Io(path.to_path_buf(), e))?;
    let table = read_scada_csv(file)?;
    info!(
        path = %path.display(),
        rows = table.readings.len(),
        metmasts = table.metmast_ids.len(),
        unidentified = table.unidentified_lines.len(),
        "Loaded SCADA table"
    );
    Ok(table)
}

/// Read a SCADA export from any reader.
pub fn read_scada_csv<R: Read>(reader: R) -> Result<ScadaTable, DatasetError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let cols = ScadaColumns::from_headers(&headers)?;
    debug!(
        metmast_speed_columns = cols.metmast_speed.len(),
        metmast_direction_columns = cols.metmast_direction.len(),
        "Resolved SCADA headers"
    );

    let mut table = ScadaTable {
        metmast_ids: cols.metmast_ids(),
        ..ScadaTable::default()
    };

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, csv::Position::line);

        let station = cell(&record, cols.station_id);
        let raw_ts = cell(&record, cols.timestamp);
        if is_missing(station) || is_missing(raw_ts) {
            warn!(line, "Row has no station id or timestamp, flagged");
            table.unidentified_lines.push(line);
            continue;
        }
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| DatasetError::InvalidTimestamp {
            line,
            value: raw_ts.to_string(),
        })?;

        let number = |index: usize, column: &str| parse_number(cell(&record, index), column, line);

        let mut reading = TurbineReading::new(station, timestamp);
        reading.effective_alarm_seconds = number(cols.alarm_seconds, columns::EFFECTIVE_ALARM_TIME)?;
        reading.internal_curtailment_seconds =
            number(cols.internal_curtailment, columns::INTERNAL_CURTAILMENT_2006)?;
        reading.exported_energy = number(cols.exported_energy, columns::EXPORTED_ENERGY)?;
        reading.active_power_mean = number(cols.power_mean, columns::ACTIVE_POWER_MEAN)?;
        reading.active_power_min = number(cols.power_min, columns::ACTIVE_POWER_MIN)?;
        reading.active_power_max = number(cols.power_max, columns::ACTIVE_POWER_MAX)?;
        reading.wind_speed_mean = number(cols.wind_speed, columns::WIND_SPEED_MEAN)?;
        reading.wind_direction_mean = number(cols.wind_direction, columns::WIND_DIRECTION_MEAN)?;
        reading.external_curtailment_seconds =
            number(cols.external_curtailment, columns::EXTERNAL_CURTAILMENT)?;

        let text = cell(&record, cols.alarm_text);
        if !is_missing(text) {
            reading.alarm_text = Some(text.to_string());
        }

        for met in &cols.metmast_speed {
            if let Some(value) = number(met.index, met.header.as_str())? {
                reading.metmast_wind_speed.insert(met.id.clone(), value);
            }
        }
        for met in &cols.metmast_direction {
            if let Some(value) = number(met.index, met.header.as_str())? {
                reading.metmast_wind_direction.insert(met.id.clone(), value);
            }
        }

        table.readings.push(reading);
    }

    if table.readings.is_empty() && table.unidentified_lines.is_empty() {
        return Err(DatasetError::Empty);
    }
    Ok(table)
}

/// Parse a `TimeStamp` cell in any accepted layout.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

fn cell(record: &csv::StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or("")
}

fn is_missing(raw: &str) -> bool {
    MISSING_VALUE_TOKENS
        .iter()
        .any(|token| raw.eq_ignore_ascii_case(token))
}

fn parse_number(raw: &str, column: &str, line: u64) -> Result<Option<f64>, DatasetError> {
    if is_missing(raw) {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(|v| if v.is_nan() { None } else { Some(v) })
        .map_err(|_| DatasetError::WrongType {
            column: column.to_string(),
            line,
            value: raw.to_string(),
        })
}
