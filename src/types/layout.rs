//! Farm geometry: turbine and metmast positions, adjacency entries

use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// Kind of reference used to cross-check a turbine's wind sensor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Turbine,
    Metmast,
}

impl std::fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Turbine => write!(f, "turbine"),
            Self::Metmast => write!(f, "metmast"),
        }
    }
}

/// Turbine position in a planar meter coordinate system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurbineLocation {
    pub station_id: String,
    pub x: f64,
    pub y: f64,
}

/// Metmast position, keyed by the `<id>` suffix of its SCADA columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetmastLocation {
    pub metmast_id: String,
    pub x: f64,
    pub y: f64,
}

/// All known positions for one farm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub turbines: Vec<TurbineLocation>,
    pub metmasts: Vec<MetmastLocation>,
}

impl Layout {
    pub fn new(turbines: Vec<TurbineLocation>, metmasts: Vec<MetmastLocation>) -> Self {
        Self { turbines, metmasts }
    }

    pub fn is_empty(&self) -> bool {
        self.turbines.is_empty() && self.metmasts.is_empty()
    }

    pub fn turbine(&self, station_id: &str) -> Option<&TurbineLocation> {
        self.turbines.iter().find(|t| t.station_id == station_id)
    }

    pub fn has_metmast(&self, metmast_id: &str) -> bool {
        self.metmasts.iter().any(|m| m.metmast_id == metmast_id)
    }

    /// Content hash identifying this layout in the adjacency cache.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        for t in &self.turbines {
            ReferenceType::Turbine.hash(&mut hasher);
            t.station_id.hash(&mut hasher);
            t.x.to_bits().hash(&mut hasher);
            t.y.to_bits().hash(&mut hasher);
        }
        for m in &self.metmasts {
            ReferenceType::Metmast.hash(&mut hasher);
            m.metmast_id.hash(&mut hasher);
            m.x.to_bits().hash(&mut hasher);
            m.y.to_bits().hash(&mut hasher);
        }
        hasher.finish()
    }
}

// ============================================================================
// Adjacency
// ============================================================================

/// One neighbor of a turbine, as found by the adjacency resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacentReference {
    pub reference_id: String,
    pub reference_type: ReferenceType,
    pub distance_m: f64,
}

impl AdjacentReference {
    pub fn id(&self) -> ReferenceId {
        match self.reference_type {
            ReferenceType::Turbine => ReferenceId::Turbine(self.reference_id.clone()),
            ReferenceType::Metmast => ReferenceId::Metmast(self.reference_id.clone()),
        }
    }
}

/// Nearest references of one turbine, ascending by distance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjacencyEntry {
    pub source_id: String,
    pub references: Vec<AdjacentReference>,
}

impl AdjacencyEntry {
    pub fn empty(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            references: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn reference_ids(&self) -> impl Iterator<Item = ReferenceId> + '_ {
        self.references.iter().map(AdjacentReference::id)
    }
}

/// Adjacency of every station, keyed by station id.
pub type AdjacencyMap = BTreeMap<String, AdjacencyEntry>;

// ============================================================================
// Reference Id
// ============================================================================

/// A wind reference chosen for cross-validation.
///
/// Parses from `T01`/`turbine:T01` for turbines and `met:38`/`metmast:38`
/// for metmasts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum ReferenceId {
    Turbine(String),
    Metmast(String),
}

impl ReferenceId {
    pub fn id(&self) -> &str {
        match self {
            Self::Turbine(id) | Self::Metmast(id) => id,
        }
    }

    pub fn reference_type(&self) -> ReferenceType {
        match self {
            Self::Turbine(_) => ReferenceType::Turbine,
            Self::Metmast(_) => ReferenceType::Metmast,
        }
    }
}

impl std::fmt::Display for ReferenceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Turbine(id) => write!(f, "{id}"),
            Self::Metmast(id) => write!(f, "met:{id}"),
        }
    }
}

impl std::str::FromStr for ReferenceId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, id) = match s.split_once(':') {
            Some((kind, id)) => (kind.trim().to_ascii_lowercase(), id.trim()),
            None => (String::from("turbine"), s),
        };
        if id.is_empty() {
            return Err(format!("empty reference id in '{s}'"));
        }
        match kind.as_str() {
            "turbine" | "wtg" => Ok(Self::Turbine(id.to_string())),
            "met" | "metmast" => Ok(Self::Metmast(id.to_string())),
            other => Err(format!("unknown reference kind '{other}' (use turbine: or met:)")),
        }
    }
}
