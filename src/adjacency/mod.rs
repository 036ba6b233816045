//! Spatial Adjacency Resolver
//!
//! For every located turbine: Euclidean distance to every other turbine and
//! every located metmast, keep those within `distance_threshold_m`, sort
//! ascending by distance (ties by reference id, turbines before metmasts),
//! truncate to `max_adjacent_turbines`.
//!
//! Without a layout every station gets an empty entry. Callers treat an
//! empty entry as "insufficient references", never as an error.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::AdjacencyConfig;
use crate::types::{
    AdjacencyEntry, AdjacencyMap, AdjacentReference, Layout, ReferenceType, TurbineLocation,
};

/// Resolve adjacency for every located turbine plus every listed station.
///
/// Stations in `stations` that have no layout position get an empty entry.
pub fn resolve_adjacency<'s>(
    layout: Option<&Layout>,
    stations: impl IntoIterator<Item = &'s str>,
    config: &AdjacencyConfig,
) -> AdjacencyMap {
    let mut map = AdjacencyMap::new();

    let Some(layout) = layout else {
        for station in stations {
            map.insert(station.to_string(), AdjacencyEntry::empty(station));
        }
        debug!(stations = map.len(), "No layout, adjacency entries are empty");
        return map;
    };

    for turbine in &layout.turbines {
        map.insert(turbine.station_id.clone(), neighbours_of(turbine, layout, config));
    }

    let mut unlocated = Vec::new();
    for station in stations {
        if !map.contains_key(station) {
            unlocated.push(station.to_string());
            map.insert(station.to_string(), AdjacencyEntry::empty(station));
        }
    }
    if !unlocated.is_empty() {
        warn!(
            count = unlocated.len(),
            stations = ?unlocated,
            "Stations missing from layout get no geometric adjacency"
        );
    }

    info!(
        turbines = layout.turbines.len(),
        metmasts = layout.metmasts.len(),
        max_adjacent = config.max_adjacent_turbines,
        distance_threshold_m = config.distance_threshold_m,
        "Adjacency resolved"
    );
    map
}

fn neighbours_of(source: &TurbineLocation, layout: &Layout, config: &AdjacencyConfig) -> AdjacencyEntry {
    let turbines = layout
        .turbines
        .iter()
        .filter(|t| t.station_id != source.station_id)
        .map(|t| AdjacentReference {
            reference_id: t.station_id.clone(),
            reference_type: ReferenceType::Turbine,
            distance_m: distance(source.x, source.y, t.x, t.y),
        });
    let metmasts = layout.metmasts.iter().map(|m| AdjacentReference {
        reference_id: m.metmast_id.clone(),
        reference_type: ReferenceType::Metmast,
        distance_m: distance(source.x, source.y, m.x, m.y),
    });

    // NaN distances fail the comparison and drop out here
    let mut references: Vec<AdjacentReference> = turbines
        .chain(metmasts)
        .filter(|r| r.distance_m <= config.distance_threshold_m)
        .collect();
    references.sort_by(|a, b| {
        a.distance_m
            .total_cmp(&b.distance_m)
            .then_with(|| a.reference_id.cmp(&b.reference_id))
            .then_with(|| a.reference_type.cmp(&b.reference_type))
    });
    references.truncate(config.max_adjacent_turbines);

    AdjacencyEntry {
        source_id: source.station_id.clone(),
        references,
    }
}

fn distance(x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    (x2 - x1).hypot(y2 - y1)
}

// ============================================================================
// Cache
// ============================================================================

/// Adjacency computed once per layout, shared read-only between analyses.
///
/// Keyed by the layout fingerprint and the adjacency limits; `refresh`
/// recomputes only when the key changes.
#[derive(Debug, Clone)]
pub struct AdjacencyCache {
    key: u64,
    map: Arc<AdjacencyMap>,
}

impl AdjacencyCache {
    pub fn resolve<'s>(
        layout: Option<&Layout>,
        stations: impl IntoIterator<Item = &'s str>,
        config: &AdjacencyConfig,
    ) -> Self {
        Self {
            key: cache_key(layout, config),
            map: Arc::new(resolve_adjacency(layout, stations, config)),
        }
    }

    /// Recompute if the layout or the limits changed. Returns whether it did.
    pub fn refresh<'s>(
        &mut self,
        layout: Option<&Layout>,
        stations: impl IntoIterator<Item = &'s str>,
        config: &AdjacencyConfig,
    ) -> bool {
        let key = cache_key(layout, config);
        if key == self.key {
            debug!("Adjacency cache hit");
            return false;
        }
        *self = Self {
            key,
            map: Arc::new(resolve_adjacency(layout, stations, config)),
        };
        true
    }

    /// Shared handle to the current adjacency.
    pub fn map(&self) -> Arc<AdjacencyMap> {
        Arc::clone(&self.map)
    }

    pub fn key(&self) -> u64 {
        self.key
    }
}

fn cache_key(layout: Option<&Layout>, config: &AdjacencyConfig) -> u64 {
    let mut hasher = DefaultHasher::new();
    layout.map(Layout::fingerprint).hash(&mut hasher);
    config.max_adjacent_turbines.hash(&mut hasher);
    config.distance_threshold_m.to_bits().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetmastLocation;

    fn turbine(id: &str, x: f64, y: f64) -> TurbineLocation {
        TurbineLocation { station_id: id.into(), x, y }
    }

    fn grid_layout() -> Layout {
        // 4x4 grid at 300 m spacing
        let turbines = (0..16)
            .map(|i| turbine(&format!("T{i:02}"), f64::from(i % 4) * 300.0, f64::from(i / 4) * 300.0))
            .collect();
        Layout::new(turbines, vec![MetmastLocation { metmast_id: "38".into(), x: 450.0, y: 450.0 }])
    }

    #[test]
    fn test_beyond_threshold_not_adjacent() {
        let layout = Layout::new(vec![turbine("A", 0.0, 0.0), turbine("B", 1200.0, 0.0)], vec![]);
        let map = resolve_adjacency(Some(&layout), [], &AdjacencyConfig::default());
        assert!(map["A"].is_empty());
        assert!(map["B"].is_empty());
    }

    #[test]
    fn test_cap_threshold_and_order_hold() {
        let config = AdjacencyConfig::default();
        let map = resolve_adjacency(Some(&grid_layout()), [], &config);
        assert_eq!(map.len(), 16);
        for entry in map.values() {
            assert!(entry.len() <= config.max_adjacent_turbines);
            assert!(entry.references.iter().all(|r| r.distance_m <= config.distance_threshold_m));
            assert!(entry
                .references
                .windows(2)
                .all(|w| w[0].distance_m <= w[1].distance_m));
            assert!(entry.references.iter().all(|r| r.reference_id != entry.source_id));
        }
    }

    #[test]
    fn test_ties_broken_by_id() {
        let layout = Layout::new(
            vec![turbine("S", 0.0, 0.0), turbine("Z", 100.0, 0.0), turbine("M", -100.0, 0.0)],
            vec![],
        );
        let map = resolve_adjacency(Some(&layout), [], &AdjacencyConfig::default());
        let ids: Vec<&str> = map["S"].references.iter().map(|r| r.reference_id.as_str()).collect();
        assert_eq!(ids, vec!["M", "Z"]);
    }

    #[test]
    fn test_metmasts_included() {
        let map = resolve_adjacency(Some(&grid_layout()), [], &AdjacencyConfig::default());
        // T05 at (300, 300) is 212 m from the mast
        let entry = &map["T05"];
        assert!(entry
            .references
            .iter()
            .any(|r| r.reference_type == ReferenceType::Metmast && r.reference_id == "38"));
    }

    #[test]
    fn test_no_layout_gives_empty_entries() {
        let map = resolve_adjacency(None, ["T1", "T2"], &AdjacencyConfig::default());
        assert_eq!(map.len(), 2);
        assert!(map.values().all(AdjacencyEntry::is_empty));
    }

    #[test]
    fn test_unlocated_station_gets_empty_entry() {
        let layout = Layout::new(vec![turbine("A", 0.0, 0.0), turbine("B", 100.0, 0.0)], vec![]);
        let map = resolve_adjacency(Some(&layout), ["A", "C"], &AdjacencyConfig::default());
        assert_eq!(map["A"].len(), 1);
        assert!(map["C"].is_empty());
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let config = AdjacencyConfig::default();
        let layout = grid_layout();
        assert_eq!(
            resolve_adjacency(Some(&layout), [], &config),
            resolve_adjacency(Some(&layout), [], &config)
        );
    }

    #[test]
    fn test_cache_refreshes_only_on_change() {
        let config = AdjacencyConfig::default();
        let layout = grid_layout();
        let mut cache = AdjacencyCache::resolve(Some(&layout), [], &config);
        let before = cache.map();
        assert!(!cache.refresh(Some(&layout), [], &config));
        assert!(Arc::ptr_eq(&before, &cache.map()));

        let mut moved = layout.clone();
        moved.turbines[0].x += 5000.0;
        assert!(cache.refresh(Some(&moved), [], &config));
        assert!(cache.map()["T00"].is_empty());
        // The old snapshot is untouched for anyone still holding it
        assert!(!before["T00"].is_empty());
    }
}
