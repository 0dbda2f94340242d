//! Snapshot comparison.

use std::collections::HashMap;

use tracing::{debug, trace, warn};

use crate::distance::distance_meters;
use crate::domain::Station;

/// A station whose name changed while it stayed in place.
#[derive(Debug, Clone, PartialEq)]
pub struct Renamed {
    /// The station as it is now.
    pub current: Station,
    /// The station as it was in the reference snapshot.
    pub previous: Station,
}

/// Classification of two snapshots against each other.
///
/// Unchanged stations appear in none of the lists. The order within each
/// list is not meaningful; sort at the output boundary if it matters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comparison {
    /// In current, not in reference.
    pub added: Vec<Station>,
    /// In reference, not in current.
    pub removed: Vec<Station>,
    /// In both, further apart than the tolerance. Takes precedence over
    /// a rename.
    pub moved: Vec<Station>,
    /// In both, within tolerance, with a different name.
    pub renamed: Vec<Renamed>,
}

impl Comparison {
    /// Returns true if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.moved.is_empty()
            && self.renamed.is_empty()
    }

    /// Total number of classified stations across all four lists.
    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len() + self.moved.len() + self.renamed.len()
    }

    /// Renamed pairs as `(current, previous_name)`, the shape the renamed-set
    /// file is written from.
    pub fn renamed_pairs(&self) -> impl Iterator<Item = (&Station, &str)> {
        self.renamed.iter().map(|r| (&r.current, r.previous.name()))
    }
}

/// Compare `current` against `reference`.
///
/// A station present in both is moved if its positions are more than
/// `tolerance_m` meters apart, otherwise renamed if its normalized name
/// differs, otherwise unchanged.
///
/// If a snapshot repeats an id, the last occurrence is used and the
/// others are ignored.
pub fn compare(current: &[Station], reference: &[Station], tolerance_m: f64) -> Comparison {
    let current_index = index_by_id(current, "current");
    let reference_index = index_by_id(reference, "reference");

    let mut result = Comparison::default();

    for station in current {
        if !is_indexed(&current_index, station) {
            continue;
        }

        let Some(previous) = reference_index.get(station.id.as_str()) else {
            result.added.push(station.clone());
            continue;
        };

        let distance = distance_meters(
            previous.latitude,
            previous.longitude,
            station.latitude,
            station.longitude,
        );

        if distance > tolerance_m {
            trace!(id = %station.id, distance, "station moved");
            result.moved.push(station.clone());
        } else if station.name() != previous.name() {
            trace!(id = %station.id, from = previous.name(), to = station.name(), "station renamed");
            result.renamed.push(Renamed {
                current: station.clone(),
                previous: (*previous).clone(),
            });
        }
    }

    for station in reference {
        if is_indexed(&reference_index, station)
            && !current_index.contains_key(station.id.as_str())
        {
            result.removed.push(station.clone());
        }
    }

    debug!(
        current = current_index.len(),
        reference = reference_index.len(),
        tolerance_m,
        added = result.added.len(),
        removed = result.removed.len(),
        moved = result.moved.len(),
        renamed = result.renamed.len(),
        "compared snapshots"
    );

    result
}

/// Index stations by id. Later duplicates replace earlier ones.
fn index_by_id<'a>(stations: &'a [Station], label: &str) -> HashMap<&'a str, &'a Station> {
    let mut index = HashMap::with_capacity(stations.len());
    for station in stations {
        if index.insert(station.id.as_str(), station).is_some() {
            warn!(id = %station.id, snapshot = label, "duplicate station id; keeping last occurrence");
        }
    }
    index
}

/// Whether `station` is the occurrence the index kept for its id.
fn is_indexed(index: &HashMap<&str, &Station>, station: &Station) -> bool {
    index
        .get(station.id.as_str())
        .is_some_and(|kept| std::ptr::eq(*kept, station))
}
