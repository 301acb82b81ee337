//! Beacon nodes and the coordinate-keyed registry that stores them.
//!
//! Beacons reference each other by coordinate only; the registry is the single
//! owner of every node.

use crate::faction::FactionId;
use crate::geometry::Point;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Beacons are identified by their coordinate.
pub type BeaconId = Point;

/// Epoch milliseconds at which a link was created.
pub type Timestamp = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beacon {
    pub coord: BeaconId,
    pub owner: Option<FactionId>,
    /// Neighbor coordinate -> link creation timestamp.
    links: BTreeMap<BeaconId, Timestamp>,
}

impl Beacon {
    pub fn new(coord: BeaconId, owner: Option<FactionId>) -> Self {
        Beacon {
            coord,
            owner,
            links: BTreeMap::new(),
        }
    }

    pub fn is_owned_by(&self, faction: FactionId) -> bool {
        self.owner == Some(faction)
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn is_linked_to(&self, other: BeaconId) -> bool {
        self.links.contains_key(&other)
    }

    pub fn link_timestamp(&self, other: BeaconId) -> Option<Timestamp> {
        self.links.get(&other).copied()
    }

    /// Neighbors in coordinate order.
    pub fn neighbors(&self) -> impl Iterator<Item = BeaconId> + '_ {
        self.links.keys().copied()
    }

    pub fn links(&self) -> impl Iterator<Item = (BeaconId, Timestamp)> + '_ {
        self.links.iter().map(|(p, t)| (*p, *t))
    }

    pub(crate) fn insert_link(&mut self, other: BeaconId, created_at: Timestamp) {
        self.links.insert(other, created_at);
    }

    pub(crate) fn remove_link(&mut self, other: BeaconId) -> Option<Timestamp> {
        self.links.remove(&other)
    }

    pub(crate) fn clear_links(&mut self) {
        self.links.clear();
    }
}

/// Keyed store of beacons. Structural cascades live in the engine; this is a
/// plain store.
#[derive(Debug, Clone, Default)]
pub struct BeaconRegistry {
    beacons: BTreeMap<BeaconId, Beacon>,
}

impl BeaconRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a beacon unless one already exists at `coord`.
    /// Returns `true` when a new beacon was created.
    pub fn insert(&mut self, coord: BeaconId, owner: Option<FactionId>) -> bool {
        if self.beacons.contains_key(&coord) {
            return false;
        }
        self.beacons.insert(coord, Beacon::new(coord, owner));
        true
    }

    pub fn remove(&mut self, coord: BeaconId) -> Option<Beacon> {
        self.beacons.remove(&coord)
    }

    pub fn get(&self, coord: BeaconId) -> Option<&Beacon> {
        self.beacons.get(&coord)
    }

    pub(crate) fn get_mut(&mut self, coord: BeaconId) -> Option<&mut Beacon> {
        self.beacons.get_mut(&coord)
    }

    pub fn contains(&self, coord: BeaconId) -> bool {
        self.beacons.contains_key(&coord)
    }

    pub fn owner_of(&self, coord: BeaconId) -> Option<FactionId> {
        self.beacons.get(&coord).and_then(|b| b.owner)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Beacon> {
        self.beacons.values()
    }

    pub fn owned_by(&self, faction: FactionId) -> impl Iterator<Item = &Beacon> {
        self.beacons.values().filter(move |b| b.is_owned_by(faction))
    }

    pub fn len(&self) -> usize {
        self.beacons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beacons.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.beacons.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut registry = BeaconRegistry::new();
        let p = Point::new(3, 4);
        assert!(registry.insert(p, Some(FactionId(0))));
        assert!(!registry.insert(p, Some(FactionId(1))));
        assert_eq!(registry.owner_of(p), Some(FactionId(0)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_owned_by_filters_on_owner() {
        let mut registry = BeaconRegistry::new();
        registry.insert(Point::new(0, 0), Some(FactionId(0)));
        registry.insert(Point::new(1, 0), Some(FactionId(1)));
        registry.insert(Point::new(2, 0), None);
        assert_eq!(registry.owned_by(FactionId(0)).count(), 1);
        assert_eq!(registry.owned_by(FactionId(1)).count(), 1);
    }

    #[test]
    fn test_beacon_links_are_ordered() {
        let mut beacon = Beacon::new(Point::new(0, 0), None);
        beacon.insert_link(Point::new(5, 0), 20);
        beacon.insert_link(Point::new(1, 0), 10);
        let neighbors: Vec<_> = beacon.neighbors().collect();
        assert_eq!(neighbors, vec![Point::new(1, 0), Point::new(5, 0)]);
        assert_eq!(beacon.link_timestamp(Point::new(5, 0)), Some(20));
        assert_eq!(beacon.remove_link(Point::new(5, 0)), Some(20));
        assert_eq!(beacon.link_count(), 1);
    }
}
