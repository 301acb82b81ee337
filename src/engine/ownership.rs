use super::state::Engine;
use crate::beacon::BeaconId;
use crate::error::Result;
use crate::events::Delta;
use crate::faction::FactionId;
use serde::{Deserialize, Serialize};

/// What a beacon lost when its owner was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revocation {
    pub coord: BeaconId,
    pub old_owner: Option<FactionId>,
    pub links_lost: usize,
    pub fields_lost: usize,
}

impl Engine {
    /// Registers a beacon. Registering an existing coordinate changes nothing
    /// and returns the existing id.
    pub fn register(&mut self, coord: BeaconId, owner: Option<FactionId>) -> Result<BeaconId> {
        if let Some(faction) = owner {
            self.require_faction(faction)?;
        }
        if self.beacons.insert(coord, owner) {
            tracing::debug!(%coord, ?owner, "beacon registered");
            self.record(Delta::BeaconRegistered { coord, owner });
            if let Some(faction) = owner {
                self.refresh(faction);
            }
        }
        Ok(coord)
    }

    /// Removes a beacon together with its links and fields. Returns `None`
    /// when nothing was registered at `coord`.
    pub fn unregister(&mut self, coord: BeaconId) -> Option<Revocation> {
        if !self.beacons.contains(coord) {
            return None;
        }
        let revocation = self.revoke(coord);
        self.beacons.remove(coord);
        tracing::debug!(%coord, "beacon unregistered");
        self.record(Delta::BeaconUnregistered { coord });
        Some(revocation)
    }

    /// Sets or clears the owner of a beacon.
    ///
    /// Capturing an unowned beacon keeps its (empty) structure. Clearing an
    /// owner cascades through [`clear_owner`](Self::clear_owner); switching
    /// directly between factions is a clear followed by a capture.
    pub fn set_owner(
        &mut self,
        coord: BeaconId,
        owner: Option<FactionId>,
    ) -> Result<Option<Revocation>> {
        if let Some(faction) = owner {
            self.require_faction(faction)?;
        }
        let current = self.require_beacon(coord)?.owner;
        if current == owner {
            return Ok(None);
        }

        let revocation = current.map(|_| self.revoke(coord));

        if let Some(faction) = owner {
            if let Some(beacon) = self.beacons.get_mut(coord) {
                beacon.owner = Some(faction);
            }
            tracing::debug!(%coord, %faction, "beacon captured");
            self.record(Delta::OwnerChanged {
                coord,
                old: None,
                new: Some(faction),
            });
            self.refresh(faction);
        }
        Ok(revocation)
    }

    /// Clears the owner of a beacon, dropping every link touching it and every
    /// field using it as a vertex, then refreshes the old owner's score.
    pub fn clear_owner(&mut self, coord: BeaconId) -> Result<Revocation> {
        self.require_beacon(coord)?;
        Ok(self.revoke(coord))
    }

    fn revoke(&mut self, coord: BeaconId) -> Revocation {
        let (old_owner, neighbors) = match self.beacons.get_mut(coord) {
            Some(beacon) => (beacon.owner.take(), beacon.neighbors().collect::<Vec<_>>()),
            None => (None, Vec::new()),
        };
        if old_owner.is_some() {
            self.record(Delta::OwnerChanged {
                coord,
                old: old_owner,
                new: None,
            });
        }

        let links_lost = neighbors
            .into_iter()
            .filter(|n| self.remove_link(coord, *n).is_some())
            .count();
        let fields_lost = self.remove_fields_at_vertex(coord);
        if let Some(beacon) = self.beacons.get_mut(coord) {
            beacon.clear_links();
        }

        if let Some(faction) = old_owner {
            tracing::debug!(%coord, %faction, links_lost, fields_lost, "beacon lost");
            self.refresh(faction);
        }

        Revocation {
            coord,
            old_owner,
            links_lost,
            fields_lost,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::EngineConfig;
    use crate::engine::Engine;
    use crate::error::EngineError;
    use crate::events::Delta;
    use crate::faction::FactionId;
    use crate::geometry::Point;

    const RED: FactionId = FactionId(0);
    const BLUE: FactionId = FactionId(1);

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    fn triangle_engine() -> Engine {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        for q in [p(0, 0), p(10, 0), p(5, 10)] {
            engine.register(q, Some(RED)).unwrap();
        }
        engine.add_link(p(0, 0), p(10, 0), RED).unwrap();
        engine.add_link(p(10, 0), p(5, 10), RED).unwrap();
        engine.add_link(p(5, 10), p(0, 0), RED).unwrap();
        engine
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        assert_eq!(engine.register(p(1, 1), Some(RED)), Ok(p(1, 1)));
        engine.take_changes();
        assert_eq!(engine.register(p(1, 1), Some(BLUE)), Ok(p(1, 1)));
        assert_eq!(engine.beacon(p(1, 1)).unwrap().owner, Some(RED));
        assert!(engine.pending_changes().is_empty());
    }

    #[test]
    fn test_capture_then_switch_owner() {
        let mut engine = triangle_engine();
        let revocation = engine.set_owner(p(10, 0), Some(BLUE)).unwrap().unwrap();
        assert_eq!(revocation.old_owner, Some(RED));
        assert_eq!(revocation.links_lost, 2);
        assert_eq!(revocation.fields_lost, 1);
        assert_eq!(engine.beacon(p(10, 0)).unwrap().owner, Some(BLUE));
        assert_eq!(engine.score(RED).beacons, 2);
        assert_eq!(engine.score(BLUE).beacons, 1);
    }

    #[test]
    fn test_capture_of_unowned_beacon_does_not_cascade() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.register(p(0, 0), None).unwrap();
        assert_eq!(engine.set_owner(p(0, 0), Some(RED)), Ok(None));
        assert_eq!(engine.score(RED).beacons, 1);
        assert_eq!(engine.set_owner(p(5, 5), Some(RED)), Err(EngineError::NotABeacon(p(5, 5))));
    }

    #[test]
    fn test_clear_owner_cascade_deltas_precede_score() {
        let mut engine = triangle_engine();
        engine.take_changes();
        engine.clear_owner(p(0, 0)).unwrap();
        let changes = engine.take_changes();

        assert!(matches!(changes.first(), Some(Delta::OwnerChanged { new: None, .. })));
        assert_eq!(
            changes.iter().filter(|d| matches!(d, Delta::LinkRemoved(_))).count(),
            2
        );
        assert_eq!(
            changes.iter().filter(|d| matches!(d, Delta::FieldRemoved(_))).count(),
            1
        );
        assert!(matches!(changes.last(), Some(Delta::ScoreChanged { faction: RED, .. })));
    }

    #[test]
    fn test_clear_owner_on_unowned_beacon_is_empty() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        engine.register(p(0, 0), None).unwrap();
        let revocation = engine.clear_owner(p(0, 0)).unwrap();
        assert_eq!(revocation.old_owner, None);
        assert_eq!(revocation.links_lost, 0);
    }

    #[test]
    fn test_unregister_cascades_and_removes() {
        let mut engine = triangle_engine();
        let revocation = engine.unregister(p(5, 10)).unwrap();
        assert_eq!(revocation.links_lost, 2);
        assert_eq!(revocation.fields_lost, 1);
        assert!(engine.beacon(p(5, 10)).is_none());
        assert_eq!(engine.score(RED).beacons, 2);
        assert_eq!(engine.score(RED).links, 1);
        assert!(engine.unregister(p(5, 10)).is_none());
    }
}
