//! Checks run before any state changes. Hard failures are caller errors;
//! refusals are expected game outcomes and come back as data.

use super::state::Engine;
use crate::beacon::BeaconId;
use crate::error::{EngineError, Result};
use crate::faction::FactionId;
use crate::field::{Rejection, TriangleField};
use crate::geometry::segments_intersect;
use crate::link::LinkOutcome;

fn require_owned(engine: &Engine, point: BeaconId, faction: FactionId) -> Result<()> {
    let beacon = engine.require_beacon(point)?;
    if !beacon.is_owned_by(faction) {
        return Err(EngineError::OwnershipMismatch {
            point,
            expected: faction,
            actual: beacon.owner,
        });
    }
    Ok(())
}

/// Both endpoints exist, differ, and belong to `faction`.
pub(super) fn check_link_endpoints(
    engine: &Engine,
    a: BeaconId,
    b: BeaconId,
    faction: FactionId,
) -> Result<()> {
    engine.require_faction(faction)?;
    engine.require_beacon(a)?;
    engine.require_beacon(b)?;
    if a == b {
        return Err(EngineError::SelfLink(a));
    }
    require_owned(engine, a, faction)?;
    require_owned(engine, b, faction)
}

/// Degree limit first, then duplicates. The limit applies to both ends so
/// that no adjacency ever grows past it.
pub(super) fn link_refusal(engine: &Engine, a: BeaconId, b: BeaconId) -> Option<LinkOutcome> {
    let limit = engine.config.max_links_per_beacon;
    let from = engine.beacons.get(a)?;
    let to = engine.beacons.get(b)?;

    if from.link_count() >= limit || to.link_count() >= limit {
        return Some(LinkOutcome::DegreeLimitExceeded);
    }
    if from.is_linked_to(b) {
        return Some(LinkOutcome::DuplicateLink);
    }
    None
}

/// All three vertices are registered, then all three are owned by `faction`.
pub(super) fn check_field_vertices(
    engine: &Engine,
    vertices: [BeaconId; 3],
    faction: FactionId,
) -> Result<()> {
    engine.require_faction(faction)?;
    for p in vertices {
        engine.require_beacon(p)?;
    }
    for p in vertices {
        require_owned(engine, p, faction)?;
    }
    Ok(())
}

/// Game-rule conflicts for a candidate field: duplicates, enemy fields that
/// share a vertex-containment relation with it, and enemy links crossing its
/// sides.
///
/// Two triangles that cross without either containing a vertex of the other
/// pass the overlap test; the crossing test against enemy links still applies.
pub(super) fn field_rejection(engine: &Engine, candidate: &TriangleField) -> Option<Rejection> {
    if engine.fields.contains_key(&candidate.id()) {
        return Some(Rejection::DuplicateField);
    }

    if engine.config.reject_enemy_overlap {
        let overlapping = engine
            .fields
            .iter()
            .filter(|(_, f)| f.owner != candidate.owner)
            .find(|(_, f)| f.vertex_overlaps(candidate));
        if let Some((id, enemy)) = overlapping {
            return Some(Rejection::Overlap {
                enemy: enemy.owner,
                field: *id,
            });
        }
    }

    if engine.config.reject_enemy_crossings {
        let sides = candidate.sides();
        let crossing = engine
            .links
            .values()
            .filter(|l| l.owner != candidate.owner)
            .find(|l| {
                let segment = l.segment();
                sides.iter().any(|side| segments_intersect(&segment, side))
            });
        if let Some(link) = crossing {
            return Some(Rejection::Crossing {
                enemy: link.owner,
                link: link.key(),
            });
        }
    }

    None
}
