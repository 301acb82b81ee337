use crate::beacon::BeaconId;
use crate::engine::Engine;
use crate::faction::FactionId;
use crate::field::TriangleField;
use crate::link::Link;
use crate::score::FactionScore;
use serde::{Deserialize, Serialize};

/// A structural change recorded by the engine.
///
/// Mutating operations append deltas to the engine's journal; nothing is
/// delivered until [`Engine::dispatch`] runs, after the mutation completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Delta {
    BeaconRegistered {
        coord: BeaconId,
        owner: Option<FactionId>,
    },
    BeaconUnregistered {
        coord: BeaconId,
    },
    OwnerChanged {
        coord: BeaconId,
        old: Option<FactionId>,
        new: Option<FactionId>,
    },
    LinkCreated(Link),
    LinkRemoved(Link),
    FieldCreated(TriangleField),
    FieldRemoved(TriangleField),
    ScoreChanged {
        faction: FactionId,
        score: FactionScore,
    },
    /// The whole state was replaced from persisted records.
    Rebuilt,
}

impl Delta {
    /// The faction a delta concerns, when there is exactly one.
    pub fn faction(&self) -> Option<FactionId> {
        match self {
            Delta::BeaconRegistered { owner, .. } => *owner,
            Delta::OwnerChanged { new, old, .. } => new.or(*old),
            Delta::LinkCreated(link) | Delta::LinkRemoved(link) => Some(link.owner),
            Delta::FieldCreated(field) | Delta::FieldRemoved(field) => Some(field.owner),
            Delta::ScoreChanged { faction, .. } => Some(*faction),
            Delta::BeaconUnregistered { .. } | Delta::Rebuilt => None,
        }
    }
}

/// Presentation-side receiver of structural changes. Observers get a shared
/// reference to the engine and may query it freely.
pub trait Observer {
    fn on_change(&mut self, engine: &Engine, delta: &Delta);
}

impl<F> Observer for F
where
    F: FnMut(&Engine, &Delta),
{
    fn on_change(&mut self, engine: &Engine, delta: &Delta) {
        self(engine, delta)
    }
}
