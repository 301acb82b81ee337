use super::replay::{BeaconRecord, LinkStamp};
use crate::beacon::{Beacon, BeaconId, BeaconRegistry, Timestamp};
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::events::{Delta, Observer};
use crate::faction::{FactionId, FactionRoster};
use crate::field::{FieldId, TriangleField};
use crate::geometry::Point;
use crate::link::{Link, LinkKey};
use crate::score::{union_area, FactionScore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The territorial-control engine: beacons, the link graph, control fields
/// and the per-faction scores derived from them.
///
/// All state lives in coordinate- and id-keyed maps. Every mutation runs to
/// completion before any observer sees the deltas it produced.
#[derive(Debug, Clone)]
pub struct Engine {
    pub(super) config: EngineConfig,
    pub(super) roster: FactionRoster,
    pub(super) beacons: BeaconRegistry,
    pub(super) links: BTreeMap<LinkKey, Link>,
    pub(super) fields: BTreeMap<FieldId, TriangleField>,
    pub(super) scores: BTreeMap<FactionId, FactionScore>,
    pub(super) journal: Vec<Delta>,
    /// Last timestamp handed out or observed; keeps link stamps strictly
    /// increasing.
    pub(super) clock: Timestamp,
    pub(super) defer_scoring: bool,
}

/// Read-only snapshot for the persistence and presentation collaborators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateExport {
    pub beacons: Vec<BeaconRecord>,
    pub links: Vec<Link>,
    pub fields: Vec<TriangleField>,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let roster = config.roster()?;
        let scores = roster.ids().map(|f| (f, FactionScore::default())).collect();
        Ok(Engine {
            config,
            roster,
            beacons: BeaconRegistry::new(),
            links: BTreeMap::new(),
            fields: BTreeMap::new(),
            scores,
            journal: Vec::new(),
            clock: 0,
            defer_scoring: false,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn roster(&self) -> &FactionRoster {
        &self.roster
    }

    /// Resolves a faction name from the configured roster.
    pub fn faction(&self, name: &str) -> Result<FactionId> {
        self.roster.require(name)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn beacon(&self, coord: BeaconId) -> Option<&Beacon> {
        self.beacons.get(coord)
    }

    pub fn beacons(&self) -> impl Iterator<Item = &Beacon> {
        self.beacons.iter()
    }

    pub fn link(&self, a: BeaconId, b: BeaconId) -> Option<&Link> {
        self.links.get(&LinkKey::new(a, b))
    }

    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    pub fn field(&self, id: &FieldId) -> Option<&TriangleField> {
        self.fields.get(id)
    }

    pub fn fields(&self) -> impl Iterator<Item = &TriangleField> {
        self.fields.values()
    }

    pub fn fields_of(&self, faction: FactionId) -> impl Iterator<Item = &TriangleField> {
        self.fields.values().filter(move |f| f.owner == faction)
    }

    /// Every field whose triangle covers `point`, boundary included.
    pub fn fields_at(&self, point: Point) -> Vec<&TriangleField> {
        self.fields.values().filter(|f| f.contains(point)).collect()
    }

    /// Beacons linked to both `a` and `b`.
    pub fn common_neighbors(&self, a: BeaconId, b: BeaconId) -> Vec<BeaconId> {
        match (self.beacons.get(a), self.beacons.get(b)) {
            (Some(ba), Some(bb)) => ba
                .neighbors()
                .filter(|c| *c != b && bb.is_linked_to(*c))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn score(&self, faction: FactionId) -> FactionScore {
        self.scores.get(&faction).copied().unwrap_or_default()
    }

    pub fn scores(&self) -> impl Iterator<Item = (FactionId, FactionScore)> + '_ {
        self.scores.iter().map(|(f, s)| (*f, *s))
    }

    pub fn export_state(&self) -> StateExport {
        let beacons = self
            .beacons
            .iter()
            .map(|beacon| BeaconRecord {
                coord: beacon.coord,
                owner: beacon
                    .owner
                    .and_then(|f| self.roster.name(f))
                    .map(str::to_string),
                links: beacon
                    .links()
                    .map(|(to, created_at)| LinkStamp { to, created_at })
                    .collect(),
            })
            .collect();

        StateExport {
            beacons,
            links: self.links.values().copied().collect(),
            fields: self.fields.values().cloned().collect(),
        }
    }

    // ------------------------------------------------------------------------
    // Scoring
    // ------------------------------------------------------------------------

    /// Recomputes a faction's score, journaling a `ScoreChanged` delta when it
    /// moved.
    pub fn refresh(&mut self, faction: FactionId) -> FactionScore {
        if self.defer_scoring {
            return self.score(faction);
        }
        let score = self.compute_score(faction);
        if self.scores.get(&faction) != Some(&score) {
            self.scores.insert(faction, score);
            self.record(Delta::ScoreChanged { faction, score });
        }
        score
    }

    pub(super) fn compute_score(&self, faction: FactionId) -> FactionScore {
        FactionScore {
            beacons: self.beacons.owned_by(faction).count(),
            links: self.links.values().filter(|l| l.owner == faction).count(),
            fields: self.fields_of(faction).count(),
            area: union_area(self.fields_of(faction)),
        }
    }

    // ------------------------------------------------------------------------
    // Change journal
    // ------------------------------------------------------------------------

    pub(super) fn record(&mut self, delta: Delta) {
        self.journal.push(delta);
    }

    /// Deltas recorded since the last dispatch.
    pub fn pending_changes(&self) -> &[Delta] {
        &self.journal
    }

    pub fn take_changes(&mut self) -> Vec<Delta> {
        std::mem::take(&mut self.journal)
    }

    /// Delivers pending deltas to `observer`, in the order they happened.
    /// Returns the number delivered.
    pub fn dispatch<O: Observer + ?Sized>(&mut self, observer: &mut O) -> usize {
        let changes = self.take_changes();
        for delta in &changes {
            observer.on_change(self, delta);
        }
        changes.len()
    }

    // ------------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------------

    pub(super) fn next_timestamp(&mut self, requested: Option<Timestamp>) -> Timestamp {
        let stamp = match requested {
            Some(ts) => ts,
            None => chrono::Utc::now().timestamp_millis().max(self.clock + 1),
        };
        self.clock = self.clock.max(stamp);
        stamp
    }

    pub(super) fn require_beacon(&self, coord: BeaconId) -> Result<&Beacon> {
        self.beacons
            .get(coord)
            .ok_or(EngineError::NotABeacon(coord))
    }

    pub(super) fn require_faction(&self, faction: FactionId) -> Result<()> {
        match self.roster.name(faction) {
            Some(_) => Ok(()),
            None => Err(EngineError::UnknownFaction(faction.to_string())),
        }
    }

    pub(super) fn reset(&mut self) {
        self.beacons.clear();
        self.links.clear();
        self.fields.clear();
        self.journal.clear();
        for score in self.scores.values_mut() {
            *score = FactionScore::default();
        }
    }
}
