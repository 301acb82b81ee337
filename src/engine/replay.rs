//! Deterministic reconstruction from persisted, unordered link records.

use super::state::Engine;
use crate::beacon::{BeaconId, Timestamp};
use crate::error::EngineError;
use crate::events::Delta;
use crate::faction::FactionId;
use crate::link::{LinkKey, LinkOutcome};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One persisted link entry: the neighbor and when the link was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkStamp {
    pub to: BeaconId,
    pub created_at: Timestamp,
}

/// Flat persisted form of a beacon: coordinate, owner name, link list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconRecord {
    pub coord: BeaconId,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub links: Vec<LinkStamp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    UnknownFaction(String),
    DuplicateBeacon,
    /// Links listed on a beacon with no (known) owner.
    OwnerlessLinks,
    MissingBeacon(BeaconId),
    SelfLink,
    OwnershipMismatch(BeaconId),
    DegreeLimitExceeded(BeaconId),
    Invalid(String),
}

/// A record (or one link of a record) that could not be restored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub coord: BeaconId,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildReport {
    pub beacons: usize,
    pub links_replayed: usize,
    /// Fields closed while replaying links in timestamp order.
    pub fields_created: usize,
    /// Fields only found by the final re-scan.
    pub fields_recovered: usize,
    pub skipped: Vec<SkippedRecord>,
}

impl RebuildReport {
    fn skip(&mut self, coord: BeaconId, reason: SkipReason) {
        tracing::warn!(%coord, ?reason, "skipping persisted record");
        self.skipped.push(SkippedRecord { coord, reason });
    }
}

/// A link waiting to be replayed, keyed by its canonical pair.
struct PendingLink {
    created_at: Timestamp,
    origin: BeaconId,
    owner: FactionId,
}

impl Engine {
    /// Replaces the whole state with the one described by `records`.
    ///
    /// Beacons are registered with their owners first. Links are collected
    /// from both endpoints (earliest stamp wins), replayed in ascending
    /// `(timestamp, pair)` order, and finally every link is re-scanned for
    /// 3-cycles replay ordering missed. Bad records are skipped one by one.
    pub fn rebuild(&mut self, records: &[BeaconRecord]) -> RebuildReport {
        self.reset();
        self.defer_scoring = true;
        let mut report = RebuildReport::default();
        let mut duplicates = BTreeSet::new();

        for (index, record) in records.iter().enumerate() {
            let owner = match &record.owner {
                Some(name) => match self.roster.id(name) {
                    Some(id) => Some(id),
                    None => {
                        report.skip(record.coord, SkipReason::UnknownFaction(name.clone()));
                        None
                    }
                },
                None => None,
            };
            if self.beacons.insert(record.coord, owner) {
                report.beacons += 1;
            } else {
                report.skip(record.coord, SkipReason::DuplicateBeacon);
                duplicates.insert(index);
            }
        }

        let pending = self.collect_links(records, &duplicates, &mut report);
        let mut ordered: Vec<(LinkKey, PendingLink)> = pending.into_iter().collect();
        ordered.sort_by_key(|(key, link)| (link.created_at, *key));

        for (key, link) in ordered {
            let other = if link.origin == key.0 { key.1 } else { key.0 };
            match self.link_beacons(link.origin, other, link.owner, Some(link.created_at)) {
                Ok(result) if result.success() => {
                    report.links_replayed += 1;
                    report.fields_created += result.fields_created;
                }
                Ok(result) => {
                    let reason = match result.outcome {
                        LinkOutcome::DegreeLimitExceeded => SkipReason::DegreeLimitExceeded(other),
                        other_outcome => SkipReason::Invalid(format!("{:?}", other_outcome)),
                    };
                    report.skip(link.origin, reason);
                }
                Err(EngineError::OwnershipMismatch { .. }) => {
                    report.skip(link.origin, SkipReason::OwnershipMismatch(other));
                }
                Err(e) => report.skip(link.origin, SkipReason::Invalid(e.to_string())),
            }
        }

        report.fields_recovered = self.rescan();

        self.defer_scoring = false;
        self.journal.clear();
        self.record(Delta::Rebuilt);
        let factions: Vec<FactionId> = self.roster.ids().collect();
        for faction in factions {
            let score = self.compute_score(faction);
            self.scores.insert(faction, score);
            self.record(Delta::ScoreChanged { faction, score });
        }

        tracing::info!(
            beacons = report.beacons,
            links = report.links_replayed,
            fields = report.fields_created + report.fields_recovered,
            skipped = report.skipped.len(),
            "rebuild complete"
        );
        report
    }

    fn collect_links(
        &self,
        records: &[BeaconRecord],
        duplicates: &BTreeSet<usize>,
        report: &mut RebuildReport,
    ) -> BTreeMap<LinkKey, PendingLink> {
        let mut pending: BTreeMap<LinkKey, PendingLink> = BTreeMap::new();
        for (index, record) in records.iter().enumerate() {
            // A rejected duplicate contributes nothing, links included.
            if record.links.is_empty() || duplicates.contains(&index) {
                continue;
            }
            let Some(owner) = self.beacons.owner_of(record.coord) else {
                report.skip(record.coord, SkipReason::OwnerlessLinks);
                continue;
            };
            for stamp in &record.links {
                if stamp.to == record.coord {
                    report.skip(record.coord, SkipReason::SelfLink);
                    continue;
                }
                if !self.beacons.contains(stamp.to) {
                    report.skip(record.coord, SkipReason::MissingBeacon(stamp.to));
                    continue;
                }
                let key = LinkKey::new(record.coord, stamp.to);
                let earlier = pending
                    .get(&key)
                    .map_or(true, |existing| stamp.created_at < existing.created_at);
                if earlier {
                    pending.insert(
                        key,
                        PendingLink {
                            created_at: stamp.created_at,
                            origin: record.coord,
                            owner,
                        },
                    );
                }
            }
        }
        pending
    }

    /// Attempts every 3-cycle over the current links. Existing fields come
    /// back as duplicates, so this is idempotent.
    fn rescan(&mut self) -> usize {
        let links: Vec<(LinkKey, FactionId)> =
            self.links.values().map(|l| (l.key(), l.owner)).collect();
        let mut recovered = 0;
        for (LinkKey(a, b), owner) in links {
            for c in self.common_neighbors(a, b) {
                if let Ok(Ok(_)) = self.attempt_field(a, b, c, owner) {
                    recovered += 1;
                }
            }
        }
        recovered
    }
}
