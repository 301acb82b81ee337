use super::state::Engine;
use super::validation;
use crate::beacon::{BeaconId, Timestamp};
use crate::error::Result;
use crate::events::Delta;
use crate::faction::FactionId;
use crate::link::{Link, LinkKey, LinkOutcome, LinkResult};

impl Engine {
    /// Links `a` to `b` on behalf of `faction`, stamped with the current time.
    ///
    /// Every 3-cycle the new link closes is tried as a field. A created link
    /// is reported as success even when all of those attempts were refused.
    pub fn add_link(&mut self, a: BeaconId, b: BeaconId, faction: FactionId) -> Result<LinkResult> {
        self.link_beacons(a, b, faction, None)
    }

    /// Same as [`add_link`](Self::add_link) with a caller-supplied creation
    /// timestamp (epoch milliseconds).
    pub fn add_link_at(
        &mut self,
        a: BeaconId,
        b: BeaconId,
        faction: FactionId,
        created_at: Timestamp,
    ) -> Result<LinkResult> {
        self.link_beacons(a, b, faction, Some(created_at))
    }

    pub(super) fn link_beacons(
        &mut self,
        a: BeaconId,
        b: BeaconId,
        faction: FactionId,
        created_at: Option<Timestamp>,
    ) -> Result<LinkResult> {
        validation::check_link_endpoints(self, a, b, faction)?;

        if let Some(outcome) = validation::link_refusal(self, a, b) {
            tracing::debug!(%a, %b, ?outcome, "link refused");
            return Ok(LinkResult::refused(outcome));
        }

        let created_at = self.next_timestamp(created_at);
        if let Some(from) = self.beacons.get_mut(a) {
            from.insert_link(b, created_at);
        }
        if let Some(to) = self.beacons.get_mut(b) {
            to.insert_link(a, created_at);
        }
        let link = Link::new(a, b, faction, created_at);
        self.links.insert(link.key(), link);
        self.record(Delta::LinkCreated(link));
        tracing::debug!(%a, %b, %faction, created_at, "link created");

        let mut result = LinkResult {
            outcome: LinkOutcome::Created,
            fields_created: 0,
            fields_rejected: 0,
            rejections: Vec::new(),
        };
        self.close_triangles(a, b, faction, &mut result);
        self.refresh(faction);
        Ok(result)
    }

    /// Symmetric removal from both adjacencies and the link table. No-op when
    /// the link does not exist.
    pub(super) fn remove_link(&mut self, a: BeaconId, b: BeaconId) -> Option<Link> {
        if let Some(from) = self.beacons.get_mut(a) {
            from.remove_link(b);
        }
        if let Some(to) = self.beacons.get_mut(b) {
            to.remove_link(a);
        }
        let link = self.links.remove(&LinkKey::new(a, b))?;
        self.record(Delta::LinkRemoved(link));
        Some(link)
    }
}
