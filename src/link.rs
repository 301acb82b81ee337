//! Links between beacons and the outcome of a link attempt.

use crate::beacon::{BeaconId, Timestamp};
use crate::faction::FactionId;
use crate::field::Rejection;
use crate::geometry::Segment;
use serde::{Deserialize, Serialize};

/// Order-independent key of a link: the smaller endpoint comes first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LinkKey(pub BeaconId, pub BeaconId);

impl LinkKey {
    pub fn new(a: BeaconId, b: BeaconId) -> Self {
        if a <= b {
            LinkKey(a, b)
        } else {
            LinkKey(b, a)
        }
    }
}

/// A single logical edge, tracked once regardless of which endpoint
/// initiated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub a: BeaconId,
    pub b: BeaconId,
    pub owner: FactionId,
    pub created_at: Timestamp,
}

impl Link {
    pub fn new(a: BeaconId, b: BeaconId, owner: FactionId, created_at: Timestamp) -> Self {
        let LinkKey(a, b) = LinkKey::new(a, b);
        Link {
            a,
            b,
            owner,
            created_at,
        }
    }

    pub fn key(&self) -> LinkKey {
        LinkKey(self.a, self.b)
    }

    pub fn segment(&self) -> Segment {
        Segment::new(self.a, self.b)
    }

    pub fn touches(&self, coord: BeaconId) -> bool {
        self.a == coord || self.b == coord
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkOutcome {
    Created,
    /// One endpoint already holds the configured maximum number of links.
    DegreeLimitExceeded,
    DuplicateLink,
}

/// Result of `add_link`. Link creation and field creation are independent:
/// a created link may close no field, or only rejected ones.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkResult {
    pub outcome: LinkOutcome,
    pub fields_created: usize,
    pub fields_rejected: usize,
    pub rejections: Vec<Rejection>,
}

impl LinkResult {
    pub(crate) fn refused(outcome: LinkOutcome) -> Self {
        LinkResult {
            outcome,
            fields_created: 0,
            fields_rejected: 0,
            rejections: Vec::new(),
        }
    }

    pub fn success(&self) -> bool {
        self.outcome == LinkOutcome::Created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    #[test]
    fn test_link_equality_is_order_independent() {
        let p = Point::new(0, 0);
        let q = Point::new(10, 0);
        assert_eq!(Link::new(p, q, FactionId(0), 5), Link::new(q, p, FactionId(0), 5));
        assert_eq!(LinkKey::new(p, q), LinkKey::new(q, p));
    }

    #[test]
    fn test_refused_result_is_not_success() {
        let result = LinkResult::refused(LinkOutcome::DuplicateLink);
        assert!(!result.success());
        assert_eq!(result.fields_created, 0);
    }
}
