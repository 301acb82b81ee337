use super::state::Engine;
use super::validation;
use crate::beacon::BeaconId;
use crate::error::Result;
use crate::events::Delta;
use crate::faction::FactionId;
use crate::field::{FieldId, Rejection, TriangleField};
use crate::link::LinkResult;

impl Engine {
    /// Creates a control field over three beacons owned by `faction`.
    ///
    /// Returns `Ok(false)` when the field is refused by a game rule
    /// (duplicate, enemy overlap, enemy link crossing).
    pub fn create_field(
        &mut self,
        p1: BeaconId,
        p2: BeaconId,
        p3: BeaconId,
        faction: FactionId,
    ) -> Result<bool> {
        match self.attempt_field(p1, p2, p3, faction)? {
            Ok(_) => {
                self.refresh(faction);
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    /// Dry run of [`create_field`](Self::create_field): the rejection it would
    /// hit, if any.
    pub fn check_field(
        &self,
        p1: BeaconId,
        p2: BeaconId,
        p3: BeaconId,
        faction: FactionId,
    ) -> Result<Option<Rejection>> {
        validation::check_field_vertices(self, [p1, p2, p3], faction)?;
        let candidate = TriangleField::new(p1, p2, p3, faction);
        Ok(validation::field_rejection(self, &candidate))
    }

    /// Validates and inserts a field without refreshing scores.
    pub(super) fn attempt_field(
        &mut self,
        p1: BeaconId,
        p2: BeaconId,
        p3: BeaconId,
        faction: FactionId,
    ) -> Result<std::result::Result<FieldId, Rejection>> {
        if let Some(rejection) = self.check_field(p1, p2, p3, faction)? {
            tracing::debug!(%p1, %p2, %p3, %faction, ?rejection, "field refused");
            return Ok(Err(rejection));
        }

        let field = TriangleField::new(p1, p2, p3, faction);
        let id = field.id();
        tracing::debug!(field = %field.id_str(), %faction, area = field.area(), "field created");
        self.fields.insert(id, field.clone());
        self.record(Delta::FieldCreated(field));
        Ok(Ok(id))
    }

    /// Tries every triangle closed by the link `a`-`b`, tallying into `result`.
    pub(super) fn close_triangles(
        &mut self,
        a: BeaconId,
        b: BeaconId,
        faction: FactionId,
        result: &mut LinkResult,
    ) {
        for c in self.common_neighbors(a, b) {
            match self.attempt_field(a, b, c, faction) {
                Ok(Ok(_)) => result.fields_created += 1,
                Ok(Err(rejection)) => {
                    result.fields_rejected += 1;
                    result.rejections.push(rejection);
                }
                Err(e) => {
                    tracing::warn!(%a, %b, %c, error = %e, "skipping triangle with inconsistent vertices");
                    result.fields_rejected += 1;
                }
            }
        }
    }

    /// Removes every field with `coord` as a vertex. Returns how many went.
    pub(super) fn remove_fields_at_vertex(&mut self, coord: BeaconId) -> usize {
        let doomed: Vec<FieldId> = self
            .fields
            .iter()
            .filter(|(_, f)| f.has_vertex(coord))
            .map(|(id, _)| *id)
            .collect();
        for id in &doomed {
            if let Some(field) = self.fields.remove(id) {
                self.record(Delta::FieldRemoved(field));
            }
        }
        doomed.len()
    }
}
