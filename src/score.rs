//! Per-faction scores and the non-double-counting area computation.

use crate::field::TriangleField;
use crate::geometry::try_union;
use geo::{Area, Polygon};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FactionScore {
    pub beacons: usize,
    pub links: usize,
    pub fields: usize,
    pub area: f64,
}

/// Area covered by `fields`, with overlapping or edge-sharing fields counted
/// once.
///
/// Takes an unprocessed field as accumulator and merges every remaining field
/// that unions with it into a single outline, repeating until nothing else
/// merges. The accumulated outline's area is added, and the next unprocessed
/// field starts a new island.
pub fn union_area<'a, I>(fields: I) -> f64
where
    I: IntoIterator<Item = &'a TriangleField>,
{
    // Zero-area fields add nothing and only upset the boolean ops.
    let polygons: VecDeque<Polygon<f64>> = fields
        .into_iter()
        .filter(|f| f.area() > 0.0)
        .map(TriangleField::polygon)
        .collect();
    union_area_of_polygons(polygons)
}

pub(crate) fn union_area_of_polygons(mut remaining: VecDeque<Polygon<f64>>) -> f64 {
    let mut total = 0.0;
    while let Some(mut acc) = remaining.pop_front() {
        loop {
            let mut merged_any = false;
            let mut i = 0;
            while i < remaining.len() {
                match try_union(&acc, &remaining[i]) {
                    Some(merged) => {
                        acc = merged;
                        remaining.remove(i);
                        merged_any = true;
                    }
                    None => i += 1,
                }
            }
            if !merged_any {
                break;
            }
        }
        total += acc.unsigned_area();
    }
    total
}
