use crate::faction::FactionId;
use crate::geometry::{point_in_triangle, triangle_area, triangle_polygon, triangle_sides, Point, Segment};
use crate::link::LinkKey;
use geo::Polygon;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content-addressed field id
pub type FieldId = [u8; 32];

/// A control field: three mutually linked beacons of one faction.
///
/// Vertices are kept sorted, so two fields over the same three beacons compare
/// equal whatever order they were given in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "FieldRepr")]
pub struct TriangleField {
    vertices: [Point; 3],
    pub owner: FactionId,
}

#[derive(Deserialize)]
struct FieldRepr {
    vertices: [Point; 3],
    owner: FactionId,
}

impl From<FieldRepr> for TriangleField {
    fn from(repr: FieldRepr) -> Self {
        let [a, b, c] = repr.vertices;
        TriangleField::new(a, b, c, repr.owner)
    }
}

impl TriangleField {
    pub fn new(a: Point, b: Point, c: Point, owner: FactionId) -> Self {
        let mut vertices = [a, b, c];
        vertices.sort();
        TriangleField { vertices, owner }
    }

    pub fn vertices(&self) -> &[Point; 3] {
        &self.vertices
    }

    pub fn has_vertex(&self, p: Point) -> bool {
        self.vertices.contains(&p)
    }

    /// Calculates the area of the field using the Shoelace formula.
    pub fn area(&self) -> f64 {
        let [a, b, c] = self.vertices;
        triangle_area(a, b, c)
    }

    pub fn sides(&self) -> [Segment; 3] {
        triangle_sides(&self.vertices)
    }

    /// Boundary-inclusive containment.
    pub fn contains(&self, p: Point) -> bool {
        point_in_triangle(p, &self.vertices)
    }

    /// True if either field contains a vertex of the other.
    pub fn vertex_overlaps(&self, other: &TriangleField) -> bool {
        other.vertices.iter().any(|v| self.contains(*v))
            || self.vertices.iter().any(|v| other.contains(*v))
    }

    pub fn polygon(&self) -> Polygon<f64> {
        triangle_polygon(&self.vertices)
    }

    /// Calculates the unique hash of the field.
    ///
    /// Vertices are already canonical, so the hash is invariant under
    /// permutation of the constructor arguments. The owner is part of the id.
    pub fn id(&self) -> FieldId {
        let mut hasher = Sha256::new();
        for vertex in &self.vertices {
            hasher.update(vertex.x.to_le_bytes());
            hasher.update(vertex.y.to_le_bytes());
        }
        hasher.update(self.owner.0.to_le_bytes());
        hasher.finalize().into()
    }

    pub fn id_str(&self) -> String {
        hex::encode(self.id())
    }
}

/// Why a candidate field was refused. These are ordinary game outcomes, not
/// errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    DuplicateField,
    /// An enemy field contains one of our vertices, or the candidate contains
    /// one of theirs.
    Overlap { enemy: FactionId, field: FieldId },
    /// A side of the candidate crosses an enemy link.
    Crossing { enemy: FactionId, link: LinkKey },
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn setup_test_field() -> TriangleField {
        TriangleField::new(
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(5, 10),
            FactionId(0),
        )
    }

    #[test]
    fn test_field_area() {
        assert_eq!(setup_test_field().area(), 50.0);
    }

    #[test]
    fn test_field_id_changes_with_owner() {
        let f = setup_test_field();
        let [a, b, c] = *f.vertices();
        let g = TriangleField::new(a, b, c, FactionId(1));
        assert_ne!(f, g);
        assert_ne!(f.id(), g.id());
        assert_eq!(f.id_str().len(), 64);
    }

    #[test]
    fn test_vertex_overlap_either_direction() {
        let big = setup_test_field();
        let inner = TriangleField::new(
            Point::new(4, 2),
            Point::new(6, 2),
            Point::new(5, 4),
            FactionId(1),
        );
        assert!(big.vertex_overlaps(&inner));
        assert!(inner.vertex_overlaps(&big));

        let far = TriangleField::new(
            Point::new(40, 40),
            Point::new(50, 40),
            Point::new(45, 50),
            FactionId(1),
        );
        assert!(!big.vertex_overlaps(&far));
    }

    #[test]
    fn test_deserialized_field_is_canonical() {
        let json = r#"{"vertices":[{"x":5,"y":10},{"x":0,"y":0},{"x":10,"y":0}],"owner":0}"#;
        let field: TriangleField = serde_json::from_str(json).unwrap();
        assert_eq!(field, setup_test_field());
    }

    proptest! {
        #[test]
        fn field_identity_ignores_vertex_order(
            pts in prop::array::uniform3((-1000i32..1000, -1000i32..1000)),
            owner in 0u16..4,
        ) {
            let [a, b, c] = pts.map(|(x, y)| Point::new(x, y));
            let f = FactionId(owner);
            let base = TriangleField::new(a, b, c, f);
            for perm in [[b, c, a], [c, a, b], [b, a, c], [a, c, b], [c, b, a]] {
                let other = TriangleField::new(perm[0], perm[1], perm[2], f);
                prop_assert_eq!(&base, &other);
                prop_assert_eq!(base.id(), other.id());
            }
        }
    }
}
