use geo::{BooleanOps, LineString, Polygon};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ----------------------------------------------------------------------------
// 1.1 Coordinate System: Point
// ----------------------------------------------------------------------------

/// Represents a 2D point with integer coordinates (the beacon grid).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    /// Creates a new Point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    #[inline]
    fn to_tuple(self) -> (f64, f64) {
        (self.x as f64, self.y as f64)
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.x, self.y)
    }
}

impl FromStr for Point {
    type Err = String;

    /// Parses the `x:y` form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(':')
            .ok_or_else(|| format!("expected x:y, got {:?}", s))?;
        let x = x.trim().parse::<i32>().map_err(|e| format!("bad x in {:?}: {}", s, e))?;
        let y = y.trim().parse::<i32>().map_err(|e| format!("bad y in {:?}: {}", s, e))?;
        Ok(Point::new(x, y))
    }
}

// ----------------------------------------------------------------------------
// 1.2 Segments
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Segment {
    pub a: Point,
    pub b: Point,
}

impl Segment {
    #[inline]
    pub const fn new(a: Point, b: Point) -> Self {
        Segment { a, b }
    }
}

/// Signed cross product of `(a - o) x (b - o)`. Widened to i128 so that
/// extreme i32 coordinates cannot overflow.
#[inline]
fn cross(o: Point, a: Point, b: Point) -> i128 {
    let (ox, oy) = (o.x as i128, o.y as i128);
    (a.x as i128 - ox) * (b.y as i128 - oy) - (a.y as i128 - oy) * (b.x as i128 - ox)
}

#[inline]
fn orientation(o: Point, a: Point, b: Point) -> i8 {
    match cross(o, a, b) {
        v if v > 0 => 1,
        v if v < 0 => -1,
        _ => 0,
    }
}

/// `p` is collinear with `s` and inside its bounding box.
fn on_segment(p: Point, s: &Segment) -> bool {
    cross(s.a, s.b, p) == 0
        && p.x >= s.a.x.min(s.b.x)
        && p.x <= s.a.x.max(s.b.x)
        && p.y >= s.a.y.min(s.b.y)
        && p.y <= s.a.y.max(s.b.y)
}

/// Standard 2D segment intersection test. Touching, shared endpoints and
/// collinear overlap all count as intersecting.
pub fn segments_intersect(s1: &Segment, s2: &Segment) -> bool {
    let o1 = orientation(s1.a, s1.b, s2.a);
    let o2 = orientation(s1.a, s1.b, s2.b);
    let o3 = orientation(s2.a, s2.b, s1.a);
    let o4 = orientation(s2.a, s2.b, s1.b);

    if o1 != o2 && o3 != o4 {
        return true;
    }

    (o1 == 0 && on_segment(s2.a, s1))
        || (o2 == 0 && on_segment(s2.b, s1))
        || (o3 == 0 && on_segment(s1.a, s2))
        || (o4 == 0 && on_segment(s1.b, s2))
}

// ----------------------------------------------------------------------------
// 1.3 Triangles
// ----------------------------------------------------------------------------

/// Twice the signed area of the triangle (shoelace determinant).
#[inline]
pub fn twice_signed_area(p1: Point, p2: Point, p3: Point) -> i128 {
    cross(p1, p2, p3)
}

/// Calculates the area of the triangle using the Shoelace formula.
/// Degenerate triangles yield zero.
pub fn triangle_area(p1: Point, p2: Point, p3: Point) -> f64 {
    twice_signed_area(p1, p2, p3).unsigned_abs() as f64 / 2.0
}

/// The three sides of a triangle.
pub fn triangle_sides(tri: &[Point; 3]) -> [Segment; 3] {
    [
        Segment::new(tri[0], tri[1]),
        Segment::new(tri[1], tri[2]),
        Segment::new(tri[2], tri[0]),
    ]
}

/// Point containment, inclusive of the boundary.
///
/// A degenerate triangle only contains points lying on one of its sides.
pub fn point_in_triangle(pt: Point, tri: &[Point; 3]) -> bool {
    if twice_signed_area(tri[0], tri[1], tri[2]) == 0 {
        return triangle_sides(tri).iter().any(|s| on_segment(pt, s));
    }

    let d1 = orientation(tri[0], tri[1], pt);
    let d2 = orientation(tri[1], tri[2], pt);
    let d3 = orientation(tri[2], tri[0], pt);

    let has_neg = d1 < 0 || d2 < 0 || d3 < 0;
    let has_pos = d1 > 0 || d2 > 0 || d3 > 0;
    !(has_neg && has_pos)
}

// ----------------------------------------------------------------------------
// 1.4 Polygon Union
// ----------------------------------------------------------------------------

/// Closed polygon outline of a triangle.
pub fn triangle_polygon(tri: &[Point; 3]) -> Polygon<f64> {
    let ring = vec![
        tri[0].to_tuple(),
        tri[1].to_tuple(),
        tri[2].to_tuple(),
        tri[0].to_tuple(),
    ];
    Polygon::new(LineString::from(ring), vec![])
}

/// Union of two polygons, returned only when the result is a single
/// connected outline. Disjoint inputs give `None`.
pub fn try_union(a: &Polygon<f64>, b: &Polygon<f64>) -> Option<Polygon<f64>> {
    let merged = a.union(b);
    if merged.0.len() == 1 {
        merged.0.into_iter().next()
    } else {
        None
    }
}

// ----------------------------------------------------------------------------
// Testing
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Area;

    fn setup_test_triangle() -> [Point; 3] {
        [Point::new(0, 0), Point::new(10, 0), Point::new(5, 10)]
    }

    #[test]
    fn test_triangle_area() {
        let [a, b, c] = setup_test_triangle();
        assert_eq!(triangle_area(a, b, c), 50.0);
        assert_eq!(triangle_area(c, b, a), 50.0);
    }

    #[test]
    fn test_degenerate_triangle_has_zero_area() {
        assert_eq!(
            triangle_area(Point::new(1, 1), Point::new(2, 2), Point::new(3, 3)),
            0.0
        );
    }

    #[test]
    fn test_extreme_coordinates_do_not_overflow() {
        let area = triangle_area(
            Point::new(i32::MIN, i32::MIN),
            Point::new(i32::MAX, i32::MIN),
            Point::new(i32::MIN, i32::MAX),
        );
        assert!(area > 0.0);
    }

    #[test]
    fn test_point_display_and_parse() {
        let p = Point::new(-12, 40);
        assert_eq!(p.to_string(), "-12:40");
        assert_eq!("-12:40".parse::<Point>(), Ok(p));
        assert!("12,40".parse::<Point>().is_err());
    }

    #[test]
    fn test_crossing_segments_intersect() {
        let s1 = Segment::new(Point::new(0, 0), Point::new(10, 10));
        let s2 = Segment::new(Point::new(0, 10), Point::new(10, 0));
        assert!(segments_intersect(&s1, &s2));
    }

    #[test]
    fn test_shared_endpoint_counts_as_intersection() {
        let s1 = Segment::new(Point::new(0, 0), Point::new(10, 0));
        let s2 = Segment::new(Point::new(10, 0), Point::new(10, 10));
        assert!(segments_intersect(&s1, &s2));
    }

    #[test]
    fn test_parallel_and_collinear_disjoint_segments() {
        let s1 = Segment::new(Point::new(0, 0), Point::new(10, 0));
        let s2 = Segment::new(Point::new(0, 5), Point::new(10, 5));
        assert!(!segments_intersect(&s1, &s2));

        let s3 = Segment::new(Point::new(11, 0), Point::new(20, 0));
        assert!(!segments_intersect(&s1, &s3));

        let s4 = Segment::new(Point::new(5, 0), Point::new(20, 0));
        assert!(segments_intersect(&s1, &s4));
    }

    #[test]
    fn test_point_in_triangle() {
        let tri = setup_test_triangle();
        assert!(point_in_triangle(Point::new(5, 5), &tri));
        assert!(point_in_triangle(Point::new(0, 0), &tri));
        assert!(point_in_triangle(Point::new(5, 0), &tri));
        assert!(!point_in_triangle(Point::new(0, 10), &tri));
        assert!(!point_in_triangle(Point::new(-1, 0), &tri));
    }

    #[test]
    fn test_point_in_degenerate_triangle() {
        let tri = [Point::new(0, 0), Point::new(5, 5), Point::new(10, 10)];
        assert!(point_in_triangle(Point::new(3, 3), &tri));
        assert!(!point_in_triangle(Point::new(20, 20), &tri));
    }

    #[test]
    fn test_union_of_edge_sharing_triangles() {
        let left = triangle_polygon(&[Point::new(0, 0), Point::new(10, 0), Point::new(0, 10)]);
        let right = triangle_polygon(&[Point::new(10, 0), Point::new(10, 10), Point::new(0, 10)]);
        let merged = try_union(&left, &right).expect("triangles share an edge");
        assert!((merged.unsigned_area() - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_union_of_disjoint_triangles_is_none() {
        let a = triangle_polygon(&setup_test_triangle());
        let b = triangle_polygon(&[Point::new(100, 100), Point::new(110, 100), Point::new(105, 110)]);
        assert!(try_union(&a, &b).is_none());
    }
}
