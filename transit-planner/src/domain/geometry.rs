//! Planar geometry in map coordinates (metres).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Distances below this are treated as equal.
pub const EPSILON: f64 = 1e-6;

/// A point on the map, in metres.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        self.distance_sq(other).sqrt()
    }

    pub fn distance_sq(self, other: Point) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Whether two points coincide within `tolerance` metres.
    pub fn approx_eq(self, other: Point, tolerance: f64) -> bool {
        self.distance_sq(other) <= tolerance * tolerance
    }

    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }

    pub fn to_array(self) -> [f64; 2] {
        [self.x, self.y]
    }

    pub fn from_array(a: [f64; 2]) -> Self {
        Self::new(a[0], a[1])
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Which side of a directed line a point lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Side of `p` relative to the directed line `a -> b`.
    ///
    /// Points exactly on the line count as `Right`.
    pub fn of(a: Point, b: Point, p: Point) -> Side {
        let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
        if cross > 0.0 { Side::Left } else { Side::Right }
    }
}

/// Closest point to `p` on the segment `a -> b`, with its parameter in `[0, 1]`.
pub fn nearest_point_on_segment(a: Point, b: Point, p: Point) -> (Point, f64) {
    let len_sq = a.distance_sq(b);
    if len_sq < EPSILON * EPSILON {
        return (a, 0.0);
    }
    let t = ((p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y)) / len_sq;
    let t = t.clamp(0.0, 1.0);
    (a.lerp(b, t), t)
}

/// Where a point projects onto a polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolylineProjection {
    /// The projected point.
    pub point: Point,
    /// Index of the polyline piece containing the projection.
    pub piece: usize,
    /// Distance along the polyline from its first vertex.
    pub along: f64,
    /// Distance between the query point and its projection.
    pub distance: f64,
}

/// Project `p` onto the polyline `positions`.
///
/// `cumulative[i]` must hold the distance along the polyline to
/// `positions[i]`. Returns `None` for polylines with fewer than two vertices.
pub fn project_onto_polyline(
    positions: &[Point],
    cumulative: &[f64],
    p: Point,
) -> Option<PolylineProjection> {
    let mut best: Option<PolylineProjection> = None;
    for (piece, w) in positions.windows(2).enumerate() {
        let (point, t) = nearest_point_on_segment(w[0], w[1], p);
        let distance = point.distance(p);
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(PolylineProjection {
                point,
                piece,
                along: cumulative[piece] + w[0].distance(w[1]) * t,
                distance,
            });
        }
    }
    best
}

/// Running distances along a polyline, starting at zero.
pub fn cumulative_lengths(positions: &[Point]) -> Vec<f64> {
    let mut out = Vec::with_capacity(positions.len());
    let mut total = 0.0;
    out.push(0.0);
    for w in positions.windows(2) {
        total += w[0].distance(w[1]);
        out.push(total);
    }
    if positions.is_empty() {
        out.clear();
    }
    out
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Point,
    pub max: Point,
}

impl Bounds {
    /// Smallest box containing all `points`, or `None` if empty.
    pub fn enclosing(points: impl IntoIterator<Item = Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Bounds {
            min: first,
            max: first,
        };
        for p in iter {
            bounds.min.x = bounds.min.x.min(p.x);
            bounds.min.y = bounds.min.y.min(p.y);
            bounds.max.x = bounds.max.x.max(p.x);
            bounds.max.y = bounds.max.y.max(p.y);
        }
        Some(bounds)
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distances() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!(a.distance_sq(b), 25.0);
        assert!(b.approx_eq(Point::new(3.0, 4.0000001), 1e-3));
        assert!(!a.approx_eq(b, 4.9));
    }

    #[test]
    fn side_of_line() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(Side::of(a, b, Point::new(5.0, 3.0)), Side::Left);
        assert_eq!(Side::of(a, b, Point::new(5.0, -3.0)), Side::Right);
        assert_eq!(Side::of(b, a, Point::new(5.0, 3.0)), Side::Right);
        assert_eq!(Side::of(a, b, Point::new(5.0, 0.0)), Side::Right);
    }

    #[test]
    fn projection_clamps_to_segment() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);

        let (p, t) = nearest_point_on_segment(a, b, Point::new(4.0, 7.0));
        assert_eq!(p, Point::new(4.0, 0.0));
        assert!((t - 0.4).abs() < 1e-12);

        let (p, t) = nearest_point_on_segment(a, b, Point::new(-5.0, 1.0));
        assert_eq!(p, a);
        assert_eq!(t, 0.0);
    }

    #[test]
    fn polyline_projection_tracks_distance_along() {
        let line = [
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
        ];
        let cumulative = cumulative_lengths(&line);
        assert_eq!(cumulative, vec![0.0, 10.0, 20.0]);

        let proj = project_onto_polyline(&line, &cumulative, Point::new(12.0, 6.0)).unwrap();
        assert_eq!(proj.piece, 1);
        assert_eq!(proj.point, Point::new(10.0, 6.0));
        assert!((proj.along - 16.0).abs() < 1e-9);
        assert!((proj.distance - 2.0).abs() < 1e-9);

        assert!(project_onto_polyline(&line[..1], &cumulative[..1], Point::default()).is_none());
    }

    #[test]
    fn bounds_enclose_points() {
        let b = Bounds::enclosing([
            Point::new(1.0, 5.0),
            Point::new(-2.0, 3.0),
            Point::new(4.0, -1.0),
        ])
        .unwrap();
        assert_eq!(b.min, Point::new(-2.0, -1.0));
        assert_eq!(b.max, Point::new(4.0, 5.0));
        assert_eq!(b.width(), 6.0);
        assert_eq!(b.height(), 6.0);
        assert!(Bounds::enclosing(std::iter::empty()).is_none());
    }
}
