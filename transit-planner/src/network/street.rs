//! Streets, street segments and intersections.

use serde::{Deserialize, Serialize};

use crate::domain::{
    IntersectionId, Point, SegmentId, Side, Speed, StreetId, project_onto_polyline,
};

/// Road class of a street.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreetClass {
    Highway,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Path,
    River,
}

impl StreetClass {
    /// Classes eligible to host routing hubs.
    pub fn is_major(self) -> bool {
        matches!(
            self,
            StreetClass::Highway
                | StreetClass::Primary
                | StreetClass::Secondary
                | StreetClass::Tertiary
        )
    }

    /// Speed limit used when a street does not declare one.
    pub fn default_speed(self) -> Speed {
        match self {
            StreetClass::Highway => Speed::from_kph(100.0),
            StreetClass::Primary => Speed::from_kph(70.0),
            StreetClass::Secondary => Speed::from_kph(50.0),
            StreetClass::Tertiary | StreetClass::Residential | StreetClass::Path => {
                Speed::from_kph(30.0)
            }
            StreetClass::River => Speed::from_kph(50.0),
        }
    }
}

/// A named street.
#[derive(Debug, Clone)]
pub struct Street {
    pub id: StreetId,
    pub name: String,
    pub class: StreetClass,
    pub one_way: bool,
    pub speed: Speed,
}

/// One piece of a street between two intersections.
///
/// `positions` always starts at the start intersection and ends at the end
/// intersection. One-way streets may only be driven from start to end.
#[derive(Debug, Clone)]
pub struct StreetSegment {
    pub id: SegmentId,
    pub street: StreetId,
    pub start: IntersectionId,
    pub end: IntersectionId,
    pub positions: Vec<Point>,
    pub cumulative: Vec<f64>,
    pub length: f64,
    pub has_tram_tracks: bool,
}

/// Where a point lies relative to a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Closest point on the segment.
    pub point: Point,
    /// Side of the segment (in start-to-end direction) the query point is on.
    pub side: Side,
    /// Distance from the query point to `point`.
    pub distance: f64,
}

impl StreetSegment {
    pub fn start_position(&self) -> Point {
        self.positions.first().copied().unwrap_or_default()
    }

    pub fn touches(&self, intersection: IntersectionId) -> bool {
        self.start == intersection || self.end == intersection
    }

    /// Closest point on the segment and the side `pos` lies on.
    pub fn closest_point_and_side(&self, pos: Point) -> Option<SegmentProjection> {
        let proj = project_onto_polyline(&self.positions, &self.cumulative, pos)?;
        let a = self.positions[proj.piece];
        let b = self.positions[proj.piece + 1];
        Some(SegmentProjection {
            point: proj.point,
            side: Side::of(a, b, pos),
            distance: proj.distance,
        })
    }

    /// Distance along the segment from its start to the projection of `pos`.
    pub fn distance_from_start(&self, pos: Point) -> f64 {
        project_onto_polyline(&self.positions, &self.cumulative, pos)
            .map_or(0.0, |p| p.along)
    }

    /// Fast estimate of [`distance_from_start`](Self::distance_from_start):
    /// the distance to the nearest piece's first vertex plus the straight
    /// line from there to `pos`.
    ///
    /// Overestimates for points off the centre line, so partial lengths
    /// derived from it can come out negative.
    pub fn approx_distance_from_start(&self, pos: Point) -> f64 {
        match project_onto_polyline(&self.positions, &self.cumulative, pos) {
            Some(p) => self.cumulative[p.piece] + self.positions[p.piece].distance(pos),
            None => 0.0,
        }
    }
}

/// A junction of street segments.
#[derive(Debug, Clone)]
pub struct StreetIntersection {
    pub id: IntersectionId,
    pub position: Point,
    pub segments: Vec<SegmentId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cumulative_lengths;

    fn l_shaped() -> StreetSegment {
        let positions = vec![
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            Point::new(100.0, 50.0),
        ];
        let cumulative = cumulative_lengths(&positions);
        StreetSegment {
            id: SegmentId(0),
            street: StreetId(0),
            start: IntersectionId(0),
            end: IntersectionId(1),
            length: 150.0,
            positions,
            cumulative,
            has_tram_tracks: false,
        }
    }

    #[test]
    fn distances_along_segment() {
        let seg = l_shaped();
        assert!((seg.distance_from_start(Point::new(40.0, 5.0)) - 40.0).abs() < 1e-9);
        assert!((seg.distance_from_start(Point::new(103.0, 20.0)) - 120.0).abs() < 1e-9);
    }

    #[test]
    fn approx_distance_overestimates_off_line() {
        let seg = l_shaped();
        let pos = Point::new(40.0, 30.0);
        let approx = seg.approx_distance_from_start(pos);
        assert!(approx > seg.distance_from_start(pos));
        assert!((approx - 50.0).abs() < 1e-9);
    }

    #[test]
    fn closest_point_reports_side() {
        let seg = l_shaped();
        let left = seg.closest_point_and_side(Point::new(50.0, 10.0)).unwrap();
        assert_eq!(left.side, Side::Left);
        assert_eq!(left.point, Point::new(50.0, 0.0));
        assert!((left.distance - 10.0).abs() < 1e-9);

        let right = seg.closest_point_and_side(Point::new(50.0, -10.0)).unwrap();
        assert_eq!(right.side, Side::Right);
    }

    #[test]
    fn endpoints() {
        let seg = l_shaped();
        assert_eq!(seg.start_position(), Point::new(0.0, 0.0));
        assert!(seg.touches(IntersectionId(0)));
        assert!(!seg.touches(IntersectionId(9)));
    }

    #[test]
    fn major_classes() {
        assert!(StreetClass::Highway.is_major());
        assert!(StreetClass::Tertiary.is_major());
        assert!(!StreetClass::Residential.is_major());
        assert!(!StreetClass::River.is_major());
    }
}
