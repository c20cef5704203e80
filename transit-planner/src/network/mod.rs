//! The street and transit network the planner searches.
//!
//! A [`Network`] owns every street, segment, intersection, line, stop, route
//! and parking lot in dense arenas indexed by their ids. It is immutable once
//! built, so it can be shared between concurrent searches behind an `Arc`.
//!
//! Spatial lookups (snapping a coordinate to the nearest street, finding
//! stops within walking distance, nearest free parking) go through R-trees
//! built alongside the arenas.

mod builder;
mod file;
mod parking;
mod street;
mod transit;

use rstar::RTree;
use rstar::primitives::{GeomWithData, Line as LinePrimitive};
use serde::Serialize;

use crate::domain::{
    Bounds, DomainError, EntityKind, IntersectionId, LineId, ParkingLotId, Point, RouteId,
    SegmentId, Side, StopId, StreetId,
};

pub use builder::NetworkBuilder;
pub use file::{LoadError, NetworkFile};
pub use parking::ParkingLot;
pub use street::{SegmentProjection, Street, StreetClass, StreetIntersection, StreetSegment};
pub use transit::{Line, Route, Stop};

/// Coordinates further than this from every street do not snap.
pub const MAX_SNAP_DISTANCE: f64 = 500.0;

/// One straight piece of a segment's polyline.
type SegmentPiece = GeomWithData<LinePrimitive<[f64; 2]>, SegmentId>;

/// A point feature tagged with its id.
type IndexedPoint<T> = GeomWithData<[f64; 2], T>;

/// A coordinate snapped onto the street network.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StreetSnap {
    pub segment: SegmentId,
    /// Closest point on the segment.
    pub position: Point,
    /// Side of the segment (start-to-end) the original coordinate is on.
    pub side: Side,
    /// Distance from the original coordinate to `position`.
    pub distance: f64,
}

/// Entity counts for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkSummary {
    pub intersections: usize,
    pub streets: usize,
    pub segments: usize,
    pub lines: usize,
    pub stops: usize,
    pub routes: usize,
    pub parking_lots: usize,
}

/// An immutable city network.
pub struct Network {
    intersections: Vec<StreetIntersection>,
    streets: Vec<Street>,
    segments: Vec<StreetSegment>,
    lines: Vec<Line>,
    stops: Vec<Stop>,
    routes: Vec<Route>,
    parking_lots: Vec<ParkingLot>,

    segment_index: RTree<SegmentPiece>,
    intersection_index: RTree<IndexedPoint<IntersectionId>>,
    stop_index: RTree<IndexedPoint<StopId>>,
    parking_index: RTree<IndexedPoint<ParkingLotId>>,
}

fn lookup<'a, T>(items: &'a [T], kind: EntityKind, index: u32) -> Result<&'a T, DomainError> {
    items
        .get(index as usize)
        .ok_or(DomainError::unknown(kind, index))
}

impl Network {
    pub(crate) fn from_parts(
        intersections: Vec<StreetIntersection>,
        streets: Vec<Street>,
        segments: Vec<StreetSegment>,
        lines: Vec<Line>,
        stops: Vec<Stop>,
        routes: Vec<Route>,
        parking_lots: Vec<ParkingLot>,
    ) -> Self {
        let pieces = segments
            .iter()
            .flat_map(|seg| {
                seg.positions.windows(2).map(move |w| {
                    GeomWithData::new(
                        LinePrimitive::new(w[0].to_array(), w[1].to_array()),
                        seg.id,
                    )
                })
            })
            .collect();
        let intersection_points = intersections
            .iter()
            .map(|i| GeomWithData::new(i.position.to_array(), i.id))
            .collect();
        let stop_points = stops
            .iter()
            .map(|s| GeomWithData::new(s.position.to_array(), s.id))
            .collect();
        let lot_points = parking_lots
            .iter()
            .map(|l| GeomWithData::new(l.centroid.to_array(), l.id))
            .collect();

        Self {
            segment_index: RTree::bulk_load(pieces),
            intersection_index: RTree::bulk_load(intersection_points),
            stop_index: RTree::bulk_load(stop_points),
            parking_index: RTree::bulk_load(lot_points),
            intersections,
            streets,
            segments,
            lines,
            stops,
            routes,
            parking_lots,
        }
    }

    pub fn intersection(&self, id: IntersectionId) -> Result<&StreetIntersection, DomainError> {
        lookup(&self.intersections, EntityKind::Intersection, id.0)
    }

    pub fn street(&self, id: StreetId) -> Result<&Street, DomainError> {
        lookup(&self.streets, EntityKind::Street, id.0)
    }

    pub fn segment(&self, id: SegmentId) -> Result<&StreetSegment, DomainError> {
        lookup(&self.segments, EntityKind::Segment, id.0)
    }

    pub fn line(&self, id: LineId) -> Result<&Line, DomainError> {
        lookup(&self.lines, EntityKind::Line, id.0)
    }

    pub fn stop(&self, id: StopId) -> Result<&Stop, DomainError> {
        lookup(&self.stops, EntityKind::Stop, id.0)
    }

    pub fn route(&self, id: RouteId) -> Result<&Route, DomainError> {
        lookup(&self.routes, EntityKind::Route, id.0)
    }

    pub fn parking_lot(&self, id: ParkingLotId) -> Result<&ParkingLot, DomainError> {
        lookup(&self.parking_lots, EntityKind::ParkingLot, id.0)
    }

    /// The street a segment belongs to.
    pub fn street_of(&self, segment: SegmentId) -> Result<&Street, DomainError> {
        self.street(self.segment(segment)?.street)
    }

    pub fn intersections(&self) -> impl Iterator<Item = &StreetIntersection> {
        self.intersections.iter()
    }

    pub fn segments(&self) -> impl Iterator<Item = &StreetSegment> {
        self.segments.iter()
    }

    pub fn stops(&self) -> impl Iterator<Item = &Stop> {
        self.stops.iter()
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.lines.iter()
    }

    pub fn summary(&self) -> NetworkSummary {
        NetworkSummary {
            intersections: self.intersections.len(),
            streets: self.streets.len(),
            segments: self.segments.len(),
            lines: self.lines.len(),
            stops: self.stops.len(),
            routes: self.routes.len(),
            parking_lots: self.parking_lots.len(),
        }
    }

    /// Box around every intersection and stop.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::enclosing(
            self.intersections
                .iter()
                .map(|i| i.position)
                .chain(self.stops.iter().map(|s| s.position)),
        )
    }

    /// Snap `point` to the nearest street segment within [`MAX_SNAP_DISTANCE`].
    ///
    /// River segments are only considered when `use_rivers` is set.
    pub fn closest_street(&self, point: Point, use_rivers: bool) -> Option<StreetSnap> {
        let query = point.to_array();
        for piece in self.segment_index.nearest_neighbor_iter(&query) {
            let segment = self.segments.get(piece.data.index())?;
            let from = Point::from_array(piece.geom().from);
            let to = Point::from_array(piece.geom().to);
            let (on_piece, _) = crate::domain::nearest_point_on_segment(from, to, point);
            if on_piece.distance(point) > MAX_SNAP_DISTANCE {
                return None;
            }
            let is_river = self
                .streets
                .get(segment.street.index())
                .is_some_and(|s| s.class == StreetClass::River);
            if is_river && !use_rivers {
                continue;
            }
            let projection = segment.closest_point_and_side(point)?;
            return Some(StreetSnap {
                segment: segment.id,
                position: projection.point,
                side: projection.side,
                distance: projection.distance,
            });
        }
        None
    }

    /// Stops within `radius` metres of `point`, nearest first.
    pub fn stops_within(&self, point: Point, radius: f64) -> Vec<(StopId, f64)> {
        let mut found: Vec<(StopId, f64)> = self
            .stop_index
            .locate_within_distance(point.to_array(), radius * radius)
            .map(|entry| {
                let d = Point::from_array(*entry.geom()).distance(point);
                (entry.data, d)
            })
            .collect();
        found.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        found
    }

    /// The closest parking lot that still has a free space.
    pub fn nearest_free_parking_lot(&self, point: Point) -> Option<ParkingLotId> {
        self.parking_index
            .nearest_neighbor_iter(&point.to_array())
            .map(|entry| entry.data)
            .find(|id| {
                self.parking_lots
                    .get(id.index())
                    .is_some_and(ParkingLot::has_space)
            })
    }

    /// The closest intersection within `max_distance` satisfying `pred`.
    pub fn nearest_intersection_where(
        &self,
        point: Point,
        max_distance: f64,
        pred: impl Fn(&StreetIntersection) -> bool,
    ) -> Option<IntersectionId> {
        self.intersection_index
            .nearest_neighbor_iter(&point.to_array())
            .take_while(|entry| Point::from_array(*entry.geom()).distance(point) <= max_distance)
            .filter_map(|entry| self.intersections.get(entry.data.index()))
            .find(|i| pred(i))
            .map(|i| i.id)
    }

    /// Whether any street touching `intersection` is of a major class.
    pub fn is_major_intersection(&self, intersection: &StreetIntersection) -> bool {
        intersection.segments.iter().any(|seg| {
            self.street_of(*seg)
                .is_ok_and(|street| street.class.is_major())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn lookups_report_unknown_ids() {
        let net = fixtures::street_grid(2, 2, 100.0);
        assert!(net.intersection(IntersectionId(3)).is_ok());
        assert_eq!(
            net.intersection(IntersectionId(4)).unwrap_err(),
            DomainError::unknown(EntityKind::Intersection, 4)
        );
        assert!(net.route(RouteId(0)).is_err());
    }

    #[test]
    fn snaps_to_nearest_street_with_side() {
        let net = fixtures::street_grid(2, 2, 100.0);
        // Segment 0 runs from (0,0) to (100,0).
        let snap = net.closest_street(Point::new(30.0, -8.0), false).unwrap();
        assert_eq!(snap.segment, SegmentId(0));
        assert_eq!(snap.position, Point::new(30.0, 0.0));
        assert_eq!(snap.side, Side::Right);
        assert!((snap.distance - 8.0).abs() < 1e-9);
    }

    #[test]
    fn snapping_fails_far_off_map() {
        let net = fixtures::street_grid(2, 2, 100.0);
        assert!(net.closest_street(Point::new(5000.0, 5000.0), false).is_none());
    }

    #[test]
    fn rivers_are_skipped_unless_requested() {
        let net = fixtures::river_beside_road();
        let p = Point::new(50.0, 9.0);
        let road = net.closest_street(p, false).unwrap();
        assert_eq!(net.street_of(road.segment).unwrap().class, StreetClass::Residential);

        let river = net.closest_street(p, true).unwrap();
        assert_eq!(net.street_of(river.segment).unwrap().class, StreetClass::River);
    }

    #[test]
    fn stops_within_radius_sorted() {
        let net = fixtures::three_stop_line();
        let near = net.stops_within(Point::new(100.0, 0.0), 10_500.0);
        let ids: Vec<StopId> = near.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![StopId(0), StopId(1)]);
        assert!((near[0].1 - 100.0).abs() < 1e-9);
    }

    #[test]
    fn parking_skips_full_lots() {
        let net = fixtures::parking_street();
        let lot = net.nearest_free_parking_lot(Point::new(0.0, 0.0)).unwrap();
        assert_eq!(net.parking_lot(lot).unwrap().name, "Open");
    }

    #[test]
    fn nearest_major_intersection() {
        let net = fixtures::street_grid(3, 3, 100.0);
        let found = net.nearest_intersection_where(Point::new(90.0, 90.0), 50.0, |_| true);
        assert_eq!(found, Some(IntersectionId(4)));
        assert_eq!(
            net.nearest_intersection_where(Point::new(50.0, 50.0), 20.0, |_| true),
            None
        );
    }

    #[test]
    fn summary_and_bounds() {
        let net = fixtures::street_grid(3, 2, 100.0);
        let summary = net.summary();
        assert_eq!(summary.intersections, 6);
        assert_eq!(summary.segments, 7);
        let bounds = net.bounds().unwrap();
        assert_eq!(bounds.max, Point::new(200.0, 100.0));
    }
}
