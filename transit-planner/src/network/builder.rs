//! Incremental construction of a [`Network`].

use crate::domain::{
    DomainError, EntityKind, IntersectionId, LineId, LineSchedule, ParkingLotId, Point, RouteId,
    SegmentId, Speed, StopId, StreetId, TransitType, cumulative_lengths,
};

use super::parking::ParkingLot;
use super::street::{Street, StreetClass, StreetIntersection, StreetSegment};
use super::transit::{Line, Route, Stop};
use super::Network;

/// Builder for a [`Network`].
///
/// Ids are handed out in insertion order. Route travel times and schedule
/// offsets are derived from line speeds when the network is built, so speeds
/// may be changed after routes are added.
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    intersections: Vec<StreetIntersection>,
    streets: Vec<Street>,
    segments: Vec<StreetSegment>,
    lines: Vec<Line>,
    stops: Vec<Stop>,
    routes: Vec<Route>,
    parking_lots: Vec<ParkingLot>,
}

fn check<T>(items: &[T], kind: EntityKind, id: u32) -> Result<(), DomainError> {
    if (id as usize) < items.len() {
        Ok(())
    } else {
        Err(DomainError::unknown(kind, id))
    }
}

fn next_id<T>(items: &[T]) -> u32 {
    items.len() as u32
}

impl NetworkBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_intersection(&mut self, position: Point) -> IntersectionId {
        let id = IntersectionId(next_id(&self.intersections));
        self.intersections.push(StreetIntersection {
            id,
            position,
            segments: Vec::new(),
        });
        id
    }

    /// Add a street using its class's default speed.
    pub fn add_street(&mut self, name: &str, class: StreetClass, one_way: bool) -> StreetId {
        let id = StreetId(next_id(&self.streets));
        self.streets.push(Street {
            id,
            name: name.to_string(),
            class,
            one_way,
            speed: class.default_speed(),
        });
        id
    }

    pub fn set_street_speed(&mut self, street: StreetId, speed: Speed) -> Result<(), DomainError> {
        check(&self.streets, EntityKind::Street, street.0)?;
        self.streets[street.index()].speed = speed;
        Ok(())
    }

    /// Add a segment of `street` from `start` to `end`, bending through `waypoints`.
    pub fn add_segment(
        &mut self,
        street: StreetId,
        start: IntersectionId,
        end: IntersectionId,
        waypoints: &[Point],
    ) -> Result<SegmentId, DomainError> {
        check(&self.streets, EntityKind::Street, street.0)?;
        check(&self.intersections, EntityKind::Intersection, start.0)?;
        check(&self.intersections, EntityKind::Intersection, end.0)?;
        if start == end {
            return Err(DomainError::InvalidGeometry(format!(
                "segment would start and end at {start}"
            )));
        }

        let id = SegmentId(next_id(&self.segments));
        let mut positions = Vec::with_capacity(waypoints.len() + 2);
        positions.push(self.intersections[start.index()].position);
        positions.extend_from_slice(waypoints);
        positions.push(self.intersections[end.index()].position);
        let cumulative = cumulative_lengths(&positions);
        let length = cumulative.last().copied().unwrap_or(0.0);

        self.segments.push(StreetSegment {
            id,
            street,
            start,
            end,
            positions,
            cumulative,
            length,
            has_tram_tracks: false,
        });
        self.intersections[start.index()].segments.push(id);
        self.intersections[end.index()].segments.push(id);
        Ok(id)
    }

    pub fn add_tram_tracks(&mut self, segment: SegmentId) -> Result<(), DomainError> {
        check(&self.segments, EntityKind::Segment, segment.0)?;
        self.segments[segment.index()].has_tram_tracks = true;
        Ok(())
    }

    /// Add a line with its transit type's default speed and schedule.
    pub fn add_line(&mut self, name: &str, transit_type: TransitType) -> LineId {
        let id = LineId(next_id(&self.lines));
        self.lines.push(Line {
            id,
            name: name.to_string(),
            transit_type,
            schedule: transit_type.default_schedule().into(),
            speed: transit_type.default_speed(),
            routes: Vec::new(),
        });
        id
    }

    pub fn set_schedule(
        &mut self,
        line: LineId,
        schedule: impl Into<LineSchedule>,
    ) -> Result<(), DomainError> {
        check(&self.lines, EntityKind::Line, line.0)?;
        let schedule = schedule.into();
        schedule.validate()?;
        self.lines[line.index()].schedule = schedule;
        Ok(())
    }

    pub fn set_line_speed(&mut self, line: LineId, speed: Speed) -> Result<(), DomainError> {
        check(&self.lines, EntityKind::Line, line.0)?;
        self.lines[line.index()].speed = speed;
        Ok(())
    }

    pub fn add_stop(&mut self, name: &str, position: Point) -> StopId {
        let id = StopId(next_id(&self.stops));
        self.stops.push(Stop {
            id,
            name: name.to_string(),
            position,
            outgoing: Vec::new(),
        });
        id
    }

    /// Append a route to `line` from `begin` to `end`.
    ///
    /// Routes must be appended in running order: each one starts where the
    /// previous one on the same line ended.
    pub fn add_route(
        &mut self,
        line: LineId,
        begin: StopId,
        end: StopId,
        waypoints: &[Point],
    ) -> Result<RouteId, DomainError> {
        check(&self.lines, EntityKind::Line, line.0)?;
        check(&self.stops, EntityKind::Stop, begin.0)?;
        check(&self.stops, EntityKind::Stop, end.0)?;
        if let Some(prev) = self.lines[line.index()].routes.last() {
            let prev_end = self.routes[prev.index()].end;
            if prev_end != begin {
                return Err(DomainError::InvalidNetwork(format!(
                    "route on {line} starts at {begin} but the previous one ends at {prev_end}"
                )));
            }
        }

        let id = RouteId(next_id(&self.routes));
        let mut positions = Vec::with_capacity(waypoints.len() + 2);
        positions.push(self.stops[begin.index()].position);
        positions.extend_from_slice(waypoints);
        positions.push(self.stops[end.index()].position);
        let length = cumulative_lengths(&positions).last().copied().unwrap_or(0.0);

        self.routes.push(Route {
            id,
            line,
            begin,
            end,
            positions,
            length,
            travel_secs: 0.0,
            offset_secs: 0.0,
        });
        self.lines[line.index()].routes.push(id);
        self.stops[begin.index()].outgoing.push(id);
        Ok(id)
    }

    pub fn add_parking_lot(&mut self, name: &str, centroid: Point, capacity: u32) -> ParkingLotId {
        let id = ParkingLotId(next_id(&self.parking_lots));
        self.parking_lots.push(ParkingLot {
            id,
            name: name.to_string(),
            centroid,
            capacity,
            occupied: 0,
        });
        id
    }

    pub fn set_occupancy(&mut self, lot: ParkingLotId, occupied: u32) -> Result<(), DomainError> {
        check(&self.parking_lots, EntityKind::ParkingLot, lot.0)?;
        self.parking_lots[lot.index()].occupied = occupied;
        Ok(())
    }

    /// Derive route timings and build the spatial indices.
    pub fn build(mut self) -> Result<Network, DomainError> {
        for line in &self.lines {
            if line.speed.kph() <= 0.0 {
                return Err(DomainError::InvalidNetwork(format!(
                    "{} has a non-positive speed",
                    line.id
                )));
            }
            let mut offset = 0.0;
            for route_id in &line.routes {
                let route = &mut self.routes[route_id.index()];
                route.travel_secs = line.speed.travel_secs(route.length);
                route.offset_secs = offset;
                offset += route.travel_secs;
            }
        }
        for street in &self.streets {
            if street.speed.kph() <= 0.0 {
                return Err(DomainError::InvalidNetwork(format!(
                    "{} has a non-positive speed",
                    street.id
                )));
            }
        }

        Ok(Network::from_parts(
            self.intersections,
            self.streets,
            self.segments,
            self.lines,
            self.stops,
            self.routes,
            self.parking_lots,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_register_with_intersections() {
        let mut b = NetworkBuilder::new();
        let a = b.add_intersection(Point::new(0.0, 0.0));
        let c = b.add_intersection(Point::new(100.0, 0.0));
        let st = b.add_street("Main", StreetClass::Primary, false);
        let seg = b
            .add_segment(st, a, c, &[Point::new(50.0, 50.0)])
            .unwrap();
        let net = b.build().unwrap();

        let segment = net.segment(seg).unwrap();
        assert_eq!(segment.positions.len(), 3);
        assert!((segment.length - 2.0 * 50.0 * 2f64.sqrt()).abs() < 1e-9);
        assert_eq!(net.intersection(a).unwrap().segments, vec![seg]);
        assert_eq!(net.intersection(c).unwrap().segments, vec![seg]);
    }

    #[test]
    fn rejects_unknown_references() {
        let mut b = NetworkBuilder::new();
        let a = b.add_intersection(Point::new(0.0, 0.0));
        let err = b
            .add_segment(StreetId(3), a, IntersectionId(9), &[])
            .unwrap_err();
        assert_eq!(err, DomainError::unknown(EntityKind::Street, 3));
    }

    #[test]
    fn rejects_degenerate_segment() {
        let mut b = NetworkBuilder::new();
        let a = b.add_intersection(Point::new(0.0, 0.0));
        let st = b.add_street("Loop", StreetClass::Residential, false);
        assert!(matches!(
            b.add_segment(st, a, a, &[]),
            Err(DomainError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn routes_must_be_contiguous() {
        let mut b = NetworkBuilder::new();
        let s0 = b.add_stop("A", Point::new(0.0, 0.0));
        let s1 = b.add_stop("B", Point::new(1000.0, 0.0));
        let s2 = b.add_stop("C", Point::new(2000.0, 0.0));
        let line = b.add_line("1", TransitType::Bus);
        b.add_route(line, s0, s1, &[]).unwrap();
        assert!(matches!(
            b.add_route(line, s2, s0, &[]),
            Err(DomainError::InvalidNetwork(_))
        ));
    }

    #[test]
    fn route_timings_follow_line_speed() {
        let mut b = NetworkBuilder::new();
        let s0 = b.add_stop("A", Point::new(0.0, 0.0));
        let s1 = b.add_stop("B", Point::new(10_000.0, 0.0));
        let s2 = b.add_stop("C", Point::new(18_000.0, 0.0));
        let line = b.add_line("U1", TransitType::Subway);
        let r0 = b.add_route(line, s0, s1, &[]).unwrap();
        let r1 = b.add_route(line, s1, s2, &[]).unwrap();
        b.set_line_speed(line, Speed::from_kph(60.0)).unwrap();
        let net = b.build().unwrap();

        let r0 = net.route(r0).unwrap();
        let r1 = net.route(r1).unwrap();
        assert!((r0.travel_secs - 600.0).abs() < 1e-9);
        assert!((r1.travel_secs - 480.0).abs() < 1e-9);
        assert_eq!(r0.offset_secs, 0.0);
        assert!((r1.offset_secs - 600.0).abs() < 1e-9);
        assert_eq!(net.stop(s1).unwrap().outgoing, vec![r1.id]);
    }

    #[test]
    fn invalid_schedule_is_rejected() {
        let mut b = NetworkBuilder::new();
        let line = b.add_line("1", TransitType::Tram);
        let bad = crate::domain::Schedule::new((4, 22), (22, 1), 0, 30);
        assert!(b.set_schedule(line, bad).is_err());
    }
}
