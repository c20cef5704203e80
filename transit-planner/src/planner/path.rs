//! Planned paths.

use crate::domain::{DomainError, IntersectionId};
use crate::network::Network;

use super::step::{DriveSegment, PathStep};

/// An ordered, Turn-normalised sequence of steps forming one itinerary.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlannedPath {
    steps: Vec<PathStep>,
}

/// Intersection shared by two consecutive drives, preferring the one the
/// second drive leaves from.
fn shared_intersection(
    prev: DriveSegment,
    next: DriveSegment,
    net: &Network,
) -> Result<Option<IntersectionId>, DomainError> {
    let prev_seg = net.segment(prev.segment)?;
    let next_seg = net.segment(next.segment)?;

    let entry = next.entry(net)?;
    if prev_seg.touches(entry) {
        return Ok(Some(entry));
    }
    let exit = prev.exit(net)?;
    if next_seg.touches(exit) {
        return Ok(Some(exit));
    }
    Ok([prev_seg.start, prev_seg.end]
        .into_iter()
        .find(|i| next_seg.touches(*i)))
}

impl PlannedPath {
    /// Build a path, inserting a `Turn` between every pair of adjacent
    /// drive steps that meet at an intersection.
    ///
    /// Steps already separated by a `Turn` are left alone, so rebuilding a
    /// path from its own steps changes nothing.
    pub fn new(steps: Vec<PathStep>, net: &Network) -> Result<Self, DomainError> {
        let mut out: Vec<PathStep> = Vec::with_capacity(steps.len() * 2);
        for step in steps {
            if let (Some(prev), Some(next)) = (
                out.last().and_then(PathStep::drive_segment),
                step.drive_segment(),
            ) && let Some(intersection) = shared_intersection(prev, next, net)?
            {
                out.push(PathStep::Turn {
                    from: prev.segment,
                    to: next.segment,
                    intersection,
                });
            }
            out.push(step);
        }
        Ok(Self { steps: out })
    }

    /// Wrap steps that are already normalised.
    pub(crate) fn from_normalized(steps: Vec<PathStep>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    pub fn into_steps(self) -> Vec<PathStep> {
        self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Whether the path is nothing but walking.
    pub fn is_walk(&self) -> bool {
        !self.steps.is_empty()
            && self
                .steps
                .iter()
                .all(|s| matches!(s, PathStep::Walk { .. }))
    }

    pub fn uses_public_transit(&self) -> bool {
        self.steps
            .iter()
            .any(|s| matches!(s, PathStep::PublicTransit { .. }))
    }

    /// Whether every driven segment has tram tracks.
    pub fn valid_for_tram(&self, net: &Network) -> Result<bool, DomainError> {
        for step in &self.steps {
            if let Some(drive) = step.drive_segment()
                && !net.segment(drive.segment)?.has_tram_tracks
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Whether each located step starts where the previous one ended.
    pub fn is_contiguous(&self, net: &Network, tolerance: f64) -> Result<bool, DomainError> {
        let mut last_end = None;
        for step in &self.steps {
            let Some(start) = step.start_location(net)? else {
                continue;
            };
            if let Some(end) = last_end
                && !start.approx_eq(end, tolerance)
            {
                return Ok(false);
            }
            last_end = step.end_location(net)?;
        }
        Ok(true)
    }

    /// Number of transit rides.
    pub fn transit_rides(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, PathStep::PublicTransit { .. }))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LineId, Point, RouteId, SegmentId};
    use crate::fixtures;
    use crate::planner::step::PartialDrive;

    fn drive(seg: u32, backward: bool) -> PathStep {
        PathStep::Drive(DriveSegment::new(SegmentId(seg), backward))
    }

    #[test]
    fn inserts_turn_between_adjacent_drives() {
        let net = fixtures::street_grid(3, 1, 100.0);
        let path = PlannedPath::new(vec![drive(0, false), drive(1, false)], &net).unwrap();
        assert_eq!(
            path.steps(),
            &[
                drive(0, false),
                PathStep::Turn {
                    from: SegmentId(0),
                    to: SegmentId(1),
                    intersection: IntersectionId(1),
                },
                drive(1, false),
            ]
        );
        assert!(path.is_contiguous(&net, 1e-6).unwrap());
    }

    #[test]
    fn turn_insertion_is_idempotent() {
        let net = fixtures::street_grid(3, 2, 100.0);
        let steps = vec![
            PathStep::Walk {
                from: Point::new(0.0, -10.0),
                to: Point::new(0.0, 0.0),
            },
            drive(0, false),
            drive(1, false),
            // Segment 6 runs north from intersection 2 to 5.
            drive(6, false),
        ];
        let once = PlannedPath::new(steps, &net).unwrap();
        assert_eq!(once.len(), 6);

        let twice = PlannedPath::new(once.steps().to_vec(), &net).unwrap();
        assert_eq!(once, twice);
        assert!(twice.is_contiguous(&net, 1e-6).unwrap());
    }

    #[test]
    fn no_turn_between_unconnected_drives() {
        let net = fixtures::street_grid(3, 2, 100.0);
        // Segment 0 is (0,0)-(100,0); segment 3 is (100,100)-(200,100).
        let path = PlannedPath::new(vec![drive(0, false), drive(3, false)], &net).unwrap();
        assert_eq!(path.len(), 2);
        assert!(!path.is_contiguous(&net, 1e-6).unwrap());
    }

    #[test]
    fn turn_after_partial_drive() {
        let net = fixtures::street_grid(3, 1, 100.0);
        let partial = PathStep::PartialDrive(PartialDrive {
            start: Point::new(40.0, 0.0),
            end: Point::new(100.0, 0.0),
            drive: DriveSegment::new(SegmentId(0), false),
            partial_start: true,
            partial_end: false,
            parking_lot: None,
        });
        let path = PlannedPath::new(vec![partial, drive(1, false)], &net).unwrap();
        assert!(matches!(
            path.steps()[1],
            PathStep::Turn {
                intersection: IntersectionId(1),
                ..
            }
        ));
    }

    #[test]
    fn derived_properties() {
        let net = fixtures::tram_street();
        let walk = PathStep::Walk {
            from: Point::new(0.0, 0.0),
            to: Point::new(1.0, 0.0),
        };
        assert!(PlannedPath::new(vec![walk.clone()], &net).unwrap().is_walk());
        assert!(!PlannedPath::default().is_walk());

        let tracked = PlannedPath::new(vec![drive(0, false)], &net).unwrap();
        assert!(tracked.valid_for_tram(&net).unwrap());
        let untracked = PlannedPath::new(vec![drive(0, false), drive(1, false)], &net).unwrap();
        assert!(!untracked.valid_for_tram(&net).unwrap());

        let ride = PathStep::PublicTransit {
            line: LineId(0),
            routes: vec![RouteId(0)],
        };
        let mixed = PlannedPath::from_normalized(vec![walk, ride]);
        assert!(mixed.uses_public_transit());
        assert!(!mixed.is_walk());
        assert_eq!(mixed.transit_rides(), 1);
    }
}
