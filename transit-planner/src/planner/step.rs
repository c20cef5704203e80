//! Itinerary steps.
//!
//! A [`PathStep`] is one leg of a journey. Each step knows how long it takes
//! and how much it costs under a given set of options; cost is duration in
//! seconds scaled by the factor for the step's kind.

use std::fmt;

use chrono::Duration;
use tracing::warn;

use crate::domain::{
    DomainError, IntersectionId, LineId, ParkingLotId, Point, RouteId, SegmentId, duration_secs,
    secs_to_duration,
};
use crate::network::{Network, StreetSegment};

use super::options::PathPlanningOptions;

/// A whole street segment driven in one direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DriveSegment {
    pub segment: SegmentId,
    /// Driven from the segment's end towards its start.
    pub backward: bool,
}

impl DriveSegment {
    pub fn new(segment: SegmentId, backward: bool) -> Self {
        Self { segment, backward }
    }

    /// The intersection the drive leaves from.
    pub fn entry(&self, net: &Network) -> Result<IntersectionId, DomainError> {
        let seg = net.segment(self.segment)?;
        Ok(if self.backward { seg.end } else { seg.start })
    }

    /// The intersection the drive arrives at.
    pub fn exit(&self, net: &Network) -> Result<IntersectionId, DomainError> {
        let seg = net.segment(self.segment)?;
        Ok(if self.backward { seg.start } else { seg.end })
    }
}

/// Driving only part of a segment, at the very start or end of a drive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartialDrive {
    /// Where driving begins.
    pub start: Point,
    /// Where driving ends.
    pub end: Point,
    pub drive: DriveSegment,
    /// `start` lies part-way along the segment.
    pub partial_start: bool,
    /// `end` lies part-way along the segment.
    pub partial_end: bool,
    /// Lot the car is left in after this step.
    pub parking_lot: Option<ParkingLotId>,
}

impl PartialDrive {
    /// Length of the driven sub-span.
    ///
    /// Uses the fast vertex-based distance estimate first and falls back to
    /// exact projection if that comes out negative. If even that is
    /// negative the whole segment length is used.
    pub fn traversed_length(&self, net: &Network) -> Result<f64, DomainError> {
        let seg = net.segment(self.drive.segment)?;

        let approx = self.length_with(seg, StreetSegment::approx_distance_from_start);
        if approx >= 0.0 {
            return Ok(approx);
        }

        let exact = self.length_with(seg, StreetSegment::distance_from_start);
        if exact >= 0.0 {
            return Ok(exact);
        }

        warn!(
            segment = %seg.id,
            approx,
            exact,
            "negative partial drive length, using full segment"
        );
        Ok(seg.length)
    }

    fn length_with(&self, seg: &StreetSegment, from_start: fn(&StreetSegment, Point) -> f64) -> f64 {
        let from_end = |p: Point| seg.length - from_start(seg, p);
        let mut length = seg.length;
        if self.partial_start {
            length -= if self.drive.backward {
                from_end(self.start)
            } else {
                from_start(seg, self.start)
            };
        }
        if self.partial_end {
            length -= if self.drive.backward {
                from_start(seg, self.end)
            } else {
                from_end(self.end)
            };
        }
        length
    }
}

/// Discriminant of a [`PathStep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Walk,
    Drive,
    PartialDrive,
    Turn,
    Wait,
    PublicTransit,
}

impl StepKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StepKind::Walk => "walk",
            StepKind::Drive => "drive",
            StepKind::PartialDrive => "partial_drive",
            StepKind::Turn => "turn",
            StepKind::Wait => "wait",
            StepKind::PublicTransit => "public_transit",
        }
    }

    /// Cost per second of a step of this kind.
    pub fn cost_factor(self, options: &PathPlanningOptions) -> f64 {
        match self {
            StepKind::Walk => options.walking_time_factor,
            StepKind::Drive | StepKind::PartialDrive | StepKind::Turn => {
                options.travel_time_factor * options.car_time_factor
            }
            StepKind::Wait => options.waiting_time_factor,
            StepKind::PublicTransit => options.travel_time_factor,
        }
    }
}

/// One leg of an itinerary.
#[derive(Debug, Clone, PartialEq)]
pub enum PathStep {
    /// Straight-line walk.
    Walk { from: Point, to: Point },
    /// A whole street segment.
    Drive(DriveSegment),
    /// Part of a street segment.
    PartialDrive(PartialDrive),
    /// Turning from one segment onto the next at an intersection.
    Turn {
        from: SegmentId,
        to: SegmentId,
        intersection: IntersectionId,
    },
    /// Waiting at a stop for a departure.
    Wait { duration: Duration },
    /// One ride on consecutive routes of a single line.
    PublicTransit { line: LineId, routes: Vec<RouteId> },
}

impl PathStep {
    pub fn kind(&self) -> StepKind {
        match self {
            PathStep::Walk { .. } => StepKind::Walk,
            PathStep::Drive(_) => StepKind::Drive,
            PathStep::PartialDrive(_) => StepKind::PartialDrive,
            PathStep::Turn { .. } => StepKind::Turn,
            PathStep::Wait { .. } => StepKind::Wait,
            PathStep::PublicTransit { .. } => StepKind::PublicTransit,
        }
    }

    /// Whether this step moves a car along a street.
    pub fn is_drive(&self) -> bool {
        matches!(self, PathStep::Drive(_) | PathStep::PartialDrive(_))
    }

    /// The segment driven by a drive-family step.
    pub fn drive_segment(&self) -> Option<DriveSegment> {
        match self {
            PathStep::Drive(d) => Some(*d),
            PathStep::PartialDrive(p) => Some(p.drive),
            _ => None,
        }
    }

    /// Estimated time for the step, in seconds.
    pub fn estimate_secs(
        &self,
        net: &Network,
        options: &PathPlanningOptions,
    ) -> Result<f64, DomainError> {
        Ok(match self {
            PathStep::Walk { from, to } => options.walking_speed().travel_secs(from.distance(*to)),
            PathStep::Drive(d) => {
                let seg = net.segment(d.segment)?;
                net.street(seg.street)?.speed.travel_secs(seg.length)
            }
            PathStep::PartialDrive(p) => {
                let speed = net.street_of(p.drive.segment)?.speed;
                speed.travel_secs(p.traversed_length(net)?)
            }
            PathStep::Turn { .. } => 0.0,
            PathStep::Wait { duration } => duration_secs(*duration),
            PathStep::PublicTransit { routes, .. } => {
                let mut total = 0.0;
                for route in routes {
                    total += net.route(*route)?.travel_secs;
                }
                total
            }
        })
    }

    pub fn estimate_duration(
        &self,
        net: &Network,
        options: &PathPlanningOptions,
    ) -> Result<Duration, DomainError> {
        Ok(secs_to_duration(self.estimate_secs(net, options)?))
    }

    /// Scalar cost of the step.
    pub fn cost(&self, net: &Network, options: &PathPlanningOptions) -> Result<f64, DomainError> {
        Ok(self.estimate_secs(net, options)? * self.kind().cost_factor(options))
    }

    /// Where the step begins. Waits have no location.
    pub fn start_location(&self, net: &Network) -> Result<Option<Point>, DomainError> {
        Ok(match self {
            PathStep::Walk { from, .. } => Some(*from),
            PathStep::Drive(d) => Some(net.intersection(d.entry(net)?)?.position),
            PathStep::PartialDrive(p) => Some(p.start),
            PathStep::Turn { intersection, .. } => Some(net.intersection(*intersection)?.position),
            PathStep::Wait { .. } => None,
            PathStep::PublicTransit { routes, .. } => match routes.first() {
                Some(r) => Some(net.stop(net.route(*r)?.begin)?.position),
                None => None,
            },
        })
    }

    /// Where the step ends. A partial drive into a parking lot ends at the lot.
    pub fn end_location(&self, net: &Network) -> Result<Option<Point>, DomainError> {
        Ok(match self {
            PathStep::Walk { to, .. } => Some(*to),
            PathStep::Drive(d) => Some(net.intersection(d.exit(net)?)?.position),
            PathStep::PartialDrive(p) => match p.parking_lot {
                Some(lot) => Some(net.parking_lot(lot)?.centroid),
                None => Some(p.end),
            },
            PathStep::Turn { intersection, .. } => Some(net.intersection(*intersection)?.position),
            PathStep::Wait { .. } => None,
            PathStep::PublicTransit { routes, .. } => match routes.last() {
                Some(r) => Some(net.stop(net.route(*r)?.end)?.position),
                None => None,
            },
        })
    }

    /// A one-line description using entity names from `net`.
    pub fn describe(&self, net: &Network) -> String {
        let street_name = |seg: SegmentId| {
            net.street_of(seg)
                .map(|s| s.name.clone())
                .unwrap_or_else(|_| seg.to_string())
        };
        match self {
            PathStep::Walk { from, to } => {
                format!("walk {:.0} m from {from} to {to}", from.distance(*to))
            }
            PathStep::Drive(d) => format!("drive along {}", street_name(d.segment)),
            PathStep::PartialDrive(p) => {
                let mut s = format!("drive part of {}", street_name(p.drive.segment));
                if let Some(lot) = p.parking_lot {
                    let name = net
                        .parking_lot(lot)
                        .map(|l| l.name.clone())
                        .unwrap_or_else(|_| lot.to_string());
                    s.push_str(&format!(" and park at {name}"));
                }
                s
            }
            PathStep::Turn { from, to, .. } => {
                format!("turn from {} onto {}", street_name(*from), street_name(*to))
            }
            PathStep::Wait { duration } => format!("wait {} min", duration.num_minutes()),
            PathStep::PublicTransit { line, routes } => {
                let line_name = net
                    .line(*line)
                    .map(|l| format!("{} {}", l.transit_type, l.name))
                    .unwrap_or_else(|_| line.to_string());
                let stop_name = |id| {
                    net.stop(id)
                        .map(|s| s.name.clone())
                        .unwrap_or_else(|_| id.to_string())
                };
                let ends = routes.first().zip(routes.last()).and_then(|(first, last)| {
                    Some((net.route(*first).ok()?.begin, net.route(*last).ok()?.end))
                });
                match ends {
                    Some((from, to)) => format!(
                        "take {line_name} from {} to {} ({} stops)",
                        stop_name(from),
                        stop_name(to),
                        routes.len()
                    ),
                    None => format!("take {line_name}"),
                }
            }
        }
    }
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Walk { from, to } => write!(f, "walk {from} -> {to}"),
            PathStep::Drive(d) => {
                write!(f, "drive {}{}", d.segment, if d.backward { " (backward)" } else { "" })
            }
            PathStep::PartialDrive(p) => write!(f, "drive {} {} -> {}", p.drive.segment, p.start, p.end),
            PathStep::Turn { from, to, intersection } => {
                write!(f, "turn {from} -> {to} at {intersection}")
            }
            PathStep::Wait { duration } => write!(f, "wait {}s", duration.num_seconds()),
            PathStep::PublicTransit { line, routes } => {
                write!(f, "ride {line} over {} route(s)", routes.len())
            }
        }
    }
}
