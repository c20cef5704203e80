//! Coordinate-to-coordinate journey strategies.
//!
//! These wrap the graph search with snapping, boundary walks and the
//! fallback policy: a search that finds nothing becomes a walk when walking
//! is allowed, and [`PlanError::NoRouteFound`] otherwise.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::{Point, Side, secs_to_duration};
use crate::graph::Node;
use crate::network::{Network, StreetSnap};

use super::error::PlanError;
use super::result::PathPlanningResult;
use super::search::PathPlanner;
use super::step::{DriveSegment, PartialDrive, PathStep};

/// Which strategy to plan a journey with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JourneyMode {
    /// Walk, transit or drive, whichever is cheapest.
    #[default]
    Closest,
    Drive,
    Transit,
    /// Drive using the hub cache when one is attached.
    Hub,
}

impl JourneyMode {
    pub fn as_str(self) -> &'static str {
        match self {
            JourneyMode::Closest => "closest",
            JourneyMode::Drive => "drive",
            JourneyMode::Transit => "transit",
            JourneyMode::Hub => "hub",
        }
    }
}

/// Intersections the drive leaves from and arrives at, by side of street.
///
/// Traffic keeps right, so a point on the right of a segment joins it
/// heading towards its end and a point on the left heading towards its
/// start. One-way streets can only be joined heading forward.
fn directional_ends(
    planner: &PathPlanner<'_>,
    from: &StreetSnap,
    to: &StreetSnap,
) -> Result<(Node, Node), PlanError> {
    let net = planner.network;
    let from_seg = net.segment(from.segment)?;
    let to_seg = net.segment(to.segment)?;

    let start = if from.side == Side::Left && !net.street(from_seg.street)?.one_way {
        from_seg.start
    } else {
        from_seg.end
    };
    let goal = if to.side == Side::Left && !net.street(to_seg.street)?.one_way {
        to_seg.end
    } else {
        to_seg.start
    };
    Ok((Node::Intersection(start), Node::Intersection(goal)))
}

impl PathPlanner<'_> {
    /// A journey that is one straight walk.
    pub fn create_walk(
        &self,
        from: Point,
        to: Point,
        leave_by: Option<NaiveDateTime>,
    ) -> Result<PathPlanningResult, PlanError> {
        let leave_by = self.departure(leave_by);
        self.finish(vec![PathStep::Walk { from, to }], leave_by)
    }

    fn walk_or_fail(
        &self,
        from: Point,
        to: Point,
        leave_by: NaiveDateTime,
    ) -> Result<PathPlanningResult, PlanError> {
        if self.options.allow_walk {
            debug!(%from, %to, "falling back to walking");
            self.create_walk(from, to, Some(leave_by))
        } else {
            Err(PlanError::NoRouteFound)
        }
    }

    /// Drive between two coordinates, optionally ending at the nearest
    /// parking lot with free space.
    ///
    /// Both coordinates are snapped to the nearest street. When they snap
    /// onto the same segment, on the same side, in the direction of traffic,
    /// the journey is a single partial drive and no search is run.
    pub fn find_closest_drive(
        &self,
        from: Point,
        to: Point,
        end_at_parking_lot: bool,
        leave_by: Option<NaiveDateTime>,
    ) -> Result<PathPlanningResult, PlanError> {
        let net = self.network;
        let leave_by = self.departure(leave_by);

        let parking_lot = if end_at_parking_lot {
            let lot = net.nearest_free_parking_lot(to);
            if lot.is_none() {
                warn!(%to, "no parking lot with free space, driving to destination");
            }
            lot
        } else {
            None
        };
        let drive_to = match parking_lot {
            Some(lot) => net.parking_lot(lot)?.centroid,
            None => to,
        };

        let use_rivers = self.options.use_rivers;
        let (Some(from_snap), Some(to_snap)) = (
            net.closest_street(from, use_rivers),
            net.closest_street(drive_to, use_rivers),
        ) else {
            debug!(%from, %to, "could not snap to a street");
            return self.walk_or_fail(from, to, leave_by);
        };

        let mut steps = vec![PathStep::Walk {
            from,
            to: from_snap.position,
        }];

        if let Some(backward) = simple_journey(net, &from_snap, &to_snap)? {
            if from_snap.position != to_snap.position {
                steps.push(PathStep::PartialDrive(PartialDrive {
                    start: from_snap.position,
                    end: to_snap.position,
                    drive: DriveSegment::new(from_snap.segment, backward),
                    partial_start: true,
                    partial_end: true,
                    parking_lot,
                }));
            }
        } else {
            let (start, goal) = directional_ends(self, &from_snap, &to_snap)?;
            let found = match self.search(start, goal, leave_by) {
                Ok(outcome) => outcome,
                Err(PlanError::NoRouteFound) => return self.walk_or_fail(from, to, leave_by),
                Err(e) => return Err(e),
            };

            let start_position = start.location(net)?;
            if from_snap.position != start_position {
                let seg = net.segment(from_snap.segment)?;
                steps.push(PathStep::PartialDrive(PartialDrive {
                    start: from_snap.position,
                    end: start_position,
                    drive: DriveSegment::new(seg.id, start == Node::Intersection(seg.start)),
                    partial_start: true,
                    partial_end: false,
                    parking_lot: None,
                }));
            }

            steps.extend(found.steps);

            let seg = net.segment(to_snap.segment)?;
            steps.push(PathStep::PartialDrive(PartialDrive {
                start: goal.location(net)?,
                end: to_snap.position,
                drive: DriveSegment::new(seg.id, goal == Node::Intersection(seg.end)),
                partial_start: false,
                partial_end: true,
                parking_lot,
            }));
        }

        let walk_from = match parking_lot {
            Some(lot) => net.parking_lot(lot)?.centroid,
            None => to_snap.position,
        };
        steps.push(PathStep::Walk {
            from: walk_from,
            to,
        });

        self.finish(steps, leave_by)
    }

    /// Ride transit between two coordinates.
    ///
    /// Every pair of stops within walking distance of the two ends is
    /// searched, nearest stops first. The cheapest complete journey wins;
    /// on equal cost the first pair found is kept.
    pub fn find_fastest_transit_route(
        &self,
        from: Point,
        to: Point,
        leave_by: Option<NaiveDateTime>,
    ) -> Result<PathPlanningResult, PlanError> {
        let net = self.network;
        let leave_by = self.departure(leave_by);
        let radius = self.options.max_walking_distance;
        let walking = self.options.walking_speed();

        let origins = net.stops_within(from, radius);
        let destinations = net.stops_within(to, radius);

        let mut best: Option<PathPlanningResult> = None;
        for (from_stop, _) in &origins {
            let board = net.stop(*from_stop)?.position;
            let at_stop = leave_by + secs_to_duration(walking.travel_secs(from.distance(board)));

            for (to_stop, _) in &destinations {
                if from_stop == to_stop {
                    continue;
                }
                let outcome = match self.search(Node::Stop(*from_stop), Node::Stop(*to_stop), at_stop) {
                    Ok(outcome) => outcome,
                    Err(PlanError::NoRouteFound) => continue,
                    Err(e) => return Err(e),
                };

                let alight = net.stop(*to_stop)?.position;
                let mut steps = Vec::with_capacity(outcome.steps.len() + 2);
                steps.push(PathStep::Walk { from, to: board });
                steps.extend(outcome.steps);
                steps.push(PathStep::Walk { from: alight, to });

                let result = self.finish(steps, leave_by)?;
                if best.as_ref().is_none_or(|b| result.cost < b.cost) {
                    best = Some(result);
                }
            }
        }

        match best {
            Some(result) => Ok(result),
            None => {
                debug!(
                    origins = origins.len(),
                    destinations = destinations.len(),
                    "no transit connection"
                );
                self.walk_or_fail(from, to, leave_by)
            }
        }
    }

    /// Walk if the destination is close, otherwise the cheaper of transit
    /// and driving. Transit wins ties and is used when driving fails.
    pub fn find_closest_path(
        &self,
        from: Point,
        to: Point,
        leave_by: Option<NaiveDateTime>,
    ) -> Result<PathPlanningResult, PlanError> {
        let leave_by = self.departure(leave_by);
        if from.distance(to) <= self.options.max_walking_distance {
            return self.create_walk(from, to, Some(leave_by));
        }

        let transit = self.find_fastest_transit_route(from, to, Some(leave_by));
        if !self.options.allow_car {
            return transit;
        }

        let drive = match self.find_closest_drive(from, to, false, Some(leave_by)) {
            Ok(result) => Some(result),
            Err(PlanError::NoRouteFound) => None,
            Err(e) => return Err(e),
        };

        match (transit, drive) {
            (Ok(transit), Some(drive)) => {
                debug!(car = drive.cost, transit = transit.cost, "comparing modes");
                Ok(if drive.cost < transit.cost { drive } else { transit })
            }
            (Ok(transit), None) => Ok(transit),
            (Err(PlanError::NoRouteFound), Some(drive)) => Ok(drive),
            (Err(e), _) => Err(e),
        }
    }

    /// Plan with the given strategy.
    pub fn plan(
        &self,
        mode: JourneyMode,
        from: Point,
        to: Point,
        end_at_parking_lot: bool,
        leave_by: Option<NaiveDateTime>,
    ) -> Result<PathPlanningResult, PlanError> {
        match mode {
            JourneyMode::Closest => self.find_closest_path(from, to, leave_by),
            JourneyMode::Drive => self.find_closest_drive(from, to, end_at_parking_lot, leave_by),
            JourneyMode::Transit => self.find_fastest_transit_route(from, to, leave_by),
            JourneyMode::Hub => match self.router {
                Some(router) => router.get_route(
                    self.network,
                    &self.options,
                    from,
                    to,
                    self.departure(leave_by),
                ),
                None => self.find_closest_drive(from, to, end_at_parking_lot, leave_by),
            },
        }
    }
}

/// If both snaps lie on one segment in a drivable order, the direction to
/// drive it in (`true` for backward).
fn simple_journey(
    net: &Network,
    from: &StreetSnap,
    to: &StreetSnap,
) -> Result<Option<bool>, PlanError> {
    if from.segment != to.segment || from.side != to.side {
        return Ok(None);
    }
    let seg = net.segment(from.segment)?;
    let origin = seg.start_position();
    let start_distance = origin.distance_sq(from.position);
    let end_distance = origin.distance_sq(to.position);
    if start_distance == end_distance {
        return Ok(None);
    }
    let backward = start_distance > end_distance;
    let drivable = if net.street(seg.street)?.one_way {
        !backward
    } else {
        match from.side {
            Side::Right => !backward,
            Side::Left => backward,
        }
    };
    Ok(drivable.then_some(backward))
}
