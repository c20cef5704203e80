//! Serializable form of a planning result.
//!
//! Steps are stored with entity ids only. A [`WirePathPlanningResult`] can be
//! produced from any result, but turning it back into a
//! [`PathPlanningResult`] needs the network it was planned on, so every id
//! can be checked.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::{
    DomainError, IntersectionId, LineId, ParkingLotId, Point, RouteId, SegmentId,
};
use crate::network::Network;
use crate::planner::{
    DriveSegment, PartialDrive, PathPlanningOptions, PathPlanningResult, PathStep, PlannedPath,
};

/// Errors turning a wire result back into a planning result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WireError {
    /// A referenced entity does not exist in the network
    #[error("unresolved reference: {0}")]
    Unresolved(#[from] DomainError),

    /// The ids exist but do not describe a valid journey
    #[error("malformed result: {0}")]
    Malformed(String),
}

/// One step, by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WirePathStep {
    Walk {
        from: Point,
        to: Point,
    },
    Drive {
        segment: SegmentId,
        backward: bool,
    },
    PartialDrive {
        start: Point,
        end: Point,
        segment: SegmentId,
        backward: bool,
        partial_start: bool,
        partial_end: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parking_lot: Option<ParkingLotId>,
    },
    Turn {
        from_segment: SegmentId,
        to_segment: SegmentId,
        intersection: IntersectionId,
    },
    Wait {
        duration_ms: i64,
    },
    PublicTransit {
        line: LineId,
        routes: Vec<RouteId>,
    },
}

impl From<&PathStep> for WirePathStep {
    fn from(step: &PathStep) -> Self {
        match step {
            PathStep::Walk { from, to } => WirePathStep::Walk {
                from: *from,
                to: *to,
            },
            PathStep::Drive(d) => WirePathStep::Drive {
                segment: d.segment,
                backward: d.backward,
            },
            PathStep::PartialDrive(p) => WirePathStep::PartialDrive {
                start: p.start,
                end: p.end,
                segment: p.drive.segment,
                backward: p.drive.backward,
                partial_start: p.partial_start,
                partial_end: p.partial_end,
                parking_lot: p.parking_lot,
            },
            PathStep::Turn {
                from,
                to,
                intersection,
            } => WirePathStep::Turn {
                from_segment: *from,
                to_segment: *to,
                intersection: *intersection,
            },
            PathStep::Wait { duration } => WirePathStep::Wait {
                duration_ms: duration.num_milliseconds(),
            },
            PathStep::PublicTransit { line, routes } => WirePathStep::PublicTransit {
                line: *line,
                routes: routes.clone(),
            },
        }
    }
}

impl WirePathStep {
    /// Check the step against `net` and rebuild it.
    pub fn resolve(&self, net: &Network) -> Result<PathStep, WireError> {
        Ok(match self {
            WirePathStep::Walk { from, to } => PathStep::Walk {
                from: *from,
                to: *to,
            },
            WirePathStep::Drive { segment, backward } => {
                net.segment(*segment)?;
                PathStep::Drive(DriveSegment::new(*segment, *backward))
            }
            WirePathStep::PartialDrive {
                start,
                end,
                segment,
                backward,
                partial_start,
                partial_end,
                parking_lot,
            } => {
                net.segment(*segment)?;
                if let Some(lot) = parking_lot {
                    net.parking_lot(*lot)?;
                }
                PathStep::PartialDrive(PartialDrive {
                    start: *start,
                    end: *end,
                    drive: DriveSegment::new(*segment, *backward),
                    partial_start: *partial_start,
                    partial_end: *partial_end,
                    parking_lot: *parking_lot,
                })
            }
            WirePathStep::Turn {
                from_segment,
                to_segment,
                intersection,
            } => {
                net.intersection(*intersection)?;
                for id in [*from_segment, *to_segment] {
                    if !net.segment(id)?.touches(*intersection) {
                        return Err(WireError::Malformed(format!(
                            "turn at {intersection} uses {id}, which does not meet it"
                        )));
                    }
                }
                PathStep::Turn {
                    from: *from_segment,
                    to: *to_segment,
                    intersection: *intersection,
                }
            }
            WirePathStep::Wait { duration_ms } => {
                if *duration_ms < 0 {
                    return Err(WireError::Malformed(format!(
                        "negative wait of {duration_ms} ms"
                    )));
                }
                PathStep::Wait {
                    duration: Duration::milliseconds(*duration_ms),
                }
            }
            WirePathStep::PublicTransit { line, routes } => {
                net.line(*line)?;
                if routes.is_empty() {
                    return Err(WireError::Malformed(format!("ride on {line} has no routes")));
                }
                let mut previous_end = None;
                for id in routes {
                    let route = net.route(*id)?;
                    if route.line != *line {
                        return Err(WireError::Malformed(format!(
                            "{id} belongs to {}, not {line}",
                            route.line
                        )));
                    }
                    if previous_end.is_some_and(|end| end != route.begin) {
                        return Err(WireError::Malformed(format!(
                            "{id} does not continue the previous route"
                        )));
                    }
                    previous_end = Some(route.end);
                }
                PathStep::PublicTransit {
                    line: *line,
                    routes: routes.clone(),
                }
            }
        })
    }
}

/// A planning result as stored or sent over HTTP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePathPlanningResult {
    pub options: PathPlanningOptions,
    pub leave_by: NaiveDateTime,
    pub cost: f64,
    pub steps: Vec<WirePathStep>,
    pub arrival_times: Vec<NaiveDateTime>,
}

impl From<&PathPlanningResult> for WirePathPlanningResult {
    fn from(result: &PathPlanningResult) -> Self {
        Self {
            options: result.options.clone(),
            leave_by: result.leave_by,
            cost: result.cost,
            steps: result.path.steps().iter().map(WirePathStep::from).collect(),
            arrival_times: result.arrival_times.clone(),
        }
    }
}

impl WirePathPlanningResult {
    /// Rebuild the result against `net`.
    ///
    /// Steps are taken as stored; turns are not re-derived and arrival times
    /// are not recomputed.
    pub fn resolve(&self, net: &Network) -> Result<PathPlanningResult, WireError> {
        let steps = self
            .steps
            .iter()
            .map(|s| s.resolve(net))
            .collect::<Result<Vec<_>, _>>()?;
        PathPlanningResult::from_parts(
            self.options.clone(),
            self.leave_by,
            PlannedPath::from_normalized(steps),
            self.arrival_times.clone(),
            self.cost,
        )
        .map_err(|e| WireError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntityKind, StopId};
    use crate::fixtures;
    use crate::graph::Node;
    use crate::planner::PathPlanner;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn transit_result(net: &Network) -> PathPlanningResult {
        PathPlanner::new(net, PathPlanningOptions::default())
            .find_closest_drive_between(Node::Stop(StopId(0)), Node::Stop(StopId(2)), Some(at(6, 5)))
            .unwrap()
    }

    #[test]
    fn steps_are_tagged_by_kind() {
        let step = WirePathStep::Wait { duration_ms: 900_000 };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["kind"], "wait");
        assert_eq!(json["duration_ms"], 900_000);

        let turn: WirePathStep = serde_json::from_str(
            r#"{"kind":"turn","from_segment":0,"to_segment":1,"intersection":1}"#,
        )
        .unwrap();
        assert_eq!(
            turn,
            WirePathStep::Turn {
                from_segment: SegmentId(0),
                to_segment: SegmentId(1),
                intersection: IntersectionId(1),
            }
        );
    }

    #[test]
    fn stored_result_resolves_on_same_network() {
        let net = fixtures::three_stop_line();
        let result = transit_result(&net);
        let json = serde_json::to_string(&WirePathPlanningResult::from(&result)).unwrap();

        let wire: WirePathPlanningResult = serde_json::from_str(&json).unwrap();
        let back = wire.resolve(&net).unwrap();
        assert_eq!(back.path, result.path);
        assert_eq!(back.arrival_times, result.arrival_times);
        assert_eq!(back.leave_by, result.leave_by);
        assert!((back.cost - result.cost).abs() < 1e-6);
    }

    #[test]
    fn every_step_kind_survives_storage() {
        use crate::domain::TransitType;
        use crate::network::{NetworkBuilder, StreetClass};

        let mut b = NetworkBuilder::new();
        let i0 = b.add_intersection(Point::new(0.0, 0.0));
        let i1 = b.add_intersection(Point::new(100.0, 0.0));
        let i2 = b.add_intersection(Point::new(200.0, 0.0));
        let street = b.add_street("High Street", StreetClass::Secondary, false);
        let s0 = b.add_segment(street, i0, i1, &[]).unwrap();
        let s1 = b.add_segment(street, i1, i2, &[]).unwrap();
        let lot = b.add_parking_lot("Market", Point::new(150.0, -20.0), 10);
        let a = b.add_stop("A", Point::new(0.0, 50.0));
        let c = b.add_stop("B", Point::new(200.0, 50.0));
        let line = b.add_line("1", TransitType::Bus);
        let route = b.add_route(line, a, c, &[]).unwrap();
        let net = b.build().unwrap();

        let steps = vec![
            PathStep::Walk {
                from: Point::new(-5.0, -5.0),
                to: Point::new(0.0, 0.0),
            },
            PathStep::Drive(DriveSegment::new(s0, false)),
            PathStep::Turn {
                from: s0,
                to: s1,
                intersection: i1,
            },
            PathStep::PartialDrive(PartialDrive {
                start: Point::new(100.0, 0.0),
                end: Point::new(150.0, 0.0),
                drive: DriveSegment::new(s1, false),
                partial_start: false,
                partial_end: true,
                parking_lot: Some(lot),
            }),
            PathStep::Wait {
                duration: Duration::seconds(90),
            },
            PathStep::PublicTransit {
                line,
                routes: vec![route],
            },
        ];

        for step in steps {
            let json = serde_json::to_string(&WirePathStep::from(&step)).unwrap();
            let wire: WirePathStep = serde_json::from_str(&json).unwrap();
            assert_eq!(wire.resolve(&net).unwrap(), step);
        }
    }

    #[test]
    fn unknown_ids_are_unresolved() {
        let net = fixtures::three_stop_line();
        let step = WirePathStep::Drive {
            segment: SegmentId(3),
            backward: false,
        };
        assert_eq!(
            step.resolve(&net),
            Err(WireError::Unresolved(DomainError::unknown(
                EntityKind::Segment,
                3
            )))
        );
    }

    #[test]
    fn routes_must_belong_to_line() {
        let net = fixtures::two_line_change();
        let step = WirePathStep::PublicTransit {
            line: LineId(0),
            routes: vec![RouteId(0), RouteId(1)],
        };
        assert!(matches!(step.resolve(&net), Err(WireError::Malformed(_))));
    }

    #[test]
    fn routes_must_be_consecutive() {
        let net = fixtures::three_stop_line();
        let step = WirePathStep::PublicTransit {
            line: LineId(0),
            routes: vec![RouteId(1), RouteId(0)],
        };
        assert!(matches!(step.resolve(&net), Err(WireError::Malformed(_))));

        let empty = WirePathStep::PublicTransit {
            line: LineId(0),
            routes: vec![],
        };
        assert!(matches!(empty.resolve(&net), Err(WireError::Malformed(_))));
    }

    #[test]
    fn turn_must_meet_its_segments() {
        let net = fixtures::street_grid(3, 1, 100.0);
        let good = WirePathStep::Turn {
            from_segment: SegmentId(0),
            to_segment: SegmentId(1),
            intersection: IntersectionId(1),
        };
        assert!(good.resolve(&net).is_ok());

        let bad = WirePathStep::Turn {
            from_segment: SegmentId(0),
            to_segment: SegmentId(1),
            intersection: IntersectionId(2),
        };
        assert!(matches!(bad.resolve(&net), Err(WireError::Malformed(_))));
    }

    #[test]
    fn arrival_times_must_match_steps() {
        let net = fixtures::three_stop_line();
        let mut wire = WirePathPlanningResult::from(&transit_result(&net));
        wire.arrival_times.pop();
        assert!(matches!(wire.resolve(&net), Err(WireError::Malformed(_))));
    }

    #[test]
    fn negative_wait_is_malformed() {
        let net = fixtures::three_stop_line();
        let step = WirePathStep::Wait { duration_ms: -1 };
        assert!(matches!(step.resolve(&net), Err(WireError::Malformed(_))));
    }
}
