//! A* search over the unified street and transit graph.
//!
//! The planner explores [`Node`]s by f-score, pricing each [`Edge`] by its
//! travel time and, for transit edges, the wait until the next departure
//! plus a penalty for changing lines. Costs are in seconds of weighted time.
//!
//! The heuristic is straight-line distance at a 30 km/h reference speed. A
//! fast transit line can beat that speed, so the heuristic is not admissible
//! and the search is best-effort rather than guaranteed optimal.

use std::collections::{HashMap, HashSet};

use chrono::{Duration, NaiveDateTime};
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::domain::{DomainError, LineId, Point, RouteId, Speed, duration_secs, secs_to_duration};
use crate::graph::{Edge, Node};
use crate::network::{Network, StreetClass};
use crate::router::Router;

use super::error::PlanError;
use super::options::PathPlanningOptions;
use super::path::PlannedPath;
use super::result::PathPlanningResult;
use super::step::{DriveSegment, PathStep};

/// Reference speed for the distance heuristic.
const HEURISTIC_KPH: f64 = 30.0;

static SYSTEM_CLOCK: SystemClock = SystemClock;

/// What a successful search found, before the path is timed.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Steps from start to the reached node, without turns or waits.
    pub steps: Vec<PathStep>,

    /// The node that satisfied the goal test.
    pub reached: Node,

    /// Search cost (g-score) of the reached node.
    pub cost: f64,

    /// Cumulative travel and waiting time to the reached node.
    pub duration: Duration,

    /// Portion of `duration` spent waiting for departures.
    pub waiting: Duration,
}

/// How the search arrived at a node.
#[derive(Debug, Clone, Copy)]
struct Predecessor {
    node: Node,
    /// Last edge taken. After a hub jump this is the cached path's final
    /// street segment, so the U-turn rule still applies at the target.
    edge: Option<Edge>,
    /// Reached through the router's cache rather than a single edge.
    via_hub: bool,
}

/// Bookkeeping for one search. Scores are in seconds.
#[derive(Default)]
struct SearchState {
    open: Vec<Node>,
    closed: HashSet<Node>,
    came_from: HashMap<Node, Predecessor>,
    duration: HashMap<Node, f64>,
    waiting: HashMap<Node, f64>,
    g: HashMap<Node, f64>,
    f: HashMap<Node, f64>,
}

impl SearchState {
    fn g(&self, node: &Node) -> f64 {
        self.g.get(node).copied().unwrap_or(f64::INFINITY)
    }

    /// Remove and return the open node with the lowest f-score. Ties go to
    /// the node that was opened first.
    fn pop_best(&mut self) -> Option<Node> {
        let mut best: Option<(usize, f64)> = None;
        for (i, node) in self.open.iter().enumerate() {
            let f = self.f.get(node).copied().unwrap_or(f64::INFINITY);
            if best.is_none_or(|(_, best_f)| f < best_f) {
                best = Some((i, f));
            }
        }
        best.map(|(i, _)| self.open.remove(i))
    }

    fn record(&mut self, node: Node, from: Predecessor, g: f64, h: f64, duration: f64, waiting: f64) {
        self.came_from.insert(node, from);
        self.g.insert(node, g);
        self.f.insert(node, g + h);
        self.duration.insert(node, duration);
        self.waiting.insert(node, waiting);
        if !self.open.contains(&node) {
            self.open.push(node);
        }
    }
}

/// Journey planner bound to one network and one set of options.
///
/// The planner holds no state between calls; every search builds its own
/// open and closed sets.
pub struct PathPlanner<'a> {
    pub(super) network: &'a Network,
    pub(super) options: PathPlanningOptions,
    pub(super) router: Option<&'a Router>,
    pub(super) clock: &'a dyn Clock,
}

impl<'a> PathPlanner<'a> {
    pub fn new(network: &'a Network, options: PathPlanningOptions) -> Self {
        Self {
            network,
            options,
            router: None,
            clock: &SYSTEM_CLOCK,
        }
    }

    /// Allow the search to take hub shortcuts through `router`'s cache.
    pub fn with_router(mut self, router: &'a Router) -> Self {
        self.router = Some(router);
        self
    }

    /// Use `clock` for requests that do not name a departure time.
    pub fn with_clock(mut self, clock: &'a dyn Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn network(&self) -> &'a Network {
        self.network
    }

    pub fn options(&self) -> &PathPlanningOptions {
        &self.options
    }

    pub(super) fn departure(&self, leave_by: Option<NaiveDateTime>) -> NaiveDateTime {
        leave_by.unwrap_or_else(|| self.clock.now())
    }

    /// Plan a drive between two graph nodes.
    pub fn find_closest_drive_between(
        &self,
        from: Node,
        to: Node,
        leave_by: Option<NaiveDateTime>,
    ) -> Result<PathPlanningResult, PlanError> {
        let leave_by = self.departure(leave_by);
        let outcome = self.search(from, to, leave_by)?;
        self.finish(outcome.steps, leave_by)
    }

    /// Normalise and time a list of steps.
    pub(super) fn finish(
        &self,
        steps: Vec<PathStep>,
        leave_by: NaiveDateTime,
    ) -> Result<PathPlanningResult, PlanError> {
        let path = PlannedPath::new(steps, self.network)?;
        Ok(PathPlanningResult::new(
            self.network,
            &self.options,
            leave_by,
            path,
        )?)
    }

    fn heuristic(&self, node: &Node, goal: Point) -> Result<f64, PlanError> {
        let distance = node.location(self.network)?.distance(goal);
        Ok(Speed::from_kph(HEURISTIC_KPH).travel_secs(distance))
    }

    /// Run A* from `start` until a node satisfies `goal`'s goal test.
    ///
    /// `depart_at` is the time the traveller is at `start`; transit edges
    /// are priced by the wait for their next departure after the time the
    /// search reaches their stop.
    pub fn search(
        &self,
        start: Node,
        goal: Node,
        depart_at: NaiveDateTime,
    ) -> Result<SearchOutcome, PlanError> {
        let net = self.network;
        let goal_location = goal.location(net)?;
        let mut state = SearchState::default();

        state.g.insert(start, 0.0);
        state.f.insert(start, self.heuristic(&start, goal_location)?);
        state.duration.insert(start, 0.0);
        state.waiting.insert(start, 0.0);
        state.open.push(start);

        let mut expanded = 0usize;
        while let Some(current) = state.pop_best() {
            if current.is_goal_reached(&goal, net)? {
                debug!(%start, %goal, expanded, "search reached goal");
                return self.outcome(&state, start, current);
            }
            state.closed.insert(current);
            expanded += 1;

            self.try_hub_jump(&mut state, current, &goal, goal_location)?;
            self.expand(&mut state, current, goal_location, depart_at)?;
        }

        debug!(%start, %goal, expanded, "search exhausted open set");
        Err(PlanError::NoRouteFound)
    }

    fn expand(
        &self,
        state: &mut SearchState,
        current: Node,
        goal_location: Point,
        depart_at: NaiveDateTime,
    ) -> Result<(), PlanError> {
        let net = self.network;
        let options = &self.options;
        let prev_edge = state.came_from.get(&current).and_then(|p| p.edge);
        let current_g = state.g(&current);
        let current_duration = state.duration.get(&current).copied().unwrap_or(0.0);
        let current_waiting = state.waiting.get(&current).copied().unwrap_or(0.0);

        for edge in current.edges(net)? {
            if let Edge::Street(segment) = edge
                && !options.use_rivers
                && net.street_of(segment)?.class == StreetClass::River
            {
                continue;
            }
            let Some(neighbor) = edge.neighbor_from(&current, net)? else {
                continue;
            };
            if prev_edge == Some(edge) && !current.u_turn_allowed(net)? {
                continue;
            }
            if state.closed.contains(&neighbor) {
                continue;
            }

            let travel = edge.travel_secs(net)?;
            let mut tentative_g = current_g + travel * options.travel_time_factor;
            let mut duration = current_duration + travel;
            let mut waiting = current_waiting;

            if edge.is_transit() {
                let line = edge.associated_id(net)?;
                let changing = match prev_edge {
                    Some(prev) if prev.is_transit() => {
                        let changed = prev.associated_id(net)? != line;
                        if changed {
                            tentative_g += options.changing_penalty_secs();
                        }
                        changed
                    }
                    _ => false,
                };
                let boarding = changing || !prev_edge.is_some_and(|p| p.is_transit());
                if boarding {
                    let at_stop = depart_at + secs_to_duration(current_duration);
                    let Some(departure) = edge.next_departure(net, at_stop)? else {
                        trace!(%edge, "line never departs");
                        continue;
                    };
                    let wait = duration_secs(departure - at_stop).max(0.0);
                    tentative_g += wait * options.waiting_time_factor;
                    duration += wait;
                    waiting += wait;
                }
            }

            if tentative_g >= state.g(&neighbor) {
                continue;
            }
            let h = self.heuristic(&neighbor, goal_location)?;
            trace!(%current, %neighbor, %edge, g = tentative_g, "improved");
            state.record(
                neighbor,
                Predecessor {
                    node: current,
                    edge: Some(edge),
                    via_hub: false,
                },
                tentative_g,
                h,
                duration,
                waiting,
            );
        }
        Ok(())
    }

    /// Offer the router's cached path from a hub to the hub nearest the goal
    /// as one more way of reaching that hub. The current hub's own edges are
    /// still expanded, so the jump only wins where it is cheaper. Jumps
    /// whose cached path passes the goal are not offered.
    fn try_hub_jump(
        &self,
        state: &mut SearchState,
        current: Node,
        goal: &Node,
        goal_location: Point,
    ) -> Result<(), PlanError> {
        let Some(router) = self.router else {
            return Ok(());
        };
        let Some(hub) = current.as_intersection() else {
            return Ok(());
        };
        if !router.is_hub(hub) {
            return Ok(());
        }
        let Some(target) = router.find_closest_hub_in_direction(goal_location, goal_location)
        else {
            return Ok(());
        };
        let target_node = Node::Intersection(target);
        if target == hub || state.closed.contains(&target_node) {
            return Ok(());
        }
        let Some(cached) = router.get_path(hub, target) else {
            return Ok(());
        };

        let secs = duration_secs(cached.total_duration());
        let tentative_g = state.g(&current) + secs * self.options.travel_time_factor;
        if tentative_g >= state.g(&target_node) {
            return Ok(());
        }

        let drives: Vec<DriveSegment> = cached
            .path
            .steps()
            .iter()
            .filter_map(PathStep::drive_segment)
            .collect();
        let (Some(first), Some(last)) = (drives.first(), drives.last()) else {
            return Ok(());
        };
        let prev_edge = state.came_from.get(&current).and_then(|p| p.edge);
        if prev_edge == Some(Edge::Street(first.segment)) && !current.u_turn_allowed(self.network)? {
            return Ok(());
        }

        // A cached path through the goal is left to the ordinary edges.
        for d in &drives[..drives.len() - 1] {
            if Node::Intersection(d.exit(self.network)?).is_goal_reached(goal, self.network)? {
                return Ok(());
            }
        }

        let duration = state.duration.get(&current).copied().unwrap_or(0.0) + secs;
        let waiting = state.waiting.get(&current).copied().unwrap_or(0.0);
        let h = self.heuristic(&target_node, goal_location)?;
        debug!(from = %hub, to = %target, "hub jump");
        state.record(
            target_node,
            Predecessor {
                node: current,
                edge: Some(Edge::Street(last.segment)),
                via_hub: true,
            },
            tentative_g,
            h,
            duration,
            waiting,
        );
        Ok(())
    }

    fn outcome(
        &self,
        state: &SearchState,
        start: Node,
        reached: Node,
    ) -> Result<SearchOutcome, PlanError> {
        let steps = self.reconstruct(state, start, reached)?;
        Ok(SearchOutcome {
            steps,
            reached,
            cost: state.g(&reached),
            duration: secs_to_duration(state.duration.get(&reached).copied().unwrap_or(0.0)),
            waiting: secs_to_duration(state.waiting.get(&reached).copied().unwrap_or(0.0)),
        })
    }

    /// Turn predecessor links into steps.
    ///
    /// Street edges become one `Drive` each; consecutive transit edges on
    /// the same line become one `PublicTransit` ride; hub jumps are replaced
    /// by the cached path's drive steps.
    fn reconstruct(
        &self,
        state: &SearchState,
        start: Node,
        reached: Node,
    ) -> Result<Vec<PathStep>, PlanError> {
        let net = self.network;

        let mut transitions = Vec::new();
        let mut node = reached;
        while node != start {
            let Some(pred) = state.came_from.get(&node) else {
                return Err(DomainError::InvalidNetwork(format!("{node} has no predecessor")).into());
            };
            transitions.push((pred.node, node, pred.via_hub, pred.edge));
            node = pred.node;
        }
        transitions.reverse();

        let mut steps = Vec::new();
        let mut ride: Option<(LineId, Vec<RouteId>)> = None;
        let flush = |ride: &mut Option<(LineId, Vec<RouteId>)>, steps: &mut Vec<PathStep>| {
            if let Some((line, routes)) = ride.take() {
                steps.push(PathStep::PublicTransit { line, routes });
            }
        };

        for (from, to, via_hub, edge) in transitions {
            match edge {
                _ if via_hub => {
                    flush(&mut ride, &mut steps);
                    let cached = match (from.as_intersection(), to.as_intersection(), self.router) {
                        (Some(a), Some(b), Some(router)) => router.get_path(a, b),
                        _ => None,
                    };
                    let Some(cached) = cached else {
                        return Err(DomainError::InvalidNetwork(format!(
                            "no cached hub path from {from} to {to}"
                        ))
                        .into());
                    };
                    steps.extend(
                        cached
                            .path
                            .steps()
                            .iter()
                            .filter(|s| !matches!(s, PathStep::Turn { .. } | PathStep::Wait { .. }))
                            .cloned(),
                    );
                }
                Some(Edge::Street(segment)) => {
                    flush(&mut ride, &mut steps);
                    let seg = net.segment(segment)?;
                    let backward = to == Node::Intersection(seg.start);
                    steps.push(PathStep::Drive(DriveSegment::new(segment, backward)));
                }
                Some(Edge::Transit(route)) => {
                    let line = net.route(route)?.line;
                    match &mut ride {
                        Some((current, routes)) if *current == line => routes.push(route),
                        _ => {
                            flush(&mut ride, &mut steps);
                            ride = Some((line, vec![route]));
                        }
                    }
                }
                None => {
                    return Err(DomainError::InvalidNetwork(format!(
                        "{to} was reached from {from} without an edge"
                    ))
                    .into());
                }
            }
        }
        flush(&mut ride, &mut steps);
        Ok(steps)
    }
}
