//! Planning results with arrival times and cost.

use std::fmt;

use chrono::{Duration, NaiveDateTime};
use tracing::warn;

use crate::domain::DomainError;
use crate::network::Network;

use super::options::PathPlanningOptions;
use super::path::PlannedPath;
use super::step::PathStep;

/// A planned journey with per-step arrival times.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPlanningResult {
    /// Options the journey was planned with.
    pub options: PathPlanningOptions,

    /// Requested departure time.
    pub leave_by: NaiveDateTime,

    pub path: PlannedPath,

    /// When each step finishes; parallel to `path.steps()`.
    pub arrival_times: Vec<NaiveDateTime>,

    /// Total scalar cost.
    pub cost: f64,
}

impl PathPlanningResult {
    /// Time the path out from `leave_by`.
    ///
    /// A `Wait` is inserted before every transit ride whose first departure
    /// is later than the time the rider reaches the stop, unless the ride is
    /// already preceded by one. Cost is the sum of step costs plus the
    /// changing penalty for every ride after the first.
    pub fn new(
        net: &Network,
        options: &PathPlanningOptions,
        leave_by: NaiveDateTime,
        path: PlannedPath,
    ) -> Result<Self, DomainError> {
        let mut steps = Vec::with_capacity(path.len() + 2);
        let mut arrival_times = Vec::with_capacity(path.len() + 2);
        let mut cost = 0.0;
        let mut time = leave_by;

        for step in path.into_steps() {
            if let PathStep::PublicTransit { routes, .. } = &step
                && !matches!(steps.last(), Some(PathStep::Wait { .. }))
                && let Some(first) = routes.first()
            {
                let route = net.route(*first)?;
                let line = net.line(route.line)?;
                match route.next_departure(&line.schedule, time) {
                    Some(departure) if departure > time => {
                        let wait = PathStep::Wait {
                            duration: departure - time,
                        };
                        cost += wait.cost(net, options)?;
                        steps.push(wait);
                        arrival_times.push(departure);
                        time = departure;
                    }
                    Some(_) => {}
                    None => warn!(line = %line.id, "line never departs, timing ride without a wait"),
                }
            }

            cost += step.cost(net, options)?;
            time += step.estimate_duration(net, options)?;
            steps.push(step);
            arrival_times.push(time);
        }

        let rides = steps
            .iter()
            .filter(|s| matches!(s, PathStep::PublicTransit { .. }))
            .count();
        cost += options.changing_penalty_secs() * rides.saturating_sub(1) as f64;

        Ok(Self {
            options: options.clone(),
            leave_by,
            path: PlannedPath::from_normalized(steps),
            arrival_times,
            cost,
        })
    }

    /// Reassemble a result from stored parts.
    pub fn from_parts(
        options: PathPlanningOptions,
        leave_by: NaiveDateTime,
        path: PlannedPath,
        arrival_times: Vec<NaiveDateTime>,
        cost: f64,
    ) -> Result<Self, DomainError> {
        if arrival_times.len() != path.len() {
            return Err(DomainError::InvalidNetwork(format!(
                "{} arrival times for {} steps",
                arrival_times.len(),
                path.len()
            )));
        }
        let mut previous = leave_by;
        for t in &arrival_times {
            if *t < previous {
                return Err(DomainError::InvalidNetwork(
                    "arrival times go backwards".to_string(),
                ));
            }
            previous = *t;
        }
        Ok(Self {
            options,
            leave_by,
            path,
            arrival_times,
            cost,
        })
    }

    /// When the journey ends.
    pub fn arrival_time(&self) -> NaiveDateTime {
        self.arrival_times.last().copied().unwrap_or(self.leave_by)
    }

    pub fn total_duration(&self) -> Duration {
        self.arrival_time() - self.leave_by
    }

    /// Time spent waiting for departures.
    pub fn waiting_time(&self) -> Duration {
        self.path
            .steps()
            .iter()
            .filter_map(|s| match s {
                PathStep::Wait { duration } => Some(*duration),
                _ => None,
            })
            .fold(Duration::zero(), |acc, d| acc + d)
    }

    /// Number of changes between transit lines.
    pub fn changes(&self) -> usize {
        self.path.transit_rides().saturating_sub(1)
    }

    /// Human-readable itinerary, one line per step.
    pub fn itinerary(&self, net: &Network) -> Vec<String> {
        self.path
            .steps()
            .iter()
            .zip(&self.arrival_times)
            .filter(|(step, _)| !matches!(step, PathStep::Turn { .. }))
            .map(|(step, at)| format!("{} {}", at.format("%H:%M"), step.describe(net)))
            .collect()
    }
}

impl fmt::Display for PathPlanningResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} -> {} ({} min, cost {:.0}, {} change(s))",
            self.leave_by.format("%H:%M"),
            self.arrival_time().format("%H:%M"),
            self.total_duration().num_minutes(),
            self.cost,
            self.changes()
        )?;
        for (step, at) in self.path.steps().iter().zip(&self.arrival_times) {
            writeln!(f, "  {} {step}", at.format("%H:%M:%S"))?;
        }
        Ok(())
    }
}
