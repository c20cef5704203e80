//! Transit lines, stops and routes.

use chrono::{Duration, NaiveDateTime};

use crate::domain::{LineId, LineSchedule, Point, RouteId, Speed, StopId, TransitType};

/// A transit line: an ordered chain of routes run on one schedule.
#[derive(Debug, Clone)]
pub struct Line {
    pub id: LineId,
    pub name: String,
    pub transit_type: TransitType,
    pub schedule: LineSchedule,
    pub speed: Speed,
    /// Routes in running order from the first stop.
    pub routes: Vec<RouteId>,
}

/// A place where passengers board and alight.
#[derive(Debug, Clone)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub position: Point,
    /// Routes departing from this stop.
    pub outgoing: Vec<RouteId>,
}

/// One hop of a line between two consecutive stops.
#[derive(Debug, Clone)]
pub struct Route {
    pub id: RouteId,
    pub line: LineId,
    pub begin: StopId,
    pub end: StopId,
    pub positions: Vec<Point>,
    pub length: f64,
    /// Seconds from the begin stop to the end stop.
    pub travel_secs: f64,
    /// Seconds from the line's first departure until this route departs.
    pub offset_secs: f64,
}

impl Route {
    fn offset(&self) -> Duration {
        crate::domain::secs_to_duration(self.offset_secs)
    }

    /// Next departure from this route's begin stop at or after `after`.
    pub fn next_departure(
        &self,
        schedule: &LineSchedule,
        after: NaiveDateTime,
    ) -> Option<NaiveDateTime> {
        let offset = self.offset();
        schedule
            .next_departure(after - offset)
            .map(|dep| dep + offset)
    }
}
