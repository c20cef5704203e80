//! Data transfer objects for web requests and responses.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::Point;
use crate::network::NetworkSummary;
use crate::planner::{JourneyMode, PathPlanningOptions, PathPlanningResult};
use crate::wire::WirePathPlanningResult;

/// Request to plan a journey.
#[derive(Debug, Clone, Deserialize)]
pub struct PlanJourneyRequest {
    /// Origin in map coordinates (metres)
    pub from: Point,

    /// Destination in map coordinates (metres)
    pub to: Point,

    /// Departure time (defaults to now)
    pub departure: Option<NaiveDateTime>,

    /// Which strategy to use
    #[serde(default)]
    pub mode: JourneyMode,

    /// For drives, finish at the nearest free parking lot
    #[serde(default)]
    pub end_at_parking_lot: bool,

    /// Planner weights (defaults to the server's)
    pub options: Option<PathPlanningOptions>,
}

/// Headline figures for a journey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JourneySummary {
    /// Departure time
    pub departure: NaiveDateTime,

    /// Arrival time
    pub arrival: NaiveDateTime,

    /// Total duration in minutes
    pub duration_mins: i64,

    /// Time spent waiting, in minutes
    pub waiting_mins: i64,

    /// Number of changes between transit lines
    pub changes: usize,

    /// Weighted cost
    pub cost: f64,
}

impl From<&PathPlanningResult> for JourneySummary {
    fn from(result: &PathPlanningResult) -> Self {
        Self {
            departure: result.leave_by,
            arrival: result.arrival_time(),
            duration_mins: result.total_duration().num_minutes(),
            waiting_mins: result.waiting_time().num_minutes(),
            changes: result.changes(),
            cost: result.cost,
        }
    }
}

/// A planned journey.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanJourneyResponse {
    pub summary: JourneySummary,

    /// One line per step, turns omitted
    pub itinerary: Vec<String>,

    /// The full result, suitable for `/journey/resolve`
    pub result: WirePathPlanningResult,
}

/// A stored journey checked against the loaded network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveJourneyResponse {
    pub summary: JourneySummary,
    pub itinerary: Vec<String>,
}

/// Loaded network statistics.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkResponse {
    #[serde(flatten)]
    pub counts: NetworkSummary,

    /// Number of hubs (0 without a hub router)
    pub hubs: usize,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
