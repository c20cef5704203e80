//! Domain types for the journey planner.
//!
//! Identifiers, planar geometry, speeds and transit calendars. None of these
//! depend on the network graph, so they can be used and tested in isolation.

mod error;
mod geometry;
mod ids;
mod schedule;
mod speed;
mod transit_type;

pub use error::{DomainError, EntityKind};
pub use geometry::{
    Bounds, EPSILON, Point, PolylineProjection, Side, cumulative_lengths,
    nearest_point_on_segment, project_onto_polyline,
};
pub use ids::{IntersectionId, LineId, ParkingLotId, RouteId, SegmentId, StopId, StreetId};
pub use schedule::{ActiveSchedule, ContinuousSchedule, LineSchedule, Schedule, Weekdays};
pub use speed::{Speed, duration_secs, secs_to_duration};
pub use transit_type::TransitType;
