//! Journey planner using A* search.
//!
//! This module answers "how do I get from here to there, leaving at this
//! time?" over the combined street and transit network. The search core
//! lives in `search`; the strategies that snap coordinates, add walks and
//! pick between modes live in `journey`.
//!
//! Results are built from [`PathStep`]s collected into a [`PlannedPath`]
//! and timed by [`PathPlanningResult`].

mod error;
mod journey;
mod options;
mod path;
mod result;
mod search;
mod step;


pub use error::PlanError;
pub use journey::JourneyMode;
pub use options::PathPlanningOptions;
pub use path::PlannedPath;
pub use result::PathPlanningResult;
pub use search::{PathPlanner, SearchOutcome};
pub use step::{DriveSegment, PartialDrive, PathStep, StepKind};
