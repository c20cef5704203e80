//! Web layer for the journey planner.
//!
//! Provides HTTP endpoints for planning journeys and checking stored ones.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
