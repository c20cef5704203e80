//! Planner errors.

use crate::domain::DomainError;

/// Error from a planning request.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanError {
    /// The search exhausted every reachable node, or a coordinate could not
    /// be snapped onto the network
    #[error("no route found")]
    NoRouteFound,

    /// The network contradicted itself during the search
    #[error("inconsistent network: {0}")]
    Inconsistent(#[from] DomainError),
}

impl PlanError {
    pub fn is_no_route(&self) -> bool {
        matches!(self, PlanError::NoRouteFound)
    }
}
