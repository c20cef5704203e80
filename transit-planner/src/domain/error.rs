//! Domain error types.
//!
//! These errors represent validation failures and data inconsistencies
//! in the domain and network layers. They are distinct from "no route"
//! outcomes, which are ordinary planner results.

/// Which arena an unknown id was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Intersection,
    Segment,
    Street,
    Stop,
    Route,
    Line,
    ParkingLot,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntityKind::Intersection => "intersection",
            EntityKind::Segment => "segment",
            EntityKind::Street => "street",
            EntityKind::Stop => "stop",
            EntityKind::Route => "route",
            EntityKind::Line => "line",
            EntityKind::ParkingLot => "parking lot",
        };
        f.write_str(name)
    }
}

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// An id does not name an entity in the network
    #[error("unknown {kind} {id}")]
    UnknownEntity { kind: EntityKind, id: u32 },

    /// Schedule hours or intervals are out of range
    #[error("invalid schedule: {0}")]
    InvalidSchedule(&'static str),

    /// Geometry that cannot be used (e.g. a segment with one vertex)
    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Network data that contradicts itself
    #[error("invalid network: {0}")]
    InvalidNetwork(String),
}

impl DomainError {
    pub fn unknown(kind: EntityKind, id: u32) -> Self {
        DomainError::UnknownEntity { kind, id }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::unknown(EntityKind::Segment, 7);
        assert_eq!(err.to_string(), "unknown segment 7");

        let err = DomainError::unknown(EntityKind::ParkingLot, 2);
        assert_eq!(err.to_string(), "unknown parking lot 2");

        let err = DomainError::InvalidSchedule("intervals must be positive");
        assert_eq!(err.to_string(), "invalid schedule: intervals must be positive");

        let err = DomainError::InvalidGeometry("segment seg3 has fewer than two points".into());
        assert_eq!(
            err.to_string(),
            "invalid geometry: segment seg3 has fewer than two points"
        );

        let err = DomainError::InvalidNetwork("route r1 does not start at stop0".into());
        assert_eq!(
            err.to_string(),
            "invalid network: route r1 does not start at stop0"
        );
    }
}
