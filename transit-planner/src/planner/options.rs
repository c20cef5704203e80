//! Per-request planning options.

use serde::{Deserialize, Serialize};

use crate::domain::Speed;

/// Configuration for a single planning request.
///
/// Weights are not validated; negative or zero factors are the caller's
/// responsibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathPlanningOptions {
    /// Whether driving may be suggested.
    pub allow_car: bool,

    /// Whether a pure walk may be suggested.
    pub allow_walk: bool,

    /// Whether river segments count as streets (for ferries and boats).
    pub use_rivers: bool,

    /// Maximum distance (metres) to walk between a coordinate and the graph.
    pub max_walking_distance: f64,

    /// Cost multiplier for walking time.
    pub walking_time_factor: f64,

    /// Cost multiplier for time spent moving.
    pub travel_time_factor: f64,

    /// Cost multiplier for time spent waiting for a departure.
    pub waiting_time_factor: f64,

    /// Extra multiplier for time spent driving.
    pub car_time_factor: f64,

    /// Cost of changing between transit lines (minutes).
    pub changing_penalty_mins: f64,

    /// Walking speed in km/h.
    pub walking_speed_kph: f64,
}

impl PathPlanningOptions {
    /// Options that only permit walking and transit.
    pub fn transit_only() -> Self {
        Self {
            allow_car: false,
            ..Self::default()
        }
    }

    /// Returns the changing penalty in seconds of cost.
    pub fn changing_penalty_secs(&self) -> f64 {
        self.changing_penalty_mins * 60.0
    }

    pub fn walking_speed(&self) -> Speed {
        Speed::from_kph(self.walking_speed_kph)
    }
}

impl Default for PathPlanningOptions {
    fn default() -> Self {
        Self {
            allow_car: true,
            allow_walk: true,
            use_rivers: false,
            max_walking_distance: 1000.0,
            walking_time_factor: 3.0,
            travel_time_factor: 1.0,
            waiting_time_factor: 2.0,
            car_time_factor: 2.0,
            changing_penalty_mins: 10.0,
            walking_speed_kph: 5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options() {
        let options = PathPlanningOptions::default();

        assert!(options.allow_car);
        assert!(options.allow_walk);
        assert!(!options.use_rivers);
        assert_eq!(options.max_walking_distance, 1000.0);
        assert_eq!(options.walking_time_factor, 3.0);
        assert_eq!(options.travel_time_factor, 1.0);
        assert_eq!(options.waiting_time_factor, 2.0);
        assert_eq!(options.car_time_factor, 2.0);
        assert_eq!(options.changing_penalty_mins, 10.0);
    }

    #[test]
    fn duration_methods() {
        let options = PathPlanningOptions::default();

        assert_eq!(options.changing_penalty_secs(), 600.0);
        assert!((options.walking_speed().mps() - 5.0 / 3.6).abs() < 1e-12);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let options: PathPlanningOptions =
            serde_json::from_str(r#"{"allow_car": false, "changing_penalty_mins": 3}"#).unwrap();

        assert!(!options.allow_car);
        assert_eq!(options.changing_penalty_mins, 3.0);
        assert_eq!(options.max_walking_distance, 1000.0);
        assert!(!PathPlanningOptions::transit_only().allow_car);
    }
}
