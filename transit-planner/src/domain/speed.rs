//! Speeds and conversions between seconds and `chrono::Duration`.

use chrono::Duration;
use serde::{Deserialize, Serialize};

/// A travel speed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Speed {
    kph: f64,
}

impl Speed {
    pub const fn from_kph(kph: f64) -> Self {
        Self { kph }
    }

    pub fn kph(self) -> f64 {
        self.kph
    }

    /// Metres per second.
    pub fn mps(self) -> f64 {
        self.kph / 3.6
    }

    /// Seconds needed to cover `metres`. Non-positive speeds never arrive.
    pub fn travel_secs(self, metres: f64) -> f64 {
        if self.kph <= 0.0 {
            return f64::INFINITY;
        }
        metres / self.mps()
    }
}

/// Converts fractional seconds to a `Duration`, rounded to the millisecond.
///
/// Non-finite or negative inputs become zero.
pub fn secs_to_duration(secs: f64) -> Duration {
    if !secs.is_finite() || secs <= 0.0 {
        return Duration::zero();
    }
    Duration::milliseconds((secs * 1000.0).round() as i64)
}

/// Fractional seconds in a `Duration`.
pub fn duration_secs(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_conversions() {
        let s = Speed::from_kph(36.0);
        assert_eq!(s.mps(), 10.0);
        assert_eq!(s.travel_secs(1000.0), 100.0);
        assert!(Speed::from_kph(0.0).travel_secs(1.0).is_infinite());
    }

    #[test]
    fn duration_round_trip() {
        assert_eq!(secs_to_duration(90.0), Duration::seconds(90));
        assert_eq!(secs_to_duration(1.2344), Duration::milliseconds(1234));
        assert_eq!(secs_to_duration(-3.0), Duration::zero());
        assert_eq!(secs_to_duration(f64::NAN), Duration::zero());
        assert_eq!(duration_secs(Duration::milliseconds(1500)), 1.5);
    }
}
