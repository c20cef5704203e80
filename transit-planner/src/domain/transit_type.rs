//! Transit systems.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::schedule::Schedule;
use super::speed::Speed;

/// The kind of vehicle running a transit line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitType {
    Bus,
    Tram,
    Subway,
    IntercityRail,
    Ferry,
    LightRail,
}

impl TransitType {
    pub const ALL: [TransitType; 6] = [
        TransitType::Bus,
        TransitType::Tram,
        TransitType::Subway,
        TransitType::IntercityRail,
        TransitType::Ferry,
        TransitType::LightRail,
    ];

    /// Average vehicle speed when a line does not set its own.
    pub fn default_speed(self) -> Speed {
        match self {
            TransitType::Bus | TransitType::Tram => Speed::from_kph(45.0),
            TransitType::Subway => Speed::from_kph(50.0),
            TransitType::LightRail => Speed::from_kph(60.0),
            TransitType::IntercityRail => Speed::from_kph(80.0),
            TransitType::Ferry => Speed::from_kph(10.0),
        }
    }

    /// The operating calendar a new line of this type starts with.
    pub fn default_schedule(self) -> Schedule {
        match self {
            TransitType::Bus | TransitType::Tram | TransitType::LightRail => {
                Schedule::new((4, 22), (22, 1), 20, 30)
            }
            TransitType::Subway => Schedule::new((4, 22), (22, 1), 5, 15),
            TransitType::IntercityRail => Schedule::new((4, 22), (22, 24), 30, 60),
            TransitType::Ferry => Schedule::new((4, 22), (22, 22), 20, 30),
        }
    }

    /// Whether vehicles of this type run on the street network.
    pub fn uses_streets(self) -> bool {
        matches!(self, TransitType::Bus | TransitType::Tram)
    }
}

impl fmt::Display for TransitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransitType::Bus => "bus",
            TransitType::Tram => "tram",
            TransitType::Subway => "subway",
            TransitType::IntercityRail => "intercity rail",
            TransitType::Ferry => "ferry",
            TransitType::LightRail => "light rail",
        };
        f.write_str(name)
    }
}
