//! Entity identifiers.
//!
//! Every graph entity owned by a [`Network`](crate::network::Network) is
//! addressed by a small `Copy` id. Ids are dense indices into the network's
//! arenas and are also the stable integers used by the wire form.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Returns the id as an arena index.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }
    };
}

entity_id!(
    /// A street intersection.
    IntersectionId,
    "i"
);
entity_id!(
    /// A street segment between two intersections.
    SegmentId,
    "seg"
);
entity_id!(
    /// A named street made of one or more segments.
    StreetId,
    "st"
);
entity_id!(
    /// A transit stop.
    StopId,
    "stop"
);
entity_id!(
    /// One hop of a transit line between two consecutive stops.
    RouteId,
    "r"
);
entity_id!(
    /// A transit line.
    LineId,
    "line"
);
entity_id!(
    /// A parking lot.
    ParkingLotId,
    "lot"
);
