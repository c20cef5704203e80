//! Parking lots.

use crate::domain::{ParkingLotId, Point};

/// A parking lot cars can end a drive at.
#[derive(Debug, Clone)]
pub struct ParkingLot {
    pub id: ParkingLotId,
    pub name: String,
    pub centroid: Point,
    pub capacity: u32,
    pub occupied: u32,
}

impl ParkingLot {
    /// Whether at least one space is free.
    pub fn has_space(&self) -> bool {
        self.occupied < self.capacity
    }
}
