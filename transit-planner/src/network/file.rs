//! JSON map files.
//!
//! A map file lists every entity in id order; references between entities
//! are plain indices into those lists.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::domain::{
    DomainError, IntersectionId, LineId, LineSchedule, Point, Speed, StopId, StreetId,
    TransitType,
};

use super::builder::NetworkBuilder;
use super::street::StreetClass;
use super::Network;

/// Errors from loading a map file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid map JSON
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file parsed but describes an inconsistent network
    #[error("invalid map: {0}")]
    Invalid(#[from] DomainError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreetRecord {
    pub name: String,
    pub class: StreetClass,
    #[serde(default)]
    pub one_way: bool,
    /// Overrides the class's default speed.
    #[serde(default)]
    pub speed_kph: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub street: u32,
    pub start: u32,
    pub end: u32,
    #[serde(default)]
    pub waypoints: Vec<Point>,
    #[serde(default)]
    pub tram_tracks: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRecord {
    pub name: String,
    pub transit_type: TransitType,
    #[serde(default)]
    pub speed_kph: Option<f64>,
    /// Defaults to the transit type's schedule.
    #[serde(default)]
    pub schedule: Option<LineSchedule>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopRecord {
    pub name: String,
    pub position: Point,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub line: u32,
    pub begin: u32,
    pub end: u32,
    #[serde(default)]
    pub waypoints: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingLotRecord {
    pub name: String,
    pub centroid: Point,
    pub capacity: u32,
    #[serde(default)]
    pub occupied: u32,
}

/// On-disk form of a [`Network`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkFile {
    #[serde(default)]
    pub intersections: Vec<Point>,
    #[serde(default)]
    pub streets: Vec<StreetRecord>,
    #[serde(default)]
    pub segments: Vec<SegmentRecord>,
    #[serde(default)]
    pub lines: Vec<LineRecord>,
    #[serde(default)]
    pub stops: Vec<StopRecord>,
    /// Routes of each line in running order.
    #[serde(default)]
    pub routes: Vec<RouteRecord>,
    #[serde(default)]
    pub parking_lots: Vec<ParkingLotRecord>,
}

impl NetworkFile {
    pub fn from_json(json: &str) -> Result<Self, LoadError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validate references and build the network.
    pub fn into_network(self) -> Result<Network, DomainError> {
        let mut b = NetworkBuilder::new();
        for position in self.intersections {
            b.add_intersection(position);
        }
        for street in self.streets {
            let id = b.add_street(&street.name, street.class, street.one_way);
            if let Some(kph) = street.speed_kph {
                b.set_street_speed(id, Speed::from_kph(kph))?;
            }
        }
        for seg in self.segments {
            let id = b.add_segment(
                StreetId(seg.street),
                IntersectionId(seg.start),
                IntersectionId(seg.end),
                &seg.waypoints,
            )?;
            if seg.tram_tracks {
                b.add_tram_tracks(id)?;
            }
        }
        for line in self.lines {
            let id = b.add_line(&line.name, line.transit_type);
            if let Some(kph) = line.speed_kph {
                b.set_line_speed(id, Speed::from_kph(kph))?;
            }
            if let Some(schedule) = line.schedule {
                b.set_schedule(id, schedule)?;
            }
        }
        for stop in self.stops {
            b.add_stop(&stop.name, stop.position);
        }
        for route in self.routes {
            b.add_route(
                LineId(route.line),
                StopId(route.begin),
                StopId(route.end),
                &route.waypoints,
            )?;
        }
        for lot in self.parking_lots {
            let id = b.add_parking_lot(&lot.name, lot.centroid, lot.capacity);
            b.set_occupancy(id, lot.occupied)?;
        }
        b.build()
    }

    /// Capture a network in file form.
    pub fn from_network(net: &Network) -> Self {
        let interior = |positions: &[Point]| -> Vec<Point> {
            if positions.len() > 2 {
                positions[1..positions.len() - 1].to_vec()
            } else {
                Vec::new()
            }
        };

        Self {
            intersections: net.intersections.iter().map(|i| i.position).collect(),
            streets: net
                .streets
                .iter()
                .map(|s| StreetRecord {
                    name: s.name.clone(),
                    class: s.class,
                    one_way: s.one_way,
                    speed_kph: Some(s.speed.kph()),
                })
                .collect(),
            segments: net
                .segments
                .iter()
                .map(|s| SegmentRecord {
                    street: s.street.0,
                    start: s.start.0,
                    end: s.end.0,
                    waypoints: interior(&s.positions),
                    tram_tracks: s.has_tram_tracks,
                })
                .collect(),
            lines: net
                .lines
                .iter()
                .map(|l| LineRecord {
                    name: l.name.clone(),
                    transit_type: l.transit_type,
                    speed_kph: Some(l.speed.kph()),
                    schedule: Some(l.schedule.clone()),
                })
                .collect(),
            stops: net
                .stops
                .iter()
                .map(|s| StopRecord {
                    name: s.name.clone(),
                    position: s.position,
                })
                .collect(),
            routes: net
                .routes
                .iter()
                .map(|r| RouteRecord {
                    line: r.line.0,
                    begin: r.begin.0,
                    end: r.end.0,
                    waypoints: interior(&r.positions),
                })
                .collect(),
            parking_lots: net
                .parking_lots
                .iter()
                .map(|l| ParkingLotRecord {
                    name: l.name.clone(),
                    centroid: l.centroid,
                    capacity: l.capacity,
                    occupied: l.occupied,
                })
                .collect(),
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl Network {
    /// Load a network from a JSON map file.
    pub fn load(path: impl AsRef<Path>) -> Result<Network, LoadError> {
        let contents = std::fs::read_to_string(path)?;
        let file = NetworkFile::from_json(&contents)?;
        Ok(file.into_network()?)
    }
}
