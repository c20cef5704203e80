//! Small networks shared by unit tests.

use crate::domain::{Point, Schedule, Speed, TransitType};
use crate::network::{Network, NetworkBuilder, StreetClass};

/// A `cols` x `rows` lattice of two-way primary streets.
///
/// Intersection `row * cols + col` sits at `(col, row) * spacing`. Each row
/// and each column is one street. Horizontal segments are added first, row
/// by row from west to east, then vertical segments row by row.
pub fn street_grid(cols: usize, rows: usize, spacing: f64) -> Network {
    let mut b = NetworkBuilder::new();
    let mut ids = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            ids.push(b.add_intersection(Point::new(col as f64 * spacing, row as f64 * spacing)));
        }
    }

    for row in 0..rows {
        let street = b.add_street(&format!("Row {row}"), StreetClass::Primary, false);
        for col in 0..cols.saturating_sub(1) {
            b.add_segment(street, ids[row * cols + col], ids[row * cols + col + 1], &[])
                .unwrap();
        }
    }
    let columns: Vec<_> = (0..cols)
        .map(|col| b.add_street(&format!("Column {col}"), StreetClass::Primary, false))
        .collect();
    for row in 0..rows.saturating_sub(1) {
        for (col, street) in columns.iter().enumerate() {
            b.add_segment(*street, ids[row * cols + col], ids[(row + 1) * cols + col], &[])
                .unwrap();
        }
    }
    b.build().unwrap()
}

/// One 100 m one-way residential segment from i0 to i1.
pub fn one_way_pair() -> Network {
    let mut b = NetworkBuilder::new();
    let a = b.add_intersection(Point::new(0.0, 0.0));
    let c = b.add_intersection(Point::new(100.0, 0.0));
    let street = b.add_street("One Way", StreetClass::Residential, true);
    b.add_segment(street, a, c, &[]).unwrap();
    b.build().unwrap()
}

/// Two streets 5 km apart with nothing joining them.
pub fn disconnected_streets() -> Network {
    let mut b = NetworkBuilder::new();
    let west = b.add_street("West", StreetClass::Residential, false);
    let east = b.add_street("East", StreetClass::Residential, false);
    let i0 = b.add_intersection(Point::new(0.0, 0.0));
    let i1 = b.add_intersection(Point::new(100.0, 0.0));
    let i2 = b.add_intersection(Point::new(5000.0, 0.0));
    let i3 = b.add_intersection(Point::new(5100.0, 0.0));
    b.add_segment(west, i0, i1, &[]).unwrap();
    b.add_segment(east, i2, i3, &[]).unwrap();
    b.build().unwrap()
}

/// A residential road along y = 0 with a river 10 m north of it.
pub fn river_beside_road() -> Network {
    let mut b = NetworkBuilder::new();
    let r0 = b.add_intersection(Point::new(0.0, 0.0));
    let r1 = b.add_intersection(Point::new(100.0, 0.0));
    let w0 = b.add_intersection(Point::new(0.0, 10.0));
    let w1 = b.add_intersection(Point::new(100.0, 10.0));
    let road = b.add_street("Bank Road", StreetClass::Residential, false);
    let river = b.add_street("River", StreetClass::River, false);
    b.add_segment(road, r0, r1, &[]).unwrap();
    b.add_segment(river, w0, w1, &[]).unwrap();
    b.build().unwrap()
}

/// Stops S1 (0,0), S2 (10 km east) and S3 (18 km east) on one 60 km/h line
/// leaving S1 every 20 minutes from 06:00.
pub fn three_stop_line() -> Network {
    let mut b = NetworkBuilder::new();
    let s1 = b.add_stop("S1", Point::new(0.0, 0.0));
    let s2 = b.add_stop("S2", Point::new(10_000.0, 0.0));
    let s3 = b.add_stop("S3", Point::new(18_000.0, 0.0));
    let line = b.add_line("L", TransitType::Tram);
    b.set_line_speed(line, Speed::from_kph(60.0)).unwrap();
    b.set_schedule(line, Schedule::new((6, 22), (22, 22), 20, 30))
        .unwrap();
    b.add_route(line, s1, s2, &[]).unwrap();
    b.add_route(line, s2, s3, &[]).unwrap();
    b.build().unwrap()
}

/// The stops of [`three_stop_line`], served by two lines that meet at S2.
pub fn two_line_change() -> Network {
    let mut b = NetworkBuilder::new();
    let s1 = b.add_stop("S1", Point::new(0.0, 0.0));
    let s2 = b.add_stop("S2", Point::new(10_000.0, 0.0));
    let s3 = b.add_stop("S3", Point::new(18_000.0, 0.0));
    for (name, from, to) in [("L1", s1, s2), ("L2", s2, s3)] {
        let line = b.add_line(name, TransitType::Tram);
        b.set_line_speed(line, Speed::from_kph(60.0)).unwrap();
        b.set_schedule(line, Schedule::new((6, 22), (22, 22), 20, 30))
            .unwrap();
        b.add_route(line, from, to, &[]).unwrap();
    }
    b.build().unwrap()
}

/// A 100 m residential street with a full lot and a free one beside it.
pub fn parking_street() -> Network {
    let mut b = NetworkBuilder::new();
    let a = b.add_intersection(Point::new(0.0, 0.0));
    let c = b.add_intersection(Point::new(100.0, 0.0));
    let street = b.add_street("Car Park Lane", StreetClass::Residential, false);
    b.add_segment(street, a, c, &[]).unwrap();
    let full = b.add_parking_lot("Full", Point::new(10.0, -20.0), 20);
    b.set_occupancy(full, 20).unwrap();
    b.add_parking_lot("Open", Point::new(50.0, -20.0), 20);
    b.build().unwrap()
}

/// Two adjacent primary segments; only the first has tram tracks.
pub fn tram_street() -> Network {
    let mut b = NetworkBuilder::new();
    let i0 = b.add_intersection(Point::new(0.0, 0.0));
    let i1 = b.add_intersection(Point::new(100.0, 0.0));
    let i2 = b.add_intersection(Point::new(200.0, 0.0));
    let street = b.add_street("Tram Street", StreetClass::Primary, false);
    let tracked = b.add_segment(street, i0, i1, &[]).unwrap();
    b.add_segment(street, i1, i2, &[]).unwrap();
    b.add_tram_tracks(tracked).unwrap();
    b.build().unwrap()
}

/// A short primary street in the south-west corner of a 2 km square whose
/// other roads are all residential.
pub fn sparse_major_corner() -> Network {
    let mut b = NetworkBuilder::new();
    let a = b.add_intersection(Point::new(0.0, 0.0));
    let hub = b.add_intersection(Point::new(250.0, 100.0));
    let far = b.add_intersection(Point::new(2000.0, 2000.0));
    let main = b.add_street("Main Street", StreetClass::Primary, false);
    let lane = b.add_street("Long Lane", StreetClass::Residential, false);
    b.add_segment(main, a, hub, &[]).unwrap();
    b.add_segment(lane, hub, far, &[]).unwrap();
    b.build().unwrap()
}
