//! Hub grid and hub-to-hub path cache.
//!
//! The map is covered by square cells. Each cell is assigned the major
//! intersection nearest its centre; cells without one borrow the hub of the
//! nearest populated cell. Drives between every ordered pair of hubs are
//! computed once and reused, either as a shortcut inside the search or to
//! stitch long journeys together without searching the middle part.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::domain::{IntersectionId, Point};
use crate::graph::Node;
use crate::network::Network;
use crate::planner::{
    PathPlanner, PathPlanningOptions, PathPlanningResult, PathStep, PlanError, PlannedPath,
};

/// Largest grid the router will lay out.
pub const MAX_CELLS: usize = 1 << 20;

/// Router configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterConfig {
    /// Side length of a grid cell, in metres.
    pub hub_spacing: f64,
}

impl RouterConfig {
    pub fn new(hub_spacing: f64) -> Self {
        Self { hub_spacing }
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self { hub_spacing: 500.0 }
    }
}

/// Hub grid with cached hub-to-hub drives.
pub struct Router {
    spacing: f64,
    origin: Point,
    cols: usize,
    rows: usize,
    /// Row-major hub per cell.
    cells: Vec<Option<IntersectionId>>,
    hubs: BTreeSet<IntersectionId>,
    cache: HashMap<(IntersectionId, IntersectionId), PathPlanningResult>,
    cache_valid: bool,
}

impl Router {
    /// Place hubs on a grid over `net`. The path cache starts empty.
    pub fn new(net: &Network, config: &RouterConfig) -> Self {
        let spacing = config.hub_spacing;
        let Some(bounds) = net.bounds().filter(|_| spacing > 0.0) else {
            return Self::empty(spacing);
        };

        let cols = ((bounds.width() / spacing).ceil() as usize).max(1);
        let rows = ((bounds.height() / spacing).ceil() as usize).max(1);
        if cols.checked_mul(rows).is_none_or(|cells| cells > MAX_CELLS) {
            warn!(cols, rows, spacing, "hub grid too large, running without hubs");
            return Self::empty(spacing);
        }
        let centre = |col: usize, row: usize| {
            Point::new(
                bounds.min.x + (col as f64 + 0.5) * spacing,
                bounds.min.y + (row as f64 + 0.5) * spacing,
            )
        };

        let mut placed = vec![None; cols * rows];
        let mut hubs = BTreeSet::new();
        for row in 0..rows {
            for col in 0..cols {
                let found = net.nearest_intersection_where(centre(col, row), spacing * 0.5, |i| {
                    net.is_major_intersection(i)
                });
                if let Some(hub) = found {
                    placed[row * cols + col] = Some(hub);
                    hubs.insert(hub);
                }
            }
        }

        let mut cells = placed.clone();
        if !hubs.is_empty() {
            for row in 0..rows {
                for col in 0..cols {
                    if cells[row * cols + col].is_none() {
                        cells[row * cols + col] =
                            nearest_populated(net, &placed, cols, rows, col, row, centre(col, row));
                    }
                }
            }
        }

        info!(cols, rows, hubs = hubs.len(), "placed hubs");
        Self {
            spacing,
            origin: bounds.min,
            cols,
            rows,
            cells,
            hubs,
            cache: HashMap::new(),
            cache_valid: false,
        }
    }

    fn empty(spacing: f64) -> Self {
        Self {
            spacing,
            origin: Point::default(),
            cols: 0,
            rows: 0,
            cells: Vec::new(),
            hubs: BTreeSet::new(),
            cache: HashMap::new(),
            cache_valid: false,
        }
    }

    /// Place hubs and fill the path cache.
    pub fn build(net: &Network, config: &RouterConfig) -> Self {
        let mut router = Self::new(net, config);
        router.fill_cache(net);
        router
    }

    /// Compute the drive between every ordered pair of distinct hubs.
    /// Unreachable pairs get no entry.
    pub fn fill_cache(&mut self, net: &Network) {
        let planner = PathPlanner::new(net, PathPlanningOptions::default());
        let leave_by = NaiveDateTime::default();
        self.cache.clear();

        for &from in &self.hubs {
            for &to in &self.hubs {
                if from == to {
                    continue;
                }
                match planner.find_closest_drive_between(
                    Node::Intersection(from),
                    Node::Intersection(to),
                    Some(leave_by),
                ) {
                    Ok(result) => {
                        self.cache.insert((from, to), result);
                    }
                    Err(e) => debug!(%from, %to, error = %e, "no hub path"),
                }
            }
        }
        self.cache_valid = true;
        info!(paths = self.cache.len(), "filled hub cache");
    }

    /// Whether `id` is a hub. Always false until the cache is filled.
    pub fn is_hub(&self, id: IntersectionId) -> bool {
        self.cache_valid && self.hubs.contains(&id)
    }

    pub fn hubs(&self) -> impl Iterator<Item = IntersectionId> + '_ {
        self.hubs.iter().copied()
    }

    pub fn hub_count(&self) -> usize {
        self.hubs.len()
    }

    /// The hub of the cell containing `point` (clamped to the grid).
    ///
    /// `_towards` is accepted for callers that know where they are heading
    /// but does not influence the choice.
    pub fn find_closest_hub_in_direction(
        &self,
        point: Point,
        _towards: Point,
    ) -> Option<IntersectionId> {
        if self.cols == 0 || self.rows == 0 {
            return None;
        }
        let cell = |v: f64, origin: f64, n: usize| {
            let i = ((v - origin) / self.spacing).floor();
            if i.is_nan() || i < 0.0 {
                0
            } else {
                (i as usize).min(n - 1)
            }
        };
        let col = cell(point.x, self.origin.x, self.cols);
        let row = cell(point.y, self.origin.y, self.rows);
        self.cells.get(row * self.cols + col).copied().flatten()
    }

    /// Cached drive between two hubs.
    pub fn get_path(&self, from: IntersectionId, to: IntersectionId) -> Option<&PathPlanningResult> {
        self.cache.get(&(from, to))
    }

    /// Drive from `from` to `to` through the cached path between their hubs.
    ///
    /// Each end reaches its hub by walking when within walking distance and
    /// by a fresh drive otherwise. Without a usable hub pair the whole
    /// journey is planned directly.
    pub fn get_route(
        &self,
        net: &Network,
        options: &PathPlanningOptions,
        from: Point,
        to: Point,
        leave_by: NaiveDateTime,
    ) -> Result<PathPlanningResult, PlanError> {
        let planner = PathPlanner::new(net, options.clone());
        let direct = || planner.find_closest_drive(from, to, false, Some(leave_by));

        let (Some(first), Some(second)) = (
            self.find_closest_hub_in_direction(from, to),
            self.find_closest_hub_in_direction(to, from),
        ) else {
            return direct();
        };
        if first == second {
            return direct();
        }
        let Some(cached) = self.get_path(first, second) else {
            debug!(%first, %second, "no cached path between hubs");
            return direct();
        };

        let first_position = net.intersection(first)?.position;
        let second_position = net.intersection(second)?.position;

        let leg = |a: Point, b: Point| -> Result<Vec<PathStep>, PlanError> {
            if a.distance(b) <= options.max_walking_distance {
                Ok(vec![PathStep::Walk { from: a, to: b }])
            } else {
                Ok(planner
                    .find_closest_drive(a, b, false, Some(leave_by))?
                    .path
                    .into_steps())
            }
        };
        let (to_hub, from_hub) = match (leg(from, first_position), leg(second_position, to)) {
            (Ok(a), Ok(b)) => (a, b),
            (Err(PlanError::NoRouteFound), _) | (_, Err(PlanError::NoRouteFound)) => {
                return direct();
            }
            (Err(e), _) | (_, Err(e)) => return Err(e),
        };

        let steps: Vec<PathStep> = to_hub
            .into_iter()
            .chain(cached.path.steps().iter().cloned())
            .chain(from_hub)
            .filter(|s| !matches!(s, PathStep::Wait { .. }))
            .collect();
        let path = PlannedPath::new(steps, net)?;
        Ok(PathPlanningResult::new(net, options, leave_by, path)?)
    }
}

/// Hub of the populated cell nearest `centre`, searching rings of cells
/// around (`col`, `row`) outwards.
fn nearest_populated(
    net: &Network,
    placed: &[Option<IntersectionId>],
    cols: usize,
    rows: usize,
    col: usize,
    row: usize,
    centre: Point,
) -> Option<IntersectionId> {
    let max_radius = cols.max(rows);
    for radius in 1..=max_radius {
        let mut best: Option<(IntersectionId, f64)> = None;
        let (c0, c1) = (col.saturating_sub(radius), (col + radius).min(cols - 1));
        let (r0, r1) = (row.saturating_sub(radius), (row + radius).min(rows - 1));
        for r in r0..=r1 {
            for c in c0..=c1 {
                let Some(hub) = placed[r * cols + c] else {
                    continue;
                };
                let Ok(intersection) = net.intersection(hub) else {
                    continue;
                };
                let d = intersection.position.distance_sq(centre);
                if best.is_none_or(|(_, best_d)| d < best_d) {
                    best = Some((hub, d));
                }
            }
        }
        if let Some((hub, _)) = best {
            return Some(hub);
        }
    }
    None
}
