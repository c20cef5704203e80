//! Caching layer for planned journeys.
//!
//! Requests that differ only by sub-metre coordinates or by seconds within
//! the same departure minute share one entry. Only requests made with the
//! server's default options are cached, so options are not part of the key.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use moka::future::Cache as MokaCache;

use crate::domain::Point;
use crate::planner::{JourneyMode, PathPlanningResult};

/// Cache key for a plan request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlanKey {
    pub mode: JourneyMode,
    /// Origin rounded to whole metres.
    pub from: (i64, i64),
    /// Destination rounded to whole metres.
    pub to: (i64, i64),
    /// Minutes since the Unix epoch.
    pub departure_minute: i64,
    pub end_at_parking_lot: bool,
}

impl PlanKey {
    pub fn new(
        mode: JourneyMode,
        from: Point,
        to: Point,
        departure: NaiveDateTime,
        end_at_parking_lot: bool,
    ) -> Self {
        Self {
            mode,
            from: round_metres(from),
            to: round_metres(to),
            departure_minute: departure.and_utc().timestamp().div_euclid(60),
            end_at_parking_lot,
        }
    }
}

fn round_metres(p: Point) -> (i64, i64) {
    (p.x.round() as i64, p.y.round() as i64)
}

/// Cached plan.
type PlanEntry = Arc<PathPlanningResult>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_capacity: 1000,
        }
    }
}

/// Cache of planning results.
#[derive(Clone)]
pub struct PlanCache {
    plans: MokaCache<PlanKey, PlanEntry>,
}

impl PlanCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let plans = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { plans }
    }

    pub async fn get(&self, key: &PlanKey) -> Option<PlanEntry> {
        self.plans.get(key).await
    }

    pub async fn insert(&self, key: PlanKey, entry: PlanEntry) {
        self.plans.insert(key, entry).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{PathPlanningOptions, PathStep, PlannedPath};
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn walk_result() -> PathPlanningResult {
        let from = Point::new(0.0, 0.0);
        let to = Point::new(100.0, 0.0);
        PathPlanningResult::from_parts(
            PathPlanningOptions::default(),
            at(8, 0, 0),
            PlannedPath::from_normalized(vec![PathStep::Walk { from, to }]),
            vec![at(8, 1, 12)],
            216.0,
        )
        .unwrap()
    }

    #[test]
    fn key_rounds_coordinates_and_time() {
        let a = PlanKey::new(
            JourneyMode::Drive,
            Point::new(10.2, -4.6),
            Point::new(500.0, 500.0),
            at(8, 0, 5),
            false,
        );
        let b = PlanKey::new(
            JourneyMode::Drive,
            Point::new(9.8, -5.4),
            Point::new(500.4, 499.6),
            at(8, 0, 59),
            false,
        );
        assert_eq!(a, b);
        assert_eq!(a.from, (10, -5));
    }

    #[test]
    fn key_separates_mode_minute_and_parking() {
        let base = PlanKey::new(
            JourneyMode::Drive,
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            at(8, 0, 0),
            false,
        );
        let later = PlanKey::new(
            JourneyMode::Drive,
            Point::new(0.0, 0.0),
            Point::new(1.0, 1.0),
            at(8, 1, 0),
            false,
        );
        assert_ne!(base, later);
        assert_ne!(
            base,
            PlanKey {
                mode: JourneyMode::Transit,
                ..base
            }
        );
        assert_ne!(
            base,
            PlanKey {
                end_at_parking_lot: true,
                ..base
            }
        );
    }

    #[test]
    fn default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(60));
        assert_eq!(config.max_capacity, 1000);
    }

    #[tokio::test]
    async fn cached_plan_is_returned() {
        let cache = PlanCache::new(&CacheConfig::default());
        let key = PlanKey::new(
            JourneyMode::Closest,
            Point::new(0.0, 0.0),
            Point::new(100.0, 0.0),
            at(8, 0, 0),
            false,
        );
        assert!(cache.get(&key).await.is_none());

        let entry = Arc::new(walk_result());
        cache.insert(key, entry.clone()).await;
        assert_eq!(cache.get(&key).await, Some(entry));
    }
}
