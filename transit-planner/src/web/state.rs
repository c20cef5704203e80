//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::{CacheConfig, PlanCache};
use crate::clock::{Clock, SystemClock};
use crate::network::Network;
use crate::planner::PathPlanningOptions;
use crate::router::Router;

/// Shared application state.
///
/// The network and router are read-only once the server starts.
#[derive(Clone)]
pub struct AppState {
    /// The loaded city
    pub network: Arc<Network>,

    /// Hub router, if enabled
    pub router: Option<Arc<Router>>,

    /// Options used when a request does not supply its own
    pub options: Arc<PathPlanningOptions>,

    /// Source of "now" for requests without a departure time
    pub clock: Arc<dyn Clock>,

    /// Plan responses for default-option requests
    pub cache: PlanCache,
}

impl AppState {
    /// Create a new app state.
    pub fn new(network: Network, router: Option<Router>, cache_config: &CacheConfig) -> Self {
        Self {
            network: Arc::new(network),
            router: router.map(Arc::new),
            options: Arc::new(PathPlanningOptions::default()),
            clock: Arc::new(SystemClock),
            cache: PlanCache::new(cache_config),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }
}
