//! Server configuration.
//!
//! Everything is read from `PLANNER_*` environment variables. Unset
//! variables take the defaults below.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::router::RouterConfig;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("{var}: cannot parse {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Configuration for the HTTP server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Map file to load at startup.
    pub network_path: PathBuf,

    /// Address to listen on.
    pub addr: SocketAddr,

    /// Hub cell size in metres, or `None` to run without a hub router.
    pub hub_spacing: Option<f64>,

    /// Plan response cache.
    pub cache: CacheConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            network_path: PathBuf::from("network.json"),
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            hub_spacing: Some(RouterConfig::default().hub_spacing),
            cache: CacheConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name
    /// to its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = lookup("PLANNER_NETWORK") {
            config.network_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup("PLANNER_ADDR") {
            config.addr = parse("PLANNER_ADDR", &addr)?;
        }
        if let Some(spacing) = lookup("PLANNER_HUB_SPACING") {
            let spacing = spacing.trim();
            config.hub_spacing = if spacing.is_empty() || spacing.eq_ignore_ascii_case("off") {
                None
            } else {
                let metres: f64 = parse("PLANNER_HUB_SPACING", spacing)?;
                if !(metres > 0.0 && metres.is_finite()) {
                    return Err(ConfigError::Invalid {
                        var: "PLANNER_HUB_SPACING",
                        value: spacing.to_string(),
                        reason: "must be a positive number of metres".to_string(),
                    });
                }
                Some(metres)
            };
        }
        if let Some(ttl) = lookup("PLANNER_CACHE_TTL_SECS") {
            config.cache.ttl = Duration::from_secs(parse("PLANNER_CACHE_TTL_SECS", &ttl)?);
        }
        if let Some(capacity) = lookup("PLANNER_CACHE_CAPACITY") {
            config.cache.max_capacity = parse("PLANNER_CACHE_CAPACITY", &capacity)?;
        }

        Ok(config)
    }

    /// Router settings, if hubs are enabled.
    pub fn router_config(&self) -> Option<RouterConfig> {
        self.hub_spacing.map(RouterConfig::new)
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
