//! Multi-modal city journey planner.
//!
//! Plans walking, driving and public transit journeys across a city's street
//! and transit network, and serves them over HTTP.

pub mod cache;
pub mod clock;
pub mod config;
pub mod domain;
pub mod graph;
pub mod network;
pub mod planner;
pub mod router;
pub mod web;
pub mod wire;

#[cfg(test)]
pub(crate) mod fixtures;
