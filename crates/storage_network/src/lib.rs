#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Storage network connection filtering.
//!
//! Storage network buildings connect to nearby buildings of compatible types.
//! The host collects those candidate connections ("siblings") for one building
//! at a time; [`ConnectionController::invalidate_siblings`] then lets every
//! registered [`ConnectionFilter`] cancel connections or add connections to
//! buildings the host did not detect.
//!
//! Filters are registered globally or for a single building asset, and run in
//! ascending priority order: a filter with a higher priority runs later, so
//! its decisions cannot be overwritten by a filter with a lower priority.

mod building;
mod config;
mod controller;
mod sibling;

pub use building::{AssetId, Building, BuildingId, Position};
pub use config::{NetworkConfig, NetworkOptions};
pub use controller::{ConnectionController, ConnectionFilter, PotentialConnections};
pub use sibling::{Sibling, create_sibling_of};
pub use vtol_filter_chain::{ChainError, DispatchOutcome, DispatchStats, FilterId, Phase, PhaseCell};
