#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Priority-ordered filter chain.
//!
//! Filters are registered against an optional subject key and run, lowest
//! priority first, over the candidates gathered for one subject. Each filter
//! can cancel candidates or append new ones through a [`DispatchContext`];
//! filters that run later see (and may undo) what earlier filters decided.
//!
//! # Lifecycle
//!
//! Registration is only accepted while the host's [`Phase`] precedes the
//! configured cutover (see [`RegistrationGuard`]). After that point the set of
//! filters is frozen and only dispatch remains.
//!
//! ```ignore
//! let phase = PhaseCell::new();
//! let registry = FilterRegistry::<Site, Item>::new(phase.clone());
//!
//! registry
//! 	.filter("drop-far")
//! 	.priority(10)
//! 	.register(|ctx| {
//! 		ctx.cancel_where(|item| item.distance > 40.0);
//! 		Ok(())
//! 	})?;
//!
//! phase.advance(Phase::GameStarted);
//! registry.dispatch(&site, &mut items)?;
//! ```
//!
//! # Modules
//!
//! - [`candidate`] - identity traits for candidates and subjects
//! - [`context`] - per-dispatch candidate set with cancellation flags
//! - [`registry`] - filter storage with lazy priority ordering
//! - [`dispatch`] - runs the chain for one subject
//! - [`guard`] - registration cutover
//! - [`phase`] - host lifecycle phases
//! - [`config`] - TOML configuration

pub mod candidate;
pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod guard;
pub mod phase;
pub mod registry;

#[cfg(test)]
mod test_support;

pub use candidate::{Candidate, Subject};
pub use config::{ChainConfig, ConfigError, DuplicatePolicy, load_toml, parse_toml};
pub use context::{CandidateSlot, CandidateView, DispatchContext};
pub use dispatch::{DispatchOutcome, DispatchStats};
pub use error::{ChainError, Result};
pub use filter::{Filter, FnFilter};
pub use guard::{RegistrationGuard, is_registration_open};
pub use phase::{Phase, PhaseCell};
pub use registry::{FilterBuilder, FilterId, FilterList, FilterRegistry, RegisteredFilter};
