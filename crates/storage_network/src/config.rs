//! Storage network configuration.
//!
//! Extends the filter chain settings with a `[network]` table:
//!
//! ```toml
//! cutover = "game-started"
//! duplicates = "reject"
//!
//! [network]
//! filter_unbuilt = false
//! ```

use std::path::Path;

use serde::Deserialize;
use vtol_filter_chain::{ChainConfig, ConfigError, load_toml, parse_toml};

/// Options specific to storage network dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct NetworkOptions {
	/// Run filters for buildings that are still placement previews.
	pub filter_unbuilt: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
	#[serde(flatten)]
	pub chain: ChainConfig,
	pub network: NetworkOptions,
}

impl NetworkConfig {
	pub fn parse(input: &str) -> Result<Self, ConfigError> {
		parse_toml(input)
	}

	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		load_toml(path)
	}
}
