//! Filter chain configuration.
//!
//! ```toml
//! cutover = "game-started"
//! duplicates = "reject"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::phase::Phase;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},

	/// Error parsing TOML or mapping it onto the config types.
	#[error("invalid configuration: {0}")]
	Parse(#[from] toml::de::Error),
}

/// What a dispatch does when a filter adds a candidate that is already present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
	/// Fail the addition with [`crate::ChainError::DuplicateCandidate`].
	#[default]
	Reject,
	/// Log the attempt and report that nothing was added.
	Ignore,
}

/// Settings shared by every registry built from this config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
	/// Phase at which registration closes.
	pub cutover: Phase,
	/// Handling of duplicate additions.
	pub duplicates: DuplicatePolicy,
}

impl Default for ChainConfig {
	fn default() -> Self {
		Self {
			cutover: Phase::GameStarted,
			duplicates: DuplicatePolicy::Reject,
		}
	}
}

impl ChainConfig {
	/// Parses a TOML string. Missing keys keep their defaults.
	pub fn parse(input: &str) -> Result<Self, ConfigError> {
		parse_toml(input)
	}

	/// Reads and parses a TOML file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		load_toml(path)
	}
}

/// Parses a TOML document into `T`.
pub fn parse_toml<T: DeserializeOwned>(input: &str) -> Result<T, ConfigError> {
	Ok(toml::from_str(input)?)
}

/// Reads the TOML file at `path` into `T`.
///
/// Used by every config type built on [`ChainConfig`], so they all report
/// unreadable files the same way.
pub fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
	let input = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
		path: path.to_path_buf(),
		error,
	})?;
	parse_toml(&input)
}
