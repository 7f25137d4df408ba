//! Host lifecycle phases.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::Deserialize;
use tracing::debug;

/// Lifecycle phase of the host, in the order the host moves through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum Phase {
	/// The library is being loaded; other mods may not be available yet.
	Initialize = 0,
	/// Every mod has been loaded and can be accessed.
	ModsInitialized = 1,
	/// A save or new game is about to be loaded.
	GameStarting = 2,
	/// The save or new game has been loaded.
	GameStarted = 3,
	/// The game is being torn down.
	Deinitialize = 4,
}

impl Phase {
	/// Every phase, in lifecycle order.
	pub const ALL: [Phase; 5] = [
		Phase::Initialize,
		Phase::ModsInitialized,
		Phase::GameStarting,
		Phase::GameStarted,
		Phase::Deinitialize,
	];

	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Initialize => "initialize",
			Self::ModsInitialized => "mods-initialized",
			Self::GameStarting => "game-starting",
			Self::GameStarted => "game-started",
			Self::Deinitialize => "deinitialize",
		}
	}

	const fn from_u8(raw: u8) -> Self {
		match raw {
			0 => Self::Initialize,
			1 => Self::ModsInitialized,
			2 => Self::GameStarting,
			3 => Self::GameStarted,
			_ => Self::Deinitialize,
		}
	}
}

impl fmt::Display for Phase {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Shared handle to the host's current phase.
///
/// The host advances it; everything else only reads it. Clones observe the
/// same value.
#[derive(Debug, Clone, Default)]
pub struct PhaseCell {
	inner: Arc<AtomicU8>,
}

impl PhaseCell {
	/// Creates a cell in [`Phase::Initialize`].
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates a cell already in `phase`.
	pub fn starting_at(phase: Phase) -> Self {
		Self {
			inner: Arc::new(AtomicU8::new(phase as u8)),
		}
	}

	/// Returns the current phase.
	pub fn current(&self) -> Phase {
		Phase::from_u8(self.inner.load(Ordering::Acquire))
	}

	/// Moves the cell forward to `phase`.
	///
	/// Phases never go backwards: advancing to a phase at or before the current
	/// one leaves the cell untouched. Returns the phase current afterwards.
	pub fn advance(&self, phase: Phase) -> Phase {
		let prev = self.inner.fetch_max(phase as u8, Ordering::AcqRel);
		if prev < phase as u8 {
			debug!(from = %Phase::from_u8(prev), to = %phase, "lifecycle phase advanced");
			phase
		} else {
			Phase::from_u8(prev)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn phases_are_totally_ordered() {
		for pair in Phase::ALL.windows(2) {
			assert!(pair[0] < pair[1], "{} should precede {}", pair[0], pair[1]);
		}
	}

	#[test]
	fn advance_never_moves_backwards() {
		let cell = PhaseCell::new();
		assert_eq!(cell.current(), Phase::Initialize);

		assert_eq!(cell.advance(Phase::GameStarting), Phase::GameStarting);
		assert_eq!(cell.advance(Phase::ModsInitialized), Phase::GameStarting);
		assert_eq!(cell.current(), Phase::GameStarting);

		assert_eq!(cell.advance(Phase::Deinitialize), Phase::Deinitialize);
	}

	#[test]
	fn clones_share_state() {
		let host = PhaseCell::starting_at(Phase::ModsInitialized);
		let view = host.clone();

		host.advance(Phase::GameStarted);
		assert_eq!(view.current(), Phase::GameStarted);
	}

	#[test]
	fn display_matches_config_spelling() {
		assert_eq!(Phase::GameStarted.to_string(), "game-started");
		assert_eq!(Phase::ModsInitialized.to_string(), "mods-initialized");
	}
}
