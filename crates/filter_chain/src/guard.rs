//! Registration cutover.

use crate::error::{ChainError, Result};
use crate::phase::{Phase, PhaseCell};

/// Returns true if filters may still be registered while the host is in `phase`.
#[inline]
pub const fn is_registration_open(phase: Phase, cutover: Phase) -> bool {
	(phase as u8) < (cutover as u8)
}

/// Refuses registration once the host reaches the cutover phase.
#[derive(Debug, Clone)]
pub struct RegistrationGuard {
	phase: PhaseCell,
	cutover: Phase,
}

impl RegistrationGuard {
	pub fn new(phase: PhaseCell, cutover: Phase) -> Self {
		Self { phase, cutover }
	}

	/// Returns the phase the host is currently in.
	pub fn phase(&self) -> Phase {
		self.phase.current()
	}

	/// Returns the phase at which registration closes.
	pub fn cutover(&self) -> Phase {
		self.cutover
	}

	pub fn is_open(&self) -> bool {
		is_registration_open(self.phase.current(), self.cutover)
	}

	/// Fails with [`ChainError::InvalidRegistrationState`] once registration is closed.
	pub fn check(&self) -> Result<()> {
		let phase = self.phase.current();
		if is_registration_open(phase, self.cutover) {
			Ok(())
		} else {
			Err(ChainError::InvalidRegistrationState {
				phase,
				cutover: self.cutover,
			})
		}
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case(Phase::Initialize, true)]
	#[case(Phase::ModsInitialized, true)]
	#[case(Phase::GameStarting, true)]
	#[case(Phase::GameStarted, false)]
	#[case(Phase::Deinitialize, false)]
	fn default_cutover_closes_at_game_started(#[case] phase: Phase, #[case] open: bool) {
		let guard = RegistrationGuard::new(PhaseCell::starting_at(phase), Phase::GameStarted);
		assert_eq!(guard.is_open(), open);
		assert_eq!(guard.check().is_ok(), open);
	}

	#[test]
	fn refusal_names_current_phase() {
		let guard = RegistrationGuard::new(PhaseCell::starting_at(Phase::Deinitialize), Phase::GameStarting);
		let err = guard.check().unwrap_err();

		assert!(matches!(
			err,
			ChainError::InvalidRegistrationState {
				phase: Phase::Deinitialize,
				cutover: Phase::GameStarting,
			}
		));
		assert!(err.to_string().contains("deinitialize"));
	}

	#[test]
	fn guard_follows_host_phase() {
		let host = PhaseCell::new();
		let guard = RegistrationGuard::new(host.clone(), Phase::ModsInitialized);
		assert!(guard.is_open());

		host.advance(Phase::ModsInitialized);
		assert!(!guard.is_open());
	}

	#[test]
	fn first_phase_cutover_never_opens() {
		assert!(!is_registration_open(Phase::Initialize, Phase::Initialize));
	}
}
