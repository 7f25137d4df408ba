use std::sync::Arc;

use thiserror::Error;

use crate::phase::Phase;

/// Errors raised while registering filters or running a dispatch.
#[derive(Debug, Error)]
pub enum ChainError {
	/// A filter was registered at or after the cutover phase.
	#[error("filter registration is closed: current phase is {phase}, registration closes at {cutover}")]
	InvalidRegistrationState {
		/// Phase the host was in when registration was attempted.
		phase: Phase,
		/// Phase at which registration closes.
		cutover: Phase,
	},
	/// A filter added a candidate whose identity is already part of the dispatch.
	#[error("candidate {id} was already detected or has already been added")]
	DuplicateCandidate {
		/// Identity of the rejected candidate, rendered with `Debug`.
		id: String,
	},
	/// A candidate was added after the dispatch started reconciling.
	#[error("dispatch is closed: candidates cannot be added after all filters have run")]
	DispatchClosed,
	/// A filter refused the candidate set for a reason of its own.
	#[error("{0}")]
	Rejected(String),
	/// An error escaped a filter during dispatch.
	#[error("filter `{name}` failed: {source}")]
	Filter {
		/// Name of the failing filter.
		name: Arc<str>,
		/// What the filter returned.
		source: Box<ChainError>,
	},
}

impl ChainError {
	/// Creates a [`ChainError::Rejected`] with the given message.
	pub fn rejected(message: impl Into<String>) -> Self {
		Self::Rejected(message.into())
	}

	/// Returns the innermost error, looking through [`ChainError::Filter`] wrappers.
	pub fn root(&self) -> &ChainError {
		match self {
			Self::Filter { source, .. } => source.root(),
			other => other,
		}
	}
}

/// Result type for filter chain operations.
pub type Result<T, E = ChainError> = std::result::Result<T, E>;
