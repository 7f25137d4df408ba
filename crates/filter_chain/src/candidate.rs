//! Identity traits for the values a filter chain operates on.

use std::fmt::Debug;
use std::hash::Hash;

/// A value that can be offered to, cancelled by, or added by a filter.
///
/// Two candidates with the same [`Candidate::Id`] are the same candidate as far
/// as a dispatch is concerned; a filter may not add one that is already present.
pub trait Candidate {
	/// Identity used to detect duplicate additions.
	type Id: Eq + Hash + Clone + Debug;

	/// Returns the identity of this candidate.
	fn id(&self) -> Self::Id;
}

/// The value whose candidates are being filtered.
///
/// Filters may be registered for a single subject key; they then only run for
/// subjects reporting that key.
pub trait Subject {
	/// Key used to scope filters to a group of subjects.
	type Key: Eq + Hash + Clone + Debug;

	/// Returns the scoping key for this subject.
	fn key(&self) -> Self::Key;
}
