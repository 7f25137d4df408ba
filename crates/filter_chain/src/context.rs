//! Per-dispatch candidate set.
//!
//! A [`DispatchContext`] owns the snapshot of candidates gathered for one
//! subject. Filters never remove candidates directly; they flip a cancellation
//! flag that sits beside each candidate, so a later filter can restore what an
//! earlier one cancelled. New candidates are appended to a separate list and
//! are not visited by the remaining filters.

use std::cell::OnceCell;
use std::mem;

use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::candidate::Candidate;
use crate::config::DuplicatePolicy;
use crate::error::{ChainError, Result};

/// Cancellation state of the snapshot entry at the same index.
#[derive(Debug)]
struct Slot<Id> {
	id: Id,
	cancelled: bool,
}

/// Read-only view of one snapshot candidate.
#[derive(Debug)]
pub struct CandidateView<'a, C> {
	item: &'a C,
	cancelled: bool,
}

impl<'a, C> CandidateView<'a, C> {
	pub fn get(&self) -> &'a C {
		self.item
	}

	pub fn is_cancelled(&self) -> bool {
		self.cancelled
	}
}

/// Mutable view of one snapshot candidate; only the cancellation flag can change.
#[derive(Debug)]
pub struct CandidateSlot<'a, C> {
	item: &'a C,
	cancelled: &'a mut bool,
}

impl<'a, C> CandidateSlot<'a, C> {
	pub fn get(&self) -> &'a C {
		self.item
	}

	pub fn is_cancelled(&self) -> bool {
		*self.cancelled
	}

	pub fn cancel(&mut self) {
		*self.cancelled = true;
	}

	/// Undoes a cancellation made by an earlier filter.
	pub fn restore(&mut self) {
		*self.cancelled = false;
	}

	pub fn set_cancelled(&mut self, cancelled: bool) {
		*self.cancelled = cancelled;
	}
}

/// Candidate set handed to every filter of one dispatch.
pub struct DispatchContext<'s, S, C: Candidate> {
	subject: &'s S,
	snapshot: Vec<C>,
	slots: Vec<Slot<C::Id>>,
	added: Vec<C>,
	/// First slot of each snapshot identity, built on the first lookup by identity.
	positions: OnceCell<FxHashMap<C::Id, usize>>,
	/// Built on the first addition attempt.
	known_ids: Option<FxHashSet<C::Id>>,
	duplicates: DuplicatePolicy,
	closed: bool,
}

impl<'s, S, C: Candidate> DispatchContext<'s, S, C> {
	/// Wraps `snapshot`, rejecting duplicate additions.
	pub fn new(subject: &'s S, snapshot: Vec<C>) -> Self {
		Self::with_policy(subject, snapshot, DuplicatePolicy::Reject)
	}

	pub fn with_policy(subject: &'s S, snapshot: Vec<C>, duplicates: DuplicatePolicy) -> Self {
		let slots = snapshot
			.iter()
			.map(|item| Slot {
				id: item.id(),
				cancelled: false,
			})
			.collect();
		Self {
			subject,
			snapshot,
			slots,
			added: Vec::new(),
			positions: OnceCell::new(),
			known_ids: None,
			duplicates,
			closed: false,
		}
	}

	/// Returns the subject whose candidates are being filtered.
	pub fn subject(&self) -> &'s S {
		self.subject
	}

	/// Number of candidates in the snapshot, cancelled or not.
	pub fn len(&self) -> usize {
		self.snapshot.len()
	}

	pub fn is_empty(&self) -> bool {
		self.snapshot.is_empty()
	}

	pub fn is_closed(&self) -> bool {
		self.closed
	}

	/// Iterates over the snapshot in its original order.
	pub fn candidates(&self) -> impl Iterator<Item = CandidateView<'_, C>> {
		self.snapshot
			.iter()
			.zip(&self.slots)
			.map(|(item, slot)| CandidateView {
				item,
				cancelled: slot.cancelled,
			})
	}

	/// Iterates over the snapshot, allowing cancellation flags to change.
	pub fn candidates_mut(&mut self) -> impl Iterator<Item = CandidateSlot<'_, C>> {
		self.snapshot
			.iter()
			.zip(&mut self.slots)
			.map(|(item, slot)| CandidateSlot {
				item,
				cancelled: &mut slot.cancelled,
			})
	}

	/// Cancels the snapshot candidate with identity `id`. Returns false if there is none.
	///
	/// Identity lookups address the first snapshot entry with that identity; use
	/// [`DispatchContext::cancel_where`] to reach every entry of a snapshot that
	/// repeats an identity.
	pub fn cancel(&mut self, id: &C::Id) -> bool {
		self.set_flag(id, true)
	}

	/// Restores the snapshot candidate with identity `id`. Returns false if there is none.
	pub fn restore(&mut self, id: &C::Id) -> bool {
		self.set_flag(id, false)
	}

	/// Returns the cancellation flag of `id`, or `None` if it is not in the snapshot.
	pub fn is_cancelled(&self, id: &C::Id) -> Option<bool> {
		self.position(id).map(|index| self.slots[index].cancelled)
	}

	/// Cancels every snapshot candidate matching `pred` and returns how many matched.
	///
	/// Candidates that were already cancelled are counted too.
	pub fn cancel_where(&mut self, mut pred: impl FnMut(&C) -> bool) -> usize {
		let mut matched = 0;
		for mut slot in self.candidates_mut() {
			if pred(slot.get()) {
				slot.cancel();
				matched += 1;
			}
		}
		matched
	}

	/// Number of snapshot candidates currently cancelled.
	pub fn cancelled_count(&self) -> usize {
		self.slots.iter().filter(|slot| slot.cancelled).count()
	}

	/// Candidates added so far, in acceptance order.
	pub fn added(&self) -> &[C] {
		&self.added
	}

	/// Adds a candidate that was not part of the snapshot.
	///
	/// Returns `Ok(true)` if it was added. A candidate whose identity is already
	/// in the snapshot (cancelled or not) or was added earlier is a duplicate:
	/// it fails with [`ChainError::DuplicateCandidate`], or returns `Ok(false)`
	/// under [`DuplicatePolicy::Ignore`]. Fails with
	/// [`ChainError::DispatchClosed`] once the context has been finalized.
	pub fn try_add(&mut self, candidate: C) -> Result<bool> {
		if self.closed {
			return Err(ChainError::DispatchClosed);
		}

		let slots = &self.slots;
		let known = self
			.known_ids
			.get_or_insert_with(|| slots.iter().map(|slot| slot.id.clone()).collect());

		let id = candidate.id();
		if !known.insert(id.clone()) {
			return match self.duplicates {
				DuplicatePolicy::Reject => Err(ChainError::DuplicateCandidate {
					id: format!("{id:?}"),
				}),
				DuplicatePolicy::Ignore => {
					debug!(?id, "candidate already present; ignoring addition");
					Ok(false)
				}
			};
		}

		self.added.push(candidate);
		Ok(true)
	}

	/// Closes the context and returns the reconciled candidates.
	///
	/// Cancelled candidates are removed from the snapshot in place; survivors
	/// keep their relative order and are followed by the added candidates in
	/// the order they were accepted.
	///
	/// # Panics
	///
	/// Panics if the cancellation flags are out of step with the snapshot. That
	/// can only happen through a bug in this crate, never through filter code.
	pub fn finalize(&mut self) -> Result<Vec<C>> {
		if self.closed {
			return Err(ChainError::DispatchClosed);
		}
		self.closed = true;

		assert_eq!(
			self.slots.len(),
			self.snapshot.len(),
			"cancellation flags out of step with the candidate snapshot"
		);
		for (slot, item) in self.slots.iter().zip(&self.snapshot) {
			if slot.cancelled {
				assert!(
					slot.id == item.id(),
					"cancellation flag for {:?} is attached to {:?}",
					slot.id,
					item.id()
				);
			}
		}

		// Alignment is checked above, so the removal below cannot stop halfway.
		let mut flags = self.slots.iter().map(|slot| slot.cancelled);
		self.snapshot.retain(|_| !flags.next().unwrap_or(false));
		self.slots.clear();
		self.positions = OnceCell::new();

		let mut result = mem::take(&mut self.snapshot);
		result.append(&mut self.added);
		Ok(result)
	}

	/// Moves the snapshot out, as passed in, so a failed dispatch can hand it back.
	///
	/// Only meaningful before [`DispatchContext::finalize`] has reconciled it.
	pub(crate) fn take_snapshot(&mut self) -> Vec<C> {
		self.slots.clear();
		self.positions = OnceCell::new();
		mem::take(&mut self.snapshot)
	}

	fn position(&self, id: &C::Id) -> Option<usize> {
		self.positions
			.get_or_init(|| {
				let mut positions = FxHashMap::default();
				for (index, slot) in self.slots.iter().enumerate() {
					positions.entry(slot.id.clone()).or_insert(index);
				}
				positions
			})
			.get(id)
			.copied()
	}

	fn set_flag(&mut self, id: &C::Id, cancelled: bool) -> bool {
		match self.position(id) {
			Some(index) => {
				self.slots[index].cancelled = cancelled;
				true
			}
			None => false,
		}
	}
}
