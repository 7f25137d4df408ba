//! Runs the filter chain for one subject.

use std::mem;

use tracing::{debug, debug_span, trace};

use crate::candidate::{Candidate, Subject};
use crate::context::DispatchContext;
use crate::error::{ChainError, Result};
use crate::registry::FilterRegistry;

/// Counters collected while running the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DispatchStats {
	/// Filters whose body ran.
	pub ran: usize,
	/// Filters that declared themselves irrelevant for the subject.
	pub skipped: usize,
	/// Snapshot candidates removed.
	pub cancelled: usize,
	/// Candidates appended by filters.
	pub added: usize,
}

/// What a dispatch did to the candidate collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
	/// No filter applies to the subject; the collection was not looked at.
	Bypassed,
	/// The chain ran and the collection was replaced by its result.
	Filtered(DispatchStats),
}

impl DispatchOutcome {
	pub fn stats(&self) -> Option<DispatchStats> {
		match self {
			Self::Bypassed => None,
			Self::Filtered(stats) => Some(*stats),
		}
	}
}

/// Holds the caller's collection while the chain runs and writes the
/// snapshot back unless disarmed, including when a filter panics.
struct InputGuard<'a, 's, S, C: Candidate> {
	candidates: &'a mut Vec<C>,
	ctx: DispatchContext<'s, S, C>,
	armed: bool,
}

impl<S, C: Candidate> Drop for InputGuard<'_, '_, S, C> {
	fn drop(&mut self) {
		if self.armed {
			*self.candidates = self.ctx.take_snapshot();
		}
	}
}

impl<S: Subject, C: Candidate> FilterRegistry<S, C> {
	/// Runs every filter that applies to `subject` over `candidates`.
	///
	/// Filters run once each, lowest priority first. On success `candidates`
	/// holds the surviving snapshot entries followed by the added ones. If a
	/// filter fails, `candidates` is left exactly as it was passed in and the
	/// error is returned wrapped in [`ChainError::Filter`]. A panicking filter
	/// leaves `candidates` untouched as well.
	pub fn dispatch(&self, subject: &S, candidates: &mut Vec<C>) -> Result<DispatchOutcome> {
		let key = subject.key();
		let filters = self.lookup(&key);
		if filters.is_empty() {
			trace!(?key, "no filters for subject");
			return Ok(DispatchOutcome::Bypassed);
		}

		let span = debug_span!("dispatch", ?key, candidates = candidates.len());
		let _entered = span.enter();

		let snapshot = mem::take(candidates);
		let mut input = InputGuard {
			candidates,
			ctx: DispatchContext::with_policy(subject, snapshot, self.duplicate_policy()),
			armed: true,
		};
		let mut stats = DispatchStats::default();

		for filter in filters.iter() {
			if !filter.is_relevant(subject) {
				trace!(filter = filter.name(), "filter not relevant");
				stats.skipped += 1;
				continue;
			}

			trace!(filter = filter.name(), priority = filter.priority(), "running filter");
			if let Err(source) = filter.apply(&mut input.ctx) {
				debug!(filter = filter.name(), error = %source, "filter failed; dispatch aborted");
				return Err(ChainError::Filter {
					name: filter.name.clone(),
					source: Box::new(source),
				});
			}
			stats.ran += 1;
		}

		stats.cancelled = input.ctx.cancelled_count();
		stats.added = input.ctx.added().len();
		let result = input.ctx.finalize()?;
		input.armed = false;
		*input.candidates = result;

		debug!(
			ran = stats.ran,
			skipped = stats.skipped,
			cancelled = stats.cancelled,
			added = stats.added,
			"dispatch finished"
		);
		Ok(DispatchOutcome::Filtered(stats))
	}
}
