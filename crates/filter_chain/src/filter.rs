//! Filter abstraction.

use crate::candidate::{Candidate, Subject};
use crate::context::DispatchContext;
use crate::error::Result;

/// A step of the filter chain.
///
/// [`Filter::is_relevant`] decides whether the filter runs for a subject;
/// [`Filter::apply`] then cancels or adds candidates through the context.
pub trait Filter<S: Subject, C: Candidate>: Send + Sync {
	/// Returns true if [`Filter::apply`] should run for `subject`.
	fn is_relevant(&self, _subject: &S) -> bool {
		true
	}

	/// Inspects and alters the candidate set.
	///
	/// Returning an error aborts the whole dispatch.
	fn apply(&self, ctx: &mut DispatchContext<'_, S, C>) -> Result<()>;

	/// Name used in logs and errors.
	fn name(&self) -> &str {
		std::any::type_name::<Self>()
	}
}

type ApplyFn<S, C> = dyn Fn(&mut DispatchContext<'_, S, C>) -> Result<()> + Send + Sync;
pub(crate) type RelevanceFn<S> = dyn Fn(&S) -> bool + Send + Sync;

/// Filter built from closures. Usually created through [`crate::FilterBuilder`].
pub struct FnFilter<S: Subject, C: Candidate> {
	name: String,
	apply: Box<ApplyFn<S, C>>,
	pub(crate) relevance: Option<Box<RelevanceFn<S>>>,
}

impl<S: Subject, C: Candidate> FnFilter<S, C> {
	pub fn new<F>(name: impl Into<String>, apply: F) -> Self
	where
		F: Fn(&mut DispatchContext<'_, S, C>) -> Result<()> + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			apply: Box::new(apply),
			relevance: None,
		}
	}

	/// Restricts the filter to subjects matching `pred`.
	pub fn with_relevance<P>(mut self, pred: P) -> Self
	where
		P: Fn(&S) -> bool + Send + Sync + 'static,
	{
		self.relevance = Some(Box::new(pred));
		self
	}
}

impl<S: Subject, C: Candidate> Filter<S, C> for FnFilter<S, C> {
	fn is_relevant(&self, subject: &S) -> bool {
		self.relevance.as_ref().is_none_or(|pred| pred(subject))
	}

	fn apply(&self, ctx: &mut DispatchContext<'_, S, C>) -> Result<()> {
		(self.apply)(ctx)
	}

	fn name(&self) -> &str {
		&self.name
	}
}

impl<S: Subject, C: Candidate> std::fmt::Debug for FnFilter<S, C> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("FnFilter")
			.field("name", &self.name)
			.field("has_relevance", &self.relevance.is_some())
			.finish()
	}
}
