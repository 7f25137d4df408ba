//! Filter storage with lazy priority ordering.
//!
//! Registration only appends and marks the registry dirty. The first lookup
//! after a registration sorts the filters by ascending priority (ties keep
//! registration order) and rebuilds one shared list per subject key, so
//! lookups between registrations are a reference-count bump.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap as HashMap;
use tracing::{debug, trace};

use crate::candidate::{Candidate, Subject};
use crate::config::{ChainConfig, DuplicatePolicy};
use crate::context::DispatchContext;
use crate::error::Result;
use crate::filter::{Filter, FnFilter, RelevanceFn};
use crate::guard::RegistrationGuard;
use crate::phase::{Phase, PhaseCell};

/// Handle returned by registration; also the registration sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FilterId(u64);

impl FilterId {
	pub const fn as_u64(self) -> u64 {
		self.0
	}
}

impl fmt::Display for FilterId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "FilterId({})", self.0)
	}
}

/// A filter together with its registration data.
pub struct RegisteredFilter<S: Subject, C: Candidate> {
	id: FilterId,
	key: Option<S::Key>,
	priority: i32,
	pub(crate) name: Arc<str>,
	filter: Box<dyn Filter<S, C>>,
}

impl<S: Subject, C: Candidate> RegisteredFilter<S, C> {
	pub fn id(&self) -> FilterId {
		self.id
	}

	/// Subject key the filter is scoped to; `None` for global filters.
	pub fn key(&self) -> Option<&S::Key> {
		self.key.as_ref()
	}

	pub fn priority(&self) -> i32 {
		self.priority
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn is_relevant(&self, subject: &S) -> bool {
		self.filter.is_relevant(subject)
	}

	pub fn apply(&self, ctx: &mut DispatchContext<'_, S, C>) -> Result<()> {
		self.filter.apply(ctx)
	}

	fn applies_to(&self, key: &S::Key) -> bool {
		self.key.as_ref().is_none_or(|own| own == key)
	}
}

impl<S: Subject, C: Candidate> fmt::Debug for RegisteredFilter<S, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RegisteredFilter")
			.field("id", &self.id)
			.field("key", &self.key)
			.field("priority", &self.priority)
			.field("name", &self.name)
			.finish()
	}
}

/// Filters in execution order, shared between lookups.
pub type FilterList<S, C> = Arc<[Arc<RegisteredFilter<S, C>>]>;

struct Inner<S: Subject, C: Candidate> {
	/// Registration order until the next rebuild, execution order after it.
	entries: Vec<Arc<RegisteredFilter<S, C>>>,
	next_id: u64,
	dirty: bool,
	all: FilterList<S, C>,
	global: FilterList<S, C>,
	by_key: HashMap<S::Key, FilterList<S, C>>,
}

impl<S: Subject, C: Candidate> Inner<S, C> {
	fn new() -> Self {
		Self {
			entries: Vec::new(),
			next_id: 0,
			dirty: false,
			all: Vec::new().into(),
			global: Vec::new().into(),
			by_key: HashMap::default(),
		}
	}

	fn rebuild(&mut self) {
		self.entries.sort_by_key(|f| (f.priority, f.id));

		self.all = self.entries.iter().cloned().collect();
		self.global = self.entries.iter().filter(|f| f.key.is_none()).cloned().collect();

		let mut by_key = HashMap::default();
		for key in self.entries.iter().filter_map(|f| f.key.as_ref()) {
			if by_key.contains_key(key) {
				continue;
			}
			let list: FilterList<S, C> = self.entries.iter().filter(|f| f.applies_to(key)).cloned().collect();
			by_key.insert(key.clone(), list);
		}
		self.by_key = by_key;
		self.dirty = false;

		trace!(
			filters = self.entries.len(),
			keyed = self.by_key.len(),
			"rebuilt filter order"
		);
	}

	fn for_key(&self, key: &S::Key) -> FilterList<S, C> {
		self.by_key.get(key).unwrap_or(&self.global).clone()
	}
}

/// Registry of filters for one kind of subject and candidate.
///
/// Explicitly constructed and owned by whoever drives dispatch; there is no
/// process-wide instance.
pub struct FilterRegistry<S: Subject, C: Candidate> {
	guard: RegistrationGuard,
	duplicates: DuplicatePolicy,
	inner: RwLock<Inner<S, C>>,
}

impl<S: Subject, C: Candidate> FilterRegistry<S, C> {
	/// Creates an empty registry using [`ChainConfig::default`].
	pub fn new(phase: PhaseCell) -> Self {
		Self::with_config(phase, &ChainConfig::default())
	}

	pub fn with_config(phase: PhaseCell, config: &ChainConfig) -> Self {
		Self {
			guard: RegistrationGuard::new(phase, config.cutover),
			duplicates: config.duplicates,
			inner: RwLock::new(Inner::new()),
		}
	}

	/// Registers `filter` for subjects with `key`, or for every subject when `key` is `None`.
	///
	/// Lower priorities run first, so a higher priority has the last word.
	/// Fails with [`crate::ChainError::InvalidRegistrationState`] once the host
	/// has reached the cutover phase.
	pub fn register<F>(&self, key: Option<S::Key>, filter: F, priority: i32) -> Result<FilterId>
	where
		F: Filter<S, C> + 'static,
	{
		self.insert(key, priority, Box::new(filter))
	}

	/// Starts building a closure filter named `name`.
	pub fn filter(&self, name: impl Into<String>) -> FilterBuilder<'_, S, C> {
		FilterBuilder {
			registry: self,
			name: name.into(),
			key: None,
			priority: 0,
			relevance: None,
		}
	}

	/// Returns the filters that apply to subjects with `key`, in execution order.
	pub fn lookup(&self, key: &S::Key) -> FilterList<S, C> {
		{
			let inner = self.inner.read();
			if !inner.dirty {
				return inner.for_key(key);
			}
		}
		let mut inner = self.inner.write();
		if inner.dirty {
			inner.rebuild();
		}
		inner.for_key(key)
	}

	/// Returns every registered filter, in execution order.
	pub fn all(&self) -> FilterList<S, C> {
		{
			let inner = self.inner.read();
			if !inner.dirty {
				return inner.all.clone();
			}
		}
		let mut inner = self.inner.write();
		if inner.dirty {
			inner.rebuild();
		}
		inner.all.clone()
	}

	pub fn len(&self) -> usize {
		self.inner.read().entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.inner.read().entries.is_empty()
	}

	pub fn is_registration_open(&self) -> bool {
		self.guard.is_open()
	}

	/// Returns the phase the host is currently in.
	pub fn phase(&self) -> Phase {
		self.guard.phase()
	}

	pub fn duplicate_policy(&self) -> DuplicatePolicy {
		self.duplicates
	}

	fn insert(&self, key: Option<S::Key>, priority: i32, filter: Box<dyn Filter<S, C>>) -> Result<FilterId> {
		let name: Arc<str> = Arc::from(filter.name());
		if let Err(err) = self.guard.check() {
			debug!(filter = %name, phase = %self.guard.phase(), "filter registration refused");
			return Err(err);
		}

		let mut inner = self.inner.write();
		let id = FilterId(inner.next_id);
		inner.next_id += 1;
		debug!(filter = %name, %id, priority, ?key, "registered filter");

		inner.entries.push(Arc::new(RegisteredFilter {
			id,
			key,
			priority,
			name,
			filter,
		}));
		inner.dirty = true;
		Ok(id)
	}
}

impl<S: Subject, C: Candidate> fmt::Debug for FilterRegistry<S, C> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let inner = self.inner.read();
		f.debug_struct("FilterRegistry")
			.field("guard", &self.guard)
			.field("duplicates", &self.duplicates)
			.field("filters", &inner.entries.len())
			.field("dirty", &inner.dirty)
			.finish()
	}
}

/// Builder for closure filters, returned by [`FilterRegistry::filter`].
#[must_use = "a filter is only registered once `register` is called"]
pub struct FilterBuilder<'r, S: Subject, C: Candidate> {
	registry: &'r FilterRegistry<S, C>,
	name: String,
	key: Option<S::Key>,
	priority: i32,
	relevance: Option<Box<RelevanceFn<S>>>,
}

impl<S: Subject, C: Candidate> FilterBuilder<'_, S, C> {
	/// Defaults to 0.
	pub fn priority(mut self, priority: i32) -> Self {
		self.priority = priority;
		self
	}

	/// Scopes the filter to subjects with `key`. Filters are global by default.
	pub fn subject(mut self, key: S::Key) -> Self {
		self.key = Some(key);
		self
	}

	/// Runs the filter only for subjects matching `pred`.
	pub fn when<P>(mut self, pred: P) -> Self
	where
		P: Fn(&S) -> bool + Send + Sync + 'static,
	{
		self.relevance = Some(Box::new(pred));
		self
	}

	/// Registers the filter with `apply` as its body.
	pub fn register<F>(self, apply: F) -> Result<FilterId>
	where
		F: Fn(&mut DispatchContext<'_, S, C>) -> Result<()> + Send + Sync + 'static,
		S: 'static,
		C: 'static,
	{
		let mut filter = FnFilter::new(self.name, apply);
		filter.relevance = self.relevance;
		self.registry.insert(self.key, self.priority, Box::new(filter))
	}
}
