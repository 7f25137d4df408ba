use tracing::trace;
use vtol_filter_chain::{
	ChainError, DispatchContext, DispatchOutcome, Filter, FilterId, FilterRegistry, PhaseCell,
};

use crate::building::{AssetId, Building};
use crate::config::{NetworkConfig, NetworkOptions};
use crate::sibling::Sibling;

/// Connections of one building as seen by connection filters.
pub type PotentialConnections<'a> = DispatchContext<'a, Building, Sibling>;

/// Decides which connections a storage network building may keep.
pub trait ConnectionFilter: Send + Sync {
	/// Returns true if [`ConnectionFilter::on_connect`] should run for `source`.
	fn is_relevant(&self, _source: &Building) -> bool {
		true
	}

	/// Cancels or adds connections of [`PotentialConnections::subject`].
	fn on_connect(&self, connections: &mut PotentialConnections<'_>) -> Result<(), ChainError>;

	/// Name used in logs and errors.
	fn name(&self) -> &str {
		std::any::type_name::<Self>()
	}
}

struct ConnectionFilterAdapter<F>(F);

impl<F: ConnectionFilter> Filter<Building, Sibling> for ConnectionFilterAdapter<F> {
	fn is_relevant(&self, subject: &Building) -> bool {
		self.0.is_relevant(subject)
	}

	fn apply(&self, ctx: &mut PotentialConnections<'_>) -> Result<(), ChainError> {
		self.0.on_connect(ctx)
	}

	fn name(&self) -> &str {
		self.0.name()
	}
}

/// Owns the connection filters of one game session.
#[derive(Debug)]
pub struct ConnectionController {
	filters: FilterRegistry<Building, Sibling>,
	options: NetworkOptions,
}

impl ConnectionController {
	pub fn new(phase: PhaseCell) -> Self {
		Self::with_config(phase, &NetworkConfig::default())
	}

	pub fn with_config(phase: PhaseCell, config: &NetworkConfig) -> Self {
		Self {
			filters: FilterRegistry::with_config(phase, &config.chain),
			options: config.network,
		}
	}

	/// Registers a filter that runs for every building.
	///
	/// Filters with a higher priority run after filters with a lower priority,
	/// so their alterations cannot be overwritten by lower priority filters.
	pub fn register_connection_filter<F>(&self, filter: F, priority: i32) -> Result<FilterId, ChainError>
	where
		F: ConnectionFilter + 'static,
	{
		self.filters.register(None, ConnectionFilterAdapter(filter), priority)
	}

	/// Registers a filter that only runs for buildings placed from `asset`.
	pub fn register_asset_filter<F>(&self, asset: AssetId, filter: F, priority: i32) -> Result<FilterId, ChainError>
	where
		F: ConnectionFilter + 'static,
	{
		self.filters.register(Some(asset), ConnectionFilterAdapter(filter), priority)
	}

	/// The underlying registry, for closure filters and introspection.
	pub fn filters(&self) -> &FilterRegistry<Building, Sibling> {
		&self.filters
	}

	/// Runs the connection filters over the siblings the host found for `building`.
	///
	/// Placement previews are left alone unless
	/// [`NetworkOptions::filter_unbuilt`] is set. On error `siblings` is
	/// unchanged.
	pub fn invalidate_siblings(
		&self,
		building: &Building,
		siblings: &mut Vec<Sibling>,
	) -> Result<DispatchOutcome, ChainError> {
		if !building.is_built && !self.options.filter_unbuilt {
			trace!(building = %building.id, "skipping connection filters for unbuilt building");
			return Ok(DispatchOutcome::Bypassed);
		}
		self.filters.dispatch(building, siblings)
	}
}
