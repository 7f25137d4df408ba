#![allow(unused_crate_dependencies)]

//! End-to-end connection filtering over plain storage network data.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use pretty_assertions::assert_eq;
use rstest::rstest;
use vtol_storage_network::{
	AssetId, Building, BuildingId, ChainError, ConnectionController, ConnectionFilter,
	DispatchOutcome, NetworkConfig, Phase, PhaseCell, Position, PotentialConnections, Sibling,
	create_sibling_of,
};

const WAREHOUSE: AssetId = AssetId(10);
const MINE: AssetId = AssetId(20);
const FACTORY: AssetId = AssetId(30);

fn init_tracing() {
	let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn building(id: u32, asset: AssetId, x: f32, z: f32) -> Arc<Building> {
	Arc::new(Building::new(BuildingId(id), asset, format!("building-{id}")).at(Position::new(x, 0.0, z)))
}

fn siblings_of(source: &Building, targets: &[Arc<Building>]) -> Vec<Sibling> {
	targets
		.iter()
		.map(|target| create_sibling_of(source, target.clone(), false))
		.collect()
}

fn ids(siblings: &[Sibling]) -> Vec<u32> {
	siblings.iter().map(|s| s.building.id.0).collect()
}

/// Only lets a building connect to buildings placed from the same asset.
struct SameAssetOnly;

impl ConnectionFilter for SameAssetOnly {
	fn on_connect(&self, connections: &mut PotentialConnections<'_>) -> Result<(), ChainError> {
		let asset = connections.subject().asset_id;
		connections.cancel_where(|sibling| sibling.building.asset_id != asset);
		Ok(())
	}
}

/// Forces a connection to a fixed remote building.
struct RemoteLink {
	target: Arc<Building>,
}

impl ConnectionFilter for RemoteLink {
	fn on_connect(&self, connections: &mut PotentialConnections<'_>) -> Result<(), ChainError> {
		let sibling = create_sibling_of(connections.subject(), self.target.clone(), true);
		connections.try_add(sibling)?;
		Ok(())
	}

	fn name(&self) -> &str {
		"remote-link"
	}
}

#[derive(Default)]
struct Counters {
	relevant: AtomicUsize,
	connect: AtomicUsize,
}

/// Counts how often it is consulted and run.
struct Counting(Arc<Counters>);

impl ConnectionFilter for Counting {
	fn is_relevant(&self, _source: &Building) -> bool {
		self.0.relevant.fetch_add(1, Ordering::Relaxed);
		true
	}

	fn on_connect(&self, _connections: &mut PotentialConnections<'_>) -> Result<(), ChainError> {
		self.0.connect.fetch_add(1, Ordering::Relaxed);
		Ok(())
	}
}

#[test]
fn ghost_buildings_are_not_filtered() {
	init_tracing();
	let controller = ConnectionController::new(PhaseCell::new());
	let counting = Arc::new(Counters::default());
	controller.register_connection_filter(Counting(counting.clone()), 0).unwrap();

	let ghost = Building::new(BuildingId(1), WAREHOUSE, "ghost").ghost();
	let mut siblings = siblings_of(&ghost, &[building(2, MINE, 1.0, 1.0)]);

	let outcome = controller.invalidate_siblings(&ghost, &mut siblings).unwrap();

	assert_eq!(outcome, DispatchOutcome::Bypassed);
	assert_eq!(counting.relevant.load(Ordering::Relaxed), 0);
	assert_eq!(counting.connect.load(Ordering::Relaxed), 0);
	assert_eq!(ids(&siblings), [2]);
}

#[test]
fn built_buildings_run_every_filter_once() {
	init_tracing();
	let controller = ConnectionController::new(PhaseCell::new());
	let counting = Arc::new(Counters::default());
	controller.register_connection_filter(Counting(counting.clone()), 0).unwrap();

	let source = building(1, WAREHOUSE, 0.0, 0.0);
	let mut siblings = siblings_of(&source, &[building(2, MINE, 1.0, 1.0)]);
	controller.invalidate_siblings(&source, &mut siblings).unwrap();

	assert_eq!(counting.relevant.load(Ordering::Relaxed), 1);
	assert_eq!(counting.connect.load(Ordering::Relaxed), 1);
}

#[test]
fn ghost_buildings_filtered_when_configured() {
	let config = NetworkConfig::parse("[network]\nfilter_unbuilt = true").unwrap();
	let controller = ConnectionController::with_config(PhaseCell::new(), &config);
	controller.register_connection_filter(SameAssetOnly, 0).unwrap();

	let ghost = Building::new(BuildingId(1), WAREHOUSE, "ghost").ghost();
	let mut siblings = siblings_of(&ghost, &[building(2, MINE, 1.0, 1.0), building(3, WAREHOUSE, 2.0, 2.0)]);
	controller.invalidate_siblings(&ghost, &mut siblings).unwrap();

	assert_eq!(ids(&siblings), [3]);
}

#[test]
fn asset_filters_only_run_for_their_asset() {
	init_tracing();
	let controller = ConnectionController::new(PhaseCell::new());
	controller.register_asset_filter(MINE, SameAssetOnly, 0).unwrap();

	let neighbours = [building(2, MINE, 1.0, 0.0), building(3, FACTORY, 2.0, 0.0)];

	let warehouse = building(1, WAREHOUSE, 0.0, 0.0);
	let mut siblings = siblings_of(&warehouse, &neighbours);
	let outcome = controller.invalidate_siblings(&warehouse, &mut siblings).unwrap();
	assert_eq!(outcome, DispatchOutcome::Bypassed);
	assert_eq!(ids(&siblings), [2, 3]);

	let mine = building(4, MINE, 0.0, 0.0);
	let mut siblings = siblings_of(&mine, &neighbours);
	controller.invalidate_siblings(&mine, &mut siblings).unwrap();
	assert_eq!(ids(&siblings), [2]);
}

#[test]
fn higher_priority_filter_has_the_last_word() {
	init_tracing();
	let controller = ConnectionController::new(PhaseCell::new());
	let remote = building(99, FACTORY, 500.0, 500.0);

	controller.register_connection_filter(RemoteLink { target: remote }, 10).unwrap();
	controller.register_connection_filter(SameAssetOnly, 0).unwrap();

	let source = building(1, WAREHOUSE, 0.0, 0.0);
	let mut siblings = siblings_of(&source, &[building(2, WAREHOUSE, 3.0, 4.0), building(3, MINE, 1.0, 0.0)]);
	let outcome = controller.invalidate_siblings(&source, &mut siblings).unwrap();

	assert_eq!(ids(&siblings), [2, 99]);
	assert_eq!(siblings[0].distance, 5.0);
	assert_eq!(siblings[1].distance, 0.0);
	let stats = outcome.stats().unwrap();
	assert_eq!((stats.ran, stats.cancelled, stats.added), (2, 1, 1));
}

#[test]
fn linking_an_already_detected_building_fails_the_dispatch() {
	let controller = ConnectionController::new(PhaseCell::new());
	let neighbour = building(2, MINE, 1.0, 0.0);
	controller
		.register_connection_filter(RemoteLink { target: neighbour.clone() }, 0)
		.unwrap();

	let source = building(1, WAREHOUSE, 0.0, 0.0);
	let mut siblings = siblings_of(&source, &[neighbour]);
	let before = siblings.clone();

	let err = controller.invalidate_siblings(&source, &mut siblings).unwrap_err();
	assert!(matches!(err.root(), ChainError::DuplicateCandidate { .. }));
	assert!(err.to_string().starts_with("filter `remote-link` failed"));
	assert_eq!(siblings, before);
}

#[test]
fn closure_filters_share_the_registry() {
	let controller = ConnectionController::new(PhaseCell::new());
	controller
		.filters()
		.filter("max-distance")
		.priority(5)
		.register(|connections| {
			connections.cancel_where(|sibling| sibling.distance > 10.0);
			Ok(())
		})
		.unwrap();

	let source = building(1, WAREHOUSE, 0.0, 0.0);
	let mut siblings = siblings_of(&source, &[building(2, MINE, 6.0, 8.0), building(3, MINE, 60.0, 80.0)]);
	controller.invalidate_siblings(&source, &mut siblings).unwrap();

	assert_eq!(ids(&siblings), [2]);
}

#[rstest]
#[case(Phase::Initialize, true)]
#[case(Phase::ModsInitialized, true)]
#[case(Phase::GameStarting, true)]
#[case(Phase::GameStarted, false)]
#[case(Phase::Deinitialize, false)]
fn registration_window(#[case] phase: Phase, #[case] accepted: bool) {
	let controller = ConnectionController::new(PhaseCell::starting_at(phase));
	let result = controller.register_connection_filter(SameAssetOnly, 0);

	assert_eq!(result.is_ok(), accepted);
	if let Err(err) = result {
		assert!(matches!(err, ChainError::InvalidRegistrationState { phase: p, .. } if p == phase));
	}
}

#[test]
fn host_lifecycle_closes_registration() {
	let host = PhaseCell::new();
	let controller = ConnectionController::new(host.clone());

	host.advance(Phase::ModsInitialized);
	controller.register_asset_filter(MINE, SameAssetOnly, 0).unwrap();

	host.advance(Phase::GameStarted);
	assert!(controller.register_asset_filter(MINE, SameAssetOnly, 1).is_err());
	assert_eq!(controller.filters().len(), 1);
}
