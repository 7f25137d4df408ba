use std::sync::Arc;

use vtol_filter_chain::Candidate;

use crate::building::{Building, BuildingId};

/// A potential connection from the building being updated to `building`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sibling {
	pub building: Arc<Building>,
	pub distance: f32,
}

impl Candidate for Sibling {
	type Id = BuildingId;

	fn id(&self) -> BuildingId {
		self.building.id
	}
}

/// Builds a connection from `source` to `target`.
///
/// The distance is measured on the ground plane, or left at 0 when
/// `ignore_distance` is set.
pub fn create_sibling_of(source: &Building, target: Arc<Building>, ignore_distance: bool) -> Sibling {
	let distance = if ignore_distance {
		0.0
	} else {
		source.position.xz_distance(target.position)
	};
	Sibling {
		building: target,
		distance,
	}
}
