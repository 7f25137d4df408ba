use std::fmt;

use vtol_filter_chain::Subject;

/// Unique identifier of a placed building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BuildingId(pub u32);

impl fmt::Display for BuildingId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "building#{}", self.0)
	}
}

/// Identifier of the asset (building type) a building was placed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId(pub u32);

impl fmt::Display for AssetId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "asset#{}", self.0)
	}
}

/// World position in voxel units; `y` is up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
	pub x: f32,
	pub y: f32,
	pub z: f32,
}

impl Position {
	pub const fn new(x: f32, y: f32, z: f32) -> Self {
		Self { x, y, z }
	}

	/// Distance on the ground plane, ignoring height.
	pub fn xz_distance(self, other: Position) -> f32 {
		let dx = self.x - other.x;
		let dz = self.z - other.z;
		(dx * dx + dz * dz).sqrt()
	}
}

/// A storage network building.
#[derive(Debug, Clone, PartialEq)]
pub struct Building {
	pub id: BuildingId,
	pub asset_id: AssetId,
	pub name: String,
	pub position: Position,
	/// False while the building is still a placement preview ("ghost").
	pub is_built: bool,
}

impl Building {
	/// Creates a built building at the origin.
	pub fn new(id: BuildingId, asset_id: AssetId, name: impl Into<String>) -> Self {
		Self {
			id,
			asset_id,
			name: name.into(),
			position: Position::default(),
			is_built: true,
		}
	}

	pub fn at(mut self, position: Position) -> Self {
		self.position = position;
		self
	}

	/// Marks the building as a placement preview.
	pub fn ghost(mut self) -> Self {
		self.is_built = false;
		self
	}
}

impl Subject for Building {
	type Key = AssetId;

	fn key(&self) -> AssetId {
		self.asset_id
	}
}
