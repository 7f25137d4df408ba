//! Fixtures shared by the unit tests.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::candidate::{Candidate, Subject};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Item {
	pub id: u32,
	pub label: &'static str,
}

pub(crate) const fn item(id: u32, label: &'static str) -> Item {
	Item { id, label }
}

impl Candidate for Item {
	type Id = u32;

	fn id(&self) -> u32 {
		self.id
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Site(pub &'static str);

impl Subject for Site {
	type Key = &'static str;

	fn key(&self) -> &'static str {
		self.0
	}
}

/// Shared log filters append their names to, to observe run order.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunLog(Arc<Mutex<Vec<&'static str>>>);

impl RunLog {
	pub fn push(&self, name: &'static str) {
		self.0.lock().push(name);
	}

	pub fn entries(&self) -> Vec<&'static str> {
		self.0.lock().clone()
	}
}

pub(crate) fn labels(items: &[Item]) -> Vec<&'static str> {
	items.iter().map(|item| item.label).collect()
}
