//! Activity location registry.

use std::collections::HashMap;

use nz_core::{Coord, LocationId};

/// Read-only `LocationId → Coord` lookup for activity locations.
///
/// Filled by the application from its facility or population data before
/// the pipeline starts.
#[derive(Clone, Debug, Default)]
pub struct LocationRegistry {
    coords: HashMap<LocationId, Coord>,
}

impl LocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or move) a location.
    pub fn insert(&mut self, id: LocationId, coord: Coord) {
        self.coords.insert(id, coord);
    }

    pub fn get(&self, id: LocationId) -> Option<Coord> {
        self.coords.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

impl FromIterator<(LocationId, Coord)> for LocationRegistry {
    fn from_iter<I: IntoIterator<Item = (LocationId, Coord)>>(iter: I) -> Self {
        Self { coords: iter.into_iter().collect() }
    }
}
