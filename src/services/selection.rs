//! Tile selection for export and sharing.
//!
//! The selection is a set of ids; whatever order the user clicked in, the
//! picked tiles always come back in board order.

use std::collections::HashSet;

use uuid::Uuid;

use crate::model::Tile;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TileSelection {
    selected: HashSet<Uuid>,
}

impl TileSelection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_ids(ids: impl IntoIterator<Item = Uuid>) -> Self {
        Self { selected: ids.into_iter().collect() }
    }

    pub fn toggle(&mut self, id: Uuid) {
        if !self.selected.remove(&id) {
            self.selected.insert(id);
        }
    }

    /// Deselect everything when every tile is selected, otherwise select all.
    pub fn toggle_all(&mut self, tiles: &[Tile]) {
        if self.all_selected(tiles) {
            self.selected.clear();
        } else {
            self.selected = tiles.iter().map(|t| t.id).collect();
        }
    }

    #[must_use]
    pub fn all_selected(&self, tiles: &[Tile]) -> bool {
        !tiles.is_empty() && tiles.iter().all(|t| self.selected.contains(&t.id))
    }

    #[must_use]
    pub fn is_selected(&self, id: Uuid) -> bool {
        self.selected.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Selected tiles in board order. Ids not on the board are ignored.
    #[must_use]
    pub fn pick<'a>(&self, tiles: &'a [Tile]) -> Vec<&'a Tile> {
        tiles
            .iter()
            .filter(|t| self.selected.contains(&t.id))
            .collect()
    }
}

#[cfg(test)]
#[path = "selection_test.rs"]
mod tests;
