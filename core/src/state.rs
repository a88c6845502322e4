use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cell_id::CellId;
use crate::layout::LayoutSize;
use crate::tile::{Library, Tile};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridCell {
    #[serde(default)]
    pub tile: Option<Tile>,
}

impl GridCell {
    pub fn empty() -> Self {
        Self { tile: None }
    }

    pub fn holding(tile: Tile) -> Self {
        Self { tile: Some(tile) }
    }

    pub fn is_empty(&self) -> bool {
        self.tile.is_none()
    }
}

/// One cell per position of the active layout, keyed by [`CellId`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    cells: BTreeMap<CellId, GridCell>,
}

impl Grid {
    pub fn for_layout(size: LayoutSize) -> Self {
        let cells = size
            .cell_ids()
            .into_iter()
            .map(|id| (id, GridCell::empty()))
            .collect();
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn contains(&self, id: CellId) -> bool {
        self.cells.contains_key(&id)
    }

    pub fn cell(&self, id: CellId) -> Option<&GridCell> {
        self.cells.get(&id)
    }

    pub fn tile_at(&self, id: CellId) -> Option<&Tile> {
        self.cells.get(&id).and_then(|cell| cell.tile.as_ref())
    }

    /// Returns the previous occupant, or `None` when `id` is not a cell of this grid.
    pub fn set_tile(&mut self, id: CellId, tile: Option<Tile>) -> Option<Option<Tile>> {
        let cell = self.cells.get_mut(&id)?;
        Some(std::mem::replace(&mut cell.tile, tile))
    }

    pub fn take_tile(&mut self, id: CellId) -> Option<Tile> {
        self.cells.get_mut(&id).and_then(|cell| cell.tile.take())
    }

    pub fn has_any_tile(&self) -> bool {
        self.cells.values().any(|cell| cell.tile.is_some())
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.values().filter(|cell| cell.tile.is_some()).count()
    }

    /// Cells whose copy was made from library tile `tile_id`.
    pub fn cells_with_tile(&self, tile_id: &str) -> Vec<CellId> {
        self.cells
            .iter()
            .filter(|(_, cell)| cell.tile.as_ref().is_some_and(|tile| tile.id == tile_id))
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn clear(&mut self) {
        for cell in self.cells.values_mut() {
            cell.tile = None;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellId, &GridCell)> {
        self.cells.iter().map(|(id, cell)| (*id, cell))
    }

    pub fn tiles_mut(&mut self) -> impl Iterator<Item = &mut Tile> {
        self.cells.values_mut().filter_map(|cell| cell.tile.as_mut())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardState {
    pub tiles: Library,
    pub hexes: Grid,
    pub layout_size: LayoutSize,
}

impl BoardState {
    pub fn new() -> Self {
        Self::with_layout(LayoutSize::default())
    }

    pub fn with_layout(layout_size: LayoutSize) -> Self {
        Self {
            tiles: Library::new(),
            hexes: Grid::for_layout(layout_size),
            layout_size,
        }
    }

    pub fn has_any_tile(&self) -> bool {
        self.hexes.has_any_tile()
    }

    pub fn grid_references(&self, tile_id: &str) -> Vec<CellId> {
        self.hexes.cells_with_tile(tile_id)
    }
}

impl Default for BoardState {
    fn default() -> Self {
        Self::new()
    }
}
