use crate::action::BoardAction;
use crate::cell_id::CellId;
use crate::layout::LayoutSize;
use crate::state::{BoardState, Grid};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletePlan {
    /// No grid copies; the library entry can go right away.
    Immediate,
    /// These cells hold copies and will be cleared too.
    NeedsConfirmation { cells: Vec<CellId> },
    UnknownTile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutPlan {
    Unchanged,
    Immediate,
    NeedsConfirmation,
}

pub fn plan_delete(state: &BoardState, tile_id: &str) -> DeletePlan {
    if !state.tiles.contains(tile_id) {
        return DeletePlan::UnknownTile;
    }
    let cells = state.grid_references(tile_id);
    if cells.is_empty() {
        DeletePlan::Immediate
    } else {
        DeletePlan::NeedsConfirmation { cells }
    }
}

pub fn plan_layout_change(state: &BoardState, size: LayoutSize) -> LayoutPlan {
    if state.layout_size == size {
        LayoutPlan::Unchanged
    } else if state.has_any_tile() {
        LayoutPlan::NeedsConfirmation
    } else {
        LayoutPlan::Immediate
    }
}

/// Pure form of [`apply_action`]: returns the next state, leaving `state` intact.
pub fn reconcile(state: &BoardState, action: &BoardAction) -> BoardState {
    let mut next = state.clone();
    apply_action(&mut next, action);
    next
}

/// Applies `action` in place. Returns `false` (and leaves `state` untouched)
/// when the action does not apply, e.g. a stale drag payload.
pub fn apply_action(state: &mut BoardState, action: &BoardAction) -> bool {
    match action {
        BoardAction::CreateTile { tile } => state.tiles.push(tile.clone()),
        BoardAction::Drop {
            source: None,
            target,
            tile,
        } => {
            if !state.hexes.contains(*target) {
                return false;
            }
            let Some(library_tile) = state.tiles.get(&tile.id).cloned() else {
                return false;
            };
            state.hexes.set_tile(*target, Some(library_tile)).is_some()
        }
        BoardAction::Drop {
            source: Some(source),
            target,
            ..
        } => move_or_swap(&mut state.hexes, *source, *target),
        BoardAction::Trash { source } => match state.hexes.set_tile(*source, None) {
            Some(previous) => previous.is_some(),
            None => false,
        },
        BoardAction::DeleteTile { id } => {
            if state.tiles.remove(id).is_none() {
                return false;
            }
            for cell in state.hexes.cells_with_tile(id) {
                state.hexes.set_tile(cell, None);
            }
            true
        }
        BoardAction::ChangeLayout { size } => {
            state.layout_size = *size;
            state.hexes = Grid::for_layout(*size);
            true
        }
        BoardAction::ClearBoard => {
            if !state.hexes.has_any_tile() {
                return false;
            }
            state.hexes.clear();
            true
        }
        BoardAction::Load { state: next } => {
            *state = (**next).clone();
            true
        }
    }
}

fn move_or_swap(grid: &mut Grid, source: CellId, target: CellId) -> bool {
    if source == target {
        return false;
    }
    if !grid.contains(source) || !grid.contains(target) {
        return false;
    }
    let Some(source_tile) = grid.tile_at(source).cloned() else {
        return false;
    };
    let target_tile = grid.tile_at(target).cloned();
    grid.set_tile(target, Some(source_tile));
    grid.set_tile(source, target_tile);
    true
}
