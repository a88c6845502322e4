use crate::cell_id::CellId;
use crate::layout::LayoutSize;
use crate::state::BoardState;
use crate::tile::Tile;

#[derive(Clone, Debug)]
pub enum BoardAction {
    CreateTile {
        tile: Tile,
    },
    /// `source: None` means the drag started in the library.
    Drop {
        source: Option<CellId>,
        target: CellId,
        tile: Tile,
    },
    Trash {
        source: CellId,
    },
    /// Removes the library entry and clears every grid copy of it.
    DeleteTile {
        id: String,
    },
    ChangeLayout {
        size: LayoutSize,
    },
    ClearBoard,
    Load {
        state: Box<BoardState>,
    },
}

impl BoardAction {
    pub fn name(&self) -> &'static str {
        match self {
            BoardAction::CreateTile { .. } => "create_tile",
            BoardAction::Drop { source: None, .. } => "drop_from_library",
            BoardAction::Drop { source: Some(_), .. } => "drop_from_grid",
            BoardAction::Trash { .. } => "trash",
            BoardAction::DeleteTile { .. } => "delete_tile",
            BoardAction::ChangeLayout { .. } => "change_layout",
            BoardAction::ClearBoard => "clear_board",
            BoardAction::Load { .. } => "load",
        }
    }
}
