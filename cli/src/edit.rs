use std::path::PathBuf;

use clap::Subcommand;
use hexflower_core::{
    apply_action, is_data_uri, plan_delete, plan_layout_change, BoardAction, BoardState, CellId,
    DeletePlan, LayoutPlan, LayoutSize, Tile,
};
use hexflower_image::inline_bytes;

#[derive(Subcommand, Debug)]
pub(crate) enum EditCommand {
    /// Append a tile to the library.
    AddTile {
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        color: Option<String>,
        /// Image file or data URI.
        #[arg(long)]
        image: Option<String>,
    },
    /// Copy a library tile onto a cell.
    Place { tile_id: String, cell: CellId },
    /// Move a placed tile; swaps when the target is occupied.
    Move { from: CellId, to: CellId },
    /// Clear one cell.
    Trash { cell: CellId },
    /// Remove a tile from the library.
    DeleteTile {
        id: String,
        /// Also clear the cells holding copies of it.
        #[arg(long)]
        yes: bool,
    },
    /// Switch the layout, emptying the board.
    SetLayout {
        size: LayoutSize,
        #[arg(long)]
        yes: bool,
    },
    /// Empty every cell, keeping the library.
    Clear,
}

#[derive(Debug)]
pub(crate) enum EditOutcome {
    Changed(BoardState),
    Unchanged(String),
}

pub(crate) fn run(state: &BoardState, command: EditCommand) -> Result<EditOutcome, Box<dyn std::error::Error>> {
    let action = match command {
        EditCommand::AddTile { text, color, image } => {
            let image = match image {
                Some(raw) if is_data_uri(&raw) => Some(raw),
                Some(raw) => {
                    let path = PathBuf::from(&raw);
                    let bytes = std::fs::read(&path)
                        .map_err(|err| format!("failed to read image {}: {err}", path.display()))?;
                    Some(inline_bytes(&bytes, None))
                }
                None => None,
            };
            let tile = Tile {
                id: state.tiles.next_tile_id(),
                text: text.filter(|value| !value.trim().is_empty()),
                image,
                color,
            };
            if tile.is_blank() {
                return Err("a tile needs text, a color or an image".into());
            }
            BoardAction::CreateTile { tile }
        }
        EditCommand::Place { tile_id, cell } => {
            let Some(tile) = state.tiles.get(&tile_id).cloned() else {
                return Ok(EditOutcome::Unchanged(format!("no tile '{tile_id}' in the library")));
            };
            BoardAction::Drop {
                source: None,
                target: cell,
                tile,
            }
        }
        EditCommand::Move { from, to } => {
            let Some(tile) = state.hexes.tile_at(from).cloned() else {
                return Ok(EditOutcome::Unchanged(format!("cell {from} is empty")));
            };
            BoardAction::Drop {
                source: Some(from),
                target: to,
                tile,
            }
        }
        EditCommand::Trash { cell } => BoardAction::Trash { source: cell },
        EditCommand::DeleteTile { id, yes } => match plan_delete(state, &id) {
            DeletePlan::UnknownTile => {
                return Ok(EditOutcome::Unchanged(format!("no tile '{id}' in the library")));
            }
            DeletePlan::NeedsConfirmation { cells } if !yes => {
                return Ok(EditOutcome::Unchanged(format!(
                    "'{id}' is placed on {} cell(s); pass --yes to delete every instance",
                    cells.len()
                )));
            }
            _ => BoardAction::DeleteTile { id },
        },
        EditCommand::SetLayout { size, yes } => match plan_layout_change(state, size) {
            LayoutPlan::Unchanged => {
                return Ok(EditOutcome::Unchanged(format!("layout is already {size}")));
            }
            LayoutPlan::NeedsConfirmation if !yes => {
                return Ok(EditOutcome::Unchanged(
                    "changing the layout clears every placed tile; pass --yes to continue".to_string(),
                ));
            }
            _ => BoardAction::ChangeLayout { size },
        },
        EditCommand::Clear => BoardAction::ClearBoard,
    };

    let mut next = state.clone();
    if apply_action(&mut next, &action) {
        log::debug!("applied {}", action.name());
        Ok(EditOutcome::Changed(next))
    } else {
        Ok(EditOutcome::Unchanged(format!("{} did not apply", action.name())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changed(outcome: EditOutcome) -> BoardState {
        match outcome {
            EditOutcome::Changed(state) => state,
            EditOutcome::Unchanged(reason) => panic!("expected a change, got: {reason}"),
        }
    }

    fn board_with_placed_tile() -> BoardState {
        let state = BoardState::new();
        let state = changed(
            run(
                &state,
                EditCommand::AddTile {
                    text: Some("meadow".into()),
                    color: Some("#66cc66".into()),
                    image: None,
                },
            )
            .unwrap(),
        );
        changed(
            run(
                &state,
                EditCommand::Place {
                    tile_id: "tile-1".into(),
                    cell: CellId::new(0, 0),
                },
            )
            .unwrap(),
        )
    }

    #[test]
    fn delete_of_placed_tile_needs_yes() {
        let state = board_with_placed_tile();
        let outcome = run(
            &state,
            EditCommand::DeleteTile {
                id: "tile-1".into(),
                yes: false,
            },
        )
        .unwrap();
        assert!(matches!(outcome, EditOutcome::Unchanged(_)));

        let next = changed(
            run(
                &state,
                EditCommand::DeleteTile {
                    id: "tile-1".into(),
                    yes: true,
                },
            )
            .unwrap(),
        );
        assert!(next.tiles.is_empty());
        assert!(!next.has_any_tile());
    }

    #[test]
    fn layout_switch_needs_yes_when_occupied() {
        let state = board_with_placed_tile();
        let outcome = run(
            &state,
            EditCommand::SetLayout {
                size: LayoutSize::Small,
                yes: false,
            },
        )
        .unwrap();
        assert!(matches!(outcome, EditOutcome::Unchanged(_)));
        let next = changed(
            run(
                &state,
                EditCommand::SetLayout {
                    size: LayoutSize::Small,
                    yes: true,
                },
            )
            .unwrap(),
        );
        assert_eq!(next.layout_size, LayoutSize::Small);
        assert!(!next.has_any_tile());
    }

    #[test]
    fn blank_tile_is_rejected() {
        let result = run(
            &BoardState::new(),
            EditCommand::AddTile {
                text: Some("   ".into()),
                color: None,
                image: None,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn move_from_empty_cell_reports_reason() {
        let outcome = run(
            &BoardState::new(),
            EditCommand::Move {
                from: CellId::new(0, 0),
                to: CellId::new(1, 0),
            },
        )
        .unwrap();
        assert!(matches!(outcome, EditOutcome::Unchanged(reason) if reason.contains("0-0")));
    }
}
