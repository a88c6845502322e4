use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cell_id::CellId;
use crate::layout::LayoutSize;
use crate::state::{BoardState, Grid};
use crate::tile::{Library, Tile};

pub const SAVE_FILE_NAME: &str = "hex-flower-state.json";
pub const SAVE_MIME: &str = "application/json";

const KEY_TILES: &str = "tiles";
const KEY_HEXES: &str = "hexes";
const KEY_LAYOUT: &str = "layoutSize";
const KEY_TILE: &str = "tile";

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid saved state format: document must be an object")]
    NotAnObject,
    #[error("invalid saved state format: `tiles` must be a list")]
    TilesNotList,
    #[error("invalid saved state format: `hexes` must be an object")]
    HexesNotObject,
    #[error("invalid tile at index {index}: {source}")]
    Tile {
        index: usize,
        source: serde_json::Error,
    },
    #[error("invalid tile in cell {cell}: {source}")]
    CellTile {
        cell: String,
        source: serde_json::Error,
    },
    #[error("duplicate tile id '{0}'")]
    DuplicateTile(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SaveDocumentRef<'a> {
    tiles: &'a Library,
    hexes: &'a Grid,
    layout_size: LayoutSize,
}

impl<'a> SaveDocumentRef<'a> {
    fn new(state: &'a BoardState) -> Self {
        Self {
            tiles: &state.tiles,
            hexes: &state.hexes,
            layout_size: state.layout_size,
        }
    }
}

pub fn encode_document(state: &BoardState) -> Result<String, DocumentError> {
    Ok(serde_json::to_string(&SaveDocumentRef::new(state))?)
}

pub fn encode_document_pretty(state: &BoardState) -> Result<String, DocumentError> {
    Ok(serde_json::to_string_pretty(&SaveDocumentRef::new(state))?)
}

/// Parses a saved board. The result is a fresh state: nothing is merged with
/// whatever the caller currently holds.
pub fn decode_document(text: &str) -> Result<BoardState, DocumentError> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Object(root) = value else {
        return Err(DocumentError::NotAnObject);
    };
    let Some(Value::Array(raw_tiles)) = root.get(KEY_TILES) else {
        return Err(DocumentError::TilesNotList);
    };
    let Some(Value::Object(raw_hexes)) = root.get(KEY_HEXES) else {
        return Err(DocumentError::HexesNotObject);
    };
    let layout_size = root
        .get(KEY_LAYOUT)
        .and_then(Value::as_str)
        .and_then(LayoutSize::from_name)
        .unwrap_or_default();

    let mut tiles = Library::new();
    for (index, raw) in raw_tiles.iter().enumerate() {
        let tile = Tile::deserialize(raw)
            .map_err(|source| DocumentError::Tile { index, source })?;
        let id = tile.id.clone();
        if !tiles.push(tile) {
            return Err(DocumentError::DuplicateTile(id));
        }
    }

    let hexes = decode_hexes(raw_hexes, layout_size)?;
    Ok(BoardState {
        tiles,
        hexes,
        layout_size,
    })
}

fn decode_hexes(raw: &Map<String, Value>, layout_size: LayoutSize) -> Result<Grid, DocumentError> {
    let mut grid = Grid::for_layout(layout_size);
    for (key, entry) in raw {
        // Stray keys from older layouts are skipped rather than rejected.
        let Ok(cell) = CellId::parse(key) else {
            continue;
        };
        if !layout_size.contains(cell) {
            continue;
        }
        let tile = match entry {
            Value::Object(fields) => match fields.get(KEY_TILE) {
                None | Some(Value::Null) => None,
                Some(raw_tile) => Some(Tile::deserialize(raw_tile).map_err(|source| {
                    DocumentError::CellTile {
                        cell: key.clone(),
                        source,
                    }
                })?),
            },
            Value::Null => None,
            _ => return Err(DocumentError::HexesNotObject),
        };
        grid.set_tile(cell, tile);
    }
    Ok(grid)
}
