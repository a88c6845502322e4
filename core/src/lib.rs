pub mod action;
pub mod cell_id;
pub mod codec;
pub mod color;
pub mod export;
pub mod inline;
pub mod layout;
pub mod reconcile;
pub mod state;
pub mod tile;

pub use action::BoardAction;
pub use cell_id::{CellId, CellIdError};
pub use codec::{decode_document, encode_document, encode_document_pretty, DocumentError, SAVE_FILE_NAME};
pub use export::{render_board_svg, render_page_svg, PageFit};
pub use inline::{inline_images, is_data_uri, InlineFailure, InlineReport};
pub use layout::{board_extent, hex_center, HexMetrics, LayoutSize, ALL_LAYOUT_SIZES};
pub use reconcile::{apply_action, plan_delete, plan_layout_change, reconcile, DeletePlan, LayoutPlan};
pub use state::{BoardState, Grid, GridCell};
pub use tile::{Library, Tile};
