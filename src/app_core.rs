use std::cell::RefCell;
use std::fmt::Display;
use std::future::Future;
use std::rc::Rc;

use hexflower_core::{
    apply_action, decode_document, encode_document, inline_images, plan_delete,
    plan_layout_change, BoardAction, BoardState, CellId, DeletePlan, DocumentError, InlineReport,
    LayoutPlan, LayoutSize, Tile,
};
use serde::{Deserialize, Serialize};

pub(crate) type AppSubscriber = Rc<dyn Fn()>;

pub(crate) const TOAST_DURATION_MS: u32 = 3000;
pub(crate) const DRAG_DATA_KEY: &str = "application/json";

/// What travels on the drag data transfer. `source_hex_id` is absent for
/// drags that start in the library.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DragPayload {
    pub(crate) tile: Tile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) source_hex_id: Option<CellId>,
}

impl DragPayload {
    pub(crate) fn from_library(tile: Tile) -> Self {
        Self {
            tile,
            source_hex_id: None,
        }
    }

    pub(crate) fn from_cell(tile: Tile, cell: CellId) -> Self {
        Self {
            tile,
            source_hex_id: Some(cell),
        }
    }

    pub(crate) fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Foreign drags (files, text from other pages) yield `None`.
    pub(crate) fn from_json(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Confirmation {
    DeleteTile { id: String, cells: usize },
    ChangeLayout { size: LayoutSize },
}

impl Confirmation {
    pub(crate) fn message(&self) -> String {
        match self {
            Confirmation::DeleteTile { cells, .. } => format!(
                "This tile is placed on {cells} hex(es). Delete it and every instance on the board?"
            ),
            Confirmation::ChangeLayout { size } => format!(
                "Switching to the {} layout clears every placed tile. Continue?",
                size.label()
            ),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ToastKind {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Toast {
    pub(crate) id: u64,
    pub(crate) message: String,
    pub(crate) kind: ToastKind,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct AppSnapshot {
    pub(crate) board: BoardState,
    pub(crate) confirmation: Option<Confirmation>,
    pub(crate) toast: Option<Toast>,
    pub(crate) saving: bool,
}

struct AppState {
    board: BoardState,
    confirmation: Option<Confirmation>,
    toast: Option<Toast>,
    next_toast_id: u64,
    saving: bool,
}

impl AppState {
    fn new(board: BoardState) -> Self {
        Self {
            board,
            confirmation: None,
            toast: None,
            next_toast_id: 1,
            saving: false,
        }
    }

    fn push_toast(&mut self, message: String, kind: ToastKind) -> u64 {
        let id = self.next_toast_id;
        self.next_toast_id += 1;
        self.toast = Some(Toast { id, message, kind });
        id
    }
}

pub(crate) struct AppCore {
    state: RefCell<AppState>,
    subscribers: Rc<RefCell<Vec<AppSubscriber>>>,
}

impl AppCore {
    pub(crate) fn new() -> Rc<Self> {
        Self::with_board(BoardState::new())
    }

    pub(crate) fn with_board(board: BoardState) -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(AppState::new(board)),
            subscribers: Rc::new(RefCell::new(Vec::new())),
        })
    }

    pub(crate) fn subscribe(&self, subscriber: AppSubscriber) -> AppSubscription {
        self.subscribers.borrow_mut().push(subscriber.clone());
        AppSubscription {
            subscriber,
            subscribers: Rc::clone(&self.subscribers),
        }
    }

    fn notify(&self) {
        let subscribers = self.subscribers.borrow().clone();
        for subscriber in subscribers {
            (subscriber)();
        }
    }

    pub(crate) fn snapshot(&self) -> AppSnapshot {
        let state = self.state.borrow();
        AppSnapshot {
            board: state.board.clone(),
            confirmation: state.confirmation.clone(),
            toast: state.toast.clone(),
            saving: state.saving,
        }
    }

    pub(crate) fn board(&self) -> BoardState {
        self.state.borrow().board.clone()
    }

    fn dispatch(&self, action: BoardAction) -> bool {
        let changed = {
            let mut state = self.state.borrow_mut();
            apply_action(&mut state.board, &action)
        };
        if changed {
            self.notify();
        }
        changed
    }

    /// Adds a tile built from the creator form. Returns the new id, or `None`
    /// when the form had nothing to show.
    pub(crate) fn create_tile(
        &self,
        text: Option<String>,
        color: Option<String>,
        image: Option<String>,
    ) -> Option<String> {
        let id = self.state.borrow().board.tiles.next_tile_id();
        let tile = Tile {
            id: id.clone(),
            text: text.filter(|value| !value.trim().is_empty()),
            image: image.filter(|value| !value.is_empty()),
            color: color.filter(|value| !value.is_empty()),
        };
        if tile.is_blank() {
            return None;
        }
        self.dispatch(BoardAction::CreateTile { tile }).then_some(id)
    }

    pub(crate) fn drop_tile(&self, payload: &DragPayload, target: CellId) -> bool {
        self.dispatch(BoardAction::Drop {
            source: payload.source_hex_id,
            target,
            tile: payload.tile.clone(),
        })
    }

    /// Only tiles dragged off the board can be trashed; library drags are ignored.
    pub(crate) fn trash(&self, payload: &DragPayload) -> bool {
        match payload.source_hex_id {
            Some(source) => self.dispatch(BoardAction::Trash { source }),
            None => false,
        }
    }

    pub(crate) fn request_delete_tile(&self, id: &str) {
        let plan = plan_delete(&self.state.borrow().board, id);
        match plan {
            DeletePlan::UnknownTile => {}
            DeletePlan::Immediate => {
                self.dispatch(BoardAction::DeleteTile { id: id.to_string() });
            }
            DeletePlan::NeedsConfirmation { cells } => {
                self.state.borrow_mut().confirmation = Some(Confirmation::DeleteTile {
                    id: id.to_string(),
                    cells: cells.len(),
                });
                self.notify();
            }
        }
    }

    pub(crate) fn request_layout_change(&self, size: LayoutSize) {
        let plan = plan_layout_change(&self.state.borrow().board, size);
        match plan {
            LayoutPlan::Unchanged => {}
            LayoutPlan::Immediate => {
                self.dispatch(BoardAction::ChangeLayout { size });
            }
            LayoutPlan::NeedsConfirmation => {
                self.state.borrow_mut().confirmation = Some(Confirmation::ChangeLayout { size });
                self.notify();
            }
        }
    }

    pub(crate) fn confirm(&self) {
        let Some(confirmation) = self.state.borrow_mut().confirmation.take() else {
            return;
        };
        let action = match confirmation {
            Confirmation::DeleteTile { id, .. } => BoardAction::DeleteTile { id },
            Confirmation::ChangeLayout { size } => BoardAction::ChangeLayout { size },
        };
        if !self.dispatch(action) {
            self.notify();
        }
    }

    pub(crate) fn cancel(&self) {
        if self.state.borrow_mut().confirmation.take().is_some() {
            self.notify();
        }
    }

    pub(crate) fn clear_board(&self) -> bool {
        self.dispatch(BoardAction::ClearBoard)
    }

    /// Replaces the whole board with a saved document. A bad document leaves
    /// the current board untouched and raises an error toast.
    pub(crate) fn load_document(&self, text: &str) -> Result<(), DocumentError> {
        match decode_document(text) {
            Ok(board) => {
                {
                    let mut state = self.state.borrow_mut();
                    apply_action(
                        &mut state.board,
                        &BoardAction::Load {
                            state: Box::new(board),
                        },
                    );
                    state.confirmation = None;
                    state.push_toast("Board loaded".to_string(), ToastKind::Info);
                }
                self.notify();
                Ok(())
            }
            Err(err) => {
                self.show_toast(format!("Could not load board: {err}"), ToastKind::Error);
                Err(err)
            }
        }
    }

    /// Inlines every external image through `fetch` and encodes the result.
    /// The live board is not modified.
    pub(crate) async fn save_document<F, Fut, E>(&self, fetch: F) -> Result<String, DocumentError>
    where
        F: FnMut(String) -> Fut,
        Fut: Future<Output = Result<String, E>>,
        E: Display,
    {
        let board = self.board();
        self.set_saving(true);
        let (inlined, report) = inline_images(&board, fetch).await;
        self.set_saving(false);
        self.finish_save(&inlined, &report)
    }

    fn finish_save(&self, board: &BoardState, report: &InlineReport) -> Result<String, DocumentError> {
        let encoded = encode_document(board);
        match (&encoded, report.failures.len()) {
            (Err(err), _) => self.show_toast(format!("Save failed: {err}"), ToastKind::Error),
            (Ok(_), 0) => self.show_toast("Board saved".to_string(), ToastKind::Info),
            (Ok(_), failed) => self.show_toast(
                format!("Board saved; {failed} image(s) could not be embedded"),
                ToastKind::Error,
            ),
        };
        encoded
    }

    fn set_saving(&self, saving: bool) {
        self.state.borrow_mut().saving = saving;
        self.notify();
    }

    pub(crate) fn show_toast(&self, message: String, kind: ToastKind) -> u64 {
        let id = self.state.borrow_mut().push_toast(message, kind);
        self.notify();
        id
    }

    /// Ignores ids of toasts that were already replaced.
    pub(crate) fn dismiss_toast(&self, id: u64) {
        let dismissed = {
            let mut state = self.state.borrow_mut();
            if state.toast.as_ref().is_some_and(|toast| toast.id == id) {
                state.toast = None;
                true
            } else {
                false
            }
        };
        if dismissed {
            self.notify();
        }
    }
}

pub(crate) struct AppSubscription {
    subscriber: AppSubscriber,
    subscribers: Rc<RefCell<Vec<AppSubscriber>>>,
}

impl Drop for AppSubscription {
    fn drop(&mut self) {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|item| !Rc::ptr_eq(item, &self.subscriber));
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use hexflower_core::{InlineFailure, SAVE_FILE_NAME};

    fn core_with_placed_tile() -> Rc<AppCore> {
        let core = AppCore::new();
        let id = core
            .create_tile(Some("Forest".into()), Some("#4caf50".into()), None)
            .expect("tile");
        let tile = core.board().tiles.get(&id).cloned().expect("library tile");
        assert!(core.drop_tile(&DragPayload::from_library(tile), CellId::new(0, 0)));
        core
    }

    #[test]
    fn drag_payload_uses_source_hex_id_key() {
        let payload = DragPayload::from_cell(Tile::color("tile-1", "#fff"), CellId::new(2, 1));
        let json = payload.to_json();
        assert!(json.contains(r#""sourceHexId":"2-1""#));
        assert_eq!(DragPayload::from_json(&json), Some(payload));

        let library = DragPayload::from_library(Tile::color("tile-1", "#fff"));
        assert!(!library.to_json().contains("sourceHexId"));
        assert_eq!(DragPayload::from_json("plain text"), None);
    }

    #[test]
    fn blank_tile_is_not_created() {
        let core = AppCore::new();
        assert_eq!(core.create_tile(Some("  ".into()), None, None), None);
        assert!(core.board().tiles.is_empty());
    }

    #[test]
    fn delete_waits_for_confirmation() {
        let core = core_with_placed_tile();
        core.request_delete_tile("tile-1");
        let snapshot = core.snapshot();
        assert_eq!(
            snapshot.confirmation,
            Some(Confirmation::DeleteTile {
                id: "tile-1".into(),
                cells: 1
            })
        );
        assert_eq!(snapshot.board.tiles.len(), 1);

        core.confirm();
        let snapshot = core.snapshot();
        assert_eq!(snapshot.confirmation, None);
        assert!(snapshot.board.tiles.is_empty());
        assert!(!snapshot.board.has_any_tile());
    }

    #[test]
    fn cancelled_layout_change_keeps_board() {
        let core = core_with_placed_tile();
        let before = core.board();
        core.request_layout_change(LayoutSize::Large);
        assert!(core.snapshot().confirmation.is_some());
        core.cancel();
        assert_eq!(core.snapshot().confirmation, None);
        assert_eq!(core.board(), before);
    }

    #[test]
    fn layout_request_after_cancel_asks_again() {
        let core = core_with_placed_tile();
        core.request_layout_change(LayoutSize::Small);
        core.cancel();
        assert_eq!(core.snapshot().board.layout_size, LayoutSize::Medium);
        core.request_layout_change(LayoutSize::Small);
        assert_eq!(
            core.snapshot().confirmation,
            Some(Confirmation::ChangeLayout {
                size: LayoutSize::Small
            })
        );
        core.confirm();
        assert_eq!(core.snapshot().board.layout_size, LayoutSize::Small);
    }

    #[test]
    fn cancel_without_pending_confirmation_is_silent() {
        let core = AppCore::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let _subscription = core.subscribe(Rc::new(move || counter.set(counter.get() + 1)));
        core.cancel();
        assert_eq!(hits.get(), 0);
        core.request_delete_tile("missing");
        core.cancel();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn layout_change_on_empty_board_is_immediate() {
        let core = AppCore::new();
        core.request_layout_change(LayoutSize::Small);
        let snapshot = core.snapshot();
        assert_eq!(snapshot.confirmation, None);
        assert_eq!(snapshot.board.layout_size, LayoutSize::Small);
        assert_eq!(snapshot.board.hexes.len(), 7);
    }

    #[test]
    fn trash_ignores_library_drags() {
        let core = core_with_placed_tile();
        let tile = core.board().tiles.get("tile-1").cloned().expect("tile");
        assert!(!core.trash(&DragPayload::from_library(tile.clone())));
        assert!(core.trash(&DragPayload::from_cell(tile, CellId::new(0, 0))));
        let board = core.board();
        assert!(!board.has_any_tile());
        assert_eq!(board.tiles.len(), 1);
    }

    #[test]
    fn bad_document_keeps_board_and_toasts() {
        let core = core_with_placed_tile();
        let before = core.board();
        assert!(core.load_document(r#"{"tiles": 3}"#).is_err());
        assert_eq!(core.board(), before);
        let toast = core.snapshot().toast.expect("toast");
        assert_eq!(toast.kind, ToastKind::Error);
    }

    #[test]
    fn saved_board_loads_back() {
        let core = core_with_placed_tile();
        let text = core
            .finish_save(&core.board(), &InlineReport::default())
            .expect("encode");
        let other = AppCore::new();
        other.load_document(&text).expect("load");
        assert_eq!(other.board(), core.board());
        assert!(SAVE_FILE_NAME.ends_with(".json"));
    }

    #[test]
    fn load_into_populated_board_discards_old_content() {
        let core = core_with_placed_tile();
        core.create_tile(Some("Marsh".into()), None, None).expect("tile");
        let saved = r##"{
            "tiles": [{"id": "tile-7", "color": "#357abe"}],
            "hexes": {"1-1": {"tile": {"id": "tile-7", "color": "#357abe"}}},
            "layoutSize": "SMALL"
        }"##;
        core.load_document(saved).expect("load");

        let board = core.board();
        assert_eq!(board.layout_size, LayoutSize::Small);
        assert_eq!(board.hexes.len(), 7);
        assert_eq!(board.tiles.len(), 1);
        assert!(board.tiles.contains("tile-7"));
        assert!(!board.tiles.contains("tile-1"));
        assert!(!board.tiles.contains("tile-2"));
        assert_eq!(board.grid_references("tile-1"), Vec::<CellId>::new());
        assert_eq!(board.grid_references("tile-7"), vec![CellId::new(1, 1)]);
    }

    #[test]
    fn save_with_failed_images_warns() {
        let core = core_with_placed_tile();
        let report = InlineReport {
            inlined: 0,
            failures: vec![InlineFailure {
                reference: "https://example.com/a.png".into(),
                tile_ids: vec!["tile-1".into()],
                reason: "404".into(),
            }],
        };
        assert!(core.finish_save(&core.board(), &report).is_ok());
        let toast = core.snapshot().toast.expect("toast");
        assert_eq!(toast.kind, ToastKind::Error);
        assert!(toast.message.contains("1 image"));
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[tokio::test]
    async fn save_inlines_without_touching_live_board() {
        let core = AppCore::new();
        core.create_tile(None, None, Some("tiles/forest.png".into()))
            .expect("tile");
        let text = core
            .save_document(|reference| async move {
                assert_eq!(reference, "tiles/forest.png");
                Ok::<_, String>("data:image/png;base64,AAAA".to_string())
            })
            .await
            .expect("save");
        assert!(text.contains("data:image/png;base64,AAAA"));
        let snapshot = core.snapshot();
        assert!(!snapshot.saving);
        assert_eq!(
            snapshot.board.tiles.get("tile-1").and_then(|tile| tile.image.clone()),
            Some("tiles/forest.png".to_string())
        );
    }

    #[test]
    fn stale_toast_timer_does_not_dismiss_newer_toast() {
        let core = AppCore::new();
        let first = core.show_toast("one".into(), ToastKind::Info);
        let second = core.show_toast("two".into(), ToastKind::Info);
        core.dismiss_toast(first);
        assert_eq!(core.snapshot().toast.map(|toast| toast.id), Some(second));
        core.dismiss_toast(second);
        assert_eq!(core.snapshot().toast, None);
    }

    #[test]
    fn subscription_drop_stops_notifications() {
        let core = AppCore::new();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let subscription = core.subscribe(Rc::new(move || counter.set(counter.get() + 1)));
        core.show_toast("hello".into(), ToastKind::Info);
        assert_eq!(hits.get(), 1);
        drop(subscription);
        core.show_toast("again".into(), ToastKind::Info);
        assert_eq!(hits.get(), 1);
    }
}
