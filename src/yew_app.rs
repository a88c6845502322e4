use std::ops::Deref;
use std::rc::Rc;

use gloo::events::EventListener;
use gloo::timers::callback::Timeout;
use hexflower_core::codec::SAVE_MIME;
use hexflower_core::color::{contrast_text, EMPTY_HEX_FILL, HEX_STROKE, TILE_SWATCHES, TRASH_FILL};
use hexflower_core::export::{PAGE_SVG_FILE_NAME, SVG_FILE_NAME, SVG_MIME};
use hexflower_core::{
    render_board_svg, render_page_svg, BoardState, CellId, HexMetrics, LayoutSize, Tile,
    ALL_LAYOUT_SIZES, SAVE_FILE_NAME,
};
use hexflower_image::{crop_tile_data_uri, CropParams, ZOOM_MAX, ZOOM_MIN, ZOOM_STEP};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{DragEvent, HtmlInputElement, HtmlSelectElement, HtmlTextAreaElement, KeyboardEvent};
use yew::prelude::*;

use crate::app_core::{
    AppCore, AppSnapshot, Confirmation, DragPayload, Toast, ToastKind, DRAG_DATA_KEY,
    TOAST_DURATION_MS,
};
use crate::file_io;

const HEX_CLIP: &str = "polygon(25% 0%, 75% 0%, 100% 50%, 75% 100%, 25% 100%, 0% 50%)";
const HEX_BORDER_PX: f32 = 2.0;

#[derive(Clone)]
pub(crate) struct CoreHandle(Rc<AppCore>);

impl PartialEq for CoreHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for CoreHandle {
    type Target = AppCore;

    fn deref(&self) -> &AppCore {
        &self.0
    }
}

pub(crate) fn run() {
    let core = CoreHandle(AppCore::new());
    yew::Renderer::<App>::with_props(AppProps { core }).render();
}

fn write_drag_payload(event: &DragEvent, payload: &DragPayload) {
    if let Some(transfer) = event.data_transfer() {
        let _ = transfer.set_data(DRAG_DATA_KEY, &payload.to_json());
        transfer.set_effect_allowed("move");
    }
}

fn read_drag_payload(event: &DragEvent) -> Option<DragPayload> {
    let transfer = event.data_transfer()?;
    let raw = transfer.get_data(DRAG_DATA_KEY).ok()?;
    DragPayload::from_json(&raw)
}

fn download(file_name: &str, bytes: &[u8], mime: &str) {
    if let Err(err) = file_io::download_bytes(file_name, bytes, mime) {
        gloo::console::warn!("download failed", file_name, err);
    }
}

fn tile_face(tile: &Tile) -> Html {
    let background = tile.color.clone().unwrap_or_else(|| EMPTY_HEX_FILL.to_string());
    let text_color = if tile.image.is_some() {
        contrast_text(EMPTY_HEX_FILL)
    } else {
        contrast_text(&background)
    };
    let image = tile.image.as_ref().map(|src| {
        html! {
            <img class="tile-image" src={src.clone()} alt={tile.label().to_string()} draggable="false" />
        }
    });
    let text = tile
        .text
        .as_ref()
        .filter(|text| !text.trim().is_empty())
        .map(|text| {
            html! {
                <span class="tile-text" style={format!("color: {text_color};")}>{ text.clone() }</span>
            }
        });
    html! {
        <div class="tile-face" style={format!("background: {background};")}>
            { image }
            { text }
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub(crate) struct AppProps {
    pub(crate) core: CoreHandle,
}

#[function_component(App)]
pub(crate) fn app(props: &AppProps) -> Html {
    let core = props.core.clone();
    let snapshot = use_state(|| core.snapshot());
    {
        let core = core.clone();
        let snapshot = snapshot.clone();
        use_effect_with((), move |_| {
            let core_for_cb = core.clone();
            let subscription = core.subscribe(Rc::new(move || {
                snapshot.set(core_for_cb.snapshot());
            }));
            move || drop(subscription)
        });
    }

    let AppSnapshot {
        board,
        confirmation,
        toast,
        saving,
    } = (*snapshot).clone();
    let board = Rc::new(board);

    html! {
        <div class="app">
            <Toolbar core={core.clone()} board={board.clone()} saving={saving} />
            <TileLibrary core={core.clone()} board={board.clone()} />
            <main class="main-content">
                <HexFlower core={core.clone()} board={board} />
            </main>
            <TrashZone core={core.clone()} />
            <ConfirmationDialog core={core.clone()} confirmation={confirmation} />
            <ToastView core={core} toast={toast} />
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct ToolbarProps {
    core: CoreHandle,
    board: Rc<BoardState>,
    saving: bool,
}

#[function_component(Toolbar)]
fn toolbar(props: &ToolbarProps) -> Html {
    let current = props.board.layout_size;
    let layout_ref = use_node_ref();
    {
        let layout_ref = layout_ref.clone();
        use_effect_with(current, move |size| {
            if let Some(select) = layout_ref.cast::<HtmlSelectElement>() {
                select.set_value(size.as_str());
            }
            || ()
        });
    }
    let on_layout = {
        let core = props.core.clone();
        Callback::from(move |event: Event| {
            let select: HtmlSelectElement = event.target_unchecked_into();
            if let Some(size) = LayoutSize::from_name(&select.value()) {
                core.request_layout_change(size);
            }
            // A confirmed or immediate change re-syncs through the effect above;
            // a pending or cancelled one must keep showing the live layout.
            select.set_value(current.as_str());
        })
    };
    let on_save = {
        let core = props.core.clone();
        Callback::from(move |_: MouseEvent| {
            let core = core.clone();
            spawn_local(async move {
                match core.save_document(file_io::fetch_data_uri).await {
                    Ok(text) => download(SAVE_FILE_NAME, text.as_bytes(), SAVE_MIME),
                    Err(err) => gloo::console::warn!("save failed", err.to_string()),
                }
            });
        })
    };
    let on_load = {
        let core = props.core.clone();
        Callback::from(move |event: Event| {
            let input: HtmlInputElement = event.target_unchecked_into();
            let Some(file) = input.files().and_then(|files| files.get(0)) else {
                return;
            };
            input.set_value("");
            let core = core.clone();
            spawn_local(async move {
                match file_io::read_file_text(file).await {
                    Ok(text) => {
                        if let Err(err) = core.load_document(&text) {
                            gloo::console::warn!("load rejected", err.to_string());
                        }
                    }
                    Err(err) => {
                        core.show_toast(err, ToastKind::Error);
                    }
                }
            });
        })
    };
    let on_export_svg = {
        let board = props.board.clone();
        Callback::from(move |_: MouseEvent| {
            download(SVG_FILE_NAME, render_board_svg(&board).as_bytes(), SVG_MIME);
        })
    };
    let on_export_page = {
        let board = props.board.clone();
        Callback::from(move |_: MouseEvent| {
            download(PAGE_SVG_FILE_NAME, render_page_svg(&board).as_bytes(), SVG_MIME);
        })
    };
    let on_print = Callback::from(|_: MouseEvent| {
        if let Some(window) = web_sys::window() {
            let _ = window.print();
        }
    });
    let on_clear = {
        let core = props.core.clone();
        Callback::from(move |_: MouseEvent| {
            core.clear_board();
        })
    };

    let layout_options: Html = ALL_LAYOUT_SIZES
        .iter()
        .map(|size| {
            html! {
                <option value={size.as_str()} selected={*size == current}>{ size.label() }</option>
            }
        })
        .collect();

    html! {
        <header class="toolbar">
            <label class="control">
                <span>{ "Layout" }</span>
                <select ref={layout_ref} onchange={on_layout}>{ layout_options }</select>
            </label>
            <button onclick={on_save} disabled={props.saving}>
                { if props.saving { "Saving..." } else { "Save" } }
            </button>
            <label class="button">
                { "Load" }
                <input type="file" accept="application/json,.json" class="hidden" onchange={on_load} />
            </label>
            <button onclick={on_export_svg}>{ "Export SVG" }</button>
            <button onclick={on_export_page}>{ "Export page" }</button>
            <button onclick={on_print}>{ "Print" }</button>
            <button onclick={on_clear} disabled={!props.board.has_any_tile()}>{ "Clear board" }</button>
        </header>
    }
}

#[derive(Properties, PartialEq)]
struct TileLibraryProps {
    core: CoreHandle,
    board: Rc<BoardState>,
}

#[function_component(TileLibrary)]
fn tile_library(props: &TileLibraryProps) -> Html {
    let items: Html = props
        .board
        .tiles
        .iter()
        .map(|tile| {
            let on_drag_start = {
                let payload = DragPayload::from_library(tile.clone());
                Callback::from(move |event: DragEvent| write_drag_payload(&event, &payload))
            };
            let on_delete = {
                let core = props.core.clone();
                let id = tile.id.clone();
                Callback::from(move |_: MouseEvent| core.request_delete_tile(&id))
            };
            let placed = props.board.grid_references(&tile.id).len();
            html! {
                <div key={tile.id.clone()} class="library-tile" draggable="true" ondragstart={on_drag_start}>
                    { tile_face(tile) }
                    if placed > 0 {
                        <span class="placed-count" title="Placed on the board">{ placed }</span>
                    }
                    <button class="tile-delete" title="Delete tile" onclick={on_delete}>{ "\u{00d7}" }</button>
                </div>
            }
        })
        .collect();

    html! {
        <aside class="library">
            <h2>{ "Tiles" }</h2>
            <TileCreator core={props.core.clone()} />
            <div class="library-tiles">{ items }</div>
        </aside>
    }
}

#[derive(Properties, PartialEq)]
struct TileCreatorProps {
    core: CoreHandle,
}

#[function_component(TileCreator)]
fn tile_creator(props: &TileCreatorProps) -> Html {
    let text = use_state(String::new);
    let color = use_state(|| None::<String>);
    let source = use_state(|| None::<Rc<Vec<u8>>>);
    let params = use_state(CropParams::default);
    let error = use_state(|| None::<String>);

    let preview = use_memo(((*source).clone(), *params), |(source, params)| {
        source
            .as_ref()
            .map(|bytes| crop_tile_data_uri(bytes, params).map_err(|err| err.to_string()))
    });

    let on_text = {
        let text = text.clone();
        Callback::from(move |event: InputEvent| {
            let area: HtmlTextAreaElement = event.target_unchecked_into();
            text.set(area.value());
        })
    };
    let on_custom_color = {
        let color = color.clone();
        Callback::from(move |event: InputEvent| {
            let input: HtmlInputElement = event.target_unchecked_into();
            color.set(Some(input.value()));
        })
    };
    let on_image = {
        let source = source.clone();
        let params = params.clone();
        let error = error.clone();
        Callback::from(move |event: Event| {
            let input: HtmlInputElement = event.target_unchecked_into();
            let Some(file) = input.files().and_then(|files| files.get(0)) else {
                return;
            };
            input.set_value("");
            let source = source.clone();
            let params = params.clone();
            let error = error.clone();
            spawn_local(async move {
                match file_io::read_file_bytes(file).await {
                    Ok(bytes) => {
                        params.set(CropParams::default());
                        source.set(Some(Rc::new(bytes)));
                        error.set(None);
                    }
                    Err(err) => error.set(Some(err)),
                }
            });
        })
    };
    let adjust = |update: fn(&mut CropParams)| {
        let params = params.clone();
        Callback::from(move |_: MouseEvent| {
            let mut next = *params;
            update(&mut next);
            params.set(next);
        })
    };
    let on_rotate_left = adjust(CropParams::rotate_left);
    let on_rotate_right = adjust(CropParams::rotate_right);
    let on_zoom = {
        let params = params.clone();
        Callback::from(move |event: InputEvent| {
            let input: HtmlInputElement = event.target_unchecked_into();
            if let Ok(value) = input.value().parse::<f32>() {
                params.set(CropParams {
                    zoom: value.clamp(ZOOM_MIN, ZOOM_MAX),
                    ..*params
                });
            }
        })
    };
    let on_pan = |horizontal: bool| {
        let params = params.clone();
        Callback::from(move |event: InputEvent| {
            let input: HtmlInputElement = event.target_unchecked_into();
            if let Ok(value) = input.value().parse::<f32>() {
                let value = value.clamp(0.0, 1.0);
                let (x, y) = params.center;
                let center = if horizontal { (value, y) } else { (x, value) };
                params.set(CropParams { center, ..*params });
            }
        })
    };
    let on_clear_image = {
        let source = source.clone();
        Callback::from(move |_: MouseEvent| source.set(None))
    };
    let on_submit = {
        let core = props.core.clone();
        let text = text.clone();
        let color = color.clone();
        let source = source.clone();
        let params = params.clone();
        let error = error.clone();
        let preview = preview.clone();
        Callback::from(move |event: SubmitEvent| {
            event.prevent_default();
            let image = match preview.as_ref() {
                Some(Ok(uri)) => Some(uri.clone()),
                Some(Err(err)) => {
                    error.set(Some(err.clone()));
                    return;
                }
                None => None,
            };
            match core.create_tile(Some((*text).clone()), (*color).clone(), image) {
                Some(_) => {
                    text.set(String::new());
                    color.set(None);
                    source.set(None);
                    params.set(CropParams::default());
                    error.set(None);
                }
                None => error.set(Some("Add text, a color or an image".to_string())),
            }
        })
    };

    let swatches: Html = TILE_SWATCHES
        .iter()
        .map(|(name, value)| {
            let selected = color.as_deref() == Some(*value);
            let on_pick = {
                let color = color.clone();
                let value = value.to_string();
                Callback::from(move |_: MouseEvent| {
                    if color.as_deref() == Some(value.as_str()) {
                        color.set(None);
                    } else {
                        color.set(Some(value.clone()));
                    }
                })
            };
            html! {
                <button
                    type="button"
                    class={classes!("swatch", selected.then_some("selected"))}
                    title={*name}
                    style={format!("background: {value};")}
                    onclick={on_pick}
                />
            }
        })
        .collect();

    let editor = match preview.as_ref() {
        Some(result) => {
            let preview_img = match result {
                Ok(uri) => html! { <img class="crop-preview" src={uri.clone()} alt="Tile preview" /> },
                Err(err) => html! { <p class="error">{ err.clone() }</p> },
            };
            html! {
                <div class="image-editor">
                    { preview_img }
                    <div class="editor-row">
                        <button type="button" onclick={on_rotate_left}>{ "\u{27f2}" }</button>
                        <button type="button" onclick={on_rotate_right}>{ "\u{27f3}" }</button>
                        <button type="button" onclick={on_clear_image}>{ "Remove image" }</button>
                    </div>
                    <label class="control">
                        <span>{ format!("Zoom {:.1}x", params.zoom) }</span>
                        <input
                            type="range"
                            min={ZOOM_MIN.to_string()}
                            max={ZOOM_MAX.to_string()}
                            step={ZOOM_STEP.to_string()}
                            value={params.zoom.to_string()}
                            oninput={on_zoom}
                        />
                    </label>
                    <label class="control">
                        <span>{ "Horizontal" }</span>
                        <input type="range" min="0" max="1" step="0.01"
                            value={params.center.0.to_string()} oninput={on_pan(true)} />
                    </label>
                    <label class="control">
                        <span>{ "Vertical" }</span>
                        <input type="range" min="0" max="1" step="0.01"
                            value={params.center.1.to_string()} oninput={on_pan(false)} />
                    </label>
                </div>
            }
        }
        None => html! {
            <label class="button">
                { "Add image" }
                <input type="file" accept="image/*" class="hidden" onchange={on_image} />
            </label>
        },
    };

    html! {
        <form class="tile-creator" onsubmit={on_submit}>
            <textarea placeholder="Enter tile description..." value={(*text).clone()} oninput={on_text} />
            <div class="swatches">
                { swatches }
                <input
                    type="color"
                    title="Custom color"
                    value={(*color).clone().unwrap_or_else(|| EMPTY_HEX_FILL.to_string())}
                    oninput={on_custom_color}
                />
            </div>
            { editor }
            if let Some(message) = (*error).clone() {
                <p class="error">{ message }</p>
            }
            <button type="submit" class="primary">{ "Create tile" }</button>
        </form>
    }
}

#[derive(Properties, PartialEq)]
struct HexFlowerProps {
    core: CoreHandle,
    board: Rc<BoardState>,
}

#[function_component(HexFlower)]
fn hex_flower(props: &HexFlowerProps) -> Html {
    let metrics = HexMetrics::default();
    let size = props.board.layout_size;
    let (width, height) = metrics.board_extent(size);
    let cells: Html = size
        .cell_ids()
        .into_iter()
        .filter_map(|cell| {
            let (x, y) = metrics.hex_center(size, cell)?;
            Some(html! {
                <HexCell
                    key={cell.to_string()}
                    core={props.core.clone()}
                    cell={cell}
                    tile={props.board.hexes.tile_at(cell).cloned()}
                    left={x - metrics.width * 0.5}
                    top={y - metrics.height * 0.5}
                    width={metrics.width}
                    height={metrics.height}
                />
            })
        })
        .collect();

    html! {
        <div class="flower-container" style={format!("width: {width:.1}px; height: {height:.1}px;")}>
            { cells }
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct HexCellProps {
    core: CoreHandle,
    cell: CellId,
    tile: Option<Tile>,
    left: f32,
    top: f32,
    width: f32,
    height: f32,
}

#[function_component(HexCell)]
fn hex_cell(props: &HexCellProps) -> Html {
    let is_over = use_state(|| false);

    let on_drag_over = {
        let is_over = is_over.clone();
        Callback::from(move |event: DragEvent| {
            event.prevent_default();
            if !*is_over {
                is_over.set(true);
            }
        })
    };
    let on_drag_leave = {
        let is_over = is_over.clone();
        Callback::from(move |_: DragEvent| is_over.set(false))
    };
    let on_drop = {
        let core = props.core.clone();
        let is_over = is_over.clone();
        let cell = props.cell;
        Callback::from(move |event: DragEvent| {
            event.prevent_default();
            is_over.set(false);
            if let Some(payload) = read_drag_payload(&event) {
                core.drop_tile(&payload, cell);
            }
        })
    };
    let on_drag_start = props.tile.clone().map(|tile| {
        let payload = DragPayload::from_cell(tile, props.cell);
        Callback::from(move |event: DragEvent| write_drag_payload(&event, &payload))
    });

    let outer_style = format!(
        "left: {:.1}px; top: {:.1}px; width: {:.1}px; height: {:.1}px; clip-path: {HEX_CLIP}; background: {HEX_STROKE};",
        props.left, props.top, props.width, props.height
    );
    let inner_style = format!("inset: {HEX_BORDER_PX}px; clip-path: {HEX_CLIP}; background: {EMPTY_HEX_FILL};");
    let content = props.tile.as_ref().map(tile_face);

    html! {
        <div
            class={classes!("hex", is_over.then_some("drag-over"))}
            data-cell={props.cell.to_string()}
            style={outer_style}
            draggable={props.tile.is_some().to_string()}
            ondragstart={on_drag_start}
            ondragover={on_drag_over}
            ondragleave={on_drag_leave}
            ondrop={on_drop}
        >
            <div class="hex-inner" style={inner_style}>{ content }</div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct TrashZoneProps {
    core: CoreHandle,
}

#[function_component(TrashZone)]
fn trash_zone(props: &TrashZoneProps) -> Html {
    let is_over = use_state(|| false);
    let on_drag_over = {
        let is_over = is_over.clone();
        Callback::from(move |event: DragEvent| {
            event.prevent_default();
            if !*is_over {
                is_over.set(true);
            }
        })
    };
    let on_drag_leave = {
        let is_over = is_over.clone();
        Callback::from(move |_: DragEvent| is_over.set(false))
    };
    let on_drop = {
        let core = props.core.clone();
        let is_over = is_over.clone();
        Callback::from(move |event: DragEvent| {
            event.prevent_default();
            is_over.set(false);
            if let Some(payload) = read_drag_payload(&event) {
                core.trash(&payload);
            }
        })
    };
    html! {
        <div
            class={classes!("trash-zone", is_over.then_some("drag-over"))}
            style={format!("clip-path: {HEX_CLIP}; background: {TRASH_FILL};")}
            title="Drop a placed tile here to clear its hex"
            ondragover={on_drag_over}
            ondragleave={on_drag_leave}
            ondrop={on_drop}
        >
            <span>{ "\u{1f5d1}" }</span>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct ConfirmationDialogProps {
    core: CoreHandle,
    confirmation: Option<Confirmation>,
}

#[function_component(ConfirmationDialog)]
fn confirmation_dialog(props: &ConfirmationDialogProps) -> Html {
    {
        let core = props.core.clone();
        use_effect_with(props.confirmation.is_some(), move |open| {
            let listener = open
                .then(web_sys::window)
                .flatten()
                .map(|window| {
                    EventListener::new(&window, "keyup", move |event: &Event| {
                        let is_escape = event
                            .dyn_ref::<KeyboardEvent>()
                            .is_some_and(|event| event.key() == "Escape");
                        if is_escape {
                            core.cancel();
                        }
                    })
                });
            move || drop(listener)
        });
    }
    let Some(confirmation) = props.confirmation.as_ref() else {
        return html! {};
    };
    let on_confirm = {
        let core = props.core.clone();
        Callback::from(move |_: MouseEvent| core.confirm())
    };
    let on_cancel = {
        let core = props.core.clone();
        Callback::from(move |_: MouseEvent| core.cancel())
    };
    let confirm_label = match confirmation {
        Confirmation::DeleteTile { .. } => "Delete",
        Confirmation::ChangeLayout { .. } => "Change layout",
    };
    html! {
        <div class="modal" onclick={on_cancel.clone()}>
            <div class="modal-content" onclick={Callback::from(|event: MouseEvent| event.stop_propagation())}>
                <p>{ confirmation.message() }</p>
                <div class="button-group">
                    <button class="secondary" onclick={on_cancel}>{ "Cancel" }</button>
                    <button class="danger" onclick={on_confirm}>{ confirm_label }</button>
                </div>
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct ToastViewProps {
    core: CoreHandle,
    toast: Option<Toast>,
}

#[function_component(ToastView)]
fn toast_view(props: &ToastViewProps) -> Html {
    {
        let core = props.core.clone();
        let toast_id = props.toast.as_ref().map(|toast| toast.id);
        use_effect_with(toast_id, move |toast_id| {
            let timeout = toast_id.map(|id| {
                Timeout::new(TOAST_DURATION_MS, move || core.dismiss_toast(id))
            });
            move || drop(timeout)
        });
    }
    let Some(toast) = props.toast.as_ref() else {
        return html! {};
    };
    let kind = match toast.kind {
        ToastKind::Info => "toast-info",
        ToastKind::Error => "toast-error",
    };
    html! {
        <div class={classes!("toast", kind)} role="status">
            <div class="toast-message">{ toast.message.clone() }</div>
        </div>
    }
}
