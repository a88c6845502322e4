use std::fmt::Write;

use crate::color::{contrast_text, EMPTY_HEX_FILL, HEX_STROKE, WHITE};
use crate::layout::HexMetrics;
use crate::state::BoardState;
use crate::tile::Tile;

pub const SVG_FILE_NAME: &str = "hex-flower.svg";
pub const PAGE_SVG_FILE_NAME: &str = "hex-flower-page.svg";
pub const SVG_MIME: &str = "image/svg+xml";

pub const A4_LONG_MM: f32 = 297.0;
pub const A4_SHORT_MM: f32 = 210.0;
pub const PAGE_FILL_RATIO: f32 = 0.95;

const BOARD_PADDING: f32 = 20.0;
const LABEL_FONT_SIZE: f32 = 12.0;
const STROKE_WIDTH: f32 = 2.0;

/// Placement of a `content_w x content_h` box on a page, scaled to fit and centred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageFit {
    pub page_width: f32,
    pub page_height: f32,
    pub scale: f32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl PageFit {
    pub fn new(page_width: f32, page_height: f32, content_width: f32, content_height: f32) -> Self {
        let content_width = content_width.max(1.0);
        let content_height = content_height.max(1.0);
        let scale = (page_width / content_width).min(page_height / content_height) * PAGE_FILL_RATIO;
        let width = content_width * scale;
        let height = content_height * scale;
        Self {
            page_width,
            page_height,
            scale,
            x: (page_width - width) * 0.5,
            y: (page_height - height) * 0.5,
            width,
            height,
        }
    }

    pub fn landscape_a4(content_width: f32, content_height: f32) -> Self {
        Self::new(A4_LONG_MM, A4_SHORT_MM, content_width, content_height)
    }
}

pub fn board_svg_size(state: &BoardState) -> (f32, f32) {
    let (width, height) = HexMetrics::default().board_extent(state.layout_size);
    (width + BOARD_PADDING * 2.0, height + BOARD_PADDING * 2.0)
}

/// Standalone vector snapshot of the board.
pub fn render_board_svg(state: &BoardState) -> String {
    let (width, height) = board_svg_size(state);
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{width:.2}" height="{height:.2}" viewBox="0 0 {width:.2} {height:.2}">"#
    );
    write_board_body(&mut out, state);
    out.push_str("</svg>\n");
    out
}

/// The board centred on an A4 landscape page, sized in millimetres for printing.
pub fn render_page_svg(state: &BoardState) -> String {
    let (width, height) = board_svg_size(state);
    let fit = PageFit::landscape_a4(width, height);
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{pw}mm" height="{ph}mm" viewBox="0 0 {pw} {ph}">"#,
        pw = fit.page_width,
        ph = fit.page_height,
    );
    let _ = writeln!(
        out,
        r#"<rect width="{}" height="{}" fill="{WHITE}"/>"#,
        fit.page_width, fit.page_height
    );
    let _ = writeln!(
        out,
        r#"<g transform="translate({:.3} {:.3}) scale({:.5})">"#,
        fit.x, fit.y, fit.scale
    );
    write_board_body(&mut out, state);
    out.push_str("</g>\n</svg>\n");
    out
}

fn write_board_body(out: &mut String, state: &BoardState) {
    let metrics = HexMetrics::default();
    out.push_str("<defs>\n");
    for (cell, grid_cell) in state.hexes.iter() {
        if grid_cell.tile.as_ref().and_then(|tile| tile.image.as_ref()).is_none() {
            continue;
        }
        let Some(center) = metrics.hex_center(state.layout_size, cell) else {
            continue;
        };
        let _ = writeln!(
            out,
            r#"<clipPath id="clip-{cell}"><polygon points="{}"/></clipPath>"#,
            polygon_points(&metrics, shift(center))
        );
    }
    out.push_str("</defs>\n");

    for (cell, grid_cell) in state.hexes.iter() {
        let Some(center) = metrics.hex_center(state.layout_size, cell) else {
            continue;
        };
        let center = shift(center);
        let points = polygon_points(&metrics, center);
        let fill = grid_cell
            .tile
            .as_ref()
            .and_then(|tile| tile.color.as_deref())
            .unwrap_or(EMPTY_HEX_FILL);
        let _ = writeln!(
            out,
            r#"<polygon data-cell="{cell}" points="{points}" fill="{}" stroke="{HEX_STROKE}" stroke-width="{STROKE_WIDTH}"/>"#,
            escape_xml(fill)
        );
        if let Some(tile) = grid_cell.tile.as_ref() {
            write_tile(out, &metrics, &cell.to_string(), center, tile);
        }
    }
}

fn write_tile(out: &mut String, metrics: &HexMetrics, cell: &str, center: (f32, f32), tile: &Tile) {
    if let Some(image) = tile.image.as_deref() {
        let x = center.0 - metrics.width * 0.5;
        let y = center.1 - metrics.height * 0.5;
        let _ = writeln!(
            out,
            r#"<image href="{href}" xlink:href="{href}" x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" preserveAspectRatio="xMidYMid slice" clip-path="url(#clip-{cell})"/>"#,
            href = escape_xml(image),
            w = metrics.width,
            h = metrics.height,
        );
    }
    let Some(text) = tile.text.as_deref().filter(|text| !text.trim().is_empty()) else {
        return;
    };
    let text_fill = match (tile.image.as_ref(), tile.color.as_deref()) {
        (None, Some(color)) => contrast_text(color),
        _ => contrast_text(EMPTY_HEX_FILL),
    };
    let _ = writeln!(
        out,
        r#"<text x="{:.2}" y="{:.2}" font-family="sans-serif" font-size="{LABEL_FONT_SIZE}" text-anchor="middle" dominant-baseline="middle" fill="{text_fill}">{}</text>"#,
        center.0,
        center.1,
        escape_xml(text)
    );
}

fn shift(center: (f32, f32)) -> (f32, f32) {
    (center.0 + BOARD_PADDING, center.1 + BOARD_PADDING)
}

fn polygon_points(metrics: &HexMetrics, center: (f32, f32)) -> String {
    let mut points = String::new();
    for (idx, (x, y)) in metrics.hex_corners(center).iter().enumerate() {
        if idx > 0 {
            points.push(' ');
        }
        let _ = write!(points, "{x:.2},{y:.2}");
    }
    points
}

pub fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell_id::CellId;

    #[test]
    fn page_fit_centres_and_keeps_margin() {
        let fit = PageFit::landscape_a4(1000.0, 500.0);
        assert!((fit.scale - 0.297 * 0.95).abs() < 1e-5);
        assert!((fit.x * 2.0 + fit.width - A4_LONG_MM).abs() < 1e-3);
        assert!((fit.y * 2.0 + fit.height - A4_SHORT_MM).abs() < 1e-3);
        assert!(fit.width < A4_LONG_MM);
    }

    fn small_board() -> BoardState {
        use crate::action::BoardAction;
        use crate::reconcile::apply_action;

        let mut state = BoardState::with_layout(crate::layout::LayoutSize::Small);
        for tile in [
            Tile::color("tile-1", "#000000").with_text("a<b"),
            Tile::image("tile-2", "data:image/png;base64,AAAA"),
        ] {
            assert!(apply_action(&mut state, &BoardAction::CreateTile { tile }));
        }
        for (id, target) in [("tile-1", CellId::new(0, 0)), ("tile-2", CellId::new(1, 1))] {
            let tile = state.tiles.get(id).cloned().expect("tile");
            let action = BoardAction::Drop {
                source: None,
                target,
                tile,
            };
            assert!(apply_action(&mut state, &action));
        }
        state
    }

    #[test]
    fn board_svg_draws_every_cell_and_tile() {
        let svg = render_board_svg(&small_board());
        assert_eq!(svg.matches("<polygon data-cell=").count(), 7);
        assert!(svg.contains(r#"data-cell="0-0""#));
        assert!(svg.contains(r##"fill="#000000""##));
        assert_eq!(svg.matches(&format!(r#"fill="{EMPTY_HEX_FILL}""#)).count(), 6);
        assert!(svg.contains(&format!(r#"stroke="{HEX_STROKE}""#)));
        assert!(svg.contains(r#"<clipPath id="clip-1-1">"#));
        assert!(svg.contains(r#"clip-path="url(#clip-1-1)""#));
        assert!(svg.contains(r##"fill="#ffffff">a&lt;b</text>"##));
        assert!(svg.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn page_svg_wraps_board_in_a4_group() {
        let svg = render_page_svg(&small_board());
        assert!(svg.contains(r#"width="297mm" height="210mm""#));
        assert!(svg.contains("<g transform=\"translate("));
        assert_eq!(svg.matches("<polygon data-cell=").count(), 7);
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_xml(r#"<a & "b">"#), "&lt;a &amp; &quot;b&quot;&gt;");
    }
}
