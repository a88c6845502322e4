use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cell_id::CellId;

pub const HEX_HEIGHT: f32 = 109.0;
pub const HEX_SPACING: f32 = 5.0;
pub const HEX_WIDTH: f32 = (2.0 / SQRT_3) * HEX_HEIGHT;
pub const HEX_MARGIN: f32 = HEX_WIDTH * 0.248 + HEX_SPACING;
/// Negative: neighbouring rows interlock by half a hex.
pub const ROW_SPACING: f32 = -(HEX_HEIGHT * 0.5 - HEX_SPACING * 0.5);

const SQRT_3: f32 = 1.732_050_8;

pub const SMALL_ROWS: &[u32] = &[1, 2, 1, 2, 1];
pub const MEDIUM_ROWS: &[u32] = &[1, 2, 3, 2, 3, 2, 3, 2, 1];
pub const LARGE_ROWS: &[u32] = &[1, 2, 3, 4, 3, 4, 3, 4, 3, 4, 3, 2, 1];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LayoutSize {
    Small,
    #[default]
    Medium,
    Large,
}

pub const ALL_LAYOUT_SIZES: [LayoutSize; 3] =
    [LayoutSize::Small, LayoutSize::Medium, LayoutSize::Large];

impl LayoutSize {
    pub fn rows(self) -> &'static [u32] {
        match self {
            LayoutSize::Small => SMALL_ROWS,
            LayoutSize::Medium => MEDIUM_ROWS,
            LayoutSize::Large => LARGE_ROWS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LayoutSize::Small => "SMALL",
            LayoutSize::Medium => "MEDIUM",
            LayoutSize::Large => "LARGE",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LayoutSize::Small => "Small",
            LayoutSize::Medium => "Medium",
            LayoutSize::Large => "Large",
        }
    }

    /// Case-insensitive; returns `None` for anything that is not a known size.
    pub fn from_name(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        ALL_LAYOUT_SIZES
            .iter()
            .copied()
            .find(|size| size.as_str().eq_ignore_ascii_case(trimmed))
    }

    pub fn cell_count(self) -> usize {
        self.rows().iter().map(|count| *count as usize).sum()
    }

    pub fn max_row_len(self) -> u32 {
        self.rows().iter().copied().max().unwrap_or(0)
    }

    pub fn contains(self, cell: CellId) -> bool {
        self.rows()
            .get(cell.row as usize)
            .is_some_and(|count| cell.col < *count)
    }

    /// Row-major order, matching the on-screen reading order.
    pub fn cell_ids(self) -> Vec<CellId> {
        let mut ids = Vec::with_capacity(self.cell_count());
        for (row, count) in self.rows().iter().enumerate() {
            for col in 0..*count {
                ids.push(CellId::new(row as u32, col));
            }
        }
        ids
    }
}

impl fmt::Display for LayoutSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LayoutSize {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::from_name(value).ok_or_else(|| format!("unknown layout size '{value}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HexMetrics {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub row_spacing: f32,
}

impl Default for HexMetrics {
    fn default() -> Self {
        Self {
            width: HEX_WIDTH,
            height: HEX_HEIGHT,
            margin: HEX_MARGIN,
            row_spacing: ROW_SPACING,
        }
    }
}

impl HexMetrics {
    pub fn col_pitch(&self) -> f32 {
        self.width + self.margin * 2.0
    }

    pub fn row_pitch(&self) -> f32 {
        self.height + self.row_spacing
    }

    pub fn board_extent(&self, size: LayoutSize) -> (f32, f32) {
        let rows = size.rows().len();
        if rows == 0 {
            return (0.0, 0.0);
        }
        let widest = size.max_row_len().max(1);
        let width = (widest - 1) as f32 * self.col_pitch() + self.width;
        let height = (rows - 1) as f32 * self.row_pitch() + self.height;
        (width, height)
    }

    /// Centre of `cell` relative to the top-left of the board extent.
    pub fn hex_center(&self, size: LayoutSize, cell: CellId) -> Option<(f32, f32)> {
        let count = *size.rows().get(cell.row as usize)?;
        if cell.col >= count {
            return None;
        }
        let widest = size.max_row_len() as f32;
        let shift = (widest - count as f32) * 0.5;
        let x = self.width * 0.5 + (shift + cell.col as f32) * self.col_pitch();
        let y = self.height * 0.5 + cell.row as f32 * self.row_pitch();
        Some((x, y))
    }

    /// Flat-top polygon, clockwise from the right-hand vertex.
    pub fn hex_corners(&self, center: (f32, f32)) -> [(f32, f32); 6] {
        let (cx, cy) = center;
        let half_w = self.width * 0.5;
        let quarter_w = self.width * 0.25;
        let half_h = self.height * 0.5;
        [
            (cx + half_w, cy),
            (cx + quarter_w, cy + half_h),
            (cx - quarter_w, cy + half_h),
            (cx - half_w, cy),
            (cx - quarter_w, cy - half_h),
            (cx + quarter_w, cy - half_h),
        ]
    }
}

pub fn hex_center(size: LayoutSize, cell: CellId) -> Option<(f32, f32)> {
    HexMetrics::default().hex_center(size, cell)
}

pub fn board_extent(size: LayoutSize) -> (f32, f32) {
    HexMetrics::default().board_extent(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medium_has_nineteen_cells() {
        assert_eq!(LayoutSize::Medium.cell_count(), 19);
        assert_eq!(LayoutSize::Small.cell_count(), 7);
        assert_eq!(LayoutSize::Large.cell_count(), 37);
    }

    #[test]
    fn alternate_rows_are_offset_by_half_a_pitch() {
        let metrics = HexMetrics::default();
        let top = metrics.hex_center(LayoutSize::Medium, CellId::new(0, 0)).unwrap();
        let left = metrics.hex_center(LayoutSize::Medium, CellId::new(1, 0)).unwrap();
        let right = metrics.hex_center(LayoutSize::Medium, CellId::new(1, 1)).unwrap();
        let pitch = metrics.col_pitch();
        assert!((top.0 - left.0 - pitch * 0.5).abs() < 1e-3);
        assert!((right.0 - top.0 - pitch * 0.5).abs() < 1e-3);
        assert!((left.1 - top.1 - metrics.row_pitch()).abs() < 1e-3);
    }

    #[test]
    fn centers_stay_inside_extent() {
        let metrics = HexMetrics::default();
        for size in ALL_LAYOUT_SIZES {
            let (width, height) = metrics.board_extent(size);
            for cell in size.cell_ids() {
                let (x, y) = metrics.hex_center(size, cell).unwrap();
                assert!(x - metrics.width * 0.5 >= -1e-3 && x + metrics.width * 0.5 <= width + 1e-3);
                assert!(y - metrics.height * 0.5 >= -1e-3 && y + metrics.height * 0.5 <= height + 1e-3);
            }
        }
    }

    #[test]
    fn out_of_layout_cells_have_no_center() {
        assert!(hex_center(LayoutSize::Small, CellId::new(0, 1)).is_none());
        assert!(hex_center(LayoutSize::Small, CellId::new(5, 0)).is_none());
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!(LayoutSize::from_name("large"), Some(LayoutSize::Large));
        assert_eq!(LayoutSize::from_name(" MEDIUM "), Some(LayoutSize::Medium));
        assert_eq!(LayoutSize::from_name("HUGE"), None);
    }
}
