// Greens
pub const MANTIS: &str = "#66cc66";
pub const GREEN: &str = "#4caf50";
pub const FERN: &str = "#45a049";

// Blues
pub const BLUEBERRY: &str = "#4285f4";
pub const SAPPHIRE: &str = "#357abe";
pub const NOIR: &str = "#213547";

// Reds
pub const ROSE_WATER: &str = "#ffebee";
pub const CORAL: &str = "#ff5555";
pub const CINNABAR: &str = "#f44336";
pub const RED: &str = "#ff0000";
pub const VIVALDI: &str = "#d32f2f";

// Neutrals
pub const WHITE: &str = "#ffffff";
pub const SNOW: &str = "#f0f0f0";
pub const CULTURED: &str = "#f5f5f5";
pub const GAINSBORO: &str = "#e0e0e0";
pub const COSMONAUT: &str = "#dddddd";
pub const CHINESE_SILVER: &str = "#cccccc";
pub const LEAD_GREY: &str = "#666666";
pub const DARK_CHARCOAL: &str = "#333333";
pub const BLACK: &str = "#000000";

/// Swatches offered when creating a color tile.
pub const TILE_SWATCHES: &[(&str, &str)] = &[
    ("Mantis", MANTIS),
    ("Green", GREEN),
    ("Blueberry", BLUEBERRY),
    ("Sapphire", SAPPHIRE),
    ("Noir", NOIR),
    ("Rose water", ROSE_WATER),
    ("Coral", CORAL),
    ("Vivaldi", VIVALDI),
    ("Snow", SNOW),
    ("Gainsboro", GAINSBORO),
    ("Lead grey", LEAD_GREY),
    ("Black", BLACK),
];

pub const EMPTY_HEX_FILL: &str = SNOW;
pub const HEX_STROKE: &str = COSMONAUT;
pub const TRASH_FILL: &str = "#ff4444";

/// Accepts `#rgb` and `#rrggbb` (case-insensitive).
pub fn parse_hex_color(value: &str) -> Option<(u8, u8, u8)> {
    let digits = value.trim().strip_prefix('#')?;
    if !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }
    match digits.len() {
        3 => {
            let mut channels = digits.chars().map(|ch| {
                let nibble = ch.to_digit(16).unwrap_or(0) as u8;
                nibble * 17
            });
            Some((channels.next()?, channels.next()?, channels.next()?))
        }
        6 => {
            let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
            Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
        }
        _ => None,
    }
}

pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0
}

/// Black text on light backgrounds, white on dark ones. Unparseable colors
/// get black.
pub fn contrast_text(background: &str) -> &'static str {
    match parse_hex_color(background) {
        Some((r, g, b)) if luminance(r, g, b) <= 0.5 => WHITE,
        _ => BLACK,
    }
}
