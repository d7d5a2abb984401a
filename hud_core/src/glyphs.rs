//! 3×5 bitmap font for range-ring labels.
//!
//! Only what a distance label needs: digits, `.`, `-` and `m`.
//! Each row is three bits, most significant bit on the left.

pub const GLYPH_WIDTH: i64 = 3;
pub const GLYPH_HEIGHT: i64 = 5;
/// Horizontal advance including one column of spacing.
pub const GLYPH_ADVANCE: i64 = GLYPH_WIDTH + 1;

pub fn glyph(ch: char) -> Option<[u8; 5]> {
    let rows = match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        'm' => [0b000, 0b110, 0b111, 0b101, 0b101],
        _ => return None,
    };
    Some(rows)
}

/// Pixel width of a rendered string.
pub fn text_width(text: &str) -> i64 {
    let n = text.chars().count() as i64;
    if n == 0 {
        0
    } else {
        n * GLYPH_ADVANCE - 1
    }
}

/// Label for a range ring in metres, to the millimetre, with trailing zeros
/// dropped: `2m`, `1.5m`, `0.25m`.
pub fn range_label(range_mm: f64) -> String {
    let mm = range_mm.round() as i64;
    let (metres, frac) = (mm / 1000, (mm % 1000).abs());
    if frac == 0 {
        return format!("{metres}m");
    }
    let digits = format!("{frac:03}");
    format!("{metres}.{}m", digits.trim_end_matches('0'))
}
