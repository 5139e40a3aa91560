//! Line wrapping and the sizing rules for text drawn into a bubble.
//!
//! Sizing:
//! - font size: `min(width * 0.85 / 5, height * 0.85 / 2, 48)`, never below 14
//! - line height: `font_size * 1.3`
//! - outline stroke width: `font_size / 3`

/// Share of the box width and height usable for text.
const FILL_RATIO: f32 = 0.85;
const WIDTH_DIVISOR: f32 = 5.0;
const HEIGHT_DIVISOR: f32 = 2.0;
const MAX_FONT_SIZE: f32 = 48.0;
const MIN_FONT_SIZE: f32 = 14.0;
const LINE_HEIGHT_RATIO: f32 = 1.3;
const STROKE_DIVISOR: f32 = 3.0;

/// Font size for a box of the given size.
#[must_use]
pub fn font_size_for(box_width: f32, box_height: f32) -> f32 {
    (box_width * FILL_RATIO / WIDTH_DIVISOR)
        .min(box_height * FILL_RATIO / HEIGHT_DIVISOR)
        .min(MAX_FONT_SIZE)
        .max(MIN_FONT_SIZE)
}

/// Maximum line width for a box of the given width.
#[must_use]
pub fn max_line_width(box_width: f32) -> f32 {
    box_width * FILL_RATIO
}

/// Distance between consecutive baselines.
#[must_use]
pub fn line_height_for(font_size: f32) -> f32 {
    font_size * LINE_HEIGHT_RATIO
}

/// Width of the outline drawn under each line.
#[must_use]
pub fn stroke_width_for(font_size: f32) -> f32 {
    font_size / STROKE_DIVISOR
}

/// Vertical center of the first line so that `lines` lines are centered on
/// `center_y`.
#[must_use]
pub fn block_start_y(center_y: f32, lines: usize, line_height: f32) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let total = lines as f32 * line_height;
    center_y - total / 2.0 + line_height / 2.0
}

/// Greedily wrap `text` into lines no wider than `max_width`.
///
/// Words are split on whitespace and re-joined with single spaces. A word
/// wider than `max_width` on its own gets a line to itself and is never cut.
/// At least one line is always returned; input without words comes back as
/// a single line holding the input unchanged.
pub fn wrap_text<F>(text: &str, max_width: f32, mut measure: F) -> Vec<String>
where
    F: FnMut(&str) -> f32,
{
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            continue;
        }
        let candidate = format!("{current} {word}");
        if measure(&candidate) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(text.to_string());
    }
    lines
}
