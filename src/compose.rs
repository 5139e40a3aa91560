//! Drawing wrapped, outlined text into a bubble.
//!
//! Every line is drawn twice: first an outline in the background color (the
//! glyphs stamped at every offset within half the stroke width), then the
//! fill in the text color on top.

use image::RgbaImage;

use crate::detection::Region;
use crate::direction::{self, TextDirection};
use crate::font::TextRenderer;
use crate::layout;

/// One line positioned inside a region.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    /// Line text in logical order.
    pub text: String,
    /// Horizontal center.
    pub x: f32,
    /// Vertical center.
    pub y: f32,
}

/// Layout of a block of text inside a region.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Font size in pixels.
    pub font_size: f32,
    /// Baseline-to-baseline distance.
    pub line_height: f32,
    /// Width of the outline stroke.
    pub stroke_width: f32,
    /// Lines top to bottom.
    pub lines: Vec<PlacedLine>,
}

/// Size, wrap and position `text` for `region`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn layout_block<R: TextRenderer + ?Sized>(
    renderer: &R,
    text: &str,
    region: &Region,
) -> TextBlock {
    let (box_w, box_h) = (region.bbox.width as f32, region.bbox.height as f32);
    let font_size = layout::font_size_for(box_w, box_h);
    let line_height = layout::line_height_for(font_size);
    let wrapped = layout::wrap_text(text, layout::max_line_width(box_w), |line| {
        renderer.measure(line, font_size)
    });

    let start_y = layout::block_start_y(region.center_y, wrapped.len(), line_height);
    let lines = wrapped
        .into_iter()
        .enumerate()
        .map(|(i, text)| PlacedLine {
            text,
            x: region.center_x,
            y: start_y + i as f32 * line_height,
        })
        .collect();

    TextBlock {
        font_size,
        line_height,
        stroke_width: layout::stroke_width_for(font_size),
        lines,
    }
}

/// Lay out and draw `text` into `region` using the region's colors.
pub fn draw_text_block<R: TextRenderer + ?Sized>(
    image: &mut RgbaImage,
    renderer: &R,
    text: &str,
    region: &Region,
    direction: TextDirection,
) -> TextBlock {
    let block = layout_block(renderer, text, region);
    let offsets = stroke_offsets(block.stroke_width);

    for line in &block.lines {
        let visual = direction::visual_order(&line.text, direction);

        for &(dx, dy) in &offsets {
            renderer.draw(
                image,
                &visual,
                line.x + dx,
                line.y + dy,
                block.font_size,
                region.colors.background,
            );
        }
        renderer.draw(
            image,
            &visual,
            line.x,
            line.y,
            block.font_size,
            region.colors.text,
        );
    }

    block
}

/// Offsets covering a disc of radius `stroke_width / 2`, origin excluded.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn stroke_offsets(stroke_width: f32) -> Vec<(f32, f32)> {
    let radius = (stroke_width / 2.0).round().max(1.0) as i32;
    let mut offsets = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if (dx, dy) != (0, 0) && dx * dx + dy * dy <= radius * radius {
                offsets.push((dx as f32, dy as f32));
            }
        }
    }
    offsets
}
