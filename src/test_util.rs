use image::{Rgb, Rgba, RgbaImage};

use crate::font::TextRenderer;

/// Renderer that draws every character as a solid block half an em wide.
pub(crate) struct BlockGlyphs;

impl TextRenderer for BlockGlyphs {
    #[allow(clippy::cast_precision_loss)]
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * 0.5
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn draw(
        &self,
        image: &mut RgbaImage,
        text: &str,
        center_x: f32,
        center_y: f32,
        font_size: f32,
        color: Rgb<u8>,
    ) {
        let half_w = self.measure(text, font_size) / 2.0;
        let half_h = font_size / 2.0;
        let (w, h) = (i64::from(image.width()), i64::from(image.height()));
        let x0 = ((center_x - half_w).floor() as i64).max(0);
        let x1 = ((center_x + half_w).floor() as i64).min(w);
        let y0 = ((center_y - half_h).floor() as i64).max(0);
        let y1 = ((center_y + half_h).floor() as i64).min(h);
        for y in y0..y1 {
            for x in x0..x1 {
                image.put_pixel(x as u32, y as u32, Rgba([color[0], color[1], color[2], 255]));
            }
        }
    }
}
