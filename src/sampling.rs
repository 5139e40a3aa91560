//! Brightness sampling used to pick background and text colors.

use image::{Rgb, Rgba, RgbaImage};

use crate::detection::BoundingBox;

/// Mean brightness below which a sampled area counts as dark.
const DARK_SAMPLE_THRESHOLD: f32 = 128.0;

/// Pure white.
pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
/// Pure black.
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

/// Background and text colors used to redraw a bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BubbleColors {
    /// Fill used for erasing and for the text outline.
    pub background: Rgb<u8>,
    /// Fill used for the text glyphs.
    pub text: Rgb<u8>,
    /// Whether the source area was classified as dark.
    pub is_dark: bool,
}

impl BubbleColors {
    /// Black text on a white background.
    pub const LIGHT: Self = Self {
        background: WHITE,
        text: BLACK,
        is_dark: false,
    };

    /// White text on a black background.
    pub const DARK: Self = Self {
        background: BLACK,
        text: WHITE,
        is_dark: true,
    };
}

impl Default for BubbleColors {
    fn default() -> Self {
        Self::LIGHT
    }
}

/// Brightness of a pixel as the plain mean of its RGB channels.
#[must_use]
pub fn brightness(px: &Rgba<u8>) -> f32 {
    (f32::from(px[0]) + f32::from(px[1]) + f32::from(px[2])) / 3.0
}

/// Average brightness of the image, sampling every 4th pixel in raster order.
///
/// Returns 255 for an empty image so it reads as "bright".
#[must_use]
pub fn average_brightness(image: &RgbaImage) -> f32 {
    let mut total = 0.0_f64;
    let mut count = 0_u64;
    for px in image.pixels().step_by(4) {
        total += f64::from(brightness(px));
        count += 1;
    }
    if count == 0 {
        return 255.0;
    }
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    {
        (total / count as f64) as f32
    }
}

/// Pick bubble colors from the central 50%x50% of `bbox`.
///
/// The sample rectangle keeps a 25% margin on every side and is clipped to the
/// image. An empty sample yields [`BubbleColors::LIGHT`].
#[must_use]
pub fn sample_colors(image: &RgbaImage, bbox: &BoundingBox) -> BubbleColors {
    let (img_w, img_h) = image.dimensions();

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let (x, y, w, h) = {
        let x = (bbox.x as f32 + bbox.width as f32 * 0.25).floor() as u32;
        let y = (bbox.y as f32 + bbox.height as f32 * 0.25).floor() as u32;
        let w = ((bbox.width as f32 * 0.5).floor() as u32).min(img_w.saturating_sub(x));
        let h = ((bbox.height as f32 * 0.5).floor() as u32).min(img_h.saturating_sub(y));
        (x, y, w, h)
    };

    if w == 0 || h == 0 {
        return BubbleColors::default();
    }

    let mut total = 0.0_f64;
    for py in y..y + h {
        for px in x..x + w {
            total += f64::from(brightness(image.get_pixel(px, py)));
        }
    }
    let mean = total / (f64::from(w) * f64::from(h));

    if mean < f64::from(DARK_SAMPLE_THRESHOLD) {
        BubbleColors::DARK
    } else {
        BubbleColors::LIGHT
    }
}
