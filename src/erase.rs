//! Clearing the original lettering out of a bubble.
//!
//! Scan-detected regions know their exact pixels, so erasing follows the
//! bubble's real outline and leaves alpha alone. Regions from hints only have
//! a box; for those an ellipse inscribed in the padded box is filled instead.

use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_filled_ellipse_mut;

use crate::detection::Region;

/// Inset applied to every side of a box before fitting the ellipse.
const ELLIPSE_PADDING: f32 = 5.0;

/// Ellipse filled for regions without pixel membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ellipse {
    /// Center in pixels.
    pub center: (i32, i32),
    /// Horizontal radius.
    pub radius_x: i32,
    /// Vertical radius.
    pub radius_y: i32,
}

/// Ellipse inscribed in the region box shrunk by the padding.
///
/// `None` when either radius is not positive.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn ellipse_for(region: &Region) -> Option<Ellipse> {
    #[allow(clippy::cast_precision_loss)]
    let (w, h) = (region.bbox.width as f32, region.bbox.height as f32);
    let radius_x = (w / 2.0 - ELLIPSE_PADDING).floor();
    let radius_y = (h / 2.0 - ELLIPSE_PADDING).floor();
    if radius_x <= 0.0 || radius_y <= 0.0 {
        return None;
    }
    Some(Ellipse {
        center: (region.center_x.round() as i32, region.center_y.round() as i32),
        radius_x: radius_x as i32,
        radius_y: radius_y as i32,
    })
}

/// Overwrite the region with its background color.
///
/// Returns the number of pixels written through the membership path, or the
/// ellipse that was filled for box-only regions.
pub fn erase_region(image: &mut RgbaImage, region: &Region) -> Erased {
    let bg = region.colors.background;

    if let Some(pixels) = region.pixels.as_deref().filter(|p| !p.is_empty()) {
        let (w, h) = image.dimensions();
        let mut written = 0;
        for &(x, y) in pixels {
            if x >= w || y >= h {
                continue;
            }
            let px = image.get_pixel_mut(x, y);
            px[0] = bg[0];
            px[1] = bg[1];
            px[2] = bg[2];
            written += 1;
        }
        return Erased::Pixels(written);
    }

    match ellipse_for(region) {
        Some(ellipse) => {
            draw_filled_ellipse_mut(
                image,
                ellipse.center,
                ellipse.radius_x,
                ellipse.radius_y,
                Rgba([bg[0], bg[1], bg[2], 255]),
            );
            Erased::Ellipse(ellipse)
        }
        None => Erased::Nothing,
    }
}

/// What [`erase_region`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Erased {
    /// This many member pixels were recolored.
    Pixels(usize),
    /// The ellipse was filled.
    Ellipse(Ellipse),
    /// The box was too small for the padded ellipse.
    Nothing,
}
