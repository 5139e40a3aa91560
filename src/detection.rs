//! Speech-bubble region detection.
//!
//! Regions come from one of two sources:
//! 1. **Hints**: normalized boxes returned by a vision service, scaled into
//!    pixel space and colored by sampling the image.
//! 2. **Scan**: a brightness flood fill over a coarse grid that looks for
//!    large, roughly bubble-shaped areas that are either very light or very
//!    dark.
//!
//! Output order is discovery order. Reading order is applied later by
//! [`crate::segments::sort_regions`].

use image::RgbaImage;
use serde::{Deserialize, Deserializer};
use tracing::debug;

use crate::sampling::{self, BubbleColors};

/// Grid stride of the scan, in pixels.
const SCAN_STEP: u32 = 8;
/// Pixels darker than this seed and grow dark bubbles.
const DARK_THRESHOLD: f32 = 30.0;
/// Light threshold used for bright pages.
const LIGHT_THRESHOLD_BRIGHT_PAGE: f32 = 240.0;
/// Light threshold used for everything else.
const LIGHT_THRESHOLD_DEFAULT: f32 = 220.0;
/// Average page brightness above which a page counts as bright.
const BRIGHT_PAGE_AVERAGE: f32 = 180.0;
/// Absolute floor for the minimum region size, in pixels.
const MIN_REGION_PIXELS: usize = 500;
/// Minimum region size as a fraction of the image area.
const MIN_REGION_FRACTION: f64 = 0.005;
/// Maximum region size as a fraction of the image area.
const MAX_REGION_FRACTION: f64 = 0.25;
/// Accepted width/height ratio, exclusive on both ends.
const MIN_ASPECT: f32 = 0.2;
const MAX_ASPECT: f32 = 5.0;

/// Defaults for hint fields that are missing or not numbers.
const HINT_DEFAULT_WIDTH: f64 = 0.2;
const HINT_DEFAULT_HEIGHT: f64 = 0.1;

/// Axis-aligned box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoundingBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BoundingBox {
    /// Horizontal center.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center_x(&self) -> f32 {
        self.x as f32 + self.width as f32 / 2.0
    }

    /// Vertical center.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center_y(&self) -> f32 {
        self.y as f32 + self.height as f32 / 2.0
    }

    /// Whether the box covers no pixels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// A detected (or supplied) bubble.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    /// Pixel bounds, always inside the source image.
    pub bbox: BoundingBox,
    /// Horizontal center used for ordering and text placement.
    pub center_x: f32,
    /// Vertical center used for ordering and text placement.
    pub center_y: f32,
    /// Exact member pixels for scan-detected regions; `None` for hints.
    pub pixels: Option<Vec<(u32, u32)>>,
    /// Colors used to erase and redraw.
    pub colors: BubbleColors,
    /// Literal translated text carried by a structured vision response.
    pub text: Option<String>,
}

impl Region {
    /// Build a region centered on its box.
    #[must_use]
    pub fn new(bbox: BoundingBox, colors: BubbleColors) -> Self {
        Self {
            center_x: bbox.center_x(),
            center_y: bbox.center_y(),
            bbox,
            pixels: None,
            colors,
            text: None,
        }
    }

    /// Whether the source area was dark.
    #[must_use]
    pub fn is_dark(&self) -> bool {
        self.colors.is_dark
    }
}

/// One record of a structured vision response.
///
/// Coordinates are fractions of the image size. Fields that are missing or
/// not numbers take the defaults `x = 0`, `y = 0`, `width = 0.2`,
/// `height = 0.1`.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct RegionHint {
    /// Left edge as a fraction of the image width.
    #[serde(default, deserialize_with = "lenient_number")]
    pub x: Option<f64>,
    /// Top edge as a fraction of the image height.
    #[serde(default, deserialize_with = "lenient_number")]
    pub y: Option<f64>,
    /// Width as a fraction of the image width.
    #[serde(default, deserialize_with = "lenient_number")]
    pub width: Option<f64>,
    /// Height as a fraction of the image height.
    #[serde(default, deserialize_with = "lenient_number")]
    pub height: Option<f64>,
    /// Translated text for this region.
    #[serde(default, alias = "translation", deserialize_with = "lenient_string")]
    pub text: Option<String>,
}

fn lenient_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(serde_json::Value::deserialize(d)?.as_f64())
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(serde_json::Value::deserialize(d)?
        .as_str()
        .map(str::to_string))
}

impl RegionHint {
    /// Scale into pixel space after clamping every field into `[0, 1]`.
    ///
    /// The box is clipped to the image; `None` when nothing is left.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn to_pixels(&self, img_w: u32, img_h: u32) -> Option<BoundingBox> {
        let unit = |v: Option<f64>, default: f64| v.unwrap_or(default).clamp(0.0, 1.0);
        let scale = |f: f64, total: u32| (f * f64::from(total)).floor() as u32;

        let x = scale(unit(self.x, 0.0), img_w).min(img_w);
        let y = scale(unit(self.y, 0.0), img_h).min(img_h);
        let width = scale(unit(self.width, HINT_DEFAULT_WIDTH), img_w).min(img_w - x);
        let height = scale(unit(self.height, HINT_DEFAULT_HEIGHT), img_h).min(img_h - y);

        let bbox = BoundingBox {
            x,
            y,
            width,
            height,
        };
        (!bbox.is_empty()).then_some(bbox)
    }
}

/// Detect regions, preferring `hints` when any are supplied.
#[must_use]
pub fn detect_regions(image: &RgbaImage, hints: Option<&[RegionHint]>) -> Vec<Region> {
    match hints {
        Some(hints) if !hints.is_empty() => regions_from_hints(image, hints),
        _ => scan_regions(image),
    }
}

/// Turn normalized hints into regions, dropping any that collapse to zero area.
#[must_use]
pub fn regions_from_hints(image: &RgbaImage, hints: &[RegionHint]) -> Vec<Region> {
    let (w, h) = image.dimensions();
    let regions: Vec<Region> = hints
        .iter()
        .filter_map(|hint| {
            let bbox = hint.to_pixels(w, h)?;
            let mut region = Region::new(bbox, sampling::sample_colors(image, &bbox));
            region.text = hint
                .text
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string);
            Some(region)
        })
        .collect();
    debug!(hints = hints.len(), regions = regions.len(), "regions from hints");
    regions
}

/// Find light and dark bubbles with a grid-seeded flood fill.
#[must_use]
pub fn scan_regions(image: &RgbaImage) -> Vec<Region> {
    let (width, height) = image.dimensions();
    let total = (width as usize) * (height as usize);
    if total == 0 {
        return Vec::new();
    }

    let light_threshold = if sampling::average_brightness(image) > BRIGHT_PAGE_AVERAGE {
        LIGHT_THRESHOLD_BRIGHT_PAGE
    } else {
        LIGHT_THRESHOLD_DEFAULT
    };

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let (min_size, max_size) = (
        MIN_REGION_PIXELS.max((total as f64 * MIN_REGION_FRACTION) as usize),
        (total as f64 * MAX_REGION_FRACTION) as usize,
    );

    let mut fill = FloodFill::new(image, max_size);
    let mut regions = Vec::new();

    let mut y = SCAN_STEP;
    while y + SCAN_STEP < height {
        let mut x = SCAN_STEP;
        while x + SCAN_STEP < width {
            if !fill.is_visited(x, y) {
                let value = sampling::brightness(image.get_pixel(x, y));
                let kind = if value > light_threshold {
                    Some(Tone::Light(light_threshold))
                } else if value < DARK_THRESHOLD {
                    Some(Tone::Dark)
                } else {
                    None
                };

                if let Some(kind) = kind {
                    if let Some(region) = fill
                        .run(x, y, kind)
                        .and_then(|blob| blob.into_region(min_size))
                    {
                        regions.push(region);
                    }
                }
            }
            x += SCAN_STEP;
        }
        y += SCAN_STEP;
    }

    debug!(
        regions = regions.len(),
        light_threshold, min_size, max_size, "scan finished"
    );
    regions
}

/// Fallback region used when nothing was detected: a wide band near the
/// bottom of the image, centered at 90% of the height.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn fallback_region(width: u32, height: u32) -> Region {
    let (w, h) = (u64::from(width), u64::from(height));
    let box_h = h * 3 / 20;
    let bbox = BoundingBox {
        x: (w / 10) as u32,
        y: (h * 9 / 10).saturating_sub(box_h / 2) as u32,
        width: (w * 8 / 10) as u32,
        height: box_h as u32,
    };
    Region {
        bbox,
        center_x: width as f32 / 2.0,
        center_y: height as f32 * 0.9,
        pixels: None,
        colors: BubbleColors::LIGHT,
        text: None,
    }
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    /// Brighter than the contained threshold.
    Light(f32),
    Dark,
}

impl Tone {
    fn admits(self, value: f32) -> bool {
        match self {
            Self::Light(threshold) => value > threshold,
            Self::Dark => value < DARK_THRESHOLD,
        }
    }
}

/// Pixels collected by one fill.
struct Blob {
    pixels: Vec<(u32, u32)>,
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    tone: Tone,
}

impl Blob {
    fn into_region(self, min_size: usize) -> Option<Region> {
        if self.pixels.len() < min_size {
            return None;
        }
        let bbox = BoundingBox {
            x: self.min_x,
            y: self.min_y,
            width: self.max_x - self.min_x + 1,
            height: self.max_y - self.min_y + 1,
        };
        #[allow(clippy::cast_precision_loss)]
        let aspect = bbox.width as f32 / bbox.height as f32;
        if aspect <= MIN_ASPECT || aspect >= MAX_ASPECT {
            return None;
        }
        let colors = match self.tone {
            Tone::Light(_) => BubbleColors::LIGHT,
            Tone::Dark => BubbleColors::DARK,
        };
        let mut region = Region::new(bbox, colors);
        region.pixels = Some(self.pixels);
        Some(region)
    }
}

/// Flood-fill state scoped to one scan. The visited mask is shared by every
/// fill so a component is claimed by the first grid point that reaches it.
struct FloodFill<'a> {
    image: &'a RgbaImage,
    visited: Vec<bool>,
    max_size: usize,
    stack: Vec<(u32, u32)>,
}

impl<'a> FloodFill<'a> {
    fn new(image: &'a RgbaImage, max_size: usize) -> Self {
        let (w, h) = image.dimensions();
        Self {
            image,
            visited: vec![false; (w as usize) * (h as usize)],
            max_size,
            stack: Vec::new(),
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.image.width() as usize) + x as usize
    }

    fn is_visited(&self, x: u32, y: u32) -> bool {
        self.visited[self.index(x, y)]
    }

    /// 4-connected fill from `(x, y)`. Returns `None` when the component has
    /// more than `max_size` pixels, which is too large to be a bubble. The
    /// whole component is still marked visited so no later seed picks up
    /// what is left of it.
    fn run(&mut self, x: u32, y: u32, tone: Tone) -> Option<Blob> {
        let (width, height) = self.image.dimensions();
        let mut blob = Blob {
            pixels: Vec::new(),
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
            tone,
        };

        self.stack.clear();
        self.stack.push((x, y));
        let mut oversized = false;

        while let Some((px, py)) = self.stack.pop() {
            let idx = self.index(px, py);
            if self.visited[idx] {
                continue;
            }
            if !tone.admits(sampling::brightness(self.image.get_pixel(px, py))) {
                continue;
            }
            self.visited[idx] = true;

            if !oversized {
                if blob.pixels.len() == self.max_size {
                    oversized = true;
                    blob.pixels = Vec::new();
                } else {
                    blob.pixels.push((px, py));
                    blob.min_x = blob.min_x.min(px);
                    blob.max_x = blob.max_x.max(px);
                    blob.min_y = blob.min_y.min(py);
                    blob.max_y = blob.max_y.max(py);
                }
            }

            if px + 1 < width {
                self.stack.push((px + 1, py));
            }
            if px > 0 {
                self.stack.push((px - 1, py));
            }
            if py + 1 < height {
                self.stack.push((px, py + 1));
            }
            if py > 0 {
                self.stack.push((px, py - 1));
            }
        }

        (!oversized).then_some(blob)
    }
}
