//! Font loading and glyph drawing.

use std::path::{Path, PathBuf};

use ab_glyph::{Font, FontArc, FontVec, PxScale, ScaleFont};
use image::{Rgb, Rgba, RgbaImage};
use imageproc::drawing::{draw_text_mut, text_size};
use tracing::debug;

use crate::error::{Error, Result};

/// Families tried, in order, when no font is configured.
pub const DEFAULT_FAMILIES: &[&str] = &[
    "Noto Sans Arabic",
    "Noto Sans JP",
    "Noto Sans KR",
    "Segoe UI",
    "Arial",
    "sans-serif",
];

/// Measures and draws single lines of text.
///
/// Implementations place text centered on a point, with the point on the
/// vertical middle of the line box.
pub trait TextRenderer {
    /// Advance width of `text` at `font_size` pixels.
    fn measure(&self, text: &str, font_size: f32) -> f32;

    /// Draw `text` centered on `(center_x, center_y)`.
    fn draw(
        &self,
        image: &mut RgbaImage,
        text: &str,
        center_x: f32,
        center_y: f32,
        font_size: f32,
        color: Rgb<u8>,
    );
}

/// Where to get the overlay font from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FontSource {
    /// A font file on disk (TTF, OTF or collection).
    Path(PathBuf),
    /// A family looked up in the system font database.
    Family(String),
    /// The first available family of [`DEFAULT_FAMILIES`].
    #[default]
    Default,
}

/// A loaded font used for drawing translated text.
#[derive(Clone)]
pub struct OverlayFont {
    font: FontArc,
    family: String,
}

impl std::fmt::Debug for OverlayFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverlayFont")
            .field("family", &self.family)
            .finish_non_exhaustive()
    }
}

impl OverlayFont {
    /// Load according to `source`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Font`] if no matching font can be found or parsed.
    pub fn load(source: &FontSource) -> Result<Self> {
        match source {
            FontSource::Path(path) => Self::from_path(path),
            FontSource::Family(family) => Self::from_family(family),
            FontSource::Default => {
                let db = system_fonts();
                DEFAULT_FAMILIES
                    .iter()
                    .find_map(|family| query_family(&db, family).ok())
                    .ok_or_else(|| Error::Font("no fallback fonts found".to_string()))
            }
        }
    }

    /// Parse font bytes, taking face `index` of a collection.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Font`] if the data is not a valid font.
    pub fn from_bytes(data: Vec<u8>, index: u32, family: impl Into<String>) -> Result<Self> {
        let font = FontVec::try_from_vec_and_index(data, index)
            .map_err(|e| Error::Font(format!("failed to parse font: {e}")))?;
        Ok(Self {
            font: FontArc::new(font),
            family: family.into(),
        })
    }

    /// Load the first face of a font file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Font`] if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .map_err(|e| Error::Font(format!("failed to read font {}: {e}", path.display())))?;
        let family = path
            .file_stem()
            .map_or_else(String::new, |s| s.to_string_lossy().to_string());
        Self::from_bytes(data, 0, family)
    }

    /// Look up a family in the system font database, preferring bold.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Font`] if the family is not installed.
    pub fn from_family(family: &str) -> Result<Self> {
        query_family(&system_fonts(), family)
    }

    /// Family name the font was resolved from.
    #[must_use]
    pub fn family(&self) -> &str {
        &self.family
    }
}

fn system_fonts() -> fontdb::Database {
    let mut db = fontdb::Database::new();
    db.load_system_fonts();
    db
}

fn query_family(db: &fontdb::Database, family: &str) -> Result<OverlayFont> {
    let families = if family.eq_ignore_ascii_case("sans-serif") {
        [fontdb::Family::SansSerif]
    } else {
        [fontdb::Family::Name(family)]
    };
    let query = fontdb::Query {
        families: &families,
        weight: fontdb::Weight::BOLD,
        ..Default::default()
    };
    let id = db
        .query(&query)
        .ok_or_else(|| Error::Font(format!("font not found: {family}")))?;
    let (data, index) = db
        .with_face_data(id, |data, index| (data.to_vec(), index))
        .ok_or_else(|| Error::Font(format!("failed to load font data: {family}")))?;
    debug!(family, index, "resolved overlay font");
    OverlayFont::from_bytes(data, index, family)
}

impl TextRenderer for OverlayFont {
    #[allow(clippy::cast_precision_loss)]
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        let (width, _) = text_size(PxScale::from(font_size), &self.font, text);
        width as f32
    }

    #[allow(clippy::cast_possible_truncation)]
    fn draw(
        &self,
        image: &mut RgbaImage,
        text: &str,
        center_x: f32,
        center_y: f32,
        font_size: f32,
        color: Rgb<u8>,
    ) {
        let scale = PxScale::from(font_size);
        let scaled = self.font.as_scaled(scale);
        let line_box = scaled.ascent() - scaled.descent();
        let x = center_x - self.measure(text, font_size) / 2.0;
        let y = center_y - line_box / 2.0;
        draw_text_mut(
            image,
            Rgba([color[0], color[1], color[2], 255]),
            x.round() as i32,
            y.round() as i32,
            scale,
            &self.font,
            text,
        );
    }
}
