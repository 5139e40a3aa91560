//! Pipeline orchestration: translate, detect, erase and redraw.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::buffer::ConvertBuffer;
use image::{ImageFormat, RgbImage, RgbaImage};
use tracing::{debug, info, warn};

use crate::cache::{self, CacheKey, TranslationCache};
use crate::compose;
use crate::detection;
use crate::direction::TextDirection;
use crate::erase;
use crate::error::{Error, Result};
use crate::font::{FontSource, OverlayFont, TextRenderer};
use crate::progress::{NoProgress, ProgressSink, Stage};
use crate::segments;
use crate::translate::{self, Translator};

/// Options controlling how images are translated.
#[derive(Debug, Clone)]
pub struct OverlayOptions {
    /// Language the translator is asked to produce.
    pub target_language: String,
    /// Text direction; derived from `target_language` when `None`.
    pub direction: Option<TextDirection>,
    /// Images must be larger than this on both sides.
    pub min_image_size: u32,
    /// Process images below `min_image_size` anyway.
    pub force: bool,
    /// Enable verbose logging.
    pub verbose: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            target_language: "Arabic".to_string(),
            direction: None,
            min_image_size: 200,
            force: false,
            verbose: false,
            quiet: false,
        }
    }
}

impl OverlayOptions {
    /// Direction used for sorting bubbles and shaping lines.
    #[must_use]
    pub fn text_direction(&self) -> TextDirection {
        self.direction
            .unwrap_or_else(|| TextDirection::for_language(&self.target_language))
    }
}

/// What [`OverlayEngine::overlay`] did to an image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverlayReport {
    /// Regions detected or taken from the structured response.
    pub regions: usize,
    /// Text blocks drawn.
    pub drawn: usize,
    /// Segments left over after every region got one.
    pub dropped_segments: usize,
    /// Nothing was detected and the text went into the bottom band.
    pub fallback: bool,
    /// Regions came from a structured response instead of the scan.
    pub external: bool,
}

/// A translated and redrawn image.
#[derive(Debug, Clone)]
pub struct TranslatedImage {
    /// The redrawn image.
    pub image: RgbaImage,
    /// Cleaned translation that was drawn.
    pub translation: String,
    /// Whether the translation came from the cache.
    pub cached: bool,
    /// Details of the redraw.
    pub report: OverlayReport,
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Whether the file was skipped (too small or no text).
    pub skipped: bool,
    /// Whether the translation came from the cache.
    pub cached: bool,
    /// Number of regions the text was drawn into.
    pub regions: usize,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            skipped: false,
            cached: false,
            regions: 0,
            message: String::new(),
        }
    }
}

/// Redraws manga pages with translated text.
///
/// Create once and reuse for many images. The engine holds the text renderer
/// and the translation cache; each call owns its own image buffer, so one
/// engine can serve many threads at once.
pub struct OverlayEngine<R = OverlayFont> {
    renderer: R,
    cache: Arc<TranslationCache>,
}

impl OverlayEngine<OverlayFont> {
    /// Create an engine drawing with the font from `font`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Font`] if no usable font can be loaded.
    pub fn new(font: &FontSource) -> Result<Self> {
        let font = OverlayFont::load(font)?;
        info!(family = font.family(), "overlay font loaded");
        Ok(Self::with_renderer(font))
    }
}

impl<R: TextRenderer + Sync> OverlayEngine<R> {
    /// Create an engine around any text renderer, with a fresh cache.
    pub fn with_renderer(renderer: R) -> Self {
        Self {
            renderer,
            cache: Arc::new(TranslationCache::default()),
        }
    }

    /// Share `cache` with other engines.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<TranslationCache>) -> Self {
        self.cache = cache;
        self
    }

    /// The translation cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<TranslationCache> {
        &self.cache
    }

    /// Erase the bubbles of `image` and draw `translation` into them.
    ///
    /// A translation holding a JSON array of regions is drawn region by
    /// region; anything else is split into sentences and handed to the
    /// detected bubbles in reading order. When nothing is detected the
    /// whole text goes into a band near the bottom of the image.
    pub fn overlay(
        &self,
        image: &mut RgbaImage,
        translation: &str,
        direction: TextDirection,
    ) -> OverlayReport {
        self.overlay_with_progress(image, translation, direction, &NoProgress)
    }

    fn overlay_with_progress(
        &self,
        image: &mut RgbaImage,
        translation: &str,
        direction: TextDirection,
        progress: &dyn ProgressSink,
    ) -> OverlayReport {
        let mut report = OverlayReport::default();
        let text = translate::clean_translation(translation);
        if text.is_empty() {
            return report;
        }

        progress.report(Stage::Detecting.into());
        let hints = segments::parse_region_hints(&text);
        report.external = hints.is_some();
        let mut regions = detection::detect_regions(image, hints.as_deref());
        report.regions = regions.len();

        progress.report(Stage::Compositing.into());
        if regions.is_empty() {
            let fallback_text = match &hints {
                Some(hints) => hints
                    .iter()
                    .filter_map(|h| h.text.as_deref())
                    .collect::<Vec<_>>()
                    .join(" "),
                None => text,
            };
            let region = detection::fallback_region(image.width(), image.height());
            debug!(bbox = ?region.bbox, "no regions, drawing into fallback band");
            compose::draw_text_block(image, &self.renderer, &fallback_text, &region, direction);
            report.fallback = true;
            report.drawn = 1;
            return report;
        }

        segments::sort_regions(&mut regions, direction);
        let pieces = if report.external {
            Vec::new()
        } else {
            segments::split_segments(&text)
        };
        let (assignments, dropped) = segments::assign_segments(&regions, &pieces);
        report.dropped_segments = dropped;

        for assignment in &assignments {
            erase::erase_region(image, assignment.region);
            if let Some(piece) = assignment.text {
                compose::draw_text_block(image, &self.renderer, piece, assignment.region, direction);
                report.drawn += 1;
            }
        }

        debug!(
            regions = report.regions,
            drawn = report.drawn,
            dropped = report.dropped_segments,
            external = report.external,
            "overlay finished"
        );
        report
    }

    /// Translate an encoded image and redraw it.
    ///
    /// Translations are cached by image content and target language, so the
    /// same page is only sent to `translator` once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Image`] if the bytes cannot be decoded,
    /// [`Error::ImageTooSmall`] for small images unless `options.force` is
    /// set, and the translator's error or [`Error::EmptyTranslation`] when
    /// no text comes back.
    pub fn translate_image(
        &self,
        bytes: &[u8],
        translator: &dyn Translator,
        options: &OverlayOptions,
        progress: &dyn ProgressSink,
    ) -> Result<TranslatedImage> {
        progress.report(Stage::Loading.into());
        let mut image = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = image.dimensions();
        let min = options.min_image_size;
        if !options.force && (width <= min || height <= min) {
            return Err(Error::ImageTooSmall { width, height, min });
        }

        let key = CacheKey::new(cache::content_hash(bytes), &options.target_language);
        let (translation, cached) = if let Some(text) = self.cache.get(&key) {
            progress.report(Stage::Cached.into());
            (text, true)
        } else {
            progress.report(Stage::Translating.into());
            let text = translate::translate_cleaned(
                translator,
                &translate::data_url(bytes),
                &options.target_language,
            )?;
            self.cache.insert(key, text.clone());
            (text, false)
        };

        let report = self.overlay_with_progress(
            &mut image,
            &translation,
            options.text_direction(),
            progress,
        );
        progress.report(Stage::Done.into());

        Ok(TranslatedImage {
            image,
            translation,
            cached,
            report,
        })
    }

    /// Process a single image file: read, translate, redraw, save.
    ///
    /// Returns a [`ProcessResult`] indicating success, skip, or failure.
    #[must_use]
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        translator: &dyn Translator,
        opts: &OverlayOptions,
    ) -> ProcessResult {
        let mut result = ProcessResult::new(input);

        let bytes = match std::fs::read(input) {
            Ok(bytes) => bytes,
            Err(e) => {
                result.message = format!("Failed to load: {e}");
                return result;
            }
        };

        let translated = match self.translate_image(&bytes, translator, opts, &NoProgress) {
            Ok(translated) => translated,
            Err(e @ (Error::ImageTooSmall { .. } | Error::EmptyTranslation)) => {
                result.skipped = true;
                result.success = true;
                result.message = e.to_string();
                return result;
            }
            Err(e) => {
                warn!(path = %input.display(), "translation failed: {e}");
                result.message = format!("Failed: {e}");
                return result;
            }
        };
        result.cached = translated.cached;
        result.regions = translated.report.regions;

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    result.message = format!("Failed to create output directory: {e}");
                    return result;
                }
            }
        }

        match save_image(&translated.image, output) {
            Ok(()) => {
                result.success = true;
                result.message = if translated.report.fallback {
                    "Translated (no bubbles found, text placed at bottom)".to_string()
                } else {
                    format!(
                        "Translated into {} of {} regions",
                        translated.report.drawn, translated.report.regions
                    )
                };
            }
            Err(e) => {
                result.message = format!("Failed to save: {e}");
            }
        }

        result
    }

    /// Process all supported images in a directory.
    ///
    /// Uses parallel iteration when the `cli` feature is enabled (via rayon).
    /// A failure on one image never stops the others. Returns a
    /// [`ProcessResult`] for each image found.
    #[must_use]
    pub fn process_directory(
        &self,
        input_dir: &Path,
        output_dir: &Path,
        translator: &dyn Translator,
        opts: &OverlayOptions,
    ) -> Vec<ProcessResult> {
        let inputs: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => {
                let mut result = ProcessResult::new(input_dir);
                result.message = format!("Failed to read directory: {e}");
                return vec![result];
            }
        };

        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                let mut result = ProcessResult::new(output_dir);
                result.message = format!("Failed to create output directory: {e}");
                return vec![result];
            }
        }

        let run = |input: &PathBuf| {
            let output = output_dir.join(input.file_name().unwrap_or_default());
            self.process_file(input, &output, translator, opts)
        };

        #[cfg(feature = "cli")]
        {
            use rayon::prelude::*;
            inputs.par_iter().map(run).collect()
        }

        #[cfg(not(feature = "cli"))]
        {
            inputs.iter().map(run).collect()
        }
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an image with format-specific settings.
///
/// JPEG output drops the alpha channel and uses quality 95.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Jpeg => {
            let rgb: RgbImage = img.convert();
            let file = std::io::BufWriter::new(std::fs::File::create(path)?);
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 95);
            encoder.encode_image(&rgb)?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            img.save_with_format(path, format)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default output path from an input path.
///
/// Example: `"page.jpg"` becomes `"page_translated.jpg"`.
#[must_use]
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_translated.{ext}"))
}
