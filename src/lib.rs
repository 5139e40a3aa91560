//! Redraw manga pages with translated text.
//!
//! Speech bubbles are found with a grid-seeded flood fill (or taken from a
//! structured vision response), erased to their background color, and the
//! translation is wrapped and drawn back into them with an outline in
//! reading order. Right-to-left languages are sorted and shaped accordingly.
//!
//! # Quick Start
//!
//! ```no_run
//! use manga_overlay::{FontSource, OverlayEngine, TextDirection};
//!
//! let engine = OverlayEngine::new(&FontSource::Default).expect("no usable font");
//! let mut img = image::open("page.png").unwrap().to_rgba8();
//! let report = engine.overlay(&mut img, "Hello there! Where are we?", TextDirection::Ltr);
//! println!("drew {} of {} bubbles", report.drawn, report.regions);
//! img.save("page_translated.png").unwrap();
//! ```
//!
//! # Translating
//!
//! The translation itself is delegated to a [`Translator`]. Results are cached
//! by image content and target language, so a page is only sent once.
//!
//! ```no_run
//! use manga_overlay::{FontSource, NoProgress, OverlayEngine, OverlayOptions, Result};
//!
//! let engine = OverlayEngine::new(&FontSource::Default).expect("no usable font");
//! let translator = |_image: &str, _lang: &str| -> Result<String> {
//!     Ok("مرحبا! كيف حالك؟".to_string())
//! };
//! let bytes = std::fs::read("page.jpg").unwrap();
//! let out = engine
//!     .translate_image(&bytes, &translator, &OverlayOptions::default(), &NoProgress)
//!     .unwrap();
//! out.image.save("page_translated.png").unwrap();
//! ```

#![deny(missing_docs)]

pub mod cache;
pub mod compose;
pub mod detection;
pub mod direction;
mod engine;
pub mod erase;
pub mod error;
pub mod font;
pub mod layout;
pub mod progress;
pub mod sampling;
pub mod segments;
pub mod translate;

#[cfg(test)]
mod test_util;

pub use cache::TranslationCache;
pub use detection::{BoundingBox, Region, RegionHint};
pub use direction::TextDirection;
pub use engine::{
    default_output_path, is_supported_image, save_image, OverlayEngine, OverlayOptions,
    OverlayReport, ProcessResult, TranslatedImage,
};
pub use error::{Error, Result};
pub use font::{FontSource, OverlayFont, TextRenderer};
pub use progress::{NoProgress, ProgressEvent, ProgressSink, Stage};
pub use translate::{FixedTranslator, Translator};
