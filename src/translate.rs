//! The translation capability the pipeline calls out to.
//!
//! Provider-specific request and response handling lives outside this crate.
//! The pipeline hands an image over as a `data:` URL together with the target
//! language and gets translated text back, either plain text (one bubble per
//! sentence or line) or a JSON array of regions with text.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::error::{Error, Result};

/// A service that extracts and translates the text of an image.
pub trait Translator: Send + Sync {
    /// Translate `source` into `target_language`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Translation`] when the service call fails.
    fn translate(&self, source: &str, target_language: &str) -> Result<String>;
}

impl<F> Translator for F
where
    F: Fn(&str, &str) -> Result<String> + Send + Sync,
{
    fn translate(&self, source: &str, target_language: &str) -> Result<String> {
        self(source, target_language)
    }
}

/// Translator that always answers with the same text, for translations
/// produced ahead of time.
#[derive(Debug, Clone)]
pub struct FixedTranslator {
    text: String,
}

impl FixedTranslator {
    /// Answer every request with `text`.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Translator for FixedTranslator {
    fn translate(&self, _source: &str, _target_language: &str) -> Result<String> {
        Ok(self.text.clone())
    }
}

/// Encode image bytes as a `data:` URL, guessing the MIME type from the
/// content and falling back to JPEG.
#[must_use]
pub fn data_url(bytes: &[u8]) -> String {
    let mime = image::guess_format(bytes).map_or("image/jpeg", |f| f.to_mime_type());
    format!("data:{mime};base64,{}", BASE64.encode(bytes))
}

/// Trim a translation and collapse runs of three or more newlines to two.
#[must_use]
pub fn clean_translation(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;
    for ch in text.trim().chars() {
        if ch == '\n' {
            newlines += 1;
            if newlines > 2 {
                continue;
            }
        } else {
            newlines = 0;
        }
        out.push(ch);
    }
    out
}

/// Call `translator` and reject empty answers.
///
/// # Errors
///
/// Propagates the translator's error, or [`Error::EmptyTranslation`] when
/// the cleaned answer is empty.
pub fn translate_cleaned(
    translator: &dyn Translator,
    source: &str,
    target_language: &str,
) -> Result<String> {
    let cleaned = clean_translation(&translator.translate(source, target_language)?);
    if cleaned.is_empty() {
        return Err(Error::EmptyTranslation);
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_long_newline_runs() {
        assert_eq!(clean_translation("  a\n\n\n\nb\n\nc \n"), "a\n\nb\n\nc");
    }

    #[test]
    fn data_url_detects_png() {
        let mut png = Vec::new();
        image::RgbaImage::new(1, 1)
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();
        assert!(data_url(&png).starts_with("data:image/png;base64,iVBOR"));
        assert!(data_url(b"???").starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn closures_are_translators() {
        let upper = |s: &str, _: &str| -> Result<String> { Ok(s.to_uppercase()) };
        assert_eq!(upper.translate("hi", "English").unwrap(), "HI");
    }

    #[test]
    fn empty_answers_are_rejected() {
        let blank = FixedTranslator::new(" \n\n ");
        assert!(matches!(
            translate_cleaned(&blank, "src", "Arabic"),
            Err(Error::EmptyTranslation)
        ));
    }

    #[test]
    fn failures_propagate() {
        let failing = |_: &str, _: &str| -> Result<String> { Err(Error::translation("HTTP 500")) };
        let err = translate_cleaned(&failing, "src", "Arabic").unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }
}
