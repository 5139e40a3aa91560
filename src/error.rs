//! Error types for the manga-overlay crate.

/// Errors that can occur while translating and redrawing an image.
///
/// Detection, erasing and compositing never fail; only I/O, decoding, font
/// loading and the upstream translation call produce errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The translation service failed for this image.
    #[error("translation failed: {message}")]
    Translation {
        /// Human-readable description from the service or transport.
        message: String,
    },

    /// The translation service returned no usable text.
    #[error("no text found in image")]
    EmptyTranslation,

    /// The image is below the minimum size worth translating.
    #[error("image too small ({width}x{height}), must be larger than {min}x{min}")]
    ImageTooSmall {
        /// Image width in pixels.
        width: u32,
        /// Image height in pixels.
        height: u32,
        /// Both sides must exceed this many pixels.
        min: u32,
    },

    /// No usable font could be loaded for drawing text.
    #[error("font error: {0}")]
    Font(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred while decoding or encoding an image.
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    /// Build a [`Error::Translation`] from anything printable.
    pub fn translation(message: impl Into<String>) -> Self {
        Self::Translation {
            message: message.into(),
        }
    }
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let unsupported = Error::UnsupportedFormat("tiff".to_string());
        assert!(unsupported.to_string().contains("tiff"));

        let too_small = Error::ImageTooSmall {
            width: 10,
            height: 20,
            min: 200,
        };
        let msg = too_small.to_string();
        assert!(msg.contains("10x20"));
        assert!(msg.contains("200x200"));
    }

    #[test]
    fn translation_error_keeps_message() {
        let err = Error::translation("HTTP 429");
        assert_eq!(err.to_string(), "translation failed: HTTP 429");
    }
}
