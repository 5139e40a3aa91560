//! Script direction of the target language.

use std::borrow::Cow;

use unicode_bidi::{BidiInfo, Level};

/// Horizontal direction of the translated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextDirection {
    /// Left to right.
    #[default]
    Ltr,
    /// Right to left.
    Rtl,
}

/// Languages written right to left, by English name or ISO 639 code.
const RTL_LANGUAGES: &[&str] = &[
    "arabic", "ar", "ara", "hebrew", "he", "heb", "persian", "farsi", "fa", "fas", "urdu", "ur",
    "urd",
];

impl TextDirection {
    /// Direction for a target language name such as `"Arabic"` or `"he"`.
    #[must_use]
    pub fn for_language(language: &str) -> Self {
        let language = language.trim().to_lowercase();
        if RTL_LANGUAGES.contains(&language.as_str()) {
            Self::Rtl
        } else {
            Self::Ltr
        }
    }

    /// Whether this is right to left.
    #[must_use]
    pub fn is_rtl(self) -> bool {
        self == Self::Rtl
    }

    fn level(self) -> Level {
        match self {
            Self::Ltr => Level::ltr(),
            Self::Rtl => Level::rtl(),
        }
    }
}

/// Reorder one line from logical to visual order for left-to-right glyph
/// placement.
#[must_use]
pub fn visual_order(line: &str, direction: TextDirection) -> Cow<'_, str> {
    let info = BidiInfo::new(line, Some(direction.level()));
    match info.paragraphs.first() {
        Some(para) => info.reorder_line(para, para.range.clone()),
        None => Cow::Borrowed(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arabic_and_hebrew_are_rtl() {
        assert_eq!(TextDirection::for_language("Arabic"), TextDirection::Rtl);
        assert_eq!(TextDirection::for_language(" he "), TextDirection::Rtl);
        assert_eq!(TextDirection::for_language("Farsi"), TextDirection::Rtl);
    }

    #[test]
    fn other_languages_are_ltr() {
        assert_eq!(TextDirection::for_language("English"), TextDirection::Ltr);
        assert_eq!(TextDirection::for_language("Japanese"), TextDirection::Ltr);
        assert_eq!(TextDirection::for_language(""), TextDirection::Ltr);
    }

    #[test]
    fn latin_text_is_unchanged() {
        assert_eq!(visual_order("hello world", TextDirection::Ltr), "hello world");
    }

    #[test]
    fn hebrew_is_reversed_for_display() {
        assert_eq!(visual_order("שלום", TextDirection::Rtl), "םולש");
    }

    #[test]
    fn empty_line_is_passed_through() {
        assert_eq!(visual_order("", TextDirection::Rtl), "");
    }
}
