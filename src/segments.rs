//! Splitting a translation into per-bubble pieces and matching them to
//! regions in reading order.

use tracing::debug;

use crate::detection::{Region, RegionHint};
use crate::direction::TextDirection;

/// Regions whose vertical centers are closer than this share a row.
const SAME_ROW_DISTANCE: f32 = 50.0;

/// Characters that end a segment: Latin and full-width sentence punctuation
/// plus line breaks.
const SEGMENT_BREAKS: &[char] = &['.', '!', '?', '。', '！', '？', '\n', '\r'];

/// One piece of translated text destined for a single bubble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSegment {
    /// Trimmed, non-empty text.
    pub text: String,
    /// Position among the segments of the translation.
    pub order: usize,
}

/// A region paired with the text drawn into it, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assignment<'a> {
    /// Target region.
    pub region: &'a Region,
    /// Text for the region; `None` leaves it erased and blank.
    pub text: Option<&'a str>,
}

/// Split a translation on sentence punctuation and newlines.
#[must_use]
pub fn split_segments(text: &str) -> Vec<TextSegment> {
    text.split(SEGMENT_BREAKS)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .enumerate()
        .map(|(order, t)| TextSegment {
            text: t.to_string(),
            order,
        })
        .collect()
}

/// Extract per-region records from a structured vision response.
///
/// Looks for a JSON array between the first `[` and the last `]`. Records
/// without text are dropped. `None` when there is no parsable array or
/// nothing is left.
#[must_use]
pub fn parse_region_hints(response: &str) -> Option<Vec<RegionHint>> {
    let start = response.find('[')?;
    let end = response.rfind(']')?;
    if end <= start {
        return None;
    }

    let hints: Vec<RegionHint> = match serde_json::from_str(&response[start..=end]) {
        Ok(hints) => hints,
        Err(e) => {
            debug!("response is not a region array: {e}");
            return None;
        }
    };

    let hints: Vec<RegionHint> = hints
        .into_iter()
        .filter(|h| h.text.as_deref().is_some_and(|t| !t.trim().is_empty()))
        .collect();
    (!hints.is_empty()).then_some(hints)
}

/// Sort regions top to bottom, then across each row in reading direction.
///
/// Regions are ordered by vertical center and grouped into rows: a region
/// joins the current row while its center is within 50 px of the row's
/// first region. Rows are then ordered right to left for RTL and left to
/// right otherwise, so any two regions 50 px or more apart vertically keep
/// their top-to-bottom order.
pub fn sort_regions(regions: &mut [Region], direction: TextDirection) {
    regions.sort_by(|a, b| a.center_y.total_cmp(&b.center_y));

    let mut start = 0;
    while start < regions.len() {
        let anchor = regions[start].center_y;
        let end = regions[start..]
            .iter()
            .position(|r| r.center_y - anchor >= SAME_ROW_DISTANCE)
            .map_or(regions.len(), |offset| start + offset);

        let row = &mut regions[start..end];
        if direction.is_rtl() {
            row.sort_by(|a, b| b.center_x.total_cmp(&a.center_x));
        } else {
            row.sort_by(|a, b| a.center_x.total_cmp(&b.center_x));
        }
        start = end;
    }
}

/// Pair sorted regions with text.
///
/// When any region carries its own text from a structured response, every
/// region uses its own text verbatim. Otherwise the translation is split
/// with [`split_segments`] and handed out by index: surplus regions stay
/// blank and surplus segments are dropped. Returns the assignments and the
/// number of dropped segments.
#[must_use]
pub fn assign_segments<'a>(
    regions: &'a [Region],
    segments: &'a [TextSegment],
) -> (Vec<Assignment<'a>>, usize) {
    if regions.iter().any(|r| r.text.is_some()) {
        let assignments = regions
            .iter()
            .map(|region| Assignment {
                region,
                text: region.text.as_deref(),
            })
            .collect();
        return (assignments, 0);
    }

    let assignments = regions
        .iter()
        .enumerate()
        .map(|(i, region)| Assignment {
            region,
            text: segments.get(i).map(|s| s.text.as_str()),
        })
        .collect();
    let dropped = segments.len().saturating_sub(regions.len());
    if dropped > 0 {
        debug!(
            dropped,
            regions = regions.len(),
            "more segments than regions"
        );
    }
    (assignments, dropped)
}
