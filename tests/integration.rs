use std::sync::Arc;

use image::{ImageFormat, Rgb, Rgba, RgbaImage};

use manga_overlay::cache::{CacheKey, TranslationCache};
use manga_overlay::detection::{self, BoundingBox, Region};
use manga_overlay::erase::{self, Ellipse, Erased};
use manga_overlay::layout;
use manga_overlay::sampling::{self, BubbleColors};
use manga_overlay::segments;
use manga_overlay::{
    Error, FixedTranslator, NoProgress, OverlayEngine, OverlayOptions, Result, TextDirection,
    TextRenderer,
};

const GRAY: Rgba<u8> = Rgba([128, 128, 128, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// Draws every character as a solid block half an em wide.
///
/// Mirrors the crate's `cfg(test)` renderer, which integration tests cannot
/// reach; keep it local rather than exporting a test helper.
struct Blocks;

impl TextRenderer for Blocks {
    #[allow(clippy::cast_precision_loss)]
    fn measure(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * 0.5
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn draw(
        &self,
        image: &mut RgbaImage,
        text: &str,
        center_x: f32,
        center_y: f32,
        font_size: f32,
        color: Rgb<u8>,
    ) {
        let half_w = self.measure(text, font_size) / 2.0;
        let half_h = font_size / 2.0;
        let (w, h) = (i64::from(image.width()), i64::from(image.height()));
        let x0 = ((center_x - half_w).floor() as i64).max(0);
        let x1 = ((center_x + half_w).floor() as i64).min(w);
        let y0 = ((center_y - half_h).floor() as i64).max(0);
        let y1 = ((center_y + half_h).floor() as i64).min(h);
        for y in y0..y1 {
            for x in x0..x1 {
                image.put_pixel(x as u32, y as u32, Rgba([color[0], color[1], color[2], 255]));
            }
        }
    }
}

fn engine() -> OverlayEngine<Blocks> {
    OverlayEngine::with_renderer(Blocks)
}

/// Gray page with white rectangles at `(x, y, w, h)`.
fn page(w: u32, h: u32, bubbles: &[(u32, u32, u32, u32)]) -> RgbaImage {
    let mut img = RgbaImage::from_pixel(w, h, GRAY);
    for &(bx, by, bw, bh) in bubbles {
        for y in by..by + bh {
            for x in bx..bx + bw {
                img.put_pixel(x, y, Rgba([250, 250, 250, 255]));
            }
        }
    }
    img
}

fn png(img: &RgbaImage) -> Vec<u8> {
    let mut out = Vec::new();
    img.write_to(&mut std::io::Cursor::new(&mut out), ImageFormat::Png)
        .unwrap();
    out
}

fn rgb_at(img: &RgbaImage, x: u32, y: u32) -> Rgb<u8> {
    let px = img.get_pixel(x, y);
    Rgb([px[0], px[1], px[2]])
}

#[test]
fn light_bubble_is_detected_sampled_and_erased_as_ellipse() {
    let img = page(400, 400, &[(50, 50, 200, 100)]);

    let regions = detection::detect_regions(&img, None);
    assert_eq!(regions.len(), 1);
    let expected = BoundingBox {
        x: 50,
        y: 50,
        width: 200,
        height: 100,
    };
    assert_eq!(regions[0].bbox, expected);

    let colors = sampling::sample_colors(&img, &expected);
    assert_eq!(colors, BubbleColors::LIGHT);
    assert_eq!((colors.background, colors.text), (WHITE, BLACK));

    let mut canvas = img.clone();
    let box_only = Region::new(expected, colors);
    assert_eq!(
        erase::erase_region(&mut canvas, &box_only),
        Erased::Ellipse(Ellipse {
            center: (150, 100),
            radius_x: 95,
            radius_y: 45,
        })
    );
}

#[test]
fn fixed_width_wrapping_is_exact() {
    #[allow(clippy::cast_precision_loss)]
    fn ten_per_char(s: &str) -> f32 {
        s.chars().count() as f32 * 10.0
    }
    let lines = layout::wrap_text("Hello world this is a test sentence", 180.0, ten_per_char);
    assert_eq!(lines, vec!["Hello world this", "is a test sentence"]);
}

#[test]
fn empty_page_uses_bottom_band() {
    let mut img = page(400, 400, &[]);
    assert!(detection::detect_regions(&img, None).is_empty());

    let band = detection::fallback_region(400, 400);
    assert_eq!(
        band.bbox,
        BoundingBox {
            x: 40,
            y: 330,
            width: 320,
            height: 60,
        }
    );

    let report = engine().overlay(&mut img, "Nothing to see", TextDirection::Ltr);
    assert!(report.fallback);
    assert_eq!(rgb_at(&img, 200, 360), BLACK);
}

#[test]
fn fifty_first_entry_evicts_the_first() {
    let cache = TranslationCache::default();
    for i in 0..51 {
        cache.insert(CacheKey::new(format!("{i:032x}"), "Arabic"), i.to_string());
    }
    assert_eq!(cache.len(), 50);
    assert!(cache.get(&CacheKey::new(format!("{:032x}", 0), "Arabic")).is_none());
    assert!(cache.get(&CacheKey::new(format!("{:032x}", 1), "Arabic")).is_some());
}

#[test]
fn reading_direction_decides_which_bubble_gets_the_first_sentence() {
    let bubbles = [(20, 100, 160, 100), (220, 100, 160, 100)];

    let mut rtl = page(400, 400, &bubbles);
    let report = engine().overlay(&mut rtl, "A. Hi there.", TextDirection::Rtl);
    assert_eq!((report.regions, report.drawn), (2, 2));
    assert_eq!(rgb_at(&rtl, 60, 150), BLACK, "long sentence on the left");
    assert_eq!(rgb_at(&rtl, 260, 150), WHITE, "short sentence on the right");

    let mut ltr = page(400, 400, &bubbles);
    engine().overlay(&mut ltr, "A. Hi there.", TextDirection::Ltr);
    assert_eq!(rgb_at(&ltr, 60, 150), WHITE);
    assert_eq!(rgb_at(&ltr, 260, 150), BLACK);
}

#[test]
fn structured_response_overrides_the_scan() {
    let img = page(400, 400, &[(50, 50, 200, 100)]);
    let response = r#"Regions: [
        {"x": 0.1, "y": 0.6, "width": 0.5, "height": 0.2, "text": "Placed"},
        {"x": 0.9, "y": 0.9, "width": 0, "height": 0.1, "text": "Gone"}
    ]"#;

    let hints = segments::parse_region_hints(response).unwrap();
    let regions = detection::detect_regions(&img, Some(&hints));
    assert_eq!(regions.len(), 1, "zero-width hint is dropped");
    assert_eq!(regions[0].text.as_deref(), Some("Placed"));

    let mut canvas = img.clone();
    let report = engine().overlay(&mut canvas, response, TextDirection::Ltr);
    assert!(report.external);
    assert_eq!(report.drawn, 1);
    assert_eq!(rgb_at(&canvas, 60, 60), Rgb([250, 250, 250]), "scan bubble untouched");
}

#[test]
fn engines_can_share_a_cache() {
    let cache = Arc::new(TranslationCache::new(4));
    let first = engine().with_cache(Arc::clone(&cache));
    let second = engine().with_cache(Arc::clone(&cache));
    let bytes = png(&page(300, 300, &[(50, 50, 200, 100)]));
    let opts = OverlayOptions::default();

    let out = first
        .translate_image(&bytes, &FixedTranslator::new("Hello"), &opts, &NoProgress)
        .unwrap();
    assert!(!out.cached);

    let unused = |_: &str, _: &str| -> Result<String> { Err(Error::translation("not called")) };
    let out = second
        .translate_image(&bytes, &unused, &opts, &NoProgress)
        .unwrap();
    assert!(out.cached);
    assert_eq!(out.translation, "Hello");
    assert_eq!(out.report.drawn, 1);
}

#[test]
fn process_file_writes_translated_image() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("page.png");
    page(300, 300, &[(50, 50, 200, 100)]).save(&input).unwrap();
    let output = dir.path().join("out").join("page.jpg");

    let result = engine().process_file(
        &input,
        &output,
        &FixedTranslator::new("Hello there."),
        &OverlayOptions::default(),
    );

    assert!(result.success, "{}", result.message);
    assert!(!result.skipped);
    assert_eq!(result.regions, 1);
    assert!(output.exists());
    let written = image::open(&output).unwrap();
    assert_eq!((written.width(), written.height()), (300, 300));
}

#[test]
fn process_file_reports_translation_failure() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("page.png");
    page(300, 300, &[]).save(&input).unwrap();
    let output = dir.path().join("page_translated.png");
    let failing = |_: &str, _: &str| -> Result<String> { Err(Error::translation("HTTP 503")) };

    let result = engine().process_file(&input, &output, &failing, &OverlayOptions::default());

    assert!(!result.success);
    assert!(result.message.contains("HTTP 503"), "{}", result.message);
    assert!(!output.exists());
}

#[test]
fn process_directory_isolates_failures() {
    let input_dir = tempfile::tempdir().unwrap();
    let output_dir = tempfile::tempdir().unwrap();
    page(300, 300, &[(50, 50, 200, 100)])
        .save(input_dir.path().join("good.png"))
        .unwrap();
    page(100, 100, &[])
        .save(input_dir.path().join("small.png"))
        .unwrap();
    std::fs::write(input_dir.path().join("broken.png"), b"not an image").unwrap();
    std::fs::write(input_dir.path().join("notes.txt"), b"ignored").unwrap();

    let mut results = engine().process_directory(
        input_dir.path(),
        output_dir.path(),
        &FixedTranslator::new("Hi!"),
        &OverlayOptions::default(),
    );
    results.sort_by(|a, b| a.path.cmp(&b.path));

    assert_eq!(results.len(), 3);
    let name = |i: usize| results[i].path.file_name().unwrap().to_str().unwrap();

    assert_eq!(name(0), "broken.png");
    assert!(!results[0].success);

    assert_eq!(name(1), "good.png");
    assert!(results[1].success && !results[1].skipped);
    assert!(output_dir.path().join("good.png").exists());

    assert_eq!(name(2), "small.png");
    assert!(results[2].success && results[2].skipped);
    assert!(!output_dir.path().join("small.png").exists());
}
