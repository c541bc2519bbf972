use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use overlay_editor::color_sampler::ColorSampler;
use overlay_editor::error::EnhanceError;
use overlay_editor::{BoundingBox, Detection, RgbColor};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

// Red page with a block of blue "text" in the left half of the box at (20, 20, 40x20)
fn red_page_with_blue_text() -> RgbaImage {
    let mut image = RgbaImage::from_pixel(100, 100, RED);
    for y in 20..40 {
        for x in 20..40 {
            image.put_pixel(x, y, BLUE);
        }
    }
    image
}

fn detection(index: usize, bounds: BoundingBox) -> Detection {
    Detection {
        index,
        polygon: vec![
            [bounds.x, bounds.y],
            [bounds.right(), bounds.y],
            [bounds.right(), bounds.bottom()],
            [bounds.x, bounds.bottom()],
        ],
        text: format!("region {}", index),
        confidence: 0.9,
        text_color: RgbColor::BLACK,
        bg_color: RgbColor::WHITE,
        font_size: 16.0,
        bounds,
    }
}

fn png_bytes(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

#[test]
fn test_text_on_colored_page() {
    let image = red_page_with_blue_text();
    let sampler = ColorSampler::default();
    let bounds = BoundingBox::new(20.0, 20.0, 40.0, 20.0);

    assert_eq!(sampler.sample_background(&image, &bounds), RgbColor::new(255, 0, 0));
    assert_eq!(sampler.sample_foreground(&image, &bounds), RgbColor::new(0, 0, 255));
}

#[test]
fn test_blue_glyphs_on_red_page() {
    // Red page; the box at (10, 10, 50x20) holds a stripe of blue glyphs
    let image = RgbaImage::from_fn(100, 100, |x, y| {
        if (20..40).contains(&x) && (15..25).contains(&y) {
            BLUE
        } else {
            RED
        }
    });
    let sampler = ColorSampler::default();
    let bounds = BoundingBox::new(10.0, 10.0, 50.0, 20.0);

    assert_eq!(sampler.sample_background(&image, &bounds), RgbColor::new(255, 0, 0));
    assert_eq!(sampler.sample_foreground(&image, &bounds), RgbColor::new(0, 0, 255));
}

#[test]
fn test_enhance_from_encoded_image() {
    let bytes = png_bytes(&red_page_with_blue_text());
    let input = vec![
        detection(0, BoundingBox::new(20.0, 20.0, 40.0, 20.0)),
        detection(1, BoundingBox::new(500.0, 500.0, 10.0, 10.0)),
    ];

    let enhanced = ColorSampler::default().enhance(&input, &bytes).unwrap();

    assert_eq!(enhanced.len(), 2);
    assert_eq!(enhanced[0].bg_color, RgbColor::new(255, 0, 0));
    assert_eq!(enhanced[0].text_color, RgbColor::new(0, 0, 255));
    // Entirely outside the image
    assert_eq!(enhanced[1].bg_color, RgbColor::WHITE);
    assert_eq!(enhanced[1].text_color, RgbColor::BLACK);

    // Everything except the colors is carried over
    assert_eq!(enhanced[0].text, input[0].text);
    assert_eq!(enhanced[0].polygon, input[0].polygon);
    assert_eq!(enhanced[0].bounds, input[0].bounds);
    // Input stays untouched
    assert_eq!(input[0].bg_color, RgbColor::WHITE);
}

#[test]
fn test_box_flush_with_image_edges_falls_back_to_white() {
    let image = RgbaImage::from_pixel(40, 20, Rgba([10, 200, 10, 255]));
    let sampler = ColorSampler::default();
    // No side has a margin of image left beyond the box
    let bounds = BoundingBox::new(2.0, 2.0, 36.0, 16.0);

    assert_eq!(sampler.sample_background(&image, &bounds), RgbColor::WHITE);
    // Uniform region: darkest pixel is the only pixel color
    assert_eq!(sampler.sample_foreground(&image, &bounds), RgbColor::new(10, 200, 10));
}

#[test]
fn test_single_side_is_enough() {
    let mut image = RgbaImage::from_pixel(60, 30, Rgba([0, 0, 0, 255]));
    for y in 0..30 {
        for x in 45..60 {
            image.put_pixel(x, y, Rgba([0, 128, 0, 255]));
        }
    }
    let sampler = ColorSampler::default();
    // Only the right strip qualifies
    let bounds = BoundingBox::new(0.0, 0.0, 45.0, 30.0);

    assert_eq!(sampler.sample_background(&image, &bounds), RgbColor::new(0, 128, 0));
}

#[test]
fn test_undecodable_bytes() {
    let input = vec![detection(0, BoundingBox::new(0.0, 0.0, 10.0, 10.0))];
    let result = ColorSampler::default().enhance(&input, b"not an image");

    assert!(matches!(result, Err(EnhanceError::Decode(_))));
}
