//! Background and foreground color estimation from raw pixels.
//!
//! Everything here is pure pixel math over an already decoded
//! [`RgbaImage`]. Degenerate or out-of-image regions never fail; they fall
//! back to white (background) or black (foreground).

use image::RgbaImage;

use crate::config::EditorConfig;
use crate::detection::{BoundingBox, Detection, RgbColor};
use crate::error::EnhanceError;

pub const DEFAULT_MARGIN: u32 = 5;
pub const DEFAULT_SAMPLES_PER_STRIP: usize = 50;

/// Pixel rectangle clamped to the image, half-open on the far edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelRegion {
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
}

impl PixelRegion {
    /// Round and clamp a floating rectangle to the image extent.
    /// Returns `None` when nothing of it is left.
    fn clamped(image: &RgbaImage, x: f32, y: f32, width: f32, height: f32) -> Option<Self> {
        let (img_w, img_h) = (image.width() as i64, image.height() as i64);
        let x1 = (x.round() as i64).max(0);
        let y1 = (y.round() as i64).max(0);
        let x2 = ((x + width).round() as i64).min(img_w);
        let y2 = ((y + height).round() as i64).min(img_h);

        if x2 <= x1 || y2 <= y1 {
            return None;
        }
        Some(Self {
            x1: x1 as u32,
            y1: y1 as u32,
            x2: x2 as u32,
            y2: y2 as u32,
        })
    }

    fn pixel_count(&self) -> usize {
        (self.x2 - self.x1) as usize * (self.y2 - self.y1) as usize
    }

    /// Row-major pixel coordinates
    fn coords(self) -> impl Iterator<Item = (u32, u32)> {
        (self.y1..self.y2).flat_map(move |y| (self.x1..self.x2).map(move |x| (x, y)))
    }
}

fn rgb_at(image: &RgbaImage, x: u32, y: u32) -> RgbColor {
    let [r, g, b, _] = image.get_pixel(x, y).0;
    RgbColor::new(r, g, b)
}

fn luma(color: RgbColor) -> f64 {
    0.299 * color.r as f64 + 0.587 * color.g as f64 + 0.114 * color.b as f64
}

/// Per-channel median: each channel is sorted and indexed on its own, so
/// the result does not depend on sample order. `None` for no samples.
pub fn median_color(samples: &[RgbColor]) -> Option<RgbColor> {
    if samples.is_empty() {
        return None;
    }

    let mut rs: Vec<u8> = samples.iter().map(|c| c.r).collect();
    let mut gs: Vec<u8> = samples.iter().map(|c| c.g).collect();
    let mut bs: Vec<u8> = samples.iter().map(|c| c.b).collect();
    rs.sort_unstable();
    gs.sort_unstable();
    bs.sort_unstable();

    let mid = samples.len() / 2;
    Some(RgbColor::new(rs[mid], gs[mid], bs[mid]))
}

/// Estimates detection colors from the pixels around and inside its bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSampler {
    margin: u32,
    samples_per_strip: usize,
}

impl Default for ColorSampler {
    fn default() -> Self {
        Self::new(DEFAULT_MARGIN, DEFAULT_SAMPLES_PER_STRIP)
    }
}

impl ColorSampler {
    pub fn new(margin: u32, samples_per_strip: usize) -> Self {
        Self {
            margin,
            samples_per_strip: samples_per_strip.max(1),
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        Self::new(config.background_margin, config.samples_per_strip)
    }

    pub fn margin(&self) -> u32 {
        self.margin
    }

    /// Subsample one strip so that roughly `samples_per_strip` pixels are read
    fn sample_strip(
        &self,
        image: &RgbaImage,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        out: &mut Vec<RgbColor>,
    ) {
        let Some(region) = PixelRegion::clamped(image, x, y, width, height) else {
            return;
        };
        let step = (region.pixel_count() / self.samples_per_strip).max(1);
        out.extend(
            region
                .coords()
                .step_by(step)
                .map(|(px, py)| rgb_at(image, px, py)),
        );
    }

    /// Median color of the strips just outside `bounds`.
    ///
    /// A strip is only read on a side that has at least `margin` pixels of
    /// image beyond the bounds. White when no side qualifies.
    pub fn sample_background(&self, image: &RgbaImage, bounds: &BoundingBox) -> RgbColor {
        let m = self.margin as f32;
        let (img_w, img_h) = (image.width() as f32, image.height() as f32);
        let BoundingBox { x, y, width: w, height: h } = *bounds;
        let mut samples = Vec::with_capacity(self.samples_per_strip * 4);

        if y > m {
            self.sample_strip(image, x, (y - m).max(0.0), w, m, &mut samples);
        }
        if y + h + m < img_h {
            self.sample_strip(image, x, y + h, w, m, &mut samples);
        }
        if x > m {
            self.sample_strip(image, (x - m).max(0.0), y, m, h, &mut samples);
        }
        if x + w + m < img_w {
            self.sample_strip(image, x + w, y, m, h, &mut samples);
        }

        median_color(&samples).unwrap_or(RgbColor::WHITE)
    }

    /// Median color of the "ink" inside `bounds`: pixels whose luma falls
    /// below the region's mean luma. A uniform region has no ink and
    /// yields its darkest pixel instead. Black when the region is empty.
    pub fn sample_foreground(&self, image: &RgbaImage, bounds: &BoundingBox) -> RgbColor {
        let Some(region) =
            PixelRegion::clamped(image, bounds.x, bounds.y, bounds.width, bounds.height)
        else {
            return RgbColor::BLACK;
        };

        let pixels: Vec<RgbColor> = region.coords().map(|(x, y)| rgb_at(image, x, y)).collect();
        let lumas: Vec<f64> = pixels.iter().copied().map(luma).collect();
        let threshold = lumas.iter().sum::<f64>() / lumas.len() as f64;

        let ink: Vec<RgbColor> = pixels
            .iter()
            .zip(&lumas)
            .filter(|(_, l)| **l < threshold)
            .map(|(c, _)| *c)
            .collect();

        median_color(&ink)
            .or_else(|| pixels.iter().copied().min_by_key(|c| c.channel_sum()))
            .unwrap_or(RgbColor::BLACK)
    }

    /// New detections with `bg_color`/`text_color` resampled from `image`
    pub fn enhance_with_image(&self, detections: &[Detection], image: &RgbaImage) -> Vec<Detection> {
        detections
            .iter()
            .map(|detection| {
                let bg = self.sample_background(image, &detection.bounds);
                let text = self.sample_foreground(image, &detection.bounds);
                log::debug!(
                    "Detection {}: background {}, text {}",
                    detection.index,
                    bg.to_hex(),
                    text.to_hex()
                );
                detection.with_colors(bg, text)
            })
            .collect()
    }

    /// Decode `image_bytes` once and resample every detection's colors.
    ///
    /// A decode failure aborts the whole pass; the input detections are
    /// left untouched either way.
    pub fn enhance(
        &self,
        detections: &[Detection],
        image_bytes: &[u8],
    ) -> Result<Vec<Detection>, EnhanceError> {
        let image = image::load_from_memory(image_bytes)
            .inspect_err(|err| log::error!("Failed to decode image for color sampling: {}", err))?
            .to_rgba8();
        log::info!(
            "Sampling colors for {} detections on a {}x{} image",
            detections.len(),
            image.width(),
            image.height()
        );
        Ok(self.enhance_with_image(detections, &image))
    }
}
