//! Turns a covering rectangle and its eraser strokes into a fill.

use std::sync::Arc;

use image::{Rgba, RgbaImage};

use crate::detection::{BoundingBox, RgbColor};
use crate::element::EraserStroke;
use crate::error::CompositeError;

/// Largest offscreen raster the compositor will allocate
pub const MAX_RASTER_PIXELS: u64 = 64 * 1024 * 1024;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Raster fill anchored at the covering rectangle's origin, drawn once
/// (never tiled)
#[derive(Debug, Clone, PartialEq)]
pub struct MaskPattern {
    pub origin_x: f32,
    pub origin_y: f32,
    pub raster: Arc<RgbaImage>,
}

impl MaskPattern {
    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }
}

/// How a covering rectangle is painted
#[derive(Debug, Clone, PartialEq)]
pub enum FillDescriptor {
    Solid(RgbColor),
    Pattern(MaskPattern),
}

impl FillDescriptor {
    pub fn is_masked(&self) -> bool {
        matches!(self, FillDescriptor::Pattern(_))
    }
}

fn raster_size(bounds: &BoundingBox) -> Result<(u32, u32), CompositeError> {
    let unavailable = |width: f32, height: f32| CompositeError::SurfaceUnavailable {
        width: width.max(0.0) as u32,
        height: height.max(0.0) as u32,
    };
    let (w, h) = (bounds.width.round(), bounds.height.round());
    if !w.is_finite() || !h.is_finite() || w < 1.0 || h < 1.0 {
        return Err(unavailable(w, h));
    }
    let (width, height) = (w as u32, h as u32);
    if width as u64 * height as u64 > MAX_RASTER_PIXELS {
        return Err(unavailable(w, h));
    }
    Ok((width, height))
}

/// Clear every pixel whose center lies within the stroke's disk
fn cut_disk(raster: &mut RgbaImage, cx: f32, cy: f32, radius: f32) {
    if radius.is_nan() || radius <= 0.0 || !cx.is_finite() || !cy.is_finite() {
        return;
    }
    let (w, h) = (raster.width() as i64, raster.height() as i64);
    let x_min = ((cx - radius).floor() as i64).max(0);
    let y_min = ((cy - radius).floor() as i64).max(0);
    let x_max = ((cx + radius).ceil() as i64).min(w - 1);
    let y_max = ((cy + radius).ceil() as i64).min(h - 1);
    let r2 = radius * radius;

    for py in y_min..=y_max {
        for px in x_min..=x_max {
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            if dx * dx + dy * dy <= r2 {
                raster.put_pixel(px as u32, py as u32, TRANSPARENT);
            }
        }
    }
}

/// Build the fill for a covering rectangle.
///
/// No strokes gives a solid fill. Otherwise a `bounds`-sized raster is
/// filled with `bg_color` and each stroke's disk is made transparent.
/// Cuts only ever clear pixels, so the raster is identical for any
/// ordering of the same strokes.
pub fn composite(
    bounds: &BoundingBox,
    bg_color: RgbColor,
    strokes: &[EraserStroke],
) -> Result<FillDescriptor, CompositeError> {
    if strokes.is_empty() {
        return Ok(FillDescriptor::Solid(bg_color));
    }

    let (width, height) = raster_size(bounds)
        .inspect_err(|err| log::warn!("Mask composite skipped: {}", err))?;
    let mut raster =
        RgbaImage::from_pixel(width, height, Rgba([bg_color.r, bg_color.g, bg_color.b, 255]));

    for stroke in strokes {
        cut_disk(&mut raster, stroke.x - bounds.x, stroke.y - bounds.y, stroke.radius);
    }

    Ok(FillDescriptor::Pattern(MaskPattern {
        origin_x: bounds.x,
        origin_y: bounds.y,
        raster: Arc::new(raster),
    }))
}
