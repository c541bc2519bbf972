//! Final raster production at source resolution.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage, imageops};

use crate::error::ExportError;
use crate::mask::{self, FillDescriptor};
use crate::store::StoreSnapshot;

/// Output size of an export: the on-screen canvas times the inverse of the
/// display scale, so the result matches the source image
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportPlan {
    pub multiplier: f32,
    pub width: u32,
    pub height: u32,
}

impl ExportPlan {
    pub fn new(canvas_width: f32, canvas_height: f32, scale: f32) -> Self {
        let multiplier = if scale > 0.0 { 1.0 / scale } else { 1.0 };
        Self {
            multiplier,
            width: (canvas_width * multiplier).round().max(0.0) as u32,
            height: (canvas_height * multiplier).round().max(0.0) as u32,
        }
    }

    pub fn validate(&self) -> Result<(), ExportError> {
        if self.width == 0 || self.height == 0 {
            return Err(ExportError::EmptyPlan {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// Paint every shown covering rectangle onto a copy of `source`.
///
/// `source` must already be at the plan's size, which is the source
/// resolution by construction. Erased parts of a cover let the source show
/// through. A cover whose mask cannot be composited is painted solid and
/// the export carries on. Text is left to the rendering surface.
pub fn flatten_covers(
    source: &RgbaImage,
    plan: &ExportPlan,
    snapshot: &StoreSnapshot,
    cover_expand: f32,
) -> Result<RgbaImage, ExportError> {
    plan.validate()?;
    if source.dimensions() != (plan.width, plan.height) {
        return Err(ExportError::SourceMismatch {
            expected: (plan.width, plan.height),
            actual: source.dimensions(),
        });
    }

    let mut output = source.clone();
    let mut painted = 0;

    for element in snapshot.iter().filter(|e| e.show_background()) {
        let cover = element.cover_bounds(cover_expand);
        let (x, y) = (cover.x.round() as i64, cover.y.round() as i64);

        let fill = mask::composite(&cover, element.bg_color(), element.eraser_strokes())
            .unwrap_or_else(|err| {
                log::warn!("Exporting cover of element {} without its mask: {}", element.id(), err);
                FillDescriptor::Solid(element.bg_color())
            });

        match fill {
            FillDescriptor::Solid(color) => {
                let (w, h) = (cover.width.round(), cover.height.round());
                if w < 1.0 || h < 1.0 {
                    continue;
                }
                let patch = RgbaImage::from_pixel(
                    w as u32,
                    h as u32,
                    Rgba([color.r, color.g, color.b, 255]),
                );
                imageops::overlay(&mut output, &patch, x, y);
            }
            FillDescriptor::Pattern(pattern) => {
                imageops::overlay(&mut output, pattern.raster.as_ref(), x, y);
            }
        }
        painted += 1;
    }

    log::info!(
        "Flattened {} covers onto {}x{} export (x{:.3})",
        painted,
        output.width(),
        output.height(),
        plan.multiplier
    );
    Ok(output)
}

/// Encode a raster as PNG bytes
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
