//! Mapping between source-image space and the on-screen canvas.

use egui::{Pos2, Rect, Vec2};

use crate::config::EditorConfig;
use crate::detection::BoundingBox;
use crate::export::ExportPlan;

/// Display transform: the image is fitted into the canvas box at
/// `scale`, then magnified by the viewport `zoom` and offset by `origin`.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasView {
    image_width: u32,
    image_height: u32,
    scale: f32,
    zoom: f32,
    origin: Pos2,
    min_zoom: f32,
    max_zoom: f32,
    zoom_step: f32,
}

impl Default for CanvasView {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl CanvasView {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            image_width: 0,
            image_height: 0,
            scale: 1.0,
            zoom: 1.0,
            origin: Pos2::ZERO,
            min_zoom: config.min_zoom,
            max_zoom: config.max_zoom,
            zoom_step: config.zoom_step,
        }
    }

    /// Fit an image into a `max_width` x `max_height` box, keeping its
    /// aspect ratio. Zero-sized images are treated as 1 pixel.
    pub fn fit(&mut self, image_width: u32, image_height: u32, max_width: f32, max_height: f32) {
        self.image_width = image_width;
        self.image_height = image_height;
        self.scale = (max_width / image_width.max(1) as f32).min(max_height / image_height.max(1) as f32);
        log::debug!(
            "Fitted {}x{} image at display scale {:.3}",
            image_width,
            image_height,
            self.scale
        );
    }

    pub fn image_size(&self) -> (u32, u32) {
        (self.image_width, self.image_height)
    }

    /// Source-to-canvas scale factor
    pub fn display_scale(&self) -> f32 {
        self.scale
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Source-to-screen scale factor
    pub fn effective_scale(&self) -> f32 {
        self.scale * self.zoom
    }

    /// Canvas size in display pixels
    pub fn canvas_size(&self) -> (f32, f32) {
        (
            self.image_width as f32 * self.scale,
            self.image_height as f32 * self.scale,
        )
    }

    pub fn set_origin(&mut self, origin: Pos2) {
        self.origin = origin;
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom * self.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom / self.zoom_step);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0;
        self.origin = Pos2::ZERO;
    }

    pub fn to_screen(&self, x: f32, y: f32) -> Pos2 {
        self.origin + Vec2::new(x, y) * self.effective_scale()
    }

    /// Screen position back to source-image coordinates
    pub fn to_image(&self, pos: Pos2) -> (f32, f32) {
        let scale = self.effective_scale();
        if scale <= 0.0 {
            return (0.0, 0.0);
        }
        let v = (pos - self.origin) / scale;
        (v.x, v.y)
    }

    pub fn image_rect_to_screen(&self, bounds: &BoundingBox) -> Rect {
        Rect::from_min_max(
            self.to_screen(bounds.x, bounds.y),
            self.to_screen(bounds.right(), bounds.bottom()),
        )
    }

    /// Export sized back to source resolution
    pub fn export_plan(&self) -> ExportPlan {
        let (w, h) = self.canvas_size();
        ExportPlan::new(w, h, self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_keeps_aspect_ratio() {
        let mut view = CanvasView::default();
        view.fit(1600, 900, 800.0, 600.0);
        assert_eq!(view.display_scale(), 0.5);
        assert_eq!(view.canvas_size(), (800.0, 450.0));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut view = CanvasView::default();
        for _ in 0..20 {
            view.zoom_in();
        }
        assert_eq!(view.zoom(), 4.0);
        for _ in 0..40 {
            view.zoom_out();
        }
        assert_eq!(view.zoom(), 0.25);
        view.reset_zoom();
        assert_eq!(view.zoom(), 1.0);
    }

    #[test]
    fn test_screen_round_trip() {
        let mut view = CanvasView::default();
        view.fit(1000, 1000, 500.0, 500.0);
        view.set_zoom(2.0);
        view.set_origin(Pos2::new(10.0, 20.0));

        let screen = view.to_screen(100.0, 50.0);
        assert_eq!(screen, Pos2::new(110.0, 70.0));
        assert_eq!(view.to_image(screen), (100.0, 50.0));
    }
}
