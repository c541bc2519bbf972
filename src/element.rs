//! Per-detection editable overlay state.

use serde::{Deserialize, Serialize};

use crate::detection::{BoundingBox, Detection, RgbColor};

/// Overlay elements are keyed by their detection index
pub type ElementId = usize;

/// One recorded eraser dab, in source-image pixel space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EraserStroke {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl EraserStroke {
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self { x, y, radius }
    }
}

/// Placement of the text node relative to the source image
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementTransform {
    pub left: f32,
    pub top: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub angle: f32,
}

impl ElementTransform {
    /// Untransformed placement at the top-left of `bounds`
    pub fn at(bounds: &BoundingBox) -> Self {
        Self {
            left: bounds.x,
            top: bounds.y,
            scale_x: 1.0,
            scale_y: 1.0,
            angle: 0.0,
        }
    }
}

/// Immutable snapshot every reset returns to
#[derive(Debug, Clone, PartialEq)]
pub struct ElementOriginal {
    pub detection: Detection,
    pub transform: ElementTransform,
    pub font_family: String,
}

/// Field-wise update; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementPatch {
    pub text: Option<String>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub font_color: Option<RgbColor>,
    pub bg_color: Option<RgbColor>,
    pub show_background: Option<bool>,
    pub show_text: Option<bool>,
    pub transform: Option<ElementTransform>,
}

impl ElementPatch {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn font_family(family: impl Into<String>) -> Self {
        Self {
            font_family: Some(family.into()),
            ..Default::default()
        }
    }

    pub fn font_size(size: f32) -> Self {
        Self {
            font_size: Some(size),
            ..Default::default()
        }
    }

    pub fn font_color(color: RgbColor) -> Self {
        Self {
            font_color: Some(color),
            ..Default::default()
        }
    }

    pub fn bg_color(color: RgbColor) -> Self {
        Self {
            bg_color: Some(color),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Editable overlay for one detection.
///
/// The element never references its render nodes; its id is the key
/// `RenderSync` resolves them by.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayElement {
    id: ElementId,
    original: ElementOriginal,
    text: String,
    font_family: String,
    font_size: f32,
    font_color: RgbColor,
    bg_color: RgbColor,
    show_background: bool,
    show_text: bool,
    transform: ElementTransform,
    eraser_strokes: Vec<EraserStroke>,
}

impl OverlayElement {
    pub(crate) fn from_detection(detection: Detection, font_family: &str) -> Self {
        let original = ElementOriginal {
            transform: ElementTransform::at(&detection.bounds),
            font_family: font_family.to_string(),
            detection,
        };
        let mut element = Self {
            id: original.detection.index,
            original,
            text: String::new(),
            font_family: String::new(),
            font_size: 0.0,
            font_color: RgbColor::BLACK,
            bg_color: RgbColor::WHITE,
            show_background: true,
            show_text: true,
            transform: ElementTransform::at(&BoundingBox::default()),
            eraser_strokes: Vec::new(),
        };
        element.reset();
        element
    }

    /// Restore every mutable field from `original` and drop all strokes
    pub(crate) fn reset(&mut self) {
        let original = &self.original;
        self.text = original.detection.text.clone();
        self.font_family = original.font_family.clone();
        self.font_size = original.detection.font_size;
        self.font_color = original.detection.text_color;
        self.bg_color = original.detection.bg_color;
        self.show_background = true;
        self.show_text = true;
        self.transform = original.transform;
        self.eraser_strokes.clear();
    }

    pub(crate) fn apply_patch(&mut self, patch: ElementPatch) {
        if let Some(text) = patch.text {
            self.text = text;
        }
        if let Some(family) = patch.font_family {
            self.font_family = family;
        }
        if let Some(size) = patch.font_size {
            self.font_size = size;
        }
        if let Some(color) = patch.font_color {
            self.font_color = color;
        }
        if let Some(color) = patch.bg_color {
            self.bg_color = color;
        }
        if let Some(show) = patch.show_background {
            self.show_background = show;
        }
        if let Some(show) = patch.show_text {
            self.show_text = show;
        }
        if let Some(transform) = patch.transform {
            self.transform = transform;
        }
    }

    /// Adopt freshly sampled colors as the new original. The mutable
    /// colors follow only where they still match the old original, so user
    /// edits survive.
    pub(crate) fn recolor(&mut self, bg_color: RgbColor, text_color: RgbColor) {
        let detection = &mut self.original.detection;
        if self.bg_color == detection.bg_color {
            self.bg_color = bg_color;
        }
        if self.font_color == detection.text_color {
            self.font_color = text_color;
        }
        detection.bg_color = bg_color;
        detection.text_color = text_color;
    }

    pub(crate) fn toggle_background(&mut self) {
        self.show_background = !self.show_background;
    }

    pub(crate) fn toggle_text(&mut self) {
        self.show_text = !self.show_text;
    }

    pub(crate) fn push_stroke(&mut self, stroke: EraserStroke) {
        self.eraser_strokes.push(stroke);
    }

    pub fn id(&self) -> ElementId {
        self.id
    }

    pub fn original(&self) -> &ElementOriginal {
        &self.original
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn font_family(&self) -> &str {
        &self.font_family
    }

    pub fn font_size(&self) -> f32 {
        self.font_size
    }

    pub fn font_color(&self) -> RgbColor {
        self.font_color
    }

    pub fn bg_color(&self) -> RgbColor {
        self.bg_color
    }

    pub fn show_background(&self) -> bool {
        self.show_background
    }

    pub fn show_text(&self) -> bool {
        self.show_text
    }

    pub fn transform(&self) -> ElementTransform {
        self.transform
    }

    /// Kept while the background is hidden, only drawn while it is shown
    pub fn eraser_strokes(&self) -> &[EraserStroke] {
        &self.eraser_strokes
    }

    pub fn bounds(&self) -> BoundingBox {
        self.original.detection.bounds
    }

    /// Geometry of the covering rectangle drawn over the original pixels
    pub fn cover_bounds(&self, expand: f32) -> BoundingBox {
        self.bounds().expanded_by_fraction(expand)
    }

    /// True when every mutable field matches `original` and no strokes exist
    pub fn is_pristine(&self) -> bool {
        let mut reset = self.clone();
        reset.reset();
        *self == reset
    }
}
