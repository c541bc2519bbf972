//! Abstract rendering surface the overlay is drawn onto.
//!
//! `RenderSync` is the only caller that creates or removes nodes; the mode
//! controller only flips interaction flags and the cursor.

mod egui_surface;
mod fonts;

pub use egui_surface::EguiSurface;
pub use fonts::FontRegistry;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::detection::{BoundingBox, RgbColor};
use crate::mask::FillDescriptor;

/// Opaque handle to a node owned by a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

/// Everything a text node shows, in source-image space
#[derive(Debug, Clone, PartialEq)]
pub struct TextNodeSpec {
    pub text: String,
    pub bounds: BoundingBox,
    /// Degrees, clockwise about the top-left corner
    pub angle: f32,
    pub font_family: String,
    /// Already multiplied by the element's vertical scale
    pub font_size: f32,
    pub color: RgbColor,
}

/// Per-node pointer affordances
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeInteraction {
    pub selectable: bool,
    pub hoverable: bool,
}

impl NodeInteraction {
    pub const INTERACTIVE: Self = Self {
        selectable: true,
        hoverable: true,
    };
    pub const INERT: Self = Self {
        selectable: false,
        hoverable: false,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    /// Circle indicator sized to the eraser, in screen pixels
    Eraser { screen_radius: f32 },
}

/// Operations the overlay needs from whatever draws it.
///
/// Operations on unknown nodes are ignored.
pub trait RenderSurface {
    fn create_text_node(&mut self, spec: &TextNodeSpec) -> NodeId;

    fn update_text_node(&mut self, node: NodeId, spec: &TextNodeSpec);

    /// Covering rectangles are stacked below every text node
    fn create_rect_node(&mut self, bounds: BoundingBox, fill: &FillDescriptor) -> NodeId;

    fn set_visible(&mut self, node: NodeId, visible: bool);

    fn set_fill(&mut self, node: NodeId, fill: &FillDescriptor);

    fn remove_node(&mut self, node: NodeId);

    /// Topmost visible node containing the point (source-image space)
    fn hit_test_point(&self, x: f32, y: f32) -> Option<NodeId>;

    /// Current geometry of a node
    fn node_bounds(&self, node: NodeId) -> Option<BoundingBox>;

    fn interaction(&self, node: NodeId) -> Option<NodeInteraction>;

    fn set_interaction(&mut self, node: NodeId, interaction: NodeInteraction);

    fn set_cursor(&mut self, cursor: CursorStyle);
}
