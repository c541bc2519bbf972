use std::collections::HashMap;

use egui::epaint::TextShape;
use egui::{Color32, ColorImage, Context, CursorIcon, FontId, Painter, Pos2, Rect, Stroke};

use super::{CursorStyle, FontRegistry, NodeId, NodeInteraction, RenderSurface, TextNodeSpec};
use crate::detection::BoundingBox;
use crate::mask::{FillDescriptor, MaskPattern};
use crate::texture_manager::TextureManager;
use crate::view::CanvasView;

const MASK_TEXTURE_CACHE: usize = 64;
const ERASER_RING: Color32 = Color32::from_rgb(239, 68, 68);
const HOVER_OUTLINE: Color32 = Color32::from_gray(120);

#[derive(Debug)]
enum NodeKind {
    Text(TextNodeSpec),
    Rect {
        bounds: BoundingBox,
        fill: FillDescriptor,
        fill_version: u64,
    },
}

#[derive(Debug)]
struct SurfaceNode {
    kind: NodeKind,
    visible: bool,
    interaction: NodeInteraction,
}

impl SurfaceNode {
    fn bounds(&self) -> BoundingBox {
        match &self.kind {
            NodeKind::Text(spec) => spec.bounds,
            NodeKind::Rect { bounds, .. } => *bounds,
        }
    }
}

fn mask_color_image(pattern: &MaskPattern) -> ColorImage {
    ColorImage::from_rgba_unmultiplied(
        [pattern.width() as usize, pattern.height() as usize],
        pattern.raster.as_raw(),
    )
}

/// Retained-mode node graph painted with egui each frame
#[derive(Debug)]
pub struct EguiSurface {
    nodes: HashMap<NodeId, SurfaceNode>,
    /// Back-to-front paint order
    order: Vec<NodeId>,
    cursor: CursorStyle,
    fonts: FontRegistry,
    textures: TextureManager,
    next_fill_version: u64,
}

impl Default for EguiSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl EguiSurface {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            order: Vec::new(),
            cursor: CursorStyle::Default,
            fonts: FontRegistry::new(),
            textures: TextureManager::new(MASK_TEXTURE_CACHE),
            next_fill_version: 0,
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_visible(&self, node: NodeId) -> Option<bool> {
        self.nodes.get(&node).map(|n| n.visible)
    }

    pub fn fill(&self, node: NodeId) -> Option<&FillDescriptor> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Rect { fill, .. } => Some(fill),
            NodeKind::Text(_) => None,
        }
    }

    pub fn text(&self, node: NodeId) -> Option<&TextNodeSpec> {
        match &self.nodes.get(&node)?.kind {
            NodeKind::Text(spec) => Some(spec),
            NodeKind::Rect { .. } => None,
        }
    }

    /// Paint position of a node, 0 being the back
    pub fn z_index(&self, node: NodeId) -> Option<usize> {
        self.order.iter().position(|id| *id == node)
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    /// Install a font family once; see [`FontRegistry::install`]
    pub fn register_font(&mut self, ctx: &Context, name: &str, data: Vec<u8>) -> bool {
        self.fonts.install(ctx, name, data)
    }

    fn bump_fill_version(&mut self) -> u64 {
        self.next_fill_version += 1;
        self.next_fill_version
    }

    /// Draw every visible node, back to front.
    ///
    /// `pointer` is the pointer position in screen space, used for the
    /// hover outline and the eraser indicator.
    pub fn paint(&mut self, ctx: &Context, painter: &Painter, view: &CanvasView, pointer: Option<Pos2>) {
        let Self {
            nodes,
            order,
            cursor,
            fonts,
            textures,
            ..
        } = self;
        textures.begin_frame();
        let uv = Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0));

        for id in order.iter() {
            let Some(node) = nodes.get(id) else { continue };
            if !node.visible {
                continue;
            }

            match &node.kind {
                NodeKind::Rect {
                    bounds,
                    fill: FillDescriptor::Solid(color),
                    ..
                } => {
                    painter.rect_filled(view.image_rect_to_screen(bounds), 0.0, color.to_color32());
                }
                NodeKind::Rect {
                    fill: FillDescriptor::Pattern(pattern),
                    fill_version,
                    ..
                } => {
                    let texture = textures.get_or_create_texture(
                        *id,
                        *fill_version,
                        || Ok(mask_color_image(pattern)),
                        ctx,
                    );
                    match texture {
                        Ok(texture) => {
                            let area = BoundingBox::new(
                                pattern.origin_x,
                                pattern.origin_y,
                                pattern.width() as f32,
                                pattern.height() as f32,
                            );
                            painter.image(texture, view.image_rect_to_screen(&area), uv, Color32::WHITE);
                        }
                        Err(err) => log::warn!("Mask texture for {} unavailable: {}", id, err),
                    }
                }
                NodeKind::Text(spec) => {
                    let font = FontId::new(
                        spec.font_size * view.effective_scale(),
                        fonts.resolve(&spec.font_family),
                    );
                    let color = spec.color.to_color32();
                    let galley = painter.layout_no_wrap(spec.text.clone(), font, color);
                    painter.add(
                        TextShape::new(view.to_screen(spec.bounds.x, spec.bounds.y), galley, color)
                            .with_angle(spec.angle.to_radians()),
                    );
                }
            }

            if node.interaction.hoverable {
                let rect = view.image_rect_to_screen(&node.bounds());
                if pointer.is_some_and(|p| rect.contains(p)) {
                    painter.rect_stroke(rect, 0.0, Stroke::new(1.0, HOVER_OUTLINE));
                }
            }
        }

        if let CursorStyle::Eraser { screen_radius } = *cursor {
            ctx.set_cursor_icon(CursorIcon::None);
            if let Some(p) = pointer {
                painter.circle(
                    p,
                    screen_radius,
                    ERASER_RING.gamma_multiply(0.2),
                    Stroke::new(2.0, ERASER_RING),
                );
            }
        }
    }
}

impl RenderSurface for EguiSurface {
    fn create_text_node(&mut self, spec: &TextNodeSpec) -> NodeId {
        let id = NodeId::new();
        self.nodes.insert(
            id,
            SurfaceNode {
                kind: NodeKind::Text(spec.clone()),
                visible: true,
                interaction: NodeInteraction::INTERACTIVE,
            },
        );
        self.order.push(id);
        id
    }

    fn update_text_node(&mut self, node: NodeId, spec: &TextNodeSpec) {
        if let Some(SurfaceNode {
            kind: NodeKind::Text(current),
            ..
        }) = self.nodes.get_mut(&node)
        {
            *current = spec.clone();
        }
    }

    fn create_rect_node(&mut self, bounds: BoundingBox, fill: &FillDescriptor) -> NodeId {
        let id = NodeId::new();
        let fill_version = self.bump_fill_version();
        self.nodes.insert(
            id,
            SurfaceNode {
                kind: NodeKind::Rect {
                    bounds,
                    fill: fill.clone(),
                    fill_version,
                },
                visible: true,
                interaction: NodeInteraction::INERT,
            },
        );
        // above earlier covers, below every text node
        let first_text = self
            .order
            .iter()
            .position(|id| matches!(self.nodes.get(id), Some(SurfaceNode { kind: NodeKind::Text(_), .. })))
            .unwrap_or(self.order.len());
        self.order.insert(first_text, id);
        id
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.visible = visible;
        }
    }

    fn set_fill(&mut self, node: NodeId, fill: &FillDescriptor) {
        let version = self.bump_fill_version();
        if let Some(SurfaceNode {
            kind: NodeKind::Rect {
                fill: current,
                fill_version,
                ..
            },
            ..
        }) = self.nodes.get_mut(&node)
        {
            *current = fill.clone();
            *fill_version = version;
            self.textures.invalidate_node(node);
        }
    }

    fn remove_node(&mut self, node: NodeId) {
        if self.nodes.remove(&node).is_some() {
            self.order.retain(|id| *id != node);
            self.textures.invalidate_node(node);
        }
    }

    fn hit_test_point(&self, x: f32, y: f32) -> Option<NodeId> {
        self.order.iter().rev().copied().find(|id| {
            self.nodes
                .get(id)
                .is_some_and(|n| n.visible && n.bounds().contains(x, y))
        })
    }

    fn node_bounds(&self, node: NodeId) -> Option<BoundingBox> {
        self.nodes.get(&node).map(SurfaceNode::bounds)
    }

    fn interaction(&self, node: NodeId) -> Option<NodeInteraction> {
        self.nodes.get(&node).map(|n| n.interaction)
    }

    fn set_interaction(&mut self, node: NodeId, interaction: NodeInteraction) {
        if let Some(n) = self.nodes.get_mut(&node) {
            n.interaction = interaction;
        }
    }

    fn set_cursor(&mut self, cursor: CursorStyle) {
        self.cursor = cursor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::RgbColor;
    use crate::element::EraserStroke;
    use crate::mask::composite;

    fn text_spec(bounds: BoundingBox) -> TextNodeSpec {
        TextNodeSpec {
            text: "hello".into(),
            bounds,
            angle: 0.0,
            font_family: "Noto Sans SC".into(),
            font_size: 14.0,
            color: RgbColor::BLACK,
        }
    }

    #[test]
    fn test_rects_stack_below_text() {
        let mut surface = EguiSurface::new();
        let bounds = BoundingBox::new(0.0, 0.0, 50.0, 20.0);
        let text = surface.create_text_node(&text_spec(bounds));
        let rect = surface.create_rect_node(bounds, &FillDescriptor::Solid(RgbColor::WHITE));

        assert_eq!(surface.z_index(rect), Some(0));
        assert_eq!(surface.z_index(text), Some(1));
        assert_eq!(surface.hit_test_point(10.0, 10.0), Some(text));

        surface.set_visible(text, false);
        assert_eq!(surface.hit_test_point(10.0, 10.0), Some(rect));
        assert_eq!(surface.hit_test_point(100.0, 10.0), None);
    }

    #[test]
    fn test_default_interaction() {
        let mut surface = EguiSurface::new();
        let bounds = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let text = surface.create_text_node(&text_spec(bounds));
        let rect = surface.create_rect_node(bounds, &FillDescriptor::Solid(RgbColor::WHITE));

        assert_eq!(surface.interaction(text), Some(NodeInteraction::INTERACTIVE));
        assert_eq!(surface.interaction(rect), Some(NodeInteraction::INERT));
    }

    #[test]
    fn test_remove_and_unknown_nodes() {
        let mut surface = EguiSurface::new();
        let text = surface.create_text_node(&text_spec(BoundingBox::new(0.0, 0.0, 10.0, 10.0)));
        surface.remove_node(text);
        assert_eq!(surface.node_count(), 0);

        // ignored, not a panic
        surface.set_visible(text, true);
        surface.set_fill(text, &FillDescriptor::Solid(RgbColor::BLACK));
        assert_eq!(surface.node_bounds(text), None);
    }

    #[test]
    fn test_paint_masked_fill() {
        let ctx = Context::default();
        let mut surface = EguiSurface::new();
        let bounds = BoundingBox::new(0.0, 0.0, 40.0, 20.0);
        let fill = composite(&bounds, RgbColor::WHITE, &[EraserStroke::new(10.0, 10.0, 4.0)]).unwrap();
        let rect = surface.create_rect_node(bounds, &fill);
        surface.create_text_node(&text_spec(bounds));
        surface.set_cursor(CursorStyle::Eraser { screen_radius: 10.0 });
        let view = CanvasView::default();

        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            let painter = ctx.layer_painter(egui::LayerId::background());
            surface.paint(ctx, &painter, &view, Some(Pos2::new(5.0, 5.0)));
        });

        assert_eq!(surface.fill(rect), Some(&fill));
        assert_eq!(surface.textures.cache_size(), 1);
    }

    #[test]
    fn test_paint_rotated_text() {
        let ctx = Context::default();
        let mut surface = EguiSurface::new();
        let spec = TextNodeSpec {
            angle: 30.0,
            font_size: 28.0,
            ..text_spec(BoundingBox::new(10.0, 10.0, 80.0, 40.0))
        };
        let text = surface.create_text_node(&spec);
        let view = CanvasView::default();

        let output = ctx.run(egui::RawInput::default(), |ctx| {
            let painter = ctx.layer_painter(egui::LayerId::background());
            surface.paint(ctx, &painter, &view, None);
        });

        assert!(!output.shapes.is_empty());
        assert_eq!(surface.text(text).map(|s| s.angle), Some(30.0));
    }
}
