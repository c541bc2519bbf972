//! The editing session: one store, one render reconciler and one surface.
//!
//! Every user command goes through [`EditorContext::execute`], which
//! commits the command to the store and then runs a single reconciliation
//! pass. Nothing else mutates the store or the surface's node graph.
//!
//! # Example
//!
//! ```rust,no_run
//! use overlay_editor::{Command, EditorConfig, EditorContext, EguiSurface, ElementPatch};
//!
//! # let detections = Vec::new();
//! # let image_bytes: Vec<u8> = Vec::new();
//! let mut editor = EditorContext::new(EguiSurface::new(), EditorConfig::default());
//! editor.load_detections(detections);
//! editor.enhance(&image_bytes).ok();
//! editor.execute(Command::Update { id: 0, patch: ElementPatch::text("Hello") });
//! ```
use egui::Pos2;
use image::RgbaImage;

use super::{EditorState, ModeController};
use crate::color_sampler::ColorSampler;
use crate::command::Command;
use crate::config::EditorConfig;
use crate::detection::Detection;
use crate::element::{ElementId, EraserStroke};
use crate::error::{EnhanceError, ExportError, ModeError};
use crate::export::{self, ExportPlan};
use crate::render_sync::{ReconcileReport, RenderSync};
use crate::store::{OverlayStore, StoreSnapshot};
use crate::surface::{CursorStyle, RenderSurface};
use crate::view::CanvasView;

use std::sync::Arc;

/// Detections handed out for color enhancement, stamped with the session
/// generation they belong to
#[derive(Debug, Clone)]
pub struct EnhancementTicket {
    generation: u64,
    detections: Vec<Detection>,
}

impl EnhancementTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    /// Run the color pass. Safe to call away from the editor; the result
    /// is handed back through [`EditorContext::apply_enhancement`].
    pub fn run(&self, sampler: &ColorSampler, image_bytes: &[u8]) -> Result<Vec<Detection>, EnhanceError> {
        sampler.enhance(&self.detections, image_bytes)
    }
}

/// The main context for the overlay editor
#[derive(Debug)]
pub struct EditorContext<S: RenderSurface> {
    config: EditorConfig,
    sampler: ColorSampler,
    store: OverlayStore,
    sync: RenderSync,
    surface: S,
    modes: ModeController,
    view: CanvasView,
    detections: Vec<Detection>,
    comparing: bool,
    /// Bumped on every load and session reset; stale enhancement results
    /// are dropped
    generation: u64,
}

impl<S: RenderSurface> EditorContext<S> {
    pub fn new(surface: S, config: EditorConfig) -> Self {
        Self {
            sampler: ColorSampler::from_config(&config),
            store: OverlayStore::new(config.default_font.clone()),
            sync: RenderSync::new(config.cover_expand),
            surface,
            modes: ModeController::new(),
            view: CanvasView::new(&config),
            detections: Vec::new(),
            comparing: false,
            generation: 0,
            config,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn sampler(&self) -> &ColorSampler {
        &self.sampler
    }

    pub fn store(&self) -> &OverlayStore {
        &self.store
    }

    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.store.snapshot()
    }

    pub fn sync(&self) -> &RenderSync {
        &self.sync
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// For painting and font registration. Node creation and removal
    /// belong to the reconciler.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn mode(&self) -> EditorState {
        self.modes.state()
    }

    pub fn modes(&self) -> &ModeController {
        &self.modes
    }

    pub fn view(&self) -> &CanvasView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut CanvasView {
        &mut self.view
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_comparing(&self) -> bool {
        self.comparing
    }

    /// Detections as last loaded or enhanced
    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    /// Fit the source image into the configured canvas box
    pub fn set_image_size(&mut self, width: u32, height: u32) {
        self.view.fit(
            width,
            height,
            self.config.max_canvas_width,
            self.config.max_canvas_height,
        );
    }

    fn reconcile(&mut self) -> ReconcileReport {
        let snapshot = self.store.snapshot();
        let report = self.sync.reconcile(&snapshot, &mut self.surface);
        self.modes.adopt(self.sync.owned_nodes(), &mut self.surface);
        for (id, err) in &report.failures {
            log::error!("Cover recomposition failed for element {}: {}", id, err);
        }
        report
    }

    /// Replace every element with one per detection and draw them.
    /// Enhancement tickets handed out for the previous set go stale.
    pub fn load_detections(&mut self, detections: Vec<Detection>) -> ReconcileReport {
        self.generation += 1;
        self.detections = detections.clone();
        self.store.initialize(detections);
        self.reconcile()
    }

    /// Hand out the current detections for a color pass
    pub fn begin_enhancement(&self) -> EnhancementTicket {
        EnhancementTicket {
            generation: self.generation,
            detections: self.detections.clone(),
        }
    }

    /// Apply the outcome of a color pass started with
    /// [`begin_enhancement`](Self::begin_enhancement).
    ///
    /// Results from before the last load or session reset are discarded.
    /// Only the sampled colors are applied, so edits made while the pass
    /// was running are kept. A failed pass leaves the elements as they are.
    pub fn apply_enhancement(
        &mut self,
        generation: u64,
        result: Result<Vec<Detection>, EnhanceError>,
    ) -> Result<ReconcileReport, EnhanceError> {
        if generation != self.generation {
            log::info!(
                "Discarding enhancement from generation {} (now {})",
                generation,
                self.generation
            );
            return Err(EnhanceError::Stale {
                ticket: generation,
                current: self.generation,
            });
        }
        let detections = result.inspect_err(|err| {
            log::error!("Color enhancement failed, keeping default colors: {}", err)
        })?;
        let recolored = self.store.recolor(&detections);
        log::info!("Enhancement recolored {} of {} elements", recolored, detections.len());
        self.detections = detections;
        Ok(self.reconcile())
    }

    /// Decode `image_bytes` and recolor every detection in one go
    pub fn enhance(&mut self, image_bytes: &[u8]) -> Result<ReconcileReport, EnhanceError> {
        let ticket = self.begin_enhancement();
        let result = ticket.run(&self.sampler, image_bytes);
        self.apply_enhancement(ticket.generation(), result)
    }

    /// Commit one command and reconcile the surface
    pub fn execute(&mut self, command: Command) -> ReconcileReport {
        let name = command.name();
        let target = command.target();
        if !command.apply(&mut self.store) {
            log::debug!("Command {} on {:?} changed nothing", name, target);
            return ReconcileReport::default();
        }
        self.reconcile()
    }

    pub fn enter_erase_mode(&mut self) -> Result<(), ModeError> {
        let cursor = CursorStyle::Eraser {
            screen_radius: self.config.eraser_radius() * self.view.zoom(),
        };
        self.modes
            .enter_erase(self.sync.owned_nodes(), &mut self.surface, cursor)
    }

    pub fn exit_erase_mode(&mut self) -> Result<(), ModeError> {
        self.modes.exit_erase(&mut self.surface)
    }

    /// Eraser radius in source-image pixels
    fn eraser_radius(&self) -> f32 {
        let scale = self.view.display_scale();
        if scale > 0.0 {
            self.config.eraser_radius() / scale
        } else {
            self.config.eraser_radius()
        }
    }

    /// Pointer pressed at a screen position.
    ///
    /// In Select mode this selects the element under the pointer (or clears
    /// the selection); in Erase mode it starts a stroke sequence and erases
    /// at the pointer. Returns the element affected.
    pub fn pointer_pressed(&mut self, screen: Pos2) -> Option<ElementId> {
        let (x, y) = self.view.to_image(screen);
        if self.modes.press() {
            return self.erase_at(x, y);
        }

        let hit = self
            .surface
            .hit_test_point(x, y)
            .filter(|node| self.surface.interaction(*node).is_some_and(|i| i.selectable))
            .and_then(|node| self.sync.element_for_node(node));
        self.execute(Command::Select(hit));
        hit
    }

    /// Pointer moved; erases only while a stroke sequence is active
    pub fn pointer_moved(&mut self, screen: Pos2) -> Option<ElementId> {
        if !self.modes.state().is_stroke_active() {
            return None;
        }
        let (x, y) = self.view.to_image(screen);
        self.erase_at(x, y)
    }

    /// Ends the stroke sequence without touching the store
    pub fn pointer_released(&mut self) {
        self.modes.release();
    }

    /// Record a stroke on the first shown covering rectangle containing
    /// the point, in store order
    pub fn erase_at(&mut self, x: f32, y: f32) -> Option<ElementId> {
        let snapshot = self.store.snapshot();
        let target = snapshot.iter().find(|element| {
            element.show_background()
                && self
                    .sync
                    .rect_node(element.id())
                    .and_then(|rect| self.surface.node_bounds(rect))
                    .is_some_and(|bounds| bounds.contains(x, y))
        })?;

        if let Some(cap) = self.config.max_strokes_per_element {
            if target.eraser_strokes().len() >= cap {
                log::warn!("Element {} reached the {} stroke limit", target.id(), cap);
                return None;
            }
        }

        let id = target.id();
        let stroke = EraserStroke::new(x, y, self.eraser_radius());
        self.execute(Command::AppendEraserStroke { id, stroke });
        Some(id)
    }

    /// Hide every overlay node to compare against the source, or bring
    /// them back
    pub fn set_comparing(&mut self, comparing: bool) {
        self.comparing = comparing;
        self.sync.set_suppressed(comparing, &mut self.surface);
    }

    /// Discard the session. Afterwards the editor matches a freshly
    /// constructed one, apart from a newer generation.
    pub fn reset_session(&mut self) {
        if self.modes.state().is_erasing() {
            if let Err(err) = self.modes.exit_erase(&mut self.surface) {
                log::warn!("Leaving erase mode on reset failed: {}", err);
            }
        }
        self.sync.dispose(&mut self.surface);
        self.store.clear();
        self.detections.clear();
        self.comparing = false;
        self.view = CanvasView::new(&self.config);
        self.generation += 1;
        log::info!("Session reset, generation {}", self.generation);
    }

    /// Output size that restores the source resolution
    pub fn export_plan(&self) -> ExportPlan {
        self.view.export_plan()
    }

    /// Source image with every shown covering rectangle painted on, at the
    /// export plan's size. Text stays with the render surface.
    pub fn flatten_covers(&self, source: &RgbaImage) -> Result<RgbaImage, ExportError> {
        export::flatten_covers(
            source,
            &self.export_plan(),
            &self.store.snapshot(),
            self.config.cover_expand,
        )
    }
}
