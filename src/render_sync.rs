//! One-way reconciliation from store snapshots to render-surface nodes.
//!
//! `RenderSync` owns every node it creates. Elements refer to their nodes
//! only through their id, which is looked up here.

use std::collections::HashMap;
use std::sync::Arc;

use crate::detection::{BoundingBox, RgbColor};
use crate::element::{ElementId, EraserStroke, OverlayElement};
use crate::error::CompositeError;
use crate::mask::{self, FillDescriptor};
use crate::store::StoreSnapshot;
use crate::surface::{NodeId, RenderSurface, TextNodeSpec};

/// Whether and how an element's covering rectangle is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundPresence {
    NoBackground,
    BackgroundSolid,
    BackgroundMasked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPresence {
    TextHidden,
    TextVisible,
}

/// Inputs the cover fill was last built from
#[derive(Debug, Clone, PartialEq)]
struct FillKey {
    bounds: BoundingBox,
    bg_color: RgbColor,
    strokes: Vec<EraserStroke>,
}

impl FillKey {
    fn of(element: &OverlayElement, bounds: BoundingBox) -> Self {
        Self {
            bounds,
            bg_color: element.bg_color(),
            strokes: element.eraser_strokes().to_vec(),
        }
    }
}

#[derive(Debug)]
struct NodeRecord {
    text: NodeId,
    rect: Option<NodeId>,
    /// `None` until a fill has been applied successfully
    fill_key: Option<FillKey>,
    element: Arc<OverlayElement>,
}

/// Outcome of one reconciliation pass
#[derive(Debug, Default)]
pub struct ReconcileReport {
    pub created: usize,
    pub removed: usize,
    pub refilled: usize,
    pub skipped: usize,
    /// Recompositions that failed; the previous fill stays in place
    pub failures: Vec<(ElementId, CompositeError)>,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Drives surface nodes from store snapshots
#[derive(Debug)]
pub struct RenderSync {
    records: HashMap<ElementId, NodeRecord>,
    owners: HashMap<NodeId, ElementId>,
    cover_expand: f32,
    suppressed: bool,
}

fn text_spec(element: &OverlayElement) -> TextNodeSpec {
    let bounds = element.bounds();
    let transform = element.transform();
    TextNodeSpec {
        text: element.text().to_string(),
        bounds: BoundingBox::new(
            transform.left,
            transform.top,
            bounds.width * transform.scale_x,
            bounds.height * transform.scale_y,
        ),
        angle: transform.angle,
        font_family: element.font_family().to_string(),
        // glyphs scale with the node height
        font_size: element.font_size() * transform.scale_y,
        color: element.font_color(),
    }
}

impl RenderSync {
    pub fn new(cover_expand: f32) -> Self {
        Self {
            records: HashMap::new(),
            owners: HashMap::new(),
            cover_expand,
            suppressed: false,
        }
    }

    pub fn cover_expand(&self) -> f32 {
        self.cover_expand
    }

    /// Bring the surface in line with `snapshot`.
    ///
    /// Elements whose `Arc` is unchanged since the last pass are skipped.
    /// The cover fill is only recomposited when its color, strokes or
    /// geometry changed.
    pub fn reconcile(
        &mut self,
        snapshot: &StoreSnapshot,
        surface: &mut dyn RenderSurface,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();

        let stale: Vec<ElementId> = self
            .records
            .keys()
            .copied()
            .filter(|id| !snapshot.contains(*id))
            .collect();
        for id in stale {
            self.drop_record(id, surface);
            report.removed += 1;
        }

        for element in snapshot.iter() {
            self.reconcile_element(element, surface, &mut report);
        }

        log::debug!(
            "Reconciled {} elements: {} created, {} removed, {} refilled, {} unchanged, {} failed",
            snapshot.len(),
            report.created,
            report.removed,
            report.refilled,
            report.skipped,
            report.failures.len()
        );
        report
    }

    fn reconcile_element(
        &mut self,
        element: &Arc<OverlayElement>,
        surface: &mut dyn RenderSurface,
        report: &mut ReconcileReport,
    ) {
        let id = element.id();
        let spec = text_spec(element);
        let suppressed = self.suppressed;

        let is_new = match self.records.get(&id) {
            Some(record) if Arc::ptr_eq(&record.element, element) => {
                report.skipped += 1;
                return;
            }
            Some(_) => false,
            None => true,
        };
        if is_new {
            let text = surface.create_text_node(&spec);
            self.owners.insert(text, id);
            report.created += 1;
            self.records.insert(
                id,
                NodeRecord {
                    text,
                    rect: None,
                    fill_key: None,
                    element: Arc::clone(element),
                },
            );
        }
        let Some(record) = self.records.get_mut(&id) else {
            return;
        };
        if !is_new {
            surface.update_text_node(record.text, &spec);
        }
        surface.set_visible(record.text, element.show_text() && !suppressed);

        if element.show_background() {
            let cover = element.cover_bounds(self.cover_expand);
            let key = FillKey::of(element, cover);

            if record.fill_key.as_ref() != Some(&key) {
                match mask::composite(&cover, key.bg_color, &key.strokes) {
                    Ok(fill) => {
                        match record.rect {
                            Some(rect) => surface.set_fill(rect, &fill),
                            None => {
                                let rect = surface.create_rect_node(cover, &fill);
                                self.owners.insert(rect, id);
                                record.rect = Some(rect);
                                report.created += 1;
                            }
                        }
                        record.fill_key = Some(key);
                        report.refilled += 1;
                    }
                    Err(err) => {
                        log::warn!("Keeping previous fill for element {}: {}", id, err);
                        if record.rect.is_none() {
                            let rect = surface
                                .create_rect_node(cover, &FillDescriptor::Solid(key.bg_color));
                            self.owners.insert(rect, id);
                            record.rect = Some(rect);
                            report.created += 1;
                        }
                        report.failures.push((id, err));
                    }
                }
            }
            if let Some(rect) = record.rect {
                surface.set_visible(rect, !suppressed);
            }
        } else if let Some(rect) = record.rect.take() {
            surface.remove_node(rect);
            self.owners.remove(&rect);
            record.fill_key = None;
            report.removed += 1;
        }

        record.element = Arc::clone(element);
    }

    fn drop_record(&mut self, id: ElementId, surface: &mut dyn RenderSurface) {
        if let Some(record) = self.records.remove(&id) {
            surface.remove_node(record.text);
            self.owners.remove(&record.text);
            if let Some(rect) = record.rect {
                surface.remove_node(rect);
                self.owners.remove(&rect);
            }
        }
    }

    /// Hide every owned node (compare mode) or restore visibility from the
    /// last reconciled state
    pub fn set_suppressed(&mut self, suppressed: bool, surface: &mut dyn RenderSurface) {
        self.suppressed = suppressed;
        for record in self.records.values() {
            surface.set_visible(record.text, record.element.show_text() && !suppressed);
            if let Some(rect) = record.rect {
                surface.set_visible(rect, !suppressed);
            }
        }
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    /// Remove every owned node
    pub fn dispose(&mut self, surface: &mut dyn RenderSurface) {
        let ids: Vec<ElementId> = self.records.keys().copied().collect();
        for id in ids {
            self.drop_record(id, surface);
        }
        self.suppressed = false;
        log::debug!("Disposed all render nodes");
    }

    pub fn text_node(&self, id: ElementId) -> Option<NodeId> {
        self.records.get(&id).map(|r| r.text)
    }

    pub fn rect_node(&self, id: ElementId) -> Option<NodeId> {
        self.records.get(&id).and_then(|r| r.rect)
    }

    /// Element a node was created for
    pub fn element_for_node(&self, node: NodeId) -> Option<ElementId> {
        self.owners.get(&node).copied()
    }

    pub fn owned_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.owners.keys().copied()
    }

    pub fn node_count(&self) -> usize {
        self.owners.len()
    }

    pub fn background_presence(&self, id: ElementId) -> Option<BackgroundPresence> {
        let record = self.records.get(&id)?;
        Some(match record.rect {
            None => BackgroundPresence::NoBackground,
            Some(_) if record.element.eraser_strokes().is_empty() => {
                BackgroundPresence::BackgroundSolid
            }
            Some(_) => BackgroundPresence::BackgroundMasked,
        })
    }

    pub fn text_presence(&self, id: ElementId) -> Option<TextPresence> {
        let record = self.records.get(&id)?;
        Some(if record.element.show_text() {
            TextPresence::TextVisible
        } else {
            TextPresence::TextHidden
        })
    }
}
