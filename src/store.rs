//! Canonical editable state for every detection in the session.
//!
//! Every mutation publishes a fresh [`StoreSnapshot`]. Elements that did
//! not change keep their `Arc`, so observers can diff with
//! [`Arc::ptr_eq`] instead of comparing contents.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::DEFAULT_FONT;
use crate::detection::Detection;
use crate::element::{ElementId, ElementPatch, EraserStroke, OverlayElement};

/// Immutable view of the store at one point in time
#[derive(Debug, Clone, Default)]
pub struct StoreSnapshot {
    elements: Vec<Arc<OverlayElement>>,
    index: HashMap<ElementId, usize>,
    selected: Option<ElementId>,
}

impl StoreSnapshot {
    pub fn get(&self, id: ElementId) -> Option<&Arc<OverlayElement>> {
        self.index.get(&id).map(|&i| &self.elements[i])
    }

    /// Elements in detection order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<OverlayElement>> {
        self.elements.iter()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.selected
    }
}

/// Single-writer store of overlay elements
#[derive(Debug)]
pub struct OverlayStore {
    snapshot: Arc<StoreSnapshot>,
    default_font: String,
    revision: u64,
}

impl Default for OverlayStore {
    fn default() -> Self {
        Self::new(DEFAULT_FONT)
    }
}

impl OverlayStore {
    pub fn new(default_font: impl Into<String>) -> Self {
        Self {
            snapshot: Arc::new(StoreSnapshot::default()),
            default_font: default_font.into(),
            revision: 0,
        }
    }

    /// Current state; cheap to clone and never mutated afterwards
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Bumped once per committed mutation
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, id: ElementId) -> Option<&Arc<OverlayElement>> {
        self.snapshot.get(id)
    }

    pub fn len(&self) -> usize {
        self.snapshot.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.is_empty()
    }

    pub fn selected(&self) -> Option<ElementId> {
        self.snapshot.selected
    }

    fn publish(&mut self, snapshot: StoreSnapshot) {
        self.snapshot = Arc::new(snapshot);
        self.revision += 1;
    }

    /// Replace one element by applying `f` to a copy of it.
    /// Returns false (and publishes nothing) for unknown ids.
    fn modify(&mut self, id: ElementId, f: impl FnOnce(&mut OverlayElement)) -> bool {
        let Some(&slot) = self.snapshot.index.get(&id) else {
            log::debug!("Ignoring mutation of unknown element {}", id);
            return false;
        };
        let mut next = (*self.snapshot).clone();
        f(Arc::make_mut(&mut next.elements[slot]));
        self.publish(next);
        true
    }

    /// Replace all elements with one fresh element per detection.
    ///
    /// Later duplicates of an index are dropped so ids stay unique.
    pub fn initialize(&mut self, detections: Vec<Detection>) {
        let mut elements = Vec::with_capacity(detections.len());
        let mut index = HashMap::with_capacity(detections.len());

        for detection in detections {
            let id = detection.index;
            if index.contains_key(&id) {
                log::warn!("Duplicate detection index {} dropped", id);
                continue;
            }
            index.insert(id, elements.len());
            elements.push(Arc::new(OverlayElement::from_detection(
                detection,
                &self.default_font,
            )));
        }

        log::info!("Store initialized with {} elements", elements.len());
        self.publish(StoreSnapshot {
            elements,
            index,
            selected: None,
        });
    }

    /// Merge `patch` into the element's mutable state
    pub fn update(&mut self, id: ElementId, patch: ElementPatch) -> bool {
        self.modify(id, |element| element.apply_patch(patch))
    }

    pub fn toggle_background(&mut self, id: ElementId) -> bool {
        self.modify(id, OverlayElement::toggle_background)
    }

    pub fn toggle_text(&mut self, id: ElementId) -> bool {
        self.modify(id, OverlayElement::toggle_text)
    }

    /// Append without deduplication or capping
    pub fn append_eraser_stroke(&mut self, id: ElementId, stroke: EraserStroke) -> bool {
        self.modify(id, |element| element.push_stroke(stroke))
    }

    pub fn reset_element(&mut self, id: ElementId) -> bool {
        self.modify(id, OverlayElement::reset)
    }

    /// Reset every element. Already pristine elements keep their `Arc`.
    pub fn restore_all(&mut self) {
        let mut next = (*self.snapshot).clone();
        for element in &mut next.elements {
            if !element.is_pristine() {
                Arc::make_mut(element).reset();
            }
        }
        self.publish(next);
    }

    /// Apply sampled colors to the elements with matching ids, keeping
    /// every other edit. Returns how many elements were recolored.
    pub fn recolor(&mut self, detections: &[Detection]) -> usize {
        let mut next = (*self.snapshot).clone();
        let mut recolored = 0;
        for detection in detections {
            let Some(&slot) = next.index.get(&detection.index) else {
                log::debug!("No element for enhanced detection {}", detection.index);
                continue;
            };
            let original = &next.elements[slot].original().detection;
            if original.bg_color == detection.bg_color && original.text_color == detection.text_color {
                continue;
            }
            Arc::make_mut(&mut next.elements[slot]).recolor(detection.bg_color, detection.text_color);
            recolored += 1;
        }
        if recolored > 0 {
            self.publish(next);
        }
        recolored
    }

    /// Select one element or clear the selection.
    /// Unknown ids leave the selection unchanged.
    pub fn select(&mut self, id: Option<ElementId>) -> bool {
        if let Some(id) = id {
            if !self.snapshot.contains(id) {
                return false;
            }
        }
        let mut next = (*self.snapshot).clone();
        next.selected = id;
        self.publish(next);
        true
    }

    /// Drop everything, as on a fresh store
    pub fn clear(&mut self) {
        self.publish(StoreSnapshot::default());
    }
}
