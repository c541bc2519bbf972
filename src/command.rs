use crate::element::{ElementId, ElementPatch, EraserStroke};
use crate::store::OverlayStore;

/// User-level edits applied to the overlay store
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Merge fields into an element
    Update { id: ElementId, patch: ElementPatch },

    ToggleBackground(ElementId),

    ToggleText(ElementId),

    /// Record one eraser dab on an element's covering rectangle
    AppendEraserStroke { id: ElementId, stroke: EraserStroke },

    /// Revert one element to its detection
    ResetElement(ElementId),

    /// Revert every element
    RestoreAll,

    /// Select an element or clear the selection
    Select(Option<ElementId>),
}

impl Command {
    /// Apply to the store. Returns whether anything was committed.
    pub fn apply(self, store: &mut OverlayStore) -> bool {
        match self {
            Command::Update { id, patch } => store.update(id, patch),
            Command::ToggleBackground(id) => store.toggle_background(id),
            Command::ToggleText(id) => store.toggle_text(id),
            Command::AppendEraserStroke { id, stroke } => store.append_eraser_stroke(id, stroke),
            Command::ResetElement(id) => store.reset_element(id),
            Command::RestoreAll => {
                store.restore_all();
                true
            }
            Command::Select(id) => store.select(id),
        }
    }

    /// Element the command is aimed at, if any
    pub fn target(&self) -> Option<ElementId> {
        match self {
            Command::Update { id, .. }
            | Command::ToggleBackground(id)
            | Command::ToggleText(id)
            | Command::AppendEraserStroke { id, .. }
            | Command::ResetElement(id) => Some(*id),
            Command::Select(id) => *id,
            Command::RestoreAll => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::Update { .. } => "update",
            Command::ToggleBackground(_) => "toggle_background",
            Command::ToggleText(_) => "toggle_text",
            Command::AppendEraserStroke { .. } => "append_eraser_stroke",
            Command::ResetElement(_) => "reset_element",
            Command::RestoreAll => "restore_all",
            Command::Select(_) => "select",
        }
    }
}
