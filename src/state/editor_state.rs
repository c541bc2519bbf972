//! Interaction modes of the overlay editor.
//!
//! ```text
//!   ┌──────────┐  enter_erase   ┌───────────────────────┐
//!   │          ├───────────────►│ Erase                 │
//!   │  Select  │                │  press   ─► stroke on │
//!   │          │◄───────────────┤  release ─► stroke off│
//!   └──────────┘  exit_erase    └───────────────────────┘
//! ```
//!
//! Entering Erase makes every owned node inert and records what each node
//! allowed before, in a side-table owned by the [`ModeController`].
//! Leaving Erase writes those records back verbatim.
use std::collections::{HashMap, HashSet};

use crate::error::ModeError;
use crate::surface::{CursorStyle, NodeId, NodeInteraction, RenderSurface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EditorState {
    /// Nodes can be selected and dragged
    #[default]
    Select,
    /// Pointer input erases covering rectangles
    Erase {
        /// True between pointer press and release
        stroke_active: bool,
    },
}

impl EditorState {
    /// Select and Erase only transition into each other
    pub fn can_transition_to(&self, new_state: &EditorState) -> bool {
        matches!(
            (self, new_state),
            (EditorState::Select, EditorState::Erase { .. })
                | (EditorState::Erase { .. }, EditorState::Select)
        )
    }

    pub fn is_selecting(&self) -> bool {
        matches!(self, EditorState::Select)
    }

    pub fn is_erasing(&self) -> bool {
        matches!(self, EditorState::Erase { .. })
    }

    pub fn is_stroke_active(&self) -> bool {
        matches!(self, EditorState::Erase { stroke_active: true })
    }

    pub fn name(&self) -> &'static str {
        match self {
            EditorState::Select => "Select",
            EditorState::Erase { .. } => "Erase",
        }
    }
}

/// Owns the current mode and the interaction flags it suspended
#[derive(Debug, Default)]
pub struct ModeController {
    state: EditorState,
    captured: HashMap<NodeId, NodeInteraction>,
}

impl ModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> EditorState {
        self.state
    }

    fn transition_to(&mut self, new_state: EditorState) -> Result<(), ModeError> {
        if !self.state.can_transition_to(&new_state) {
            return Err(ModeError::InvalidTransition {
                from: self.state.name(),
                to: new_state.name(),
            });
        }
        log::info!("Editor mode {} -> {}", self.state.name(), new_state.name());
        self.state = new_state;
        Ok(())
    }

    /// Switch to Erase, suspending interaction on `nodes`
    pub fn enter_erase(
        &mut self,
        nodes: impl IntoIterator<Item = NodeId>,
        surface: &mut dyn RenderSurface,
        cursor: CursorStyle,
    ) -> Result<(), ModeError> {
        self.transition_to(EditorState::Erase {
            stroke_active: false,
        })?;
        self.adopt(nodes, surface);
        surface.set_cursor(cursor);
        Ok(())
    }

    /// Bring the side-table in line with the live `nodes`: records of
    /// removed nodes are dropped and nodes created while erasing are
    /// suspended. Nodes already captured keep their first record.
    pub fn adopt(&mut self, nodes: impl IntoIterator<Item = NodeId>, surface: &mut dyn RenderSurface) {
        if !self.state.is_erasing() {
            return;
        }
        let live: HashSet<NodeId> = nodes.into_iter().collect();
        self.captured.retain(|node, _| live.contains(node));

        for node in live {
            if self.captured.contains_key(&node) {
                continue;
            }
            if let Some(previous) = surface.interaction(node) {
                self.captured.insert(node, previous);
                surface.set_interaction(node, NodeInteraction::INERT);
            }
        }
    }

    /// Number of nodes whose interaction is currently suspended
    pub fn captured_count(&self) -> usize {
        self.captured.len()
    }

    /// Back to Select, restoring every captured node
    pub fn exit_erase(&mut self, surface: &mut dyn RenderSurface) -> Result<(), ModeError> {
        self.transition_to(EditorState::Select)?;
        for (node, previous) in self.captured.drain() {
            surface.set_interaction(node, previous);
        }
        surface.set_cursor(CursorStyle::Default);
        Ok(())
    }

    /// Begin a stroke-append sequence. False outside Erase.
    pub fn press(&mut self) -> bool {
        match &mut self.state {
            EditorState::Erase { stroke_active } => {
                *stroke_active = true;
                true
            }
            EditorState::Select => false,
        }
    }

    /// End the active stroke-append sequence
    pub fn release(&mut self) {
        if let EditorState::Erase { stroke_active } = &mut self.state {
            *stroke_active = false;
        }
    }

    pub fn captured(&self, node: NodeId) -> Option<NodeInteraction> {
        self.captured.get(&node).copied()
    }
}
