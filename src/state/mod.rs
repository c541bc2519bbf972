mod editor_state;
pub mod context;

pub use context::{EditorContext, EnhancementTicket};
pub use editor_state::{EditorState, ModeController};
