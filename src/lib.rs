#![warn(clippy::all, rust_2018_idioms)]

pub mod color_sampler;
pub mod command;
pub mod config;
pub mod detection;
pub mod element;
pub mod error;
pub mod export;
pub mod mask;
pub mod render_sync;
pub mod state;
pub mod store;
pub mod surface;
pub mod texture_manager;
pub mod view;

pub use color_sampler::ColorSampler;
pub use command::Command;
pub use config::EditorConfig;
pub use detection::{BoundingBox, Detection, RgbColor, parse_detection_response};
pub use element::{ElementId, ElementPatch, ElementTransform, EraserStroke, OverlayElement};
pub use export::ExportPlan;
pub use mask::FillDescriptor;
pub use render_sync::{BackgroundPresence, ReconcileReport, RenderSync, TextPresence};
pub use state::{EditorContext, EditorState, EnhancementTicket, ModeController};
pub use store::{OverlayStore, StoreSnapshot};
pub use surface::{EguiSurface, NodeId, RenderSurface};
pub use view::CanvasView;
