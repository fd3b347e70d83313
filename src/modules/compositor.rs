mod cm_helpers;
mod cm_history;
mod cm_main;
mod cm_memory;
mod cm_snap;
mod cm_state;
mod cm_tools;
mod cm_ui;

pub use cm_main::Workspace;
pub use cm_snap::SnapPolicy;
pub use cm_state::{EditorConfig, MAX_CANVAS_SIDE};
