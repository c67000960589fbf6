//! State Management Module
//!
//! The project store with its rule selection and bounded undo/redo history.

pub mod history;
pub mod project;
pub mod selection;

pub use history::{History, Snapshot, MAX_HISTORY_DEPTH};
pub use project::{bake_positions, ProjectStore};
pub use selection::Selection;
