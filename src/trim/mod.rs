//! Trim editing
//!
//! The in/out selection state machine and its undo history.

mod history;
mod state;

pub use history::TrimHistory;
pub use state::{DragKind, TrimCommit, TrimPhase, TrimState};
