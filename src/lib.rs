//! Trimline - Timeline Trim, Ripple and Marker Engine
//!
//! The editing core behind a clip editor, independent of any rendering:
//! 1. Trim - a frame-quantized in/out selection with drag, nudge and undo
//! 2. Ripple - propagation of a committed edit to dependent clips
//! 3. Markers - time-anchored annotations, generated or hand-placed
//!
//! # Architecture
//!
//! All state lives in explicit per-session instances:
//! - [`trim::TrimState`] owns the selection and its history
//! - [`markers::MarkerRegistry`] owns the markers
//! - [`ripple`](mod@ripple) and [`patterns`] work on snapshots passed in by the caller
//! - [`session::EditorSession`] bundles them for one open editor
//!
//! Replicas of a session exchange [`collab::CollabEvent`]s; the transport
//! itself is supplied by the host.

pub mod cli;
pub mod collab;
pub mod config;
pub mod error;
pub mod markers;
pub mod patterns;
pub mod ripple;
pub mod session;
pub mod timeline;
pub mod trim;

pub use config::EngineConfig;
pub use error::{Result, TrimlineError};
pub use markers::{Marker, MarkerRegistry, MarkerType};
pub use patterns::{PatternRecognizer, RecognizedPattern};
pub use ripple::{ripple, Clip, RippleEffect, RippleMode};
pub use session::EditorSession;
pub use timeline::TimeRange;
pub use trim::{DragKind, TrimState};
