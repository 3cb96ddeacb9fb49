//! Timeline markers
//!
//! Marker records, the per-session registry, and derivation of markers
//! from external analysis output.

mod analysis;
mod marker;
mod registry;

pub use analysis::{
    derive_markers, emotion_marker, peak_marker, scene_marker, AnalysisData, EmotionData,
    PeakData, SceneData,
};
pub use marker::{Marker, MarkerPatch, MarkerType};
pub use registry::{nearest_marker, MarkerRegistry, DUPLICATE_OFFSET_SECS};
