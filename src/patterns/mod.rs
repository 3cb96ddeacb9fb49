//! Pattern recognition
//!
//! Matches the intensity profile of a marker set against known editing
//! patterns and offers a suggestion for the best fit.

mod recognizer;

pub use recognizer::{
    prefix_cosine_similarity, Pattern, PatternRecognizer, PatternScore, RecognizedPattern,
    BUILTIN_PATTERNS, MIN_MARKERS,
};
