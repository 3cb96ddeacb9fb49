//! Pattern Recognizer
//!
//! Compares the intensity sequence of a marker set against a small library
//! of reference signatures using cosine similarity. A pattern matches when
//! its score exceeds its own confidence threshold; the best match wins and
//! ties go to the earlier-registered pattern.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::markers::Marker;

/// Fewest markers that can form a pattern
pub const MIN_MARKERS: usize = 3;

/// A reference intensity signature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: Cow<'static, str>,
    /// Normalized intensities in `[0, 1]`
    pub signature: Cow<'static, [f64]>,
    pub confidence_threshold: f64,
    /// Editing advice shown when the pattern is recognized
    pub suggestion: Cow<'static, str>,
}

impl Pattern {
    pub fn new(
        id: impl Into<String>,
        signature: Vec<f64>,
        confidence_threshold: f64,
        suggestion: impl Into<String>,
    ) -> Self {
        Self {
            id: Cow::Owned(id.into()),
            signature: Cow::Owned(signature),
            confidence_threshold,
            suggestion: Cow::Owned(suggestion.into()),
        }
    }
}

/// Built-in library, in registration order
pub const BUILTIN_PATTERNS: &[Pattern] = &[
    Pattern {
        id: Cow::Borrowed("rhythm"),
        signature: Cow::Borrowed(&[0.8, 0.2, 0.8, 0.2, 0.8, 0.2, 0.8, 0.2]),
        confidence_threshold: 0.85,
        suggestion: Cow::Borrowed("Alternating beats detected: cut on every strong beat"),
    },
    Pattern {
        id: Cow::Borrowed("crescendo"),
        signature: Cow::Borrowed(&[0.2, 0.4, 0.6, 0.8, 1.0]),
        confidence_threshold: 0.75,
        suggestion: Cow::Borrowed("Rising intensity: hold the build and cut on the final peak"),
    },
    Pattern {
        id: Cow::Borrowed("decrescendo"),
        signature: Cow::Borrowed(&[1.0, 0.8, 0.6, 0.4, 0.2]),
        confidence_threshold: 0.75,
        suggestion: Cow::Borrowed("Falling intensity: a fade-out or outro fits here"),
    },
    Pattern {
        id: Cow::Borrowed("dialogue"),
        signature: Cow::Borrowed(&[0.5, 0.5, 0.5, 0.5, 0.5, 0.5]),
        confidence_threshold: 0.9,
        suggestion: Cow::Borrowed("Even intensity: keep cuts on speaker changes"),
    },
];

/// Best-matching pattern for a marker set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedPattern {
    pub pattern_id: String,
    pub score: f64,
    /// Markers (time-ordered) that took part in the comparison
    pub marker_ids: Vec<String>,
    pub suggestion: String,
}

/// Similarity of one library pattern to a marker set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternScore {
    pub pattern_id: String,
    pub score: f64,
    pub threshold: f64,
}

impl PatternScore {
    pub fn is_match(&self) -> bool {
        self.score > self.threshold
    }
}

/// Matches marker intensity sequences against a pattern library
#[derive(Debug, Clone, PartialEq)]
pub struct PatternRecognizer {
    patterns: Cow<'static, [Pattern]>,
}

impl Default for PatternRecognizer {
    fn default() -> Self {
        Self {
            patterns: Cow::Borrowed(BUILTIN_PATTERNS),
        }
    }
}

impl PatternRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom library; earlier patterns win ties
    pub fn with_patterns(patterns: Vec<Pattern>) -> Self {
        Self {
            patterns: Cow::Owned(patterns),
        }
    }

    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Find the best pattern whose score clears its own threshold.
    ///
    /// Returns `None` for fewer than three markers or when nothing matches.
    pub fn recognize(&self, markers: &[Marker]) -> Option<RecognizedPattern> {
        if markers.len() < MIN_MARKERS {
            return None;
        }

        let ordered = time_ordered(markers);
        let candidate = intensities(&ordered);

        let mut best: Option<(&Pattern, f64)> = None;
        for pattern in self.patterns.iter() {
            let score = prefix_cosine_similarity(&candidate, &pattern.signature);
            if score <= pattern.confidence_threshold {
                continue;
            }
            if best.map_or(true, |(_, best_score)| score > best_score) {
                best = Some((pattern, score));
            }
        }

        best.map(|(pattern, score)| {
            let compared = candidate.len().min(pattern.signature.len());
            RecognizedPattern {
                pattern_id: pattern.id.to_string(),
                score,
                marker_ids: ordered[..compared].iter().map(|m| m.id.clone()).collect(),
                suggestion: pattern.suggestion.to_string(),
            }
        })
    }

    /// Score every pattern in the library, in registration order
    pub fn scores(&self, markers: &[Marker]) -> Vec<PatternScore> {
        let candidate = intensities(&time_ordered(markers));
        self.patterns
            .iter()
            .map(|pattern| PatternScore {
                pattern_id: pattern.id.to_string(),
                score: prefix_cosine_similarity(&candidate, &pattern.signature),
                threshold: pattern.confidence_threshold,
            })
            .collect()
    }
}

fn time_ordered(markers: &[Marker]) -> Vec<&Marker> {
    let mut ordered: Vec<&Marker> = markers.iter().collect();
    ordered.sort_by(|a, b| a.time.total_cmp(&b.time));
    ordered
}

fn intensities(markers: &[&Marker]) -> Vec<f64> {
    markers.iter().map(|m| m.intensity.unwrap_or(0.0)).collect()
}

/// Cosine similarity over the first `min(a.len(), b.len())` elements.
///
/// Zero-length or zero-magnitude inputs score 0.
pub fn prefix_cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }

    let (dot, norm_a, norm_b) = a[..n]
        .iter()
        .zip(&b[..n])
        .fold((0.0, 0.0, 0.0), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    dot / denom
}
