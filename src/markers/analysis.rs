//! Markers derived from external analysis
//!
//! Peak, emotion and scene detectors run outside the engine. Their output
//! maps 1:1 onto markers: one marker per input entry, in input order
//! (peaks, then emotions, then scenes).

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::marker::{Marker, MarkerType};

/// Loudness peak reported by the analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakData {
    pub time: f64,
    pub value: f64,
}

/// Emotion detected at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionData {
    pub time: f64,
    pub emotion: String,
    pub confidence: f64,
}

/// Detected scene span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneData {
    pub start: f64,
    pub end: f64,
    #[serde(rename = "type")]
    pub scene_type: String,
    pub confidence: f64,
}

/// Complete analyzer output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisData {
    pub peaks: Vec<PeakData>,
    pub emotions: Vec<EmotionData>,
    pub scenes: Vec<SceneData>,
}

impl AnalysisData {
    /// Number of markers this analysis will produce
    pub fn len(&self) -> usize {
        self.peaks.len() + self.emotions.len() + self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn peak_marker(peak: &PeakData) -> Marker {
    let mut marker = Marker::new(peak.time, MarkerType::Peak)
        .with_intensity(peak.value)
        .with_confidence(peak.value.clamp(0.0, 1.0));
    marker.metadata = Some(json!({ "value": peak.value }));
    marker
}

pub fn emotion_marker(emotion: &EmotionData) -> Marker {
    let mut marker = Marker::new(emotion.time, MarkerType::Emotion)
        .with_label(capitalize(&emotion.emotion))
        .with_confidence(emotion.confidence)
        .with_intensity(emotion.confidence);
    marker.metadata = Some(json!({ "emotion": emotion.emotion }));
    marker
}

pub fn scene_marker(scene: &SceneData) -> Marker {
    let mut marker = Marker::new(scene.start, MarkerType::SceneChange)
        .with_label(format!("Scene: {}", scene.scene_type))
        .with_confidence(scene.confidence);
    marker.duration = Some((scene.end - scene.start).max(0.0));
    marker.metadata = Some(json!({ "scene_type": scene.scene_type }));
    marker
}

/// Build one marker per analysis entry, stamped with `author` if given.
pub fn derive_markers(
    peaks: &[PeakData],
    emotions: &[EmotionData],
    scenes: &[SceneData],
    author: Option<&str>,
) -> Vec<Marker> {
    peaks
        .iter()
        .map(peak_marker)
        .chain(emotions.iter().map(emotion_marker))
        .chain(scenes.iter().map(scene_marker))
        .map(|mut marker| {
            marker.author = author.map(str::to_string);
            marker
        })
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_analysis() -> AnalysisData {
        serde_json::from_str(
            r#"{
                "peaks": [{"time": 1.0, "value": 0.9}, {"time": 4.0, "value": 1.3}],
                "emotions": [{"time": 2.0, "emotion": "joy", "confidence": 0.7}],
                "scenes": [{"start": 5.0, "end": 9.5, "type": "cut", "confidence": 0.95}]
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_one_marker_per_entry_in_order() {
        let analysis = sample_analysis();
        let markers = derive_markers(
            &analysis.peaks,
            &analysis.emotions,
            &analysis.scenes,
            None,
        );

        assert_eq!(markers.len(), analysis.len());
        let types: Vec<_> = markers.iter().map(|m| m.marker_type).collect();
        assert_eq!(
            types,
            vec![
                MarkerType::Peak,
                MarkerType::Peak,
                MarkerType::Emotion,
                MarkerType::SceneChange
            ]
        );
    }

    #[test]
    fn test_peak_confidence_clamped() {
        let marker = peak_marker(&PeakData {
            time: 4.0,
            value: 1.3,
        });
        assert_eq!(marker.confidence, Some(1.0));
        assert_eq!(marker.intensity, Some(1.3));
        assert_eq!(marker.color, MarkerType::Peak.default_color());
    }

    #[test]
    fn test_emotion_label_capitalized() {
        let marker = emotion_marker(&EmotionData {
            time: 2.0,
            emotion: "surprise".to_string(),
            confidence: 0.6,
        });
        assert_eq!(marker.label, "Surprise");
        assert_eq!(marker.metadata.unwrap()["emotion"], "surprise");
    }

    #[test]
    fn test_scene_duration() {
        let marker = scene_marker(&SceneData {
            start: 5.0,
            end: 9.5,
            scene_type: "cut".to_string(),
            confidence: 0.95,
        });
        assert_eq!(marker.time, 5.0);
        assert_eq!(marker.duration, Some(4.5));
        assert_eq!(marker.label, "Scene: cut");
    }

    #[test]
    fn test_inverted_scene_has_zero_duration() {
        let marker = scene_marker(&SceneData {
            start: 5.0,
            end: 3.0,
            scene_type: "fade".to_string(),
            confidence: 0.5,
        });
        assert_eq!(marker.duration, Some(0.0));
    }

    #[test]
    fn test_author_stamped() {
        let analysis = sample_analysis();
        let markers = derive_markers(&analysis.peaks, &[], &[], Some("analyzer"));
        assert!(markers.iter().all(|m| m.author.as_deref() == Some("analyzer")));
    }

    #[test]
    fn test_missing_sections_default_empty() {
        let analysis: AnalysisData = serde_json::from_str(r#"{"peaks": []}"#).unwrap();
        assert!(analysis.is_empty());
    }
}
