//! Marker records
//!
//! A marker is a typed, labeled point (optionally with a duration) anchored
//! to a timeline position. Field names serialize in camelCase so records
//! travel unchanged through the collaboration event contract.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Kinds of marker, each with a fixed colour and icon class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MarkerType {
    /// Generic cue point placed by the editor
    Cue,
    /// Chapter boundary
    Chapter,
    /// Moment flagged as worth clipping
    Highlight,
    /// Musical beat
    Beat,
    /// Free-form note
    Comment,
    /// Audio loudness peak (from analysis)
    Peak,
    /// Detected emotion (from analysis)
    Emotion,
    /// Scene boundary (from analysis)
    SceneChange,
}

impl MarkerType {
    pub const ALL: [MarkerType; 8] = [
        MarkerType::Cue,
        MarkerType::Chapter,
        MarkerType::Highlight,
        MarkerType::Beat,
        MarkerType::Comment,
        MarkerType::Peak,
        MarkerType::Emotion,
        MarkerType::SceneChange,
    ];

    /// Wire name, as used in JSON and on the command line
    pub const fn as_str(self) -> &'static str {
        match self {
            MarkerType::Cue => "cue",
            MarkerType::Chapter => "chapter",
            MarkerType::Highlight => "highlight",
            MarkerType::Beat => "beat",
            MarkerType::Comment => "comment",
            MarkerType::Peak => "peak",
            MarkerType::Emotion => "emotion",
            MarkerType::SceneChange => "scene-change",
        }
    }

    /// Default display colour (hex)
    pub const fn default_color(self) -> &'static str {
        match self {
            MarkerType::Cue => "#3b82f6",
            MarkerType::Chapter => "#8b5cf6",
            MarkerType::Highlight => "#f59e0b",
            MarkerType::Beat => "#10b981",
            MarkerType::Comment => "#6b7280",
            MarkerType::Peak => "#ef4444",
            MarkerType::Emotion => "#ec4899",
            MarkerType::SceneChange => "#06b6d4",
        }
    }

    /// Icon class the UI renders for this type
    pub const fn icon_class(self) -> &'static str {
        match self {
            MarkerType::Cue => "icon-flag",
            MarkerType::Chapter => "icon-bookmark",
            MarkerType::Highlight => "icon-star",
            MarkerType::Beat => "icon-music",
            MarkerType::Comment => "icon-message",
            MarkerType::Peak => "icon-zap",
            MarkerType::Emotion => "icon-heart",
            MarkerType::SceneChange => "icon-film",
        }
    }

    /// Label given to freshly added markers
    pub const fn default_label(self) -> &'static str {
        match self {
            MarkerType::Cue => "Cue",
            MarkerType::Chapter => "Chapter",
            MarkerType::Highlight => "Highlight",
            MarkerType::Beat => "Beat",
            MarkerType::Comment => "Comment",
            MarkerType::Peak => "Peak",
            MarkerType::Emotion => "Emotion",
            MarkerType::SceneChange => "Scene Change",
        }
    }
}

impl fmt::Display for MarkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarkerType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        MarkerType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown marker type '{}'", s))
    }
}

/// A time-anchored annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// Unique identifier, never reused
    pub id: String,
    /// Position in seconds
    pub time: f64,
    #[serde(rename = "type")]
    pub marker_type: MarkerType,
    pub label: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// Span in seconds for range markers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Strength in `[0, 1]`, read by pattern recognition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    #[serde(default)]
    pub locked: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_markers: Vec<String>,
    /// Analysis details (emotion name, scene type, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl Marker {
    /// Create a marker with a fresh id and the type's defaults
    pub fn new(time: f64, marker_type: MarkerType) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            time,
            marker_type,
            label: marker_type.default_label().to_string(),
            color: marker_type.default_color().to_string(),
            confidence: None,
            duration: None,
            intensity: None,
            locked: false,
            author: None,
            created: now,
            modified: now,
            linked_markers: Vec::new(),
            metadata: None,
        }
    }

    /// Create a marker with a specific id (for testing or import)
    pub fn with_id(id: impl Into<String>, time: f64, marker_type: MarkerType) -> Self {
        Self {
            id: id.into(),
            ..Self::new(time, marker_type)
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_intensity(mut self, intensity: f64) -> Self {
        self.intensity = Some(intensity);
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }

    /// Icon class for this marker's type
    pub fn icon_class(&self) -> &'static str {
        self.marker_type.icon_class()
    }

    pub fn is_linked_to(&self, id: &str) -> bool {
        self.linked_markers.iter().any(|l| l == id)
    }
}

/// Partial update applied by `MarkerRegistry::update`
///
/// `None` fields are left untouched. Changing the type without giving a
/// colour resets the colour to the new type's default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MarkerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<f64>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub marker_type: Option<MarkerType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intensity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linked_markers: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl MarkerPatch {
    /// True when the patch would change nothing
    pub fn is_empty(&self) -> bool {
        *self == MarkerPatch::default()
    }

    /// Merge the patch into `marker`. Does not touch `modified`.
    pub fn apply_to(&self, marker: &mut Marker) {
        if let Some(time) = self.time {
            marker.time = time;
        }
        if let Some(marker_type) = self.marker_type {
            marker.marker_type = marker_type;
            if self.color.is_none() {
                marker.color = marker_type.default_color().to_string();
            }
        }
        if let Some(label) = &self.label {
            marker.label = label.clone();
        }
        if let Some(color) = &self.color {
            marker.color = color.clone();
        }
        if let Some(confidence) = self.confidence {
            marker.confidence = Some(confidence);
        }
        if let Some(duration) = self.duration {
            marker.duration = Some(duration);
        }
        if let Some(intensity) = self.intensity {
            marker.intensity = Some(intensity);
        }
        if let Some(locked) = self.locked {
            marker.locked = locked;
        }
        if let Some(author) = &self.author {
            marker.author = Some(author.clone());
        }
        if let Some(linked) = &self.linked_markers {
            marker.linked_markers = linked.clone();
        }
        if let Some(metadata) = &self.metadata {
            marker.metadata = Some(metadata.clone());
        }
    }
}
