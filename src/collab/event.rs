//! Collaboration event contract
//!
//! Wire format shared by every replica of an editing session:
//! `{"type": "marker-added" | "marker-updated" | "marker-deleted", "data": ...}`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::markers::{Marker, MarkerPatch};

/// Partial update of a remote marker, stamped with its modification time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMarkerUpdate {
    pub id: String,
    /// Remote `modified` stamp; decides the merge
    pub modified: DateTime<Utc>,
    #[serde(flatten)]
    pub patch: MarkerPatch,
}

/// A marker change broadcast between replicas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum CollabEvent {
    MarkerAdded(Marker),
    MarkerUpdated(RemoteMarkerUpdate),
    MarkerDeleted { id: String },
}

impl CollabEvent {
    pub fn added(marker: &Marker) -> Self {
        CollabEvent::MarkerAdded(marker.clone())
    }

    /// Update event for `patch` as applied to `marker` (post-update copy)
    pub fn updated(marker: &Marker, patch: &MarkerPatch) -> Self {
        CollabEvent::MarkerUpdated(RemoteMarkerUpdate {
            id: marker.id.clone(),
            modified: marker.modified,
            patch: patch.clone(),
        })
    }

    pub fn deleted(id: impl Into<String>) -> Self {
        CollabEvent::MarkerDeleted { id: id.into() }
    }

    /// Id of the marker this event concerns
    pub fn marker_id(&self) -> &str {
        match self {
            CollabEvent::MarkerAdded(marker) => &marker.id,
            CollabEvent::MarkerUpdated(update) => &update.id,
            CollabEvent::MarkerDeleted { id } => id,
        }
    }

    /// Wire name of the event
    pub fn kind(&self) -> &'static str {
        match self {
            CollabEvent::MarkerAdded(_) => "marker-added",
            CollabEvent::MarkerUpdated(_) => "marker-updated",
            CollabEvent::MarkerDeleted { .. } => "marker-deleted",
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::MarkerType;
    use serde_json::{json, Value};

    #[test]
    fn test_added_wire_shape() {
        let marker = Marker::with_id("m1", 2.5, MarkerType::Beat);
        let value: Value = serde_json::to_value(CollabEvent::added(&marker)).unwrap();

        assert_eq!(value["type"], "marker-added");
        assert_eq!(value["data"]["id"], "m1");
        assert_eq!(value["data"]["type"], "beat");
        assert_eq!(value["data"]["time"], 2.5);
    }

    #[test]
    fn test_deleted_wire_shape() {
        let value = serde_json::to_value(CollabEvent::deleted("m9")).unwrap();
        assert_eq!(value, json!({"type": "marker-deleted", "data": {"id": "m9"}}));
    }

    #[test]
    fn test_update_patch_is_flattened() {
        let raw = json!({
            "type": "marker-updated",
            "data": {
                "id": "m1",
                "modified": "2026-03-01T12:00:00Z",
                "label": "Drop",
                "type": "highlight"
            }
        });

        let event: CollabEvent = serde_json::from_value(raw).unwrap();
        let CollabEvent::MarkerUpdated(update) = &event else {
            panic!("expected update, got {:?}", event);
        };
        assert_eq!(update.id, "m1");
        assert_eq!(update.patch.label.as_deref(), Some("Drop"));
        assert_eq!(update.patch.marker_type, Some(MarkerType::Highlight));
        assert!(update.patch.time.is_none());
        assert_eq!(event.kind(), "marker-updated");
        assert_eq!(event.marker_id(), "m1");
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert!(CollabEvent::from_json(r#"{"type":"marker-moved","data":{}}"#).is_err());
    }
}
