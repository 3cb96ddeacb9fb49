//! Folding remote marker events into a local registry
//!
//! - `marker-added` replaces any local record with the same id
//! - `marker-updated` applies only when the remote stamp is newer
//! - `marker-deleted` is dropped for locked markers

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::event::{CollabEvent, RemoteMarkerUpdate};
use crate::markers::{Marker, MarkerRegistry};

/// What a remote event did to the local registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeOutcome {
    /// New marker added
    Inserted,
    /// Existing record overwritten by an add
    Replaced,
    Updated,
    /// Remote stamp not newer than local; ignored
    StaleUpdate,
    /// Update or delete for an id this replica does not hold
    UnknownMarker,
    Deleted,
    /// Local copy is locked; the delete is dropped
    DeleteRejectedLocked,
}

impl MergeOutcome {
    /// Whether the local state changed
    pub fn is_applied(self) -> bool {
        matches!(
            self,
            MergeOutcome::Inserted
                | MergeOutcome::Replaced
                | MergeOutcome::Updated
                | MergeOutcome::Deleted
        )
    }

    /// Whether the event should be relayed onward.
    ///
    /// Dropped and ignored events are never rebroadcast.
    pub fn should_rebroadcast(self) -> bool {
        self.is_applied()
    }
}

impl MarkerRegistry {
    /// Apply one remote event under the last-write-wins rules
    pub fn apply_remote(&mut self, event: &CollabEvent) -> MergeOutcome {
        let outcome = match event {
            CollabEvent::MarkerAdded(marker) => self.merge_added(marker),
            CollabEvent::MarkerUpdated(update) => self.merge_updated(update),
            CollabEvent::MarkerDeleted { id } => self.merge_deleted(id),
        };
        debug!(
            "[COLLAB] {} '{}' -> {:?}",
            event.kind(),
            event.marker_id(),
            outcome
        );
        outcome
    }

    fn merge_added(&mut self, marker: &Marker) -> MergeOutcome {
        if self.upsert(marker.clone()) {
            MergeOutcome::Replaced
        } else {
            MergeOutcome::Inserted
        }
    }

    fn merge_updated(&mut self, update: &RemoteMarkerUpdate) -> MergeOutcome {
        let Some(local) = self.get_mut(&update.id) else {
            return MergeOutcome::UnknownMarker;
        };

        if update.modified <= local.modified {
            warn!(
                "[COLLAB] Ignored stale update for '{}' ({} <= {})",
                update.id, update.modified, local.modified
            );
            return MergeOutcome::StaleUpdate;
        }

        update.patch.apply_to(local);
        local.modified = update.modified;
        MergeOutcome::Updated
    }

    fn merge_deleted(&mut self, id: &str) -> MergeOutcome {
        let locked = match self.get(id) {
            Some(marker) => marker.locked,
            None => return MergeOutcome::UnknownMarker,
        };
        if locked {
            warn!("[COLLAB] Dropped remote delete of locked marker '{}'", id);
            return MergeOutcome::DeleteRejectedLocked;
        }

        match self.take(id) {
            Some(_) => MergeOutcome::Deleted,
            None => MergeOutcome::UnknownMarker,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::{MarkerPatch, MarkerType};
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;

    fn registry_with(marker: Marker) -> MarkerRegistry {
        let mut registry = MarkerRegistry::new();
        registry.apply_remote(&CollabEvent::added(&marker));
        registry
    }

    fn update(id: &str, modified: chrono::DateTime<Utc>, label: &str) -> CollabEvent {
        CollabEvent::MarkerUpdated(RemoteMarkerUpdate {
            id: id.to_string(),
            modified,
            patch: MarkerPatch {
                label: Some(label.to_string()),
                ..Default::default()
            },
        })
    }

    #[test]
    fn test_add_inserts_then_replaces() {
        let mut registry = MarkerRegistry::new();
        let marker = Marker::with_id("m1", 1.0, MarkerType::Cue);
        assert_eq!(
            registry.apply_remote(&CollabEvent::added(&marker)),
            MergeOutcome::Inserted
        );

        let newer = Marker::with_id("m1", 4.0, MarkerType::Chapter).with_label("Intro");
        assert_eq!(
            registry.apply_remote(&CollabEvent::added(&newer)),
            MergeOutcome::Replaced
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("m1"), Some(&newer));
    }

    #[test]
    fn test_newer_update_applies_and_takes_remote_stamp() {
        let marker = Marker::with_id("m1", 1.0, MarkerType::Cue);
        let later = marker.modified + Duration::seconds(5);
        let mut registry = registry_with(marker);

        let outcome = registry.apply_remote(&update("m1", later, "Remote"));
        assert_eq!(outcome, MergeOutcome::Updated);
        let local = registry.get("m1").unwrap();
        assert_eq!(local.label, "Remote");
        assert_eq!(local.modified, later);
    }

    #[test]
    fn test_stale_update_ignored() {
        let marker = Marker::with_id("m1", 1.0, MarkerType::Cue);
        let stamp = marker.modified;
        let mut registry = registry_with(marker.clone());

        for modified in [stamp, stamp - Duration::seconds(1)] {
            let outcome = registry.apply_remote(&update("m1", modified, "Old"));
            assert_eq!(outcome, MergeOutcome::StaleUpdate);
            assert!(!outcome.should_rebroadcast());
        }
        assert_eq!(registry.get("m1"), Some(&marker));
    }

    #[test]
    fn test_update_unknown_marker() {
        let mut registry = MarkerRegistry::new();
        let outcome = registry.apply_remote(&update("ghost", Utc::now(), "x"));
        assert_eq!(outcome, MergeOutcome::UnknownMarker);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_delete_respects_lock() {
        let mut marker = Marker::with_id("m1", 1.0, MarkerType::Cue);
        marker.locked = true;
        let mut registry = registry_with(marker);

        let outcome = registry.apply_remote(&CollabEvent::deleted("m1"));
        assert_eq!(outcome, MergeOutcome::DeleteRejectedLocked);
        assert!(!outcome.should_rebroadcast());
        assert!(registry.get("m1").is_some());

        registry.set_locked("m1", false).unwrap();
        let outcome = registry.apply_remote(&CollabEvent::deleted("m1"));
        assert_eq!(outcome, MergeOutcome::Deleted);
        assert!(outcome.should_rebroadcast());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_delete_unknown_marker() {
        let mut registry = MarkerRegistry::new();
        assert_eq!(
            registry.apply_remote(&CollabEvent::deleted("nope")),
            MergeOutcome::UnknownMarker
        );
    }
}
