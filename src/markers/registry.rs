//! Marker Registry
//!
//! CRUD store for the markers of one editing session. The registry never
//! rejects a marker on its time; callers clamp into `[0, duration]` before
//! adding. Locked markers refuse deletion.

use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::analysis::{derive_markers, AnalysisData, EmotionData, PeakData, SceneData};
use super::marker::{Marker, MarkerPatch, MarkerType};
use crate::error::{Result, TrimlineError};

/// Offset applied to duplicated markers, in seconds
pub const DUPLICATE_OFFSET_SECS: f64 = 0.5;

/// Store of time-anchored annotations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerRegistry {
    /// Markers in insertion order; `list` sorts on the way out
    markers: Vec<Marker>,

    /// Author stamped onto markers created here
    #[serde(default, skip_serializing_if = "Option::is_none")]
    author: Option<String>,
}

impl MarkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry that stamps `author` onto new markers
    pub fn with_author(author: impl Into<String>) -> Self {
        Self {
            markers: Vec::new(),
            author: Some(author.into()),
        }
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    // ========================================================================
    // CRUD
    // ========================================================================

    /// Add a marker of `marker_type` at `time` with the type's defaults.
    pub fn add(&mut self, time: f64, marker_type: MarkerType) -> Marker {
        let mut marker = Marker::new(time, marker_type);
        marker.author = self.author.clone();
        debug!("[MARKERS] Added {} '{}' at {:.3}s", marker_type, marker.id, time);
        self.markers.push(marker.clone());
        marker
    }

    /// Look up a marker by id
    pub fn get(&self, id: &str) -> Option<&Marker> {
        self.markers.iter().find(|m| m.id == id)
    }

    /// Merge `patch` into the marker and stamp `modified = now`.
    ///
    /// # Errors
    /// `MarkerNotFound` if no marker has this id; nothing is changed.
    pub fn update(&mut self, id: &str, patch: &MarkerPatch) -> Result<Marker> {
        let marker = self.get_mut(id).ok_or_else(|| not_found(id))?;
        patch.apply_to(marker);
        marker.modified = Utc::now();
        debug!("[MARKERS] Updated '{}'", id);
        Ok(marker.clone())
    }

    /// Delete a marker and drop it from every other marker's links.
    ///
    /// # Errors
    /// - `LockedMarker` if the marker is locked
    /// - `MarkerNotFound` if no marker has this id
    ///
    /// On error the registry is unchanged.
    pub fn remove(&mut self, id: &str) -> Result<Marker> {
        let marker = self.get(id).ok_or_else(|| not_found(id))?;
        if marker.locked {
            warn!("[MARKERS] Refused to delete locked marker '{}'", id);
            return Err(TrimlineError::LockedMarker { id: id.to_string() });
        }

        let removed = self.take(id).ok_or_else(|| not_found(id))?;
        debug!("[MARKERS] Removed '{}'", id);
        Ok(removed)
    }

    /// Copy a marker half a second later with a fresh id.
    ///
    /// The copy is unlocked and carries no links.
    pub fn duplicate(&mut self, id: &str) -> Result<Marker> {
        let source = self.get(id).ok_or_else(|| not_found(id))?;

        let now = Utc::now();
        let copy = Marker {
            id: Uuid::new_v4().to_string(),
            time: source.time + DUPLICATE_OFFSET_SECS,
            label: format!("{} (copy)", source.label),
            locked: false,
            linked_markers: Vec::new(),
            created: now,
            modified: now,
            ..source.clone()
        };

        debug!("[MARKERS] Duplicated '{}' as '{}'", id, copy.id);
        self.markers.push(copy.clone());
        Ok(copy)
    }

    /// Add one derived marker per analysis entry. Existing markers are not
    /// touched. Returns the new markers in input order.
    pub fn generate_from_analysis(
        &mut self,
        peaks: &[PeakData],
        emotions: &[EmotionData],
        scenes: &[SceneData],
    ) -> Vec<Marker> {
        let generated = derive_markers(peaks, emotions, scenes, self.author.as_deref());
        debug!("[MARKERS] Generated {} markers from analysis", generated.len());
        self.markers.extend(generated.iter().cloned());
        generated
    }

    /// Convenience wrapper over [`generate_from_analysis`](Self::generate_from_analysis)
    pub fn generate_from(&mut self, analysis: &AnalysisData) -> Vec<Marker> {
        self.generate_from_analysis(&analysis.peaks, &analysis.emotions, &analysis.scenes)
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Markers sorted by time, optionally restricted to one type.
    ///
    /// Markers at the same time keep insertion order.
    pub fn list(&self, filter: Option<MarkerType>) -> Vec<&Marker> {
        let mut listed: Vec<&Marker> = self
            .markers
            .iter()
            .filter(|m| filter.map_or(true, |t| m.marker_type == t))
            .collect();
        listed.sort_by(|a, b| a.time.total_cmp(&b.time));
        listed
    }

    /// Markers with `start <= time <= end`, sorted by time
    pub fn in_range(&self, start: f64, end: f64) -> Vec<&Marker> {
        self.list(None)
            .into_iter()
            .filter(|m| m.time >= start && m.time <= end)
            .collect()
    }

    /// Closest marker within `max_distance` seconds of `time`.
    ///
    /// On equal distance the earlier marker wins.
    pub fn nearest(&self, time: f64, max_distance: f64) -> Option<&Marker> {
        nearest_marker(self.markers.iter(), time, max_distance)
    }

    /// All markers in insertion order
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    // ========================================================================
    // Locking and linking
    // ========================================================================

    pub fn set_locked(&mut self, id: &str, locked: bool) -> Result<()> {
        let marker = self.get_mut(id).ok_or_else(|| not_found(id))?;
        if marker.locked != locked {
            marker.locked = locked;
            marker.modified = Utc::now();
        }
        Ok(())
    }

    /// Flip the lock flag, returning the new value
    pub fn toggle_lock(&mut self, id: &str) -> Result<bool> {
        let locked = !self.get(id).ok_or_else(|| not_found(id))?.locked;
        self.set_locked(id, locked)?;
        Ok(locked)
    }

    /// Link two markers to each other. Linking is symmetric and idempotent.
    pub fn link(&mut self, a: &str, b: &str) -> Result<()> {
        if self.get(a).is_none() {
            return Err(not_found(a));
        }
        if self.get(b).is_none() {
            return Err(not_found(b));
        }
        if a == b {
            return Ok(());
        }

        let now = Utc::now();
        for (from, to) in [(a, b), (b, a)] {
            if let Some(marker) = self.get_mut(from) {
                if !marker.is_linked_to(to) {
                    marker.linked_markers.push(to.to_string());
                    marker.modified = now;
                }
            }
        }
        Ok(())
    }

    /// Remove the link between two markers in both directions
    pub fn unlink(&mut self, a: &str, b: &str) -> Result<()> {
        if self.get(a).is_none() {
            return Err(not_found(a));
        }
        if self.get(b).is_none() {
            return Err(not_found(b));
        }

        let now = Utc::now();
        for (from, to) in [(a, b), (b, a)] {
            if let Some(marker) = self.get_mut(from) {
                if marker.is_linked_to(to) {
                    marker.linked_markers.retain(|l| l != to);
                    marker.modified = now;
                }
            }
        }
        Ok(())
    }

    /// Remove every unlocked marker, returning how many went
    pub fn clear_unlocked(&mut self) -> usize {
        let doomed: Vec<String> = self
            .markers
            .iter()
            .filter(|m| !m.locked)
            .map(|m| m.id.clone())
            .collect();
        for id in &doomed {
            self.take(id);
        }
        doomed.len()
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Serialize the registry to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restore a registry from [`to_json`](Self::to_json) output
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    // ========================================================================
    // Crate-internal access for remote merges
    // ========================================================================

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Marker> {
        self.markers.iter_mut().find(|m| m.id == id)
    }

    /// Insert a marker as-is, replacing any record with the same id.
    /// Returns true if a record was replaced.
    pub(crate) fn upsert(&mut self, marker: Marker) -> bool {
        match self.get_mut(&marker.id) {
            Some(existing) => {
                *existing = marker;
                true
            }
            None => {
                self.markers.push(marker);
                false
            }
        }
    }

    /// Remove without the lock check, dropping dangling links
    pub(crate) fn take(&mut self, id: &str) -> Option<Marker> {
        let index = self.markers.iter().position(|m| m.id == id)?;
        let removed = self.markers.remove(index);
        for marker in &mut self.markers {
            marker.linked_markers.retain(|l| l != id);
        }
        Some(removed)
    }
}

/// Closest marker to `time` among `markers`, within `max_distance`
pub fn nearest_marker<'a>(
    markers: impl IntoIterator<Item = &'a Marker>,
    time: f64,
    max_distance: f64,
) -> Option<&'a Marker> {
    let mut best: Option<(&Marker, f64)> = None;
    for marker in markers {
        let distance = (marker.time - time).abs();
        if distance.is_nan() || distance > max_distance {
            continue;
        }
        let better = match best {
            None => true,
            Some((current, d)) => {
                distance < d || (distance == d && marker.time < current.time)
            }
        };
        if better {
            best = Some((marker, distance));
        }
    }
    best.map(|(m, _)| m)
}

fn not_found(id: &str) -> TrimlineError {
    TrimlineError::MarkerNotFound { id: id.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry_with(times: &[f64]) -> (MarkerRegistry, Vec<String>) {
        let mut registry = MarkerRegistry::new();
        let ids = times
            .iter()
            .map(|t| registry.add(*t, MarkerType::Cue).id)
            .collect();
        (registry, ids)
    }

    #[test]
    fn test_add_assigns_defaults() {
        let mut registry = MarkerRegistry::with_author("ana");
        let marker = registry.add(3.0, MarkerType::Chapter);

        assert_eq!(registry.len(), 1);
        assert_eq!(marker.color, MarkerType::Chapter.default_color());
        assert_eq!(marker.author.as_deref(), Some("ana"));
        assert_eq!(registry.get(&marker.id), Some(&marker));
    }

    #[test]
    fn test_add_does_not_clamp() {
        let mut registry = MarkerRegistry::new();
        let marker = registry.add(-4.0, MarkerType::Cue);
        assert_eq!(marker.time, -4.0);
    }

    #[test]
    fn test_update_merges_and_stamps_modified() {
        let (mut registry, ids) = registry_with(&[1.0]);
        let before = registry.get(&ids[0]).unwrap().modified;

        let patch = MarkerPatch {
            label: Some("Intro".to_string()),
            time: Some(1.5),
            ..Default::default()
        };
        let updated = registry.update(&ids[0], &patch).unwrap();

        assert_eq!(updated.label, "Intro");
        assert_eq!(updated.time, 1.5);
        assert_eq!(updated.marker_type, MarkerType::Cue);
        assert!(updated.modified >= before);
    }

    #[test]
    fn test_update_unknown_id() {
        let (mut registry, _) = registry_with(&[1.0]);
        let snapshot = registry.clone();

        let err = registry
            .update("missing", &MarkerPatch::default())
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(registry, snapshot);
    }

    #[test]
    fn test_remove() {
        let (mut registry, ids) = registry_with(&[1.0, 2.0]);
        let removed = registry.remove(&ids[0]).unwrap();
        assert_eq!(removed.id, ids[0]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_locked_leaves_registry_unchanged() {
        let (mut registry, ids) = registry_with(&[1.0, 2.0, 3.0]);
        registry.set_locked(&ids[1], true).unwrap();
        let snapshot = registry.clone();

        let err = registry.remove(&ids[1]).unwrap_err();
        assert!(matches!(err, TrimlineError::LockedMarker { .. }));
        assert_eq!(registry, snapshot);
    }

    #[test]
    fn test_remove_unknown() {
        let (mut registry, _) = registry_with(&[1.0]);
        let err = registry.remove("nope").unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_duplicate() {
        let mut registry = MarkerRegistry::new();
        let original = registry.add(10.0, MarkerType::Highlight);
        registry.set_locked(&original.id, true).unwrap();

        let copy = registry.duplicate(&original.id).unwrap();
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.time, 10.5);
        assert_eq!(copy.label, "Highlight (copy)");
        assert_eq!(copy.marker_type, MarkerType::Highlight);
        assert!(!copy.locked);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_duplicate_unknown() {
        let mut registry = MarkerRegistry::new();
        assert!(registry.duplicate("ghost").is_err());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_generate_from_analysis_keeps_existing() {
        let (mut registry, ids) = registry_with(&[0.5]);
        let existing = registry.get(&ids[0]).unwrap().clone();

        let generated = registry.generate_from_analysis(
            &[PeakData {
                time: 1.0,
                value: 0.8,
            }],
            &[EmotionData {
                time: 2.0,
                emotion: "calm".to_string(),
                confidence: 0.4,
            }],
            &[],
        );

        assert_eq!(generated.len(), 2);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(&ids[0]), Some(&existing));
    }

    #[test]
    fn test_list_sorted_and_filtered() {
        let mut registry = MarkerRegistry::new();
        registry.add(5.0, MarkerType::Beat);
        registry.add(1.0, MarkerType::Cue);
        registry.add(3.0, MarkerType::Beat);

        let times: Vec<f64> = registry.list(None).iter().map(|m| m.time).collect();
        assert_eq!(times, vec![1.0, 3.0, 5.0]);

        let beats: Vec<f64> = registry
            .list(Some(MarkerType::Beat))
            .iter()
            .map(|m| m.time)
            .collect();
        assert_eq!(beats, vec![3.0, 5.0]);
    }

    #[test]
    fn test_in_range_inclusive() {
        let (registry, _) = registry_with(&[1.0, 2.0, 3.0, 4.0]);
        let times: Vec<f64> = registry.in_range(2.0, 3.0).iter().map(|m| m.time).collect();
        assert_eq!(times, vec![2.0, 3.0]);
    }

    #[test]
    fn test_nearest() {
        let (registry, _) = registry_with(&[1.0, 2.0, 3.0]);
        assert_eq!(registry.nearest(2.2, 0.5).map(|m| m.time), Some(2.0));
        assert_eq!(registry.nearest(2.5, 0.5).map(|m| m.time), Some(2.0));
        assert!(registry.nearest(10.0, 0.5).is_none());
    }

    #[test]
    fn test_toggle_lock() {
        let (mut registry, ids) = registry_with(&[1.0]);
        assert!(registry.toggle_lock(&ids[0]).unwrap());
        assert!(registry.get(&ids[0]).unwrap().locked);
        assert!(!registry.toggle_lock(&ids[0]).unwrap());
    }

    #[test]
    fn test_link_is_symmetric() {
        let (mut registry, ids) = registry_with(&[1.0, 2.0]);
        registry.link(&ids[0], &ids[1]).unwrap();
        registry.link(&ids[0], &ids[1]).unwrap();

        assert_eq!(registry.get(&ids[0]).unwrap().linked_markers, vec![ids[1].clone()]);
        assert_eq!(registry.get(&ids[1]).unwrap().linked_markers, vec![ids[0].clone()]);

        registry.unlink(&ids[1], &ids[0]).unwrap();
        assert!(registry.get(&ids[0]).unwrap().linked_markers.is_empty());
        assert!(registry.get(&ids[1]).unwrap().linked_markers.is_empty());
    }

    #[test]
    fn test_remove_drops_links() {
        let (mut registry, ids) = registry_with(&[1.0, 2.0]);
        registry.link(&ids[0], &ids[1]).unwrap();
        registry.remove(&ids[1]).unwrap();
        assert!(registry.get(&ids[0]).unwrap().linked_markers.is_empty());
    }

    #[test]
    fn test_link_unknown() {
        let (mut registry, ids) = registry_with(&[1.0]);
        assert!(registry.link(&ids[0], "ghost").is_err());
    }

    #[test]
    fn test_clear_unlocked() {
        let (mut registry, ids) = registry_with(&[1.0, 2.0, 3.0]);
        registry.set_locked(&ids[2], true).unwrap();

        assert_eq!(registry.clear_unlocked(), 2);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.markers()[0].id, ids[2]);
    }

    #[test]
    fn test_json_snapshot() {
        let mut registry = MarkerRegistry::with_author("ana");
        registry.add(1.0, MarkerType::Comment);
        registry.add(2.0, MarkerType::Peak);

        let json = registry.to_json().unwrap();
        let restored = MarkerRegistry::from_json(&json).unwrap();
        assert_eq!(restored, registry);
    }
}
