//! Editor Session
//!
//! One open clip editor: the trim selection, its markers, the pattern
//! recognized from them, and a ripple engine bound to the session config.
//! Every session is an explicit instance; nothing here is global.
//!
//! Local marker edits queue a collaboration event. `publish` flushes the
//! queue through a [`CollabPort`] and `sync` folds remote events in.

use log::{debug, info};
use uuid::Uuid;

use crate::collab::{CollabEvent, CollabPort, MergeOutcome};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::markers::{AnalysisData, Marker, MarkerPatch, MarkerRegistry, MarkerType};
use crate::patterns::{PatternRecognizer, RecognizedPattern};
use crate::ripple::{Clip, RippleEffect, RippleEngine, RippleMode};
use crate::timeline::TimeRange;
use crate::trim::{DragKind, TrimCommit, TrimState};

/// Per-session bundle of engine state
#[derive(Debug)]
pub struct EditorSession {
    id: String,
    config: EngineConfig,
    trim: TrimState,
    markers: MarkerRegistry,
    recognizer: PatternRecognizer,
    ripple: RippleEngine,

    /// Best pattern for the current markers, kept in step with every edit
    pattern: Option<RecognizedPattern>,

    /// Local marker events not yet published
    outbox: Vec<CollabEvent>,
}

impl EditorSession {
    /// Open a session over `[0, duration]`.
    ///
    /// # Errors
    /// - `InvalidConfig` if `config` fails validation
    /// - `InvalidTimeline` for a bad duration or frame rate
    pub fn new(duration: f64, frame_rate: f64, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let trim = TrimState::with_settings(duration, frame_rate, config.trim.clone())?;
        let ripple = RippleEngine::new(config.ripple.clone());

        let session = Self {
            id: Uuid::new_v4().to_string(),
            config,
            trim,
            markers: MarkerRegistry::new(),
            recognizer: PatternRecognizer::default(),
            ripple,
            pattern: None,
            outbox: Vec::new(),
        };
        info!(
            "[SESSION] Opened {} ({:.3}s @ {} fps)",
            session.id, duration, frame_rate
        );
        Ok(session)
    }

    /// Stamp `author` onto markers created in this session
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        let mut markers = MarkerRegistry::with_author(author);
        for marker in self.markers.markers() {
            markers.upsert(marker.clone());
        }
        self.markers = markers;
        self
    }

    /// Make the quantum ripple mode reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.ripple = RippleEngine::seeded(self.config.ripple.clone(), seed);
        self
    }

    /// Use a custom pattern library
    pub fn with_recognizer(mut self, recognizer: PatternRecognizer) -> Self {
        self.recognizer = recognizer;
        self.refresh_pattern();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn trim(&self) -> &TrimState {
        &self.trim
    }

    /// Direct access for settings and locking
    pub fn trim_mut(&mut self) -> &mut TrimState {
        &mut self.trim
    }

    pub fn markers(&self) -> &MarkerRegistry {
        &self.markers
    }

    pub fn pattern(&self) -> Option<&RecognizedPattern> {
        self.pattern.as_ref()
    }

    // ========================================================================
    // Trim
    // ========================================================================

    pub fn begin_drag(&mut self, kind: DragKind) -> bool {
        self.trim.begin_drag(kind)
    }

    /// Drag toward `pointer_time`, pulled by this session's markers
    pub fn update_drag(&mut self, pointer_time: f64) -> TimeRange {
        self.trim.update_drag(pointer_time, self.markers.markers())
    }

    pub fn end_drag(&mut self) -> Option<TrimCommit> {
        self.trim.end_drag()
    }

    pub fn cancel_drag(&mut self) {
        self.trim.cancel_drag();
    }

    /// Commit the drag and ripple the moved edge through `clips`.
    ///
    /// Returns no effects when nothing was committed.
    pub fn end_drag_with_ripple(&mut self, mode: RippleMode, clips: &[Clip]) -> Vec<RippleEffect> {
        let Some(commit) = self.trim.end_drag() else {
            return Vec::new();
        };
        let (change_point, delta) = commit.ripple_anchor();
        let effects = self.ripple.ripple(change_point, delta, mode, clips);
        debug!(
            "[SESSION] Rippled {:+.3}s at {:.3}s ({}): {} clip(s) moved",
            delta,
            change_point,
            mode,
            effects.len()
        );
        effects
    }

    /// Ripple an arbitrary change through `clips` with this session's engine
    pub fn ripple(
        &mut self,
        change_point: f64,
        delta: f64,
        mode: RippleMode,
        clips: &[Clip],
    ) -> Vec<RippleEffect> {
        self.ripple.ripple(change_point, delta, mode, clips)
    }

    pub fn undo(&mut self) -> bool {
        self.trim.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.trim.redo()
    }

    /// Commit a typed range. Fails with `SelectionBusy` while the selection
    /// is locked or a drag is in progress.
    pub fn set_range(&mut self, in_point: f64, out_point: f64) -> Result<TimeRange> {
        self.trim.set_range(in_point, out_point)
    }

    pub fn nudge_in(&mut self, frames: f64) -> TimeRange {
        self.trim.nudge_in(frames)
    }

    pub fn nudge_out(&mut self, frames: f64) -> TimeRange {
        self.trim.nudge_out(frames)
    }

    // ========================================================================
    // Markers
    // ========================================================================

    /// Add a marker, clamping `time` onto the timeline
    pub fn add_marker(&mut self, time: f64, marker_type: MarkerType) -> Marker {
        let marker = self.markers.add(self.clamp_time(time), marker_type);
        self.outbox.push(CollabEvent::added(&marker));
        self.refresh_pattern();
        marker
    }

    /// Patch a marker; a patched time is clamped onto the timeline
    pub fn update_marker(&mut self, id: &str, patch: &MarkerPatch) -> Result<Marker> {
        let mut patch = patch.clone();
        patch.time = patch.time.map(|t| self.clamp_time(t));

        let marker = self.markers.update(id, &patch)?;
        self.outbox.push(CollabEvent::updated(&marker, &patch));
        self.refresh_pattern();
        Ok(marker)
    }

    /// # Errors
    /// `LockedMarker` or `MarkerNotFound`; nothing changes.
    pub fn remove_marker(&mut self, id: &str) -> Result<Marker> {
        let removed = self.markers.remove(id)?;
        self.outbox.push(CollabEvent::deleted(&removed.id));
        self.refresh_pattern();
        Ok(removed)
    }

    pub fn duplicate_marker(&mut self, id: &str) -> Result<Marker> {
        let copy = self.markers.duplicate(id)?;
        let copy = if copy.time > self.trim.duration() {
            let patch = MarkerPatch {
                time: Some(self.trim.duration()),
                ..Default::default()
            };
            self.markers.update(&copy.id, &patch)?
        } else {
            copy
        };
        self.outbox.push(CollabEvent::added(&copy));
        self.refresh_pattern();
        Ok(copy)
    }

    /// Lock or unlock a marker and share the change
    pub fn set_marker_locked(&mut self, id: &str, locked: bool) -> Result<Marker> {
        let patch = MarkerPatch {
            locked: Some(locked),
            ..Default::default()
        };
        let marker = self.markers.update(id, &patch)?;
        self.outbox.push(CollabEvent::updated(&marker, &patch));
        Ok(marker)
    }

    /// Derive markers from analysis output, clamped onto the timeline
    pub fn import_analysis(&mut self, analysis: &AnalysisData) -> Vec<Marker> {
        let duration = self.trim.duration();
        let mut created = self.markers.generate_from(analysis);
        for marker in &mut created {
            let clamped = marker.time.clamp(0.0, duration);
            if clamped != marker.time {
                marker.time = clamped;
                if let Some(stored) = self.markers.get_mut(&marker.id) {
                    stored.time = clamped;
                }
            }
            self.outbox.push(CollabEvent::added(marker));
        }
        self.refresh_pattern();
        created
    }

    // ========================================================================
    // Collaboration
    // ========================================================================

    /// Local events waiting for `publish`
    pub fn pending_events(&self) -> &[CollabEvent] {
        &self.outbox
    }

    /// Send queued local events. Returns how many were sent.
    ///
    /// On a send failure the unsent events stay queued.
    pub fn publish(&mut self, port: &dyn CollabPort) -> Result<usize> {
        let mut sent = 0;
        let mut failure = None;
        for event in &self.outbox {
            if let Err(err) = port.send(event) {
                failure = Some(err);
                break;
            }
            sent += 1;
        }
        self.outbox.drain(..sent);
        if let Some(err) = failure {
            return Err(err);
        }
        debug!("[SESSION] Published {} event(s)", sent);
        Ok(sent)
    }

    /// Fold every pending remote event into the marker registry.
    ///
    /// Remote marker times are clamped onto this session's timeline.
    pub fn sync(&mut self, port: &dyn CollabPort) -> Result<Vec<MergeOutcome>> {
        let events = port.drain()?;
        let outcomes: Vec<MergeOutcome> = events
            .into_iter()
            .map(|event| {
                let event = self.clamp_remote(event);
                self.markers.apply_remote(&event)
            })
            .collect();

        if outcomes.iter().any(|o| o.is_applied()) {
            self.refresh_pattern();
        }
        Ok(outcomes)
    }

    fn refresh_pattern(&mut self) {
        self.pattern = self.recognizer.recognize(self.markers.markers());
    }

    fn clamp_remote(&self, mut event: CollabEvent) -> CollabEvent {
        match &mut event {
            CollabEvent::MarkerAdded(marker) => marker.time = self.clamp_time(marker.time),
            CollabEvent::MarkerUpdated(update) => {
                update.patch.time = update.patch.time.map(|t| self.clamp_time(t));
            }
            CollabEvent::MarkerDeleted { .. } => {}
        }
        event
    }

    fn clamp_time(&self, time: f64) -> f64 {
        if time.is_nan() {
            return 0.0;
        }
        time.clamp(0.0, self.trim.duration())
    }
}
