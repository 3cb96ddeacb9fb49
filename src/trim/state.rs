//! Trim State Machine
//!
//! Owns the `(in_point, out_point)` selection for one editable range.
//! Pointer updates are frame-snapped, pulled onto nearby markers, and
//! clamped so that `0 <= in_point < out_point <= duration` holds after
//! every transition, with at least one frame between the two points.
//!
//! States: `Idle`, `DraggingIn`, `DraggingOut`, `DraggingRange`. The lock
//! flag is orthogonal and blocks every drag.

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use super::history::TrimHistory;
use crate::config::TrimSettings;
use crate::error::{Result, TrimlineError};
use crate::markers::{nearest_marker, Marker};
use crate::timeline::{nudge_by_frames, snap_to_frame, TimeRange};

/// Slack for float comparisons against the one-frame minimum separation
const SEPARATION_TOLERANCE: f64 = 1e-9;

/// Which part of the selection a drag moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DragKind {
    /// The in point
    In,
    /// The out point
    Out,
    /// The whole selection, keeping its length
    Range,
}

/// Current phase of the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrimPhase {
    #[default]
    Idle,
    DraggingIn,
    DraggingOut,
    DraggingRange,
}

impl From<DragKind> for TrimPhase {
    fn from(kind: DragKind) -> Self {
        match kind {
            DragKind::In => TrimPhase::DraggingIn,
            DragKind::Out => TrimPhase::DraggingOut,
            DragKind::Range => TrimPhase::DraggingRange,
        }
    }
}

impl fmt::Display for TrimPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrimPhase::Idle => write!(f, "Idle"),
            TrimPhase::DraggingIn => write!(f, "Dragging In"),
            TrimPhase::DraggingOut => write!(f, "Dragging Out"),
            TrimPhase::DraggingRange => write!(f, "Dragging Range"),
        }
    }
}

/// A committed trim edit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimCommit {
    pub kind: DragKind,
    pub before: TimeRange,
    pub after: TimeRange,
}

impl TrimCommit {
    /// `(change_point, delta)` for rippling this edit to other clips.
    ///
    /// The change point is the moved edge's old position (the old in point
    /// for range moves) and the delta is how far that edge travelled.
    pub fn ripple_anchor(&self) -> (f64, f64) {
        match self.kind {
            DragKind::In | DragKind::Range => {
                (self.before.start, self.after.start - self.before.start)
            }
            DragKind::Out => (self.before.end, self.after.end - self.before.end),
        }
    }
}

/// Frame-quantized trim selection with undo/redo
#[derive(Debug, Clone)]
pub struct TrimState {
    in_point: f64,
    out_point: f64,
    duration: f64,
    frame_rate: f64,

    history: TrimHistory,
    phase: TrimPhase,
    locked: bool,

    /// Selection when the current drag began
    drag_origin: Option<TimeRange>,
    /// Pointer offset from the in point, taken on a range drag's first update
    grab_offset: Option<f64>,

    settings: TrimSettings,
}

impl TrimState {
    /// Open a trim session over `[0, duration]` with default settings.
    ///
    /// # Example
    /// ```
    /// use trimline::trim::TrimState;
    /// let trim = TrimState::new(120.0, 30.0).unwrap();
    /// assert_eq!(trim.in_point(), 0.0);
    /// assert_eq!(trim.out_point(), 120.0);
    /// ```
    pub fn new(duration: f64, frame_rate: f64) -> Result<Self> {
        Self::with_settings(duration, frame_rate, TrimSettings::default())
    }

    /// Open a trim session with explicit settings.
    ///
    /// # Errors
    /// `InvalidTimeline` if the duration or frame rate is non-positive or
    /// non-finite, or the media is shorter than one frame.
    pub fn with_settings(duration: f64, frame_rate: f64, settings: TrimSettings) -> Result<Self> {
        if !frame_rate.is_finite() || frame_rate <= 0.0 {
            return Err(TrimlineError::InvalidTimeline {
                reason: format!("frame rate must be positive, got {}", frame_rate),
            });
        }
        if !duration.is_finite() || duration <= 0.0 {
            return Err(TrimlineError::InvalidTimeline {
                reason: format!("duration must be positive, got {}", duration),
            });
        }
        if duration < 1.0 / frame_rate {
            return Err(TrimlineError::InvalidTimeline {
                reason: format!(
                    "duration {:.4}s is shorter than one frame at {} fps",
                    duration, frame_rate
                ),
            });
        }

        let initial = TimeRange::new(0.0, duration);
        Ok(Self {
            in_point: 0.0,
            out_point: duration,
            duration,
            frame_rate,
            history: TrimHistory::new(initial, settings.max_history),
            phase: TrimPhase::Idle,
            locked: false,
            drag_origin: None,
            grab_offset: None,
            settings,
        })
    }

    // ========================================================================
    // Drag Protocol
    // ========================================================================

    /// Start dragging the in point, out point, or whole range.
    ///
    /// Returns false (and does nothing) when locked or already dragging.
    pub fn begin_drag(&mut self, kind: DragKind) -> bool {
        if self.locked {
            debug!("[TRIM] Drag {:?} ignored: selection is locked", kind);
            return false;
        }
        if self.phase != TrimPhase::Idle {
            debug!("[TRIM] Drag {:?} ignored: already {}", kind, self.phase);
            return false;
        }

        self.drag_origin = Some(self.range());
        self.grab_offset = None;
        self.phase = kind.into();
        debug!("[TRIM] Begin {} from {}", self.phase, self.range());
        true
    }

    /// Move the dragged edge (or range) toward `pointer_time`.
    ///
    /// 1. Frame-snap if enabled.
    /// 2. Pull onto the nearest marker within `magnetic_strength` seconds;
    ///    magnetism overrides the frame grid.
    /// 3. Clamp to keep one frame between in and out inside `[0, duration]`.
    ///
    /// A range drag grabs the selection where the first update lands and
    /// moves it by the pointer's travel from there, keeping its length.
    /// Snap and magnetism then apply to the moved in point.
    ///
    /// Returns the selection after the update. No-op when idle.
    pub fn update_drag(&mut self, pointer_time: f64, markers: &[Marker]) -> TimeRange {
        if self.phase == TrimPhase::Idle || !pointer_time.is_finite() {
            return self.range();
        }

        let pointer_time = match (self.phase, self.drag_origin) {
            (TrimPhase::DraggingRange, Some(origin)) => {
                let offset = *self
                    .grab_offset
                    .get_or_insert(pointer_time - origin.start);
                pointer_time - offset
            }
            _ => pointer_time,
        };
        let target = self.resolve_target(pointer_time, markers);
        let min_sep = self.min_separation();

        match self.phase {
            TrimPhase::DraggingIn => {
                self.in_point = clamp_in(target, self.out_point - min_sep);
            }
            TrimPhase::DraggingOut => {
                self.out_point = clamp_out(target, self.in_point + min_sep, self.duration);
            }
            TrimPhase::DraggingRange => {
                let length = self.drag_origin.map_or(self.length(), |o| o.length());
                let start = target.clamp(0.0, (self.duration - length).max(0.0));
                self.in_point = start;
                self.out_point = (start + length).min(self.duration);
            }
            TrimPhase::Idle => {}
        }

        self.check_invariant();
        self.range()
    }

    /// Finish the drag and commit the selection to history.
    ///
    /// Returns the commit, or `None` if not dragging or nothing moved.
    pub fn end_drag(&mut self) -> Option<TrimCommit> {
        let kind = match self.phase {
            TrimPhase::Idle => return None,
            TrimPhase::DraggingIn => DragKind::In,
            TrimPhase::DraggingOut => DragKind::Out,
            TrimPhase::DraggingRange => DragKind::Range,
        };

        self.phase = TrimPhase::Idle;
        self.grab_offset = None;
        let before = self.drag_origin.take().unwrap_or_else(|| self.history.current());
        let after = self.range();

        if after == before {
            debug!("[TRIM] End drag: unchanged at {}", after);
            return None;
        }

        self.history.commit(after);
        debug!(
            "[TRIM] Committed {} -> {} (history {}/{})",
            before,
            after,
            self.history.index() + 1,
            self.history.len()
        );
        Some(TrimCommit {
            kind,
            before,
            after,
        })
    }

    /// Abandon the drag and restore the selection it started from
    pub fn cancel_drag(&mut self) {
        if self.phase == TrimPhase::Idle {
            return;
        }
        if let Some(origin) = self.drag_origin.take() {
            self.in_point = origin.start;
            self.out_point = origin.end;
        }
        self.grab_offset = None;
        self.phase = TrimPhase::Idle;
        debug!("[TRIM] Drag cancelled, restored {}", self.range());
    }

    // ========================================================================
    // History
    // ========================================================================

    /// Restore the previous committed selection.
    ///
    /// Returns false at the oldest entry or mid-drag.
    pub fn undo(&mut self) -> bool {
        if self.phase != TrimPhase::Idle {
            return false;
        }
        match self.history.undo() {
            Some(range) => {
                self.apply(range);
                debug!("[TRIM] Undo to {}", range);
                true
            }
            None => false,
        }
    }

    /// Re-apply the next committed selection.
    ///
    /// Returns false at the newest entry or mid-drag.
    pub fn redo(&mut self) -> bool {
        if self.phase != TrimPhase::Idle {
            return false;
        }
        match self.history.redo() {
            Some(range) => {
                self.apply(range);
                debug!("[TRIM] Redo to {}", range);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ========================================================================
    // Direct Edits
    // ========================================================================

    /// Set both points at once, e.g. from typed timecode.
    ///
    /// Values are clamped into `[0, duration]` and frame-snapped if enabled,
    /// then committed.
    ///
    /// # Errors
    /// `SelectionBusy` when locked or mid-drag. `InvalidRange` if the
    /// clamped points are less than one frame apart or out of order.
    /// Either way the previous selection is kept.
    pub fn set_range(&mut self, in_point: f64, out_point: f64) -> Result<TimeRange> {
        if self.locked {
            debug!("[TRIM] set_range ignored: selection is locked");
            return Err(TrimlineError::SelectionBusy {
                reason: "selection is locked".to_string(),
            });
        }
        if self.phase != TrimPhase::Idle {
            debug!("[TRIM] set_range ignored: {}", self.phase);
            return Err(TrimlineError::SelectionBusy {
                reason: format!("{} in progress", self.phase),
            });
        }
        if in_point.is_nan() || out_point.is_nan() {
            return Err(TrimlineError::InvalidRange {
                in_point,
                out_point,
            });
        }

        let mut start = in_point.clamp(0.0, self.duration);
        let mut end = out_point.clamp(0.0, self.duration);
        if self.settings.snap_enabled {
            start = snap_to_frame(start, self.frame_rate).clamp(0.0, self.duration);
            end = snap_to_frame(end, self.frame_rate).clamp(0.0, self.duration);
        }

        if end - start < self.min_separation() - SEPARATION_TOLERANCE {
            debug!(
                "[TRIM] Rejected range {:.3}..{:.3}: under one frame",
                in_point, out_point
            );
            return Err(TrimlineError::InvalidRange {
                in_point,
                out_point,
            });
        }

        self.commit_range(TimeRange::new(start, end));
        Ok(self.range())
    }

    /// Move the in point by `frames` frames and commit.
    ///
    /// Fractional frames are rounded unless subframe mode is on.
    pub fn nudge_in(&mut self, frames: f64) -> TimeRange {
        if self.locked || self.phase != TrimPhase::Idle {
            return self.range();
        }
        let frames = self.effective_frames(frames);
        let start = clamp_in(
            nudge_by_frames(self.in_point, frames, self.frame_rate),
            self.out_point - self.min_separation(),
        );
        self.commit_range(TimeRange::new(start, self.out_point));
        self.range()
    }

    /// Move the out point by `frames` frames and commit.
    pub fn nudge_out(&mut self, frames: f64) -> TimeRange {
        if self.locked || self.phase != TrimPhase::Idle {
            return self.range();
        }
        let frames = self.effective_frames(frames);
        let end = clamp_out(
            nudge_by_frames(self.out_point, frames, self.frame_rate),
            self.in_point + self.min_separation(),
            self.duration,
        );
        self.commit_range(TimeRange::new(self.in_point, end));
        self.range()
    }

    // ========================================================================
    // Locking and Settings
    // ========================================================================

    /// Lock or unlock the selection. Locking mid-drag cancels the drag.
    pub fn set_locked(&mut self, locked: bool) {
        if locked && self.phase != TrimPhase::Idle {
            self.cancel_drag();
        }
        self.locked = locked;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn set_snap_enabled(&mut self, enabled: bool) {
        self.settings.snap_enabled = enabled;
    }

    /// Set the magnetism radius in seconds (negative values disable it)
    pub fn set_magnetic_strength(&mut self, seconds: f64) {
        self.settings.magnetic_strength = if seconds.is_finite() {
            seconds.max(0.0)
        } else {
            0.0
        };
    }

    pub fn set_subframe_enabled(&mut self, enabled: bool) {
        self.settings.subframe_enabled = enabled;
    }

    pub fn settings(&self) -> &TrimSettings {
        &self.settings
    }

    // ========================================================================
    // State Queries
    // ========================================================================

    pub fn in_point(&self) -> f64 {
        self.in_point
    }

    pub fn out_point(&self) -> f64 {
        self.out_point
    }

    pub fn range(&self) -> TimeRange {
        TimeRange::new(self.in_point, self.out_point)
    }

    /// Selected length in seconds
    pub fn length(&self) -> f64 {
        self.out_point - self.in_point
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// Minimum distance between in and out: one frame
    pub fn min_separation(&self) -> f64 {
        1.0 / self.frame_rate
    }

    pub fn phase(&self) -> TrimPhase {
        self.phase
    }

    pub fn is_dragging(&self) -> bool {
        self.phase != TrimPhase::Idle
    }

    pub fn history(&self) -> &TrimHistory {
        &self.history
    }

    pub fn history_index(&self) -> usize {
        self.history.index()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn resolve_target(&self, pointer_time: f64, markers: &[Marker]) -> f64 {
        let mut target = pointer_time;
        if self.settings.snap_enabled {
            target = snap_to_frame(target, self.frame_rate);
        }
        if self.settings.magnetic_strength > 0.0 {
            if let Some(marker) = nearest_marker(markers, target, self.settings.magnetic_strength)
            {
                debug!("[TRIM] Magnet pulled {:.3}s onto marker '{}'", target, marker.id);
                target = marker.time;
            }
        }
        target
    }

    fn effective_frames(&self, frames: f64) -> f64 {
        if self.settings.subframe_enabled {
            frames
        } else {
            frames.round()
        }
    }

    fn commit_range(&mut self, range: TimeRange) {
        if range == self.range() {
            return;
        }
        self.apply(range);
        self.history.commit(range);
        debug!("[TRIM] Committed {}", range);
    }

    fn apply(&mut self, range: TimeRange) {
        self.in_point = range.start;
        self.out_point = range.end;
        self.check_invariant();
    }

    fn check_invariant(&self) {
        debug_assert!(
            self.range().is_valid_within(self.duration),
            "trim invariant violated: {} in [0, {}]",
            self.range(),
            self.duration
        );
    }
}

/// Clamp an in point to `[0, latest]`, preferring 0 if rounding crossed them
fn clamp_in(time: f64, latest: f64) -> f64 {
    time.min(latest).max(0.0)
}

/// Clamp an out point to `[earliest, duration]`, preferring `duration`
fn clamp_out(time: f64, earliest: f64, duration: f64) -> f64 {
    time.max(earliest).min(duration)
}

// ============================================================================
// Unit Tests
// ============================================================================
