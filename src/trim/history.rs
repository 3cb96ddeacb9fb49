//! Trim history
//!
//! Append-only log of committed trim ranges plus a cursor. Undo and redo
//! move the cursor; committing while the cursor is behind the tail
//! truncates the forward entries first (classic undo-stack semantics).
//! The log is capped: once it exceeds `max_entries`, the oldest entries
//! are discarded and the cursor shifts down with them.

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_MAX_HISTORY;
use crate::timeline::TimeRange;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimHistory {
    /// Committed ranges, oldest first. Never empty.
    entries: Vec<TimeRange>,

    /// Position of the current range in `entries`
    index: usize,

    /// Maximum number of entries to keep
    max_entries: usize,

    /// Number of entries dropped off the front by the cap
    discarded: usize,
}

impl TrimHistory {
    /// Start a history whose only entry is `initial`.
    pub fn new(initial: TimeRange, max_entries: usize) -> Self {
        Self {
            entries: vec![initial],
            index: 0,
            max_entries: max_entries.max(1),
            discarded: 0,
        }
    }

    /// Record `range` as the new current entry.
    ///
    /// Any entries after the cursor are dropped first.
    pub fn commit(&mut self, range: TimeRange) {
        self.entries.truncate(self.index + 1);
        self.entries.push(range);
        self.index = self.entries.len() - 1;
        self.trim_to_capacity();
    }

    /// Step back one entry, returning the range to restore.
    ///
    /// Returns `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<TimeRange> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        Some(self.entries[self.index])
    }

    /// Step forward one entry, returning the range to restore.
    ///
    /// Returns `None` at the newest entry.
    pub fn redo(&mut self) -> Option<TimeRange> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        Some(self.entries[self.index])
    }

    /// The range at the cursor
    pub fn current(&self) -> TimeRange {
        self.entries[self.index]
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn entries(&self) -> &[TimeRange] {
        &self.entries
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false: a history holds at least its initial entry
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Change the cap, discarding the oldest entries if now over it
    pub fn set_max_entries(&mut self, max_entries: usize) {
        self.max_entries = max_entries.max(1);
        self.trim_to_capacity();
    }

    /// How many entries the cap has discarded so far
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    fn trim_to_capacity(&mut self) {
        while self.entries.len() > self.max_entries {
            if self.index == 0 {
                // The cursor entry must survive; give up redo entries instead
                self.entries.pop();
            } else {
                self.entries.remove(0);
                self.index -= 1;
                self.discarded += 1;
            }
        }
    }
}

impl Default for TrimHistory {
    fn default() -> Self {
        Self::new(TimeRange::new(0.0, 1.0), DEFAULT_MAX_HISTORY)
    }
}
