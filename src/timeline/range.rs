//! Time ranges on the media timeline

use std::fmt;

use serde::{Deserialize, Serialize};

/// A span `[start, end]` in seconds.
///
/// Trim selections additionally satisfy `0 <= start < end <= duration`;
/// clip ranges handed to the ripple engine are not bounded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Length of the range in seconds
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Check the trim invariant `0 <= start < end <= duration`
    pub fn is_valid_within(&self, duration: f64) -> bool {
        self.start >= 0.0 && self.start < self.end && self.end <= duration
    }

    /// Return the range moved by `offset` seconds
    pub fn shifted(&self, offset: f64) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }

    /// True when `point` falls strictly inside the range
    pub fn straddles(&self, point: f64) -> bool {
        self.start < point && self.end > point
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.3}s, {:.3}s]", self.start, self.end)
    }
}
