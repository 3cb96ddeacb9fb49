//! Frame-accurate time math
//!
//! Pure helpers for quantizing times to a frame grid, nudging by whole or
//! fractional frames, and predicting low-energy cut points in a sample
//! buffer. None of these fail: out-of-domain inputs are clamped or passed
//! through unchanged.

use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_CUT_WINDOW, DEFAULT_ENERGY_RADIUS};

/// A time decomposed into a whole frame index and the fraction past it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubframePosition {
    /// Whole frame index (floor)
    pub frame: i64,
    /// Position within the frame, in `[0, 1)`
    pub fraction: f64,
}

fn valid_rate(frame_rate: f64) -> bool {
    frame_rate.is_finite() && frame_rate > 0.0
}

/// Round `time` to the nearest multiple of `1 / frame_rate`.
///
/// Idempotent. A non-positive or non-finite frame rate returns `time`
/// unchanged.
///
/// # Example
/// ```
/// use trimline::timeline::snap_to_frame;
/// assert_eq!(snap_to_frame(10.016, 30.0), 10.0);
/// ```
pub fn snap_to_frame(time: f64, frame_rate: f64) -> f64 {
    if !valid_rate(frame_rate) || !time.is_finite() {
        return time;
    }
    (time * frame_rate).round() / frame_rate
}

/// Move `time` by `frames` frames. Fractional frames give a subframe nudge.
pub fn nudge_by_frames(time: f64, frames: f64, frame_rate: f64) -> f64 {
    if !valid_rate(frame_rate) || !frames.is_finite() {
        return time;
    }
    time + frames / frame_rate
}

/// Split `time` into a frame index and a fractional remainder.
///
/// Negative times clamp to frame 0.
pub fn subframe(time: f64, frame_rate: f64) -> SubframePosition {
    if !valid_rate(frame_rate) || !time.is_finite() {
        return SubframePosition {
            frame: 0,
            fraction: 0.0,
        };
    }

    let scaled = (time * frame_rate).max(0.0);
    let frame = scaled.floor();
    let fraction = (scaled - frame).clamp(0.0, 1.0 - f64::EPSILON);

    SubframePosition {
        frame: frame as i64,
        fraction,
    }
}

/// Nearest frame index for `time`
pub fn time_to_frame(time: f64, frame_rate: f64) -> i64 {
    if !valid_rate(frame_rate) || !time.is_finite() {
        return 0;
    }
    (time * frame_rate).round() as i64
}

/// Start time of frame `frame`
pub fn frame_to_time(frame: i64, frame_rate: f64) -> f64 {
    if !valid_rate(frame_rate) {
        return 0.0;
    }
    frame as f64 / frame_rate
}

/// Format `time` as non-drop `HH:MM:SS:FF` using the nominal (rounded) rate.
pub fn format_timecode(time: f64, frame_rate: f64) -> String {
    let nominal = if valid_rate(frame_rate) {
        (frame_rate.round() as i64).max(1)
    } else {
        1
    };
    let total_frames = time_to_frame(time.max(0.0), frame_rate).max(0);

    let frames = total_frames % nominal;
    let total_seconds = total_frames / nominal;
    let seconds = total_seconds % 60;
    let minutes = (total_seconds / 60) % 60;
    let hours = total_seconds / 3600;

    format!("{:02}:{:02}:{:02}:{:02}", hours, minutes, seconds, frames)
}

/// Predict where a cut near `normalized_position` should land.
///
/// Uses the default window of 128 samples on each side and an 8-sample
/// energy kernel. See [`predict_optimal_cut_with`].
pub fn predict_optimal_cut<S: Float>(samples: &[S], normalized_position: f64) -> f64 {
    predict_optimal_cut_with(
        samples,
        normalized_position,
        DEFAULT_CUT_WINDOW,
        DEFAULT_ENERGY_RADIUS,
    )
}

/// Find the quietest index within `window` samples of the requested position.
///
/// Every index in the window is scored by the mean absolute amplitude over
/// `[i - energy_radius, i + energy_radius]`; the lowest score wins, ties
/// going to the index nearest the centre and then to the earlier index.
/// Returns a normalized position in `[0, 1)`. An empty buffer returns the
/// input unchanged.
pub fn predict_optimal_cut_with<S: Float>(
    samples: &[S],
    normalized_position: f64,
    window: usize,
    energy_radius: usize,
) -> f64 {
    if samples.is_empty() {
        return normalized_position;
    }

    let position = if normalized_position.is_nan() {
        0.0
    } else {
        normalized_position.clamp(0.0, 1.0)
    };

    let len = samples.len();
    let center = ((position * len as f64) as usize).min(len - 1);
    let lo = center.saturating_sub(window);
    let hi = center.saturating_add(window).min(len - 1);

    let mut best_index = center;
    let mut best_energy = f64::INFINITY;
    let mut best_distance = usize::MAX;

    for index in lo..=hi {
        let energy = local_energy(samples, index, energy_radius);
        let distance = index.abs_diff(center);
        if energy < best_energy || (energy == best_energy && distance < best_distance) {
            best_index = index;
            best_energy = energy;
            best_distance = distance;
        }
    }

    best_index as f64 / len as f64
}

/// Mean absolute amplitude in `[index - radius, index + radius]`
fn local_energy<S: Float>(samples: &[S], index: usize, radius: usize) -> f64 {
    let lo = index.saturating_sub(radius);
    let hi = index.saturating_add(radius).min(samples.len() - 1);

    let sum: f64 = samples[lo..=hi]
        .iter()
        .map(|s| s.abs().to_f64().unwrap_or(0.0))
        .sum();

    sum / (hi - lo + 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    #[test]
    fn test_snap_example() {
        assert_eq!(snap_to_frame(10.016, 30.0), 10.0);
    }

    #[test_case(0.0, 30.0 ; "zero")]
    #[test_case(10.016, 30.0 ; "thirty fps")]
    #[test_case(3.14159, 24.0 ; "film rate")]
    #[test_case(59.999, 29.97 ; "ntsc rate")]
    #[test_case(1234.5678, 60.0 ; "long timeline")]
    #[test_case(-2.71, 25.0 ; "negative time")]
    fn test_snap_is_idempotent(time: f64, rate: f64) {
        let once = snap_to_frame(time, rate);
        assert_eq!(snap_to_frame(once, rate), once);
    }

    #[test]
    fn test_snap_invalid_rate_passthrough() {
        assert_eq!(snap_to_frame(1.234, 0.0), 1.234);
        assert_eq!(snap_to_frame(1.234, -24.0), 1.234);
        assert_eq!(snap_to_frame(1.234, f64::NAN), 1.234);
    }

    #[test]
    fn test_nudge_example() {
        assert_abs_diff_eq!(nudge_by_frames(10.0, 1.0, 30.0), 10.0333, epsilon = 1e-4);
    }

    #[test]
    fn test_nudge_subframe() {
        assert_abs_diff_eq!(nudge_by_frames(1.0, 0.5, 25.0), 1.02, epsilon = 1e-12);
        assert_abs_diff_eq!(nudge_by_frames(1.0, -2.0, 25.0), 0.92, epsilon = 1e-12);
    }

    #[test]
    fn test_subframe_decomposition() {
        let pos = subframe(1.05, 10.0);
        assert_eq!(pos.frame, 10);
        assert_abs_diff_eq!(pos.fraction, 0.5, epsilon = 1e-9);

        let pos = subframe(2.0, 30.0);
        assert_eq!(pos.frame, 60);
        assert!(pos.fraction >= 0.0 && pos.fraction < 1.0);
    }

    #[test]
    fn test_subframe_negative_clamps() {
        let pos = subframe(-3.0, 30.0);
        assert_eq!(pos.frame, 0);
        assert_eq!(pos.fraction, 0.0);
    }

    #[test]
    fn test_frame_conversions() {
        assert_eq!(time_to_frame(10.0, 30.0), 300);
        assert_abs_diff_eq!(frame_to_time(45, 30.0), 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_format_timecode() {
        assert_eq!(format_timecode(0.0, 30.0), "00:00:00:00");
        assert_eq!(format_timecode(61.5, 30.0), "00:01:01:15");
        assert_eq!(format_timecode(3723.0 + 2.0 / 24.0, 24.0), "01:02:03:02");
    }

    #[test]
    fn test_predict_cut_empty_returns_input() {
        let samples: [f32; 0] = [];
        assert_eq!(predict_optimal_cut(&samples, 0.42), 0.42);
    }

    #[test]
    fn test_predict_cut_finds_silence() {
        // Loud buffer with a silent gap at 1100..1120
        let mut samples = vec![0.8_f32; 2000];
        for s in &mut samples[1100..1120] {
            *s = 0.0;
        }

        let cut = predict_optimal_cut(&samples, 0.5);
        let index = (cut * samples.len() as f64).round() as usize;
        assert!((1100..1120).contains(&index), "cut landed at {}", index);
    }

    #[test]
    fn test_predict_cut_outside_window_ignored() {
        // Silence lies farther than the window from the centre
        let mut samples = vec![0.5_f64; 4000];
        for s in &mut samples[3500..3600] {
            *s = 0.0;
        }

        let cut = predict_optimal_cut(&samples, 0.25);
        let index = (cut * samples.len() as f64).round() as usize;
        assert!(index.abs_diff(1000) <= DEFAULT_CUT_WINDOW);
    }

    #[test]
    fn test_predict_cut_flat_buffer_stays_centred() {
        let samples = vec![0.3_f32; 1000];
        assert_abs_diff_eq!(predict_optimal_cut(&samples, 0.5), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_predict_cut_clamps_position() {
        let samples = vec![0.3_f32; 100];
        let cut = predict_optimal_cut(&samples, 7.0);
        assert!((0.0..1.0).contains(&cut));

        let cut = predict_optimal_cut(&samples, f64::NAN);
        assert_eq!(cut, 0.0);
    }
}
