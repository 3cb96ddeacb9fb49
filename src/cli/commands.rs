//! CLI Command Implementations
//!
//! Each command does its work through the library and prints a JSON
//! document on stdout.

use std::fs;
use std::path::Path;

use log::info;
use serde::Serialize;
use serde_json::json;

use crate::config::EngineConfig;
use crate::error::{Result, TrimlineError};
use crate::markers::{AnalysisData, Marker, MarkerRegistry, MarkerType};
use crate::patterns::PatternRecognizer;
use crate::ripple::{apply_effects, Clip, RippleEngine, RippleMode};
use crate::timeline::{
    format_timecode, load_mono_samples, nudge_by_frames, predict_optimal_cut_with,
    snap_to_frame, subframe, time_to_frame,
};

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn check_frame_rate(fps: f64) -> Result<()> {
    if fps.is_finite() && fps > 0.0 {
        Ok(())
    } else {
        Err(TrimlineError::InvalidTimeline {
            reason: format!("frame rate must be positive, got {}", fps),
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Snap a time to the frame grid.
pub fn snap(time: f64, fps: f64) -> Result<()> {
    check_frame_rate(fps)?;
    let snapped = snap_to_frame(time, fps);

    print_json(&json!({
        "time": time,
        "snapped": snapped,
        "frame": time_to_frame(snapped, fps),
        "timecode": format_timecode(snapped, fps),
        "subframe": subframe(time, fps),
    }))
}

/// Move a time by whole (or, with subframe mode, fractional) frames.
pub fn nudge(time: f64, frames: f64, fps: f64, config: &EngineConfig) -> Result<()> {
    check_frame_rate(fps)?;
    let frames = if config.trim.subframe_enabled {
        frames
    } else {
        frames.round()
    };
    let result = nudge_by_frames(time, frames, fps).max(0.0);

    print_json(&json!({
        "time": time,
        "frames": frames,
        "result": result,
        "timecode": format_timecode(result, fps),
    }))
}

/// Find the quietest cut point near `position` in a WAV file.
pub fn cut(input: &Path, position: f64, config: &EngineConfig) -> Result<()> {
    info!("Predicting cut in: {}", input.display());

    let audio = load_mono_samples(input)?;
    let optimal = predict_optimal_cut_with(
        &audio.samples,
        position,
        config.cut.window,
        config.cut.energy_radius,
    );

    print_json(&json!({
        "input": input.display().to_string(),
        "sampleRate": audio.sample_rate,
        "samples": audio.samples.len(),
        "requested": position,
        "optimal": optimal,
        "seconds": audio.position_to_secs(optimal),
    }))
}

/// Ripple a change through the clips in a JSON file.
pub fn ripple(
    clips_path: &Path,
    change_point: f64,
    delta: f64,
    mode: RippleMode,
    seed: Option<u64>,
    config: &EngineConfig,
) -> Result<()> {
    info!("Rippling {} clips from: {}", mode, clips_path.display());

    let clips: Vec<Clip> = read_json(clips_path)?;
    let mut engine = match seed {
        Some(seed) => RippleEngine::seeded(config.ripple.clone(), seed),
        None => RippleEngine::new(config.ripple.clone()),
    };

    let effects = engine.ripple(change_point, delta, mode, &clips);
    let updated = apply_effects(&clips, &effects);

    print_json(&json!({
        "mode": mode,
        "changePoint": change_point,
        "delta": delta,
        "effects": effects,
        "clips": updated,
    }))
}

/// Derive markers from an analysis file, optionally filtered by type.
pub fn markers(analysis_path: &Path, filter: Option<MarkerType>) -> Result<()> {
    info!("Deriving markers from: {}", analysis_path.display());

    let analysis: AnalysisData = read_json(analysis_path)?;
    let mut registry = MarkerRegistry::new();
    registry.generate_from(&analysis);

    print_json(&registry.list(filter))
}

/// Recognize an editing pattern in a marker file.
pub fn recognize(markers_path: &Path) -> Result<()> {
    info!("Recognizing patterns in: {}", markers_path.display());

    let markers: Vec<Marker> = read_json(markers_path)?;
    let recognizer = PatternRecognizer::default();

    print_json(&json!({
        "pattern": recognizer.recognize(&markers),
        "scores": recognizer.scores(&markers),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::PeakData;
    use tempfile::tempdir;

    #[test]
    fn test_rejects_bad_frame_rate() {
        let err = snap(1.0, 0.0).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_TIMELINE");
        assert!(nudge(1.0, 1.0, -24.0, &EngineConfig::default()).is_err());
    }

    #[test]
    fn test_ripple_reads_clip_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clips.json");
        let clips = vec![Clip::new("a", 0.0, 1.0), Clip::new("b", 6.0, 8.0)];
        fs::write(&path, serde_json::to_string(&clips).unwrap()).unwrap();

        let config = EngineConfig::default();
        assert!(ripple(&path, 5.0, 2.0, RippleMode::Quantum, Some(7), &config).is_ok());
        let missing = dir.path().join("missing.json");
        assert!(ripple(&missing, 5.0, 2.0, RippleMode::Forward, None, &config).is_err());
    }

    #[test]
    fn test_markers_then_recognize() {
        let dir = tempdir().unwrap();
        let analysis_path = dir.path().join("analysis.json");
        let analysis = AnalysisData {
            peaks: [0.2, 0.4, 0.6, 0.8, 1.0]
                .iter()
                .enumerate()
                .map(|(i, v)| PeakData {
                    time: i as f64,
                    value: *v,
                })
                .collect(),
            ..Default::default()
        };
        fs::write(&analysis_path, serde_json::to_string(&analysis).unwrap()).unwrap();
        assert!(markers(&analysis_path, Some(MarkerType::Peak)).is_ok());

        let mut registry = MarkerRegistry::new();
        registry.generate_from(&analysis);
        let markers_path = dir.path().join("markers.json");
        fs::write(&markers_path, serde_json::to_string(registry.markers()).unwrap()).unwrap();
        assert!(recognize(&markers_path).is_ok());
    }

    #[test]
    fn test_cut_missing_file() {
        let err = cut(Path::new("/nonexistent/take.wav"), 0.5, &EngineConfig::default())
            .unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
