//! Engine Configuration
//!
//! Tunables for snapping, history depth, ripple propagation and cut
//! prediction. Stored as JSON; every field falls back to its default when
//! omitted, so an empty object `{}` is a valid configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrimlineError};

/// Default maximum number of committed trim ranges kept for undo.
pub const DEFAULT_MAX_HISTORY: usize = 100;

/// Default magnetism radius in seconds.
pub const DEFAULT_MAGNETIC_STRENGTH: f64 = 0.1;

/// Default decay constant (seconds) for the magnetic ripple falloff.
pub const DEFAULT_MAGNETIC_DECAY: f64 = 10.0;

/// Shifts at or below this magnitude (seconds) are not emitted.
pub const DEFAULT_RIPPLE_EPSILON: f64 = 0.01;

/// Default phase scale (radians per second) for the quantum ripple mode.
pub const DEFAULT_QUANTUM_SCALE: f64 = 1.0;

/// Default half-width of the cut prediction window, in samples.
pub const DEFAULT_CUT_WINDOW: usize = 128;

/// Default half-width of the energy averaging kernel, in samples.
pub const DEFAULT_ENERGY_RADIUS: usize = 8;

/// Trim state machine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrimSettings {
    /// Quantize pointer times to the frame grid
    pub snap_enabled: bool,
    /// Markers closer than this (seconds) attract the dragged edge; 0 disables
    pub magnetic_strength: f64,
    /// Allow fractional frame nudges
    pub subframe_enabled: bool,
    /// Maximum number of history entries kept
    pub max_history: usize,
}

impl Default for TrimSettings {
    fn default() -> Self {
        Self {
            snap_enabled: true,
            magnetic_strength: DEFAULT_MAGNETIC_STRENGTH,
            subframe_enabled: false,
            max_history: DEFAULT_MAX_HISTORY,
        }
    }
}

/// Ripple propagation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RippleParams {
    /// Distance (seconds) over which magnetic force falls to 1/e
    pub magnetic_decay: f64,
    /// Minimum magnetic shift magnitude that produces an effect
    pub epsilon: f64,
    /// Phase scale for the quantum mode
    pub quantum_scale: f64,
}

impl Default for RippleParams {
    fn default() -> Self {
        Self {
            magnetic_decay: DEFAULT_MAGNETIC_DECAY,
            epsilon: DEFAULT_RIPPLE_EPSILON,
            quantum_scale: DEFAULT_QUANTUM_SCALE,
        }
    }
}

/// Cut prediction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CutSettings {
    /// Samples examined on each side of the requested position
    pub window: usize,
    /// Samples averaged on each side of a candidate index
    pub energy_radius: usize,
}

impl Default for CutSettings {
    fn default() -> Self {
        Self {
            window: DEFAULT_CUT_WINDOW,
            energy_radius: DEFAULT_ENERGY_RADIUS,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub trim: TrimSettings,
    pub ripple: RippleParams,
    pub cut: CutSettings,
}

impl EngineConfig {
    /// Load and validate a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every numeric field is in its usable domain.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(TrimlineError::InvalidConfig { reason });

        if !self.trim.magnetic_strength.is_finite() || self.trim.magnetic_strength < 0.0 {
            return invalid(format!(
                "trim.magnetic_strength must be >= 0, got {}",
                self.trim.magnetic_strength
            ));
        }
        if self.trim.max_history == 0 {
            return invalid("trim.max_history must be at least 1".to_string());
        }
        if !self.ripple.magnetic_decay.is_finite() || self.ripple.magnetic_decay <= 0.0 {
            return invalid(format!(
                "ripple.magnetic_decay must be > 0, got {}",
                self.ripple.magnetic_decay
            ));
        }
        if !self.ripple.epsilon.is_finite() || self.ripple.epsilon < 0.0 {
            return invalid(format!(
                "ripple.epsilon must be >= 0, got {}",
                self.ripple.epsilon
            ));
        }
        if !self.ripple.quantum_scale.is_finite() {
            return invalid("ripple.quantum_scale must be finite".to_string());
        }
        if self.cut.window == 0 {
            return invalid("cut.window must be at least 1".to_string());
        }

        Ok(())
    }
}
