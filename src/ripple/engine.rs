//! Ripple Propagation Engine
//!
//! Maps an edit (a change point and a delta) onto shifts for other,
//! independently owned clips. The engine never mutates clip storage: it
//! returns `RippleEffect`s and the caller applies them.
//!
//! Every mode except `Quantum` is a pure function of its inputs.
//! `Quantum` draws from a random source; pass a seeded RNG through
//! [`ripple_with_params`] or [`RippleEngine::seeded`] when results must be
//! reproducible.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::RippleParams;
use crate::timeline::TimeRange;

/// How an edit propagates to other clips
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RippleMode {
    /// No propagation
    #[default]
    None,
    /// Clips starting at or after the change point shift by `+delta`
    Forward,
    /// Clips ending at or before the change point shift by `+delta`
    Backward,
    /// Clips after shift `+delta/2`, clips before shift `-delta/2`
    Bidirectional,
    /// Shift decays exponentially with distance from the change point
    Magnetic,
    /// Sinusoidal phase scaled by a random factor; not reproducible
    Quantum,
}

impl RippleMode {
    pub const ALL: [RippleMode; 6] = [
        RippleMode::None,
        RippleMode::Forward,
        RippleMode::Backward,
        RippleMode::Bidirectional,
        RippleMode::Magnetic,
        RippleMode::Quantum,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            RippleMode::None => "none",
            RippleMode::Forward => "forward",
            RippleMode::Backward => "backward",
            RippleMode::Bidirectional => "bidirectional",
            RippleMode::Magnetic => "magnetic",
            RippleMode::Quantum => "quantum",
        }
    }

    /// False only for the stochastic `Quantum` mode
    pub const fn is_deterministic(self) -> bool {
        !matches!(self, RippleMode::Quantum)
    }
}

impl fmt::Display for RippleMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RippleMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        RippleMode::ALL
            .iter()
            .copied()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown ripple mode '{}'", s))
    }
}

/// An externally owned clip the engine may be asked to shift
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: String,
    pub range: TimeRange,
}

impl Clip {
    pub fn new(id: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            id: id.into(),
            range: TimeRange::new(start, end),
        }
    }
}

/// A computed shift for one clip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RippleEffect {
    pub clip_id: String,
    pub original_range: TimeRange,
    pub new_range: TimeRange,
    pub offset: f64,
}

impl RippleEffect {
    fn shift(clip: &Clip, offset: f64) -> Self {
        Self {
            clip_id: clip.id.clone(),
            original_range: clip.range,
            new_range: clip.range.shifted(offset),
            offset,
        }
    }

    /// The effect that moves the clip back to where it was
    pub fn inverse(&self) -> Self {
        Self {
            clip_id: self.clip_id.clone(),
            original_range: self.new_range,
            new_range: self.original_range,
            offset: -self.offset,
        }
    }
}

/// Compute ripple effects with default parameters and the thread RNG.
///
/// # Example
/// ```
/// use trimline::ripple::{ripple, Clip, RippleMode};
/// let clips = vec![Clip::new("a", 1.0, 2.0), Clip::new("b", 6.0, 8.0)];
/// let effects = ripple(5.0, 2.0, RippleMode::Forward, &clips);
/// assert_eq!(effects.len(), 1);
/// assert_eq!(effects[0].clip_id, "b");
/// ```
pub fn ripple(
    change_point: f64,
    delta: f64,
    mode: RippleMode,
    clips: &[Clip],
) -> Vec<RippleEffect> {
    ripple_with_params(
        change_point,
        delta,
        mode,
        clips,
        &RippleParams::default(),
        &mut rand::rng(),
    )
}

/// Compute ripple effects with explicit parameters and random source.
///
/// Effects come back in clip order; clips that would not move are left
/// out. Non-finite inputs yield no effects.
pub fn ripple_with_params<R: Rng + ?Sized>(
    change_point: f64,
    delta: f64,
    mode: RippleMode,
    clips: &[Clip],
    params: &RippleParams,
    rng: &mut R,
) -> Vec<RippleEffect> {
    if !change_point.is_finite() || !delta.is_finite() {
        return Vec::new();
    }

    let effects: Vec<RippleEffect> = match mode {
        RippleMode::None => Vec::new(),
        RippleMode::Forward => clips
            .iter()
            .filter(|c| c.range.start >= change_point)
            .map(|c| RippleEffect::shift(c, delta))
            .collect(),
        RippleMode::Backward => clips
            .iter()
            .filter(|c| c.range.end <= change_point)
            .map(|c| RippleEffect::shift(c, delta))
            .collect(),
        RippleMode::Bidirectional => clips
            .iter()
            .filter(|c| !c.range.straddles(change_point))
            .map(|c| {
                if c.range.start >= change_point {
                    RippleEffect::shift(c, delta / 2.0)
                } else {
                    RippleEffect::shift(c, -delta / 2.0)
                }
            })
            .collect(),
        RippleMode::Magnetic => clips
            .iter()
            .filter_map(|c| {
                let force = magnetic_force(c.range, change_point, delta, params.magnetic_decay);
                (force.abs() > params.epsilon).then(|| RippleEffect::shift(c, force))
            })
            .collect(),
        RippleMode::Quantum => clips
            .iter()
            .map(|c| {
                let phase = ((c.range.start - change_point) * params.quantum_scale).sin();
                let shift = delta * phase * rng.random::<f64>();
                RippleEffect::shift(c, shift)
            })
            .collect(),
    };

    let effects: Vec<RippleEffect> = effects.into_iter().filter(|e| e.offset != 0.0).collect();
    debug!(
        "[RIPPLE] {} at {:.3}s by {:+.3}s: {} of {} clips shifted",
        mode,
        change_point,
        delta,
        effects.len(),
        clips.len()
    );
    effects
}

/// `delta * e^(-distance / decay)`, distance taken to the nearer clip edge
pub fn magnetic_force(range: TimeRange, change_point: f64, delta: f64, decay: f64) -> f64 {
    let distance = (range.start - change_point)
        .abs()
        .min((range.end - change_point).abs());
    delta * (-distance / decay).exp()
}

/// Apply effects to a clip list, returning the shifted copy.
///
/// Clips without an effect are returned unchanged.
pub fn apply_effects(clips: &[Clip], effects: &[RippleEffect]) -> Vec<Clip> {
    let by_id: HashMap<&str, &RippleEffect> =
        effects.iter().map(|e| (e.clip_id.as_str(), e)).collect();

    clips
        .iter()
        .map(|clip| match by_id.get(clip.id.as_str()) {
            Some(effect) => Clip {
                id: clip.id.clone(),
                range: effect.new_range,
            },
            None => clip.clone(),
        })
        .collect()
}

/// Effects that exactly undo `effects`, for every mode
pub fn invert_effects(effects: &[RippleEffect]) -> Vec<RippleEffect> {
    effects.iter().map(RippleEffect::inverse).collect()
}

/// Ripple calculator bound to one editing session's parameters and RNG
#[derive(Debug, Clone)]
pub struct RippleEngine {
    params: RippleParams,
    rng: StdRng,
}

impl Default for RippleEngine {
    fn default() -> Self {
        Self::new(RippleParams::default())
    }
}

impl RippleEngine {
    /// Engine with an OS-seeded random source
    pub fn new(params: RippleParams) -> Self {
        Self {
            params,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Engine whose quantum mode is reproducible from `seed`
    pub fn seeded(params: RippleParams, seed: u64) -> Self {
        Self {
            params,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn params(&self) -> &RippleParams {
        &self.params
    }

    pub fn ripple(
        &mut self,
        change_point: f64,
        delta: f64,
        mode: RippleMode,
        clips: &[Clip],
    ) -> Vec<RippleEffect> {
        ripple_with_params(change_point, delta, mode, clips, &self.params, &mut self.rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn clips() -> Vec<Clip> {
        vec![
            Clip::new("early", 0.0, 2.0),
            Clip::new("touching", 3.0, 5.0),
            Clip::new("straddle", 4.0, 6.0),
            Clip::new("at", 5.0, 7.0),
            Clip::new("late", 9.0, 12.0),
        ]
    }

    fn ids(effects: &[RippleEffect]) -> Vec<&str> {
        effects.iter().map(|e| e.clip_id.as_str()).collect()
    }

    fn deterministic(p: f64, d: f64, mode: RippleMode, clips: &[Clip]) -> Vec<RippleEffect> {
        let mut rng = StdRng::seed_from_u64(1);
        ripple_with_params(p, d, mode, clips, &RippleParams::default(), &mut rng)
    }

    #[test]
    fn test_none_mode() {
        assert!(ripple(5.0, 2.0, RippleMode::None, &clips()).is_empty());
    }

    #[test]
    fn test_forward() {
        let effects = ripple(5.0, 2.0, RippleMode::Forward, &clips());
        assert_eq!(ids(&effects), vec!["at", "late"]);
        assert_eq!(effects[0].new_range, TimeRange::new(7.0, 9.0));
        assert_eq!(effects[0].offset, 2.0);
    }

    #[test]
    fn test_backward() {
        let effects = ripple(5.0, -1.0, RippleMode::Backward, &clips());
        assert_eq!(ids(&effects), vec!["early", "touching"]);
        assert_eq!(effects[1].new_range, TimeRange::new(2.0, 4.0));
    }

    #[test]
    fn test_bidirectional_skips_straddling() {
        let effects = ripple(5.0, 2.0, RippleMode::Bidirectional, &clips());
        assert_eq!(ids(&effects), vec!["early", "touching", "at", "late"]);
        assert_eq!(effects[0].offset, -1.0);
        assert_eq!(effects[2].offset, 1.0);
    }

    #[test]
    fn test_magnetic_example() {
        let clips = vec![Clip::new("near", 5.1, 8.0)];
        let effects = ripple(5.0, 2.0, RippleMode::Magnetic, &clips);
        assert_eq!(effects.len(), 1);
        assert_abs_diff_eq!(effects[0].offset, 2.0 * (-0.1_f64 / 10.0).exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(effects[0].offset, 1.980, epsilon = 1e-3);
    }

    #[test]
    fn test_magnetic_uses_nearer_edge() {
        let force = magnetic_force(TimeRange::new(0.0, 4.5), 5.0, 1.0, 10.0);
        assert_abs_diff_eq!(force, (-0.05_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn test_magnetic_epsilon_cutoff() {
        // 2 * e^(-60/10) ~ 0.00496, below the 0.01s threshold
        let clips = vec![Clip::new("far", 65.0, 70.0), Clip::new("near", 6.0, 7.0)];
        let effects = ripple(5.0, 2.0, RippleMode::Magnetic, &clips);
        assert_eq!(ids(&effects), vec!["near"]);
    }

    #[test]
    fn test_quantum_is_reproducible_with_seed() {
        let params = RippleParams::default();
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);

        let first = ripple_with_params(5.0, 2.0, RippleMode::Quantum, &clips(), &params, &mut a);
        let second = ripple_with_params(5.0, 2.0, RippleMode::Quantum, &clips(), &params, &mut b);
        assert_eq!(first, second);
    }

    #[test]
    fn test_quantum_bounded_by_delta() {
        let mut engine = RippleEngine::seeded(RippleParams::default(), 7);
        for effect in engine.ripple(5.0, 2.0, RippleMode::Quantum, &clips()) {
            assert!(effect.offset.abs() <= 2.0);
        }
    }

    #[test]
    fn test_quantum_at_change_point_has_zero_phase() {
        let clips = vec![Clip::new("at", 5.0, 6.0)];
        let effects = deterministic(5.0, 2.0, RippleMode::Quantum, &clips);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_zero_delta_yields_nothing() {
        for mode in RippleMode::ALL {
            assert!(deterministic(5.0, 0.0, mode, &clips()).is_empty());
        }
    }

    #[test]
    fn test_non_finite_inputs() {
        assert!(ripple(f64::NAN, 1.0, RippleMode::Forward, &clips()).is_empty());
        assert!(ripple(1.0, f64::INFINITY, RippleMode::Forward, &clips()).is_empty());
    }

    #[test_case(RippleMode::Forward, 2.0 ; "forward")]
    #[test_case(RippleMode::Backward, -1.5 ; "backward")]
    #[test_case(RippleMode::Bidirectional, 3.0 ; "bidirectional")]
    #[test_case(RippleMode::None, 4.0 ; "none")]
    fn test_inverse_law(mode: RippleMode, delta: f64) {
        let original = clips();
        let moved = apply_effects(&original, &deterministic(5.0, delta, mode, &original));
        let restored = apply_effects(&moved, &deterministic(5.0, -delta, mode, &moved));

        for (a, b) in original.iter().zip(&restored) {
            assert_eq!(a.id, b.id);
            assert_abs_diff_eq!(a.range.start, b.range.start, epsilon = 1e-12);
            assert_abs_diff_eq!(a.range.end, b.range.end, epsilon = 1e-12);
        }
    }

    #[test_case(RippleMode::Magnetic ; "magnetic")]
    #[test_case(RippleMode::Quantum ; "quantum")]
    fn test_invert_effects_restores(mode: RippleMode) {
        let original = clips();
        let effects = deterministic(5.0, 2.0, mode, &original);
        let moved = apply_effects(&original, &effects);
        let restored = apply_effects(&moved, &invert_effects(&effects));
        assert_eq!(restored, original);
    }

    #[test]
    fn test_apply_effects_leaves_others() {
        let original = clips();
        let effects = ripple(5.0, 2.0, RippleMode::Forward, &original);
        let moved = apply_effects(&original, &effects);
        assert_eq!(moved[0], original[0]);
        assert_eq!(moved[4].range, TimeRange::new(11.0, 14.0));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!("magnetic".parse::<RippleMode>().unwrap(), RippleMode::Magnetic);
        assert_eq!("Forward".parse::<RippleMode>().unwrap(), RippleMode::Forward);
        assert!("sideways".parse::<RippleMode>().is_err());
        assert!(!RippleMode::Quantum.is_deterministic());
        assert!(RippleMode::Magnetic.is_deterministic());
    }
}
