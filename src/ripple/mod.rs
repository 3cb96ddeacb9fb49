//! Ripple editing
//!
//! Propagates a time shift made at one point on the timeline to other,
//! dependent clips under a configurable policy.

mod engine;

pub use engine::{
    apply_effects, invert_effects, magnetic_force, ripple, ripple_with_params, Clip,
    RippleEffect, RippleEngine, RippleMode,
};
