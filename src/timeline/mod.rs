//! Timeline coordinate space
//!
//! Time ranges, frame quantization and the sample buffers used to place
//! cuts in quiet regions.

mod precision;
mod range;
mod samples;

pub use precision::{
    format_timecode, frame_to_time, nudge_by_frames, predict_optimal_cut,
    predict_optimal_cut_with, snap_to_frame, subframe, time_to_frame, SubframePosition,
};
pub use range::TimeRange;
pub use samples::{load_mono_samples, MonoSamples};
