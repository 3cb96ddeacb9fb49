//! Sample buffers for cut prediction
//!
//! Loads a WAV file and mixes it down to a single amplitude track in
//! `[-1, 1]`, the form `predict_optimal_cut` consumes.

use std::io::Read;
use std::path::Path;

use hound::{SampleFormat, WavReader};
use log::debug;

use crate::error::{Result, TrimlineError};

/// Mono amplitude track plus the rate it was sampled at
#[derive(Debug, Clone)]
pub struct MonoSamples {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl MonoSamples {
    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Convert a normalized buffer position to seconds
    pub fn position_to_secs(&self, normalized: f64) -> f64 {
        normalized * self.duration_secs()
    }
}

/// Read a WAV file and average all channels into one track.
pub fn load_mono_samples(path: &Path) -> Result<MonoSamples> {
    if !path.exists() {
        return Err(TrimlineError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.display()),
        )));
    }

    let reader = WavReader::open(path).map_err(|e| TrimlineError::InvalidAudio {
        reason: format!("Failed to open WAV file: {}", e),
        source: Some(Box::new(e)),
    })?;

    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;
    let interleaved = match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => decode::<f32, _>(reader, 1.0)?,
        (SampleFormat::Int, 8) => decode::<i8, _>(reader, 128.0)?,
        // hound widens every integer depth up to 32 bits into i32
        (SampleFormat::Int, bits @ 9..=32) => {
            decode::<i32, _>(reader, (1u64 << (bits - 1)) as f64)?
        }
        (format, bits) => {
            return Err(TrimlineError::UnsupportedFormat {
                format: format!("{}-bit {:?}", bits, format),
            })
        }
    };

    debug!(
        "Loaded {} samples ({} channels @ {} Hz) from {}",
        interleaved.len(),
        channels,
        spec.sample_rate,
        path.display()
    );

    Ok(MonoSamples {
        samples: mixdown(&interleaved, channels),
        sample_rate: spec.sample_rate,
    })
}

/// Average interleaved frames `[L,R,L,R,...]` into `[M,M,...]`
fn mixdown(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }

    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// Decode every sample as `S` and scale by `full_scale` into `[-1, 1]`
fn decode<S, R>(reader: WavReader<R>, full_scale: f64) -> Result<Vec<f32>>
where
    S: hound::Sample + Into<f64>,
    R: Read,
{
    reader
        .into_samples::<S>()
        .map(|sample| sample.map(|v| (v.into() / full_scale) as f32))
        .collect::<std::result::Result<Vec<f32>, _>>()
        .map_err(|e| TrimlineError::InvalidAudio {
            reason: format!("Failed to decode samples: {}", e),
            source: Some(Box::new(e)),
        })
}
