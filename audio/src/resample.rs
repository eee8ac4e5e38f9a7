//! Sample rate conversion backed by rubato.

use rubato::{FftFixedInOut, Resampler};

use crate::AudioError;

/// Frames per rubato processing block.
const CHUNK_FRAMES: usize = 1024;

/// Converts mono samples from `from_rate` to `to_rate`.
///
/// The resampler's group delay is removed, so the output lines up with
/// the input and holds `len * to_rate / from_rate` samples.
pub fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>, AudioError> {
    if from_rate == 0 {
        return Err(AudioError::InvalidSampleRate(from_rate));
    }
    if to_rate == 0 {
        return Err(AudioError::InvalidSampleRate(to_rate));
    }
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let mut resampler =
        FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_FRAMES, 1)
            .map_err(|e| AudioError::Resample(e.to_string()))?;

    let expected = (samples.len() as u64 * to_rate as u64 / from_rate as u64) as usize;
    let delay = resampler.output_delay();

    let mut input: Vec<Vec<f32>> = vec![Vec::new()];
    let mut output: Vec<Vec<f32>> = vec![vec![0.0; resampler.output_frames_max()]];
    let mut out = Vec::with_capacity(expected + delay + resampler.output_frames_max());
    let mut pos = 0;

    while out.len() < expected + delay {
        let needed = resampler.input_frames_next();
        input[0].clear();
        if pos < samples.len() {
            let end = (pos + needed).min(samples.len());
            input[0].extend_from_slice(&samples[pos..end]);
        }
        // Zero-pad the final block to flush the filter.
        input[0].resize(needed, 0.0);
        pos += needed;

        let (_, written) = resampler
            .process_into_buffer(&input, &mut output, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        out.extend_from_slice(&output[0][..written]);
    }

    out.drain(..delay.min(out.len()));
    out.truncate(expected);
    Ok(out)
}
