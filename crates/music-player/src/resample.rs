//! Clip resampling.
//!
//! Uses Rubato to convert a decoded clip's interleaved `f32` audio to the
//! output stream rate before playback starts. The whole clip is processed in
//! one pass; output devices that accept the clip rate skip this entirely.

use anyhow::{Result, anyhow};
use audioadapter_buffers::direct::InterleavedSlice;
use rubato::{
    Async, FixedAsync, Resampler, SincInterpolationParameters, SincInterpolationType,
    WindowFunction, calculate_cutoff,
};

/// Resample interleaved `samples` from `src_rate` to `dst_rate`.
///
/// Returns a copy of the input when the rates already match.
pub fn resample_interleaved(
    samples: &[f32],
    channels: usize,
    src_rate: u32,
    dst_rate: u32,
    chunk_frames: usize,
) -> Result<Vec<f32>> {
    if channels == 0 || src_rate == 0 || dst_rate == 0 {
        return Err(anyhow!(
            "invalid resample request: {channels} ch, {src_rate} -> {dst_rate} Hz"
        ));
    }
    if src_rate == dst_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let f_ratio = dst_rate as f64 / src_rate as f64;

    let sinc_len = 128;
    let oversampling_factor = 256;
    let interpolation = SincInterpolationType::Cubic;
    let window = WindowFunction::BlackmanHarris2;
    let f_cutoff = calculate_cutoff(sinc_len, window);

    let params = SincInterpolationParameters {
        sinc_len,
        f_cutoff,
        interpolation,
        oversampling_factor,
        window,
    };

    let chunk_in_frames = chunk_frames.max(1);
    let mut resampler = Async::<f32>::new_sinc(
        f_ratio,
        1.1,
        &params,
        chunk_in_frames,
        channels,
        FixedAsync::Input,
    )
    .map_err(|e| anyhow!("resampler init error: {e}"))?;

    let out_chunk_frames = resampler.output_frames_max().max(chunk_in_frames * 3);
    let mut out_interleaved = vec![0.0f32; channels * out_chunk_frames];
    let total_frames = samples.len() / channels;
    let expected_frames = (total_frames as f64 * f_ratio).ceil() as usize;
    let delay_frames = resampler.output_delay();
    let mut resampled = Vec::with_capacity((expected_frames + delay_frames) * channels);

    let silence = vec![0.0f32; chunk_in_frames * channels];
    let mut padded = Vec::with_capacity(chunk_in_frames * channels);
    let mut frame = 0usize;
    // Keep feeding silence past the end until the filter delay has drained.
    while frame < total_frames || resampled.len() / channels < expected_frames + delay_frames {
        let take = chunk_in_frames.min(total_frames - frame);
        let input = if take == chunk_in_frames {
            &samples[frame * channels..(frame + take) * channels]
        } else if take == 0 {
            &silence[..]
        } else {
            padded.clear();
            padded.extend_from_slice(&samples[frame * channels..(frame + take) * channels]);
            padded.resize(chunk_in_frames * channels, 0.0);
            &padded[..]
        };
        frame += take;

        let input_adapter = InterleavedSlice::new(input, channels, chunk_in_frames)
            .map_err(|e| anyhow!("interleaved slice (input) error: {e}"))?;
        let mut output_adapter =
            InterleavedSlice::new_mut(&mut out_interleaved, channels, out_chunk_frames)
                .map_err(|e| anyhow!("interleaved slice (output) error: {e}"))?;

        let (_nbr_in, nbr_out) = resampler
            .process_into_buffer(&input_adapter, &mut output_adapter, None)
            .map_err(|e| anyhow!("resampler process error: {e}"))?;

        resampled.extend_from_slice(&out_interleaved[..nbr_out * channels]);
    }

    resampled.drain(..(delay_frames * channels).min(resampled.len()));
    resampled.truncate(expected_frames * channels);

    tracing::debug!(
        src_rate_hz = src_rate,
        dst_rate_hz = dst_rate,
        in_frames = total_frames,
        out_frames = resampled.len() / channels,
        "clip resampled"
    );
    Ok(resampled)
}
