//! Playback stage (CPAL output stream).
//!
//! Builds the CPAL output stream that plays one [`AudioClip`] from start to
//! end. The callback:
//! - reads frames from the clip at a shared cursor
//! - applies basic channel mapping (mono↔stereo, best-effort otherwise)
//! - scales by the current gain and converts to the device sample format
//! - flags the clip as finished once the cursor passes the last frame

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use anyhow::{Result, anyhow};
use cpal::traits::DeviceTrait;

/// State shared between the output handle and the real-time callback.
#[derive(Debug)]
pub struct PlaybackShared {
    /// Frames consumed from the clip so far.
    pub frames_played: AtomicU64,
    /// Linear gain as `f32` bits.
    gain_bits: AtomicU32,
    /// Set once the clip has been played to its end.
    pub finished: AtomicBool,
}

impl PlaybackShared {
    pub fn new(gain: f32) -> Self {
        Self {
            frames_played: AtomicU64::new(0),
            gain_bits: AtomicU32::new(gain.to_bits()),
            finished: AtomicBool::new(false),
        }
    }

    pub fn gain(&self) -> f32 {
        f32::from_bits(self.gain_bits.load(Ordering::Relaxed))
    }

    pub fn set_gain(&self, gain: f32) {
        self.gain_bits.store(gain.to_bits(), Ordering::Relaxed);
    }
}

/// Interleaved clip audio already at the stream's sample rate.
#[derive(Clone, Debug)]
pub struct StreamSource {
    pub samples: Arc<[f32]>,
    pub channels: usize,
}

/// Build a CPAL output stream that plays `source` once.
pub fn build_clip_stream(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    sample_format: cpal::SampleFormat,
    source: StreamSource,
    shared: Arc<PlaybackShared>,
) -> Result<cpal::Stream> {
    match sample_format {
        cpal::SampleFormat::F32 => build_stream::<f32>(device, config, source, shared),
        cpal::SampleFormat::I16 => build_stream::<i16>(device, config, source, shared),
        cpal::SampleFormat::I32 => build_stream::<i32>(device, config, source, shared),
        cpal::SampleFormat::U16 => build_stream::<u16>(device, config, source, shared),
        other => Err(anyhow!("Unsupported sample format: {other:?}")),
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    source: StreamSource,
    shared: Arc<PlaybackShared>,
) -> Result<cpal::Stream>
where
    T: cpal::Sample + cpal::SizedSample + cpal::FromSample<f32>,
{
    let channels_out = (config.channels as usize).max(1);
    let err_fn = |err| tracing::warn!("stream error: {err}");

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _| {
            let gain = shared.gain();
            let (written, done) = render_frames(
                &source,
                shared.frames_played.load(Ordering::Relaxed) as usize,
                channels_out,
                gain,
                data,
                <T as cpal::Sample>::from_sample::<f32>,
            );
            shared
                .frames_played
                .fetch_add(written as u64, Ordering::Relaxed);
            if done {
                shared.finished.store(true, Ordering::Release);
            }
        },
        err_fn,
        None,
    )?;

    Ok(stream)
}

/// Fill `out` from `source` starting at frame `cursor`.
///
/// Frames past the end of the clip are silence. Returns the number of clip
/// frames consumed and whether the clip is exhausted.
fn render_frames<T: Copy>(
    source: &StreamSource,
    cursor: usize,
    channels_out: usize,
    gain: f32,
    out: &mut [T],
    convert: impl Fn(f32) -> T,
) -> (usize, bool) {
    let src_channels = source.channels.max(1);
    let total_frames = source.samples.len() / src_channels;
    let frames = out.len() / channels_out;
    let available = total_frames.saturating_sub(cursor);
    let written = frames.min(available);

    for frame in 0..frames {
        let src_frame = if frame < written {
            let start = (cursor + frame) * src_channels;
            Some(&source.samples[start..start + src_channels])
        } else {
            None
        };
        for ch in 0..channels_out {
            let sample = src_frame
                .map(|f| map_channel(f, channels_out, ch) * gain)
                .unwrap_or(0.0);
            out[frame * channels_out + ch] = convert(sample);
        }
    }

    (written, cursor + written >= total_frames)
}

/// Output sample for `dst_ch` from one interleaved source frame.
///
/// Mapping rules:
/// - mono → any: duplicate channel 0
/// - stereo → mono: average L/R
/// - other layouts: channel-for-channel; outputs past the last source channel are silent
fn map_channel(frame: &[f32], dst_channels: usize, dst_ch: usize) -> f32 {
    match (frame.len(), dst_channels) {
        (0, _) => 0.0,
        (1, _) => frame[0],
        (2, 1) => 0.5 * (frame[0] + frame[1]),
        _ => frame.get(dst_ch).copied().unwrap_or(0.0),
    }
}
