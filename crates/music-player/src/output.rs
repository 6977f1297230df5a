//! Output channel.
//!
//! [`AudioOutput`] is the single-voice channel the player drives: it holds at
//! most one assigned clip, plays it from the start, and exposes volume,
//! play state and position. [`CpalOutput`] is the device-backed
//! implementation.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use anyhow::{Context, Result, anyhow};
use cpal::traits::{DeviceTrait, StreamTrait};

use crate::clip::AudioClip;
use crate::config::OutputConfig;
use crate::device;
use crate::playback::{PlaybackShared, StreamSource, build_clip_stream};
use crate::resample::resample_interleaved;

/// Output channel driven by the player.
pub trait AudioOutput {
    /// Replace the assigned clip. Does not start playback.
    fn assign(&mut self, clip: AudioClip);
    /// Start the assigned clip from the beginning.
    fn play(&mut self) -> Result<()>;
    fn stop(&mut self);
    /// Set the gain; values outside `[0, 1]` are clamped.
    fn set_volume(&mut self, volume: f32);
    fn volume(&self) -> f32;
    /// True while the assigned clip is audible and has not reached its end.
    fn is_playing(&self) -> bool;
    /// Playback position in seconds of the current clip.
    fn position_seconds(&self) -> f32;
}

struct ActiveStream {
    // Dropping the stream stops the callback.
    _stream: cpal::Stream,
    shared: Arc<PlaybackShared>,
    sample_rate: u32,
}

/// CPAL-backed output channel bound to one device.
pub struct CpalOutput {
    device: cpal::Device,
    resample_chunk_frames: usize,
    clip: Option<AudioClip>,
    volume: f32,
    active: Option<ActiveStream>,
}

impl CpalOutput {
    /// Open the configured device (or the host default).
    pub fn new(cfg: &OutputConfig) -> Result<Self> {
        let host = cpal::default_host();
        let device = device::pick_device(&host, cfg.device.as_deref())?;
        if let Ok(desc) = device.description() {
            tracing::info!(device = %desc, "output device selected");
        }
        Ok(Self {
            device,
            resample_chunk_frames: cfg.resample_chunk_frames.max(1),
            clip: None,
            volume: 1.0,
            active: None,
        })
    }
}

impl AudioOutput for CpalOutput {
    fn assign(&mut self, clip: AudioClip) {
        self.active = None;
        self.clip = Some(clip);
    }

    fn play(&mut self) -> Result<()> {
        let clip = self
            .clip
            .as_ref()
            .ok_or_else(|| anyhow!("no clip assigned"))?;
        self.active = None;

        let supported = device::pick_output_config(&self.device, clip.sample_rate())?;
        let sample_format = supported.sample_format();
        let mut stream_config: cpal::StreamConfig = supported.clone().into();
        if let Some(buf) = device::pick_buffer_size(&supported) {
            stream_config.buffer_size = buf;
        }
        let stream_rate = stream_config.sample_rate;

        let samples: Arc<[f32]> = if stream_rate == clip.sample_rate() {
            clip.samples().clone()
        } else {
            resample_interleaved(
                clip.samples(),
                clip.channels(),
                clip.sample_rate(),
                stream_rate,
                self.resample_chunk_frames,
            )
            .with_context(|| format!("resample {}", clip.name()))?
            .into()
        };

        let shared = Arc::new(PlaybackShared::new(self.volume));
        let stream = build_clip_stream(
            &self.device,
            &stream_config,
            sample_format,
            StreamSource {
                samples,
                channels: clip.channels(),
            },
            shared.clone(),
        )
        .context("build output stream")?;
        stream.play().context("start output stream")?;

        tracing::info!(
            clip = %clip.name(),
            channels = clip.channels(),
            src_rate_hz = clip.sample_rate(),
            dst_rate_hz = stream_rate,
            format = ?sample_format,
            "output started"
        );

        self.active = Some(ActiveStream {
            _stream: stream,
            shared,
            sample_rate: stream_rate,
        });
        Ok(())
    }

    fn stop(&mut self) {
        if self.active.take().is_some() {
            tracing::debug!("output stopped");
        }
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) };
        if let Some(active) = &self.active {
            active.shared.set_gain(self.volume);
        }
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn is_playing(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|a| !a.shared.finished.load(Ordering::Acquire))
    }

    fn position_seconds(&self) -> f32 {
        match &self.active {
            Some(a) if a.sample_rate > 0 => {
                a.shared.frames_played.load(Ordering::Relaxed) as f32 / a.sample_rate as f32
            }
            _ => 0.0,
        }
    }
}
