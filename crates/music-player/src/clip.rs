use std::sync::Arc;

/// Fully decoded audio ready for an output channel.
///
/// Samples are interleaved `f32` and shared behind an `Arc`, so handing the
/// same clip to the output and keeping it as the player's current clip does
/// not copy audio.
#[derive(Clone, Debug)]
pub struct AudioClip {
    name: String,
    samples: Arc<[f32]>,
    sample_rate: u32,
    channels: usize,
}

impl AudioClip {
    /// Build a clip from interleaved samples.
    ///
    /// A zero channel count is treated as mono.
    pub fn new(name: impl Into<String>, samples: Vec<f32>, sample_rate: u32, channels: usize) -> Self {
        Self {
            name: name.into(),
            samples: samples.into(),
            sample_rate,
            channels: channels.max(1),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn samples(&self) -> &Arc<[f32]> {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of whole frames (one sample per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels
    }

    /// Duration in seconds; zero when the sample rate is unknown.
    pub fn duration_seconds(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f32 / self.sample_rate as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_uses_frames_not_samples() {
        let clip = AudioClip::new("stereo", vec![0.0; 96_000], 48_000, 2);
        assert_eq!(clip.frames(), 48_000);
        assert_eq!(clip.duration_seconds(), 1.0);
    }

    #[test]
    fn zero_rate_has_zero_duration() {
        let clip = AudioClip::new("broken", vec![0.0; 10], 0, 1);
        assert_eq!(clip.duration_seconds(), 0.0);
    }

    #[test]
    fn zero_channels_is_treated_as_mono() {
        let clip = AudioClip::new("mono", vec![0.0; 8], 8, 0);
        assert_eq!(clip.channels(), 1);
        assert_eq!(clip.frames(), 8);
    }

    #[test]
    fn clones_share_samples() {
        let clip = AudioClip::new("a", vec![0.5; 4], 4, 1);
        let other = clip.clone();
        assert!(Arc::ptr_eq(clip.samples(), other.samples()));
    }
}
