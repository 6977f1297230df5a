//! Fade-out timer and the pending-clip slot.

use crate::clip::AudioClip;

/// Fade bookkeeping owned by the player.
///
/// Times are player-clock seconds. Only one clip can wait behind a fade; a
/// newer one replaces it.
#[derive(Debug, Default)]
pub struct FadeState {
    end_time: f64,
    pending: Option<AudioClip>,
    play_pending: bool,
}

impl FadeState {
    /// Start a fade lasting `duration` seconds from `now`.
    pub fn begin(&mut self, now: f64, duration: f32) {
        self.end_time = now + f64::from(duration);
    }

    /// Seconds left until the fade ends; zero or negative once it has.
    pub fn remaining(&self, now: f64) -> f64 {
        self.end_time - now
    }

    /// Park `clip` until the fade completes, returning the clip it displaced.
    pub fn queue(&mut self, clip: AudioClip) -> Option<AudioClip> {
        self.play_pending = true;
        self.pending.replace(clip)
    }

    pub fn has_pending(&self) -> bool {
        self.play_pending && self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&AudioClip> {
        self.pending.as_ref()
    }

    /// Take the parked clip and clear the flag.
    pub fn take_pending(&mut self) -> Option<AudioClip> {
        if !self.play_pending {
            return None;
        }
        self.play_pending = false;
        self.pending.take()
    }
}

/// Linear fade gain for `remaining` seconds out of `duration`, in `[0, 1]`.
pub fn fade_volume(remaining: f64, duration: f32) -> f32 {
    if duration <= 0.0 || remaining <= 0.0 {
        return 0.0;
    }
    ((remaining / f64::from(duration)) as f32).clamp(0.0, 1.0)
}
