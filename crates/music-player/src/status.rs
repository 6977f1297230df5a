use music_player_types::{PlayerState, PlayerStatus};

use crate::output::AudioOutput;
use crate::player::{Phase, Player};

/// Observable state for a phase plus the loading and pending flags.
pub(crate) fn derive_state(phase: Phase, loading: bool, has_pending: bool) -> PlayerState {
    match phase {
        Phase::FadingOut if has_pending => PlayerState::FadingOutWithPending,
        Phase::FadingOut => PlayerState::FadingOut,
        Phase::Playing => PlayerState::Playing,
        Phase::Idle if loading => PlayerState::Loading,
        Phase::Idle => PlayerState::Idle,
    }
}

impl<O: AudioOutput> Player<O> {
    /// Snapshot suitable for logging or JSON output.
    pub fn status(&self) -> PlayerStatus {
        PlayerStatus {
            state: self.state(),
            loading: self.is_loading(),
            clip: self.current_clip().map(|c| c.name().to_string()),
            container: self.container(),
            volume: self.volume(),
            time_code: self.time_code(),
            length: self.length(),
            last_failure: self.last_failure().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fading_wins_over_everything() {
        assert_eq!(
            derive_state(Phase::FadingOut, true, true),
            PlayerState::FadingOutWithPending
        );
        assert_eq!(
            derive_state(Phase::FadingOut, true, false),
            PlayerState::FadingOut
        );
    }

    #[test]
    fn playing_wins_over_loading() {
        assert_eq!(derive_state(Phase::Playing, true, false), PlayerState::Playing);
    }

    #[test]
    fn idle_reports_loading() {
        assert_eq!(derive_state(Phase::Idle, true, false), PlayerState::Loading);
        assert_eq!(derive_state(Phase::Idle, false, false), PlayerState::Idle);
    }

    #[test]
    fn pending_without_fade_is_idle() {
        assert_eq!(derive_state(Phase::Idle, false, true), PlayerState::Idle);
    }
}
