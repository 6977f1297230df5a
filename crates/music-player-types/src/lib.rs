use serde::{Deserialize, Serialize};

/// Container format of a playback request, chosen from the URL suffix.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ContainerType {
    /// Ogg/Vorbis. Also the fallback for any unrecognized suffix.
    #[default]
    Ogg,
    /// MPEG layer III. Transcoded to WAV off the tick thread.
    Mp3,
    /// RIFF/WAVE PCM.
    Wav,
}

impl ContainerType {
    /// Extension handed to the decoder as a format hint.
    pub fn extension(self) -> &'static str {
        match self {
            ContainerType::Ogg => "ogg",
            ContainerType::Mp3 => "mp3",
            ContainerType::Wav => "wav",
        }
    }
}

/// Observable player state.
///
/// Derived from the player's phase, its loading flag and its pending slot;
/// fading wins over playing, which wins over loading.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PlayerState {
    /// Nothing playing and nothing loading.
    #[default]
    Idle,
    /// A fetch or MP3 transcode is in flight and nothing is audible.
    Loading,
    /// A clip is playing at full volume.
    Playing,
    /// Volume is ramping down before the output stops.
    FadingOut,
    /// Fading out with a clip queued to start once the fade completes.
    FadingOutWithPending,
}

/// Stage at which a load request gave up.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoadStage {
    /// Transport error, missing file or non-success HTTP status.
    Fetch,
    /// Empty or corrupt bytes, or no playable track.
    Decode,
    /// The output device refused to open or start.
    Output,
}

/// Last swallowed failure, kept so hosts can surface it if they want to.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadFailure {
    pub stage: LoadStage,
    /// Resolved URL of the failed request, or the clip name for output failures.
    pub url: String,
    /// Human-readable error chain.
    pub message: String,
}

/// Point-in-time snapshot of a player, suitable for logging or JSON output.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct PlayerStatus {
    pub state: PlayerState,
    /// `true` while a fetch or transcode is in flight.
    pub loading: bool,
    /// Name of the clip assigned to the output, if any.
    pub clip: Option<String>,
    /// Container of the most recent load request.
    pub container: Option<ContainerType>,
    /// Output volume in `[0, 1]`.
    pub volume: f32,
    /// Playback position in seconds (0 when not playing).
    pub time_code: f32,
    /// Clip length in seconds, or -1 when no clip is loaded.
    pub length: f32,
    pub last_failure: Option<LoadFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_extension_matches_format_hints() {
        assert_eq!(ContainerType::Ogg.extension(), "ogg");
        assert_eq!(ContainerType::Mp3.extension(), "mp3");
        assert_eq!(ContainerType::Wav.extension(), "wav");
    }

    #[test]
    fn state_serializes_snake_case() {
        let json = serde_json::to_string(&PlayerState::FadingOutWithPending).unwrap();
        assert_eq!(json, "\"fading_out_with_pending\"");
    }

    #[test]
    fn status_roundtrips_failure() {
        let status = PlayerStatus {
            state: PlayerState::Idle,
            length: -1.0,
            last_failure: Some(LoadFailure {
                stage: LoadStage::Fetch,
                url: "file:///missing.ogg".to_string(),
                message: "not found".to_string(),
            }),
            ..PlayerStatus::default()
        };
        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"stage\":\"fetch\""));
        let back: PlayerStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }
}
