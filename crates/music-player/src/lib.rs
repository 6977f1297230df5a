//! Fade-aware music player.
//!
//! Loads OGG, MP3 or WAV files from disk or HTTP, decodes them into
//! [`clip::AudioClip`]s and plays them through an [`output::AudioOutput`].
//! The host drives everything by calling [`player::Player::tick`] once per
//! frame.

pub mod clip;
pub mod config;
pub mod decode;
pub mod device;
pub mod fade;
pub mod fetch;
pub mod output;
pub mod playback;
pub mod player;
pub mod resample;
pub mod source;
pub mod status;

pub use music_player_types::{ContainerType, LoadFailure, LoadStage, PlayerState, PlayerStatus};
