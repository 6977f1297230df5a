//! Fade-aware player.
//!
//! All state transitions happen on the caller's thread inside [`Player::tick`]
//! and the request methods. Fetches and MP3 transcodes run on short-lived
//! worker threads that report back through a channel drained once per tick.
//!
//! Tick order:
//! 1. fade timer (volume ramp, then stop at the deadline)
//! 2. pending clip, only on a tick that did not start mid-fade
//! 3. natural end of the current clip
//! 4. load events from workers

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use music_player_types::{ContainerType, LoadFailure, LoadStage, PlayerState};

use crate::clip::AudioClip;
use crate::config::PlayerConfig;
use crate::decode::Decoders;
use crate::fade::{FadeState, fade_volume};
use crate::fetch::{Fetcher, UrlFetcher};
use crate::output::AudioOutput;
use crate::source::{classify, clip_name, resolve_url};
use crate::status::derive_state;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle,
    Playing,
    FadingOut,
}

/// Completion message from a worker thread.
enum LoadEvent {
    Fetched {
        url: String,
        container: ContainerType,
        result: anyhow::Result<Vec<u8>>,
    },
    Transcoded {
        url: String,
        result: anyhow::Result<Vec<u8>>,
    },
}

/// Single-voice player with fade-out and one pending slot.
pub struct Player<O: AudioOutput> {
    output: O,
    fetcher: Arc<dyn Fetcher>,
    decoders: Decoders,
    fade_out_seconds: f32,
    phase: Phase,
    fade: FadeState,
    clip: Option<AudioClip>,
    loading: bool,
    container: Option<ContainerType>,
    last_failure: Option<LoadFailure>,
    /// Player clock in seconds, advanced by `tick`.
    now: f64,
    events_tx: Sender<LoadEvent>,
    events_rx: Receiver<LoadEvent>,
}

impl<O: AudioOutput> Player<O> {
    /// Player fetching with [`UrlFetcher`] and decoding with the default decoders.
    pub fn new(config: &PlayerConfig, output: O) -> Self {
        let fetcher = Arc::new(UrlFetcher::new(config.fetch_timeout()));
        Self::with_parts(config, output, fetcher, Decoders::default())
    }

    pub fn with_parts(
        config: &PlayerConfig,
        output: O,
        fetcher: Arc<dyn Fetcher>,
        decoders: Decoders,
    ) -> Self {
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        Self {
            output,
            fetcher,
            decoders,
            fade_out_seconds: config.fade_out_seconds(),
            phase: Phase::Idle,
            fade: FadeState::default(),
            clip: None,
            loading: false,
            container: None,
            last_failure: None,
            now: 0.0,
            events_tx,
            events_rx,
        }
    }

    /// Request playback of a local path or URL.
    ///
    /// Ignored while another load is in flight or when `path` is blank.
    /// The current clip fades out while the new one loads; failures are
    /// logged and kept in [`Player::last_failure`].
    pub fn play_path(&mut self, path: &str) {
        if self.loading {
            tracing::debug!(path = %path, "load in progress; request ignored");
            return;
        }
        if path.trim().is_empty() {
            tracing::debug!("blank path; request ignored");
            return;
        }

        self.stop(true);
        self.loading = true;

        let url = resolve_url(path);
        let container = classify(&url);
        self.container = Some(container);
        tracing::info!(url = %url, container = ?container, "load requested");

        let fetcher = self.fetcher.clone();
        let tx = self.events_tx.clone();
        std::thread::spawn(move || {
            let result = fetcher.fetch(&url);
            let _ = tx.send(LoadEvent::Fetched {
                url,
                container,
                result,
            });
        });
    }

    /// Play an already decoded clip, fading out the current one first.
    pub fn play_clip(&mut self, clip: AudioClip) {
        if self.loading {
            tracing::debug!(clip = %clip.name(), "load in progress; clip ignored");
            return;
        }
        self.stop(true);
        self.start_clip(clip);
    }

    /// Stop the current clip, optionally with the configured fade-out.
    ///
    /// Has no effect when nothing is audible or a fade is already running.
    pub fn stop(&mut self, fade_out: bool) {
        if !self.output.is_playing() || self.phase == Phase::FadingOut {
            return;
        }
        if fade_out && self.fade_out_seconds > 0.0 {
            self.fade.begin(self.now, self.fade_out_seconds);
            self.phase = Phase::FadingOut;
            tracing::debug!(seconds = self.fade_out_seconds, "fade-out started");
        } else {
            self.output.stop();
            self.phase = Phase::Idle;
            tracing::debug!("stopped");
        }
    }

    /// Advance the player clock by `delta_seconds` and run one update.
    pub fn tick(&mut self, delta_seconds: f32) {
        if delta_seconds.is_finite() && delta_seconds > 0.0 {
            self.now += f64::from(delta_seconds);
        }

        if self.phase == Phase::FadingOut {
            let remaining = self.fade.remaining(self.now);
            if remaining <= 0.0 {
                self.output.stop();
                self.phase = Phase::Idle;
                tracing::debug!("fade-out complete");
            } else {
                self.output
                    .set_volume(fade_volume(remaining, self.fade_out_seconds));
            }
        } else if let Some(clip) = self.fade.take_pending() {
            self.begin_playback(clip);
        } else if self.phase == Phase::Playing && !self.output.is_playing() {
            self.phase = Phase::Idle;
            tracing::debug!("clip finished");
        }

        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// True while the output is audible and not fading out.
    pub fn is_playing(&self) -> bool {
        self.output.is_playing() && self.phase != Phase::FadingOut
    }

    /// Duration of the current clip in seconds, or -1 without one.
    pub fn length(&self) -> f32 {
        self.clip
            .as_ref()
            .map(AudioClip::duration_seconds)
            .unwrap_or(-1.0)
    }

    /// Playback position in seconds; 0 unless the output is playing.
    pub fn time_code(&self) -> f32 {
        if self.output.is_playing() {
            self.output.position_seconds()
        } else {
            0.0
        }
    }

    pub fn state(&self) -> PlayerState {
        derive_state(self.phase, self.loading, self.fade.has_pending())
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn volume(&self) -> f32 {
        self.output.volume()
    }

    pub fn fade_out_seconds(&self) -> f32 {
        self.fade_out_seconds
    }

    /// Container of the most recent `play_path` request.
    pub fn container(&self) -> Option<ContainerType> {
        self.container
    }

    pub fn current_clip(&self) -> Option<&AudioClip> {
        self.clip.as_ref()
    }

    /// Clip waiting for the running fade to finish.
    pub fn pending_clip(&self) -> Option<&AudioClip> {
        if self.fade.has_pending() {
            self.fade.pending()
        } else {
            None
        }
    }

    /// Most recent swallowed failure; cleared when a clip starts.
    pub fn last_failure(&self) -> Option<&LoadFailure> {
        self.last_failure.as_ref()
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    fn start_clip(&mut self, clip: AudioClip) {
        if self.phase == Phase::FadingOut {
            tracing::debug!(clip = %clip.name(), "clip queued behind fade-out");
            if let Some(replaced) = self.fade.queue(clip) {
                tracing::debug!(clip = %replaced.name(), "pending clip replaced");
            }
            return;
        }
        self.begin_playback(clip);
    }

    fn begin_playback(&mut self, clip: AudioClip) {
        // A clip started directly supersedes anything still parked from an earlier fade.
        if let Some(stale) = self.fade.take_pending() {
            tracing::debug!(clip = %stale.name(), "pending clip dropped");
        }

        let name = clip.name().to_string();
        self.output.assign(clip.clone());
        self.output.set_volume(1.0);

        match self.output.play() {
            Ok(()) => {
                self.clip = Some(clip);
                self.phase = Phase::Playing;
                self.last_failure = None;
                tracing::info!(clip = %name, length_s = self.length(), "playing");
            }
            Err(e) => {
                self.clip = None;
                self.phase = Phase::Idle;
                self.record_failure(LoadStage::Output, name, &e);
            }
        }
    }

    fn handle_event(&mut self, event: LoadEvent) {
        match event {
            LoadEvent::Fetched {
                url,
                container,
                result,
            } => {
                let bytes = match result {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        self.loading = false;
                        self.record_failure(LoadStage::Fetch, url, &e);
                        return;
                    }
                };
                tracing::debug!(url = %url, bytes = bytes.len(), "fetch complete");

                match self.decoders.direct(container).cloned() {
                    Some(decoder) => {
                        self.loading = false;
                        match decoder.decode(&clip_name(&url), bytes) {
                            Ok(clip) => self.start_clip(clip),
                            Err(e) => self.record_failure(LoadStage::Decode, url, &e),
                        }
                    }
                    None => self.spawn_transcode(url, bytes),
                }
            }
            LoadEvent::Transcoded { url, result } => {
                self.loading = false;
                let clip = result
                    .and_then(|wav| self.decoders.wav.decode(&clip_name(&url), wav));
                match clip {
                    Ok(clip) => self.start_clip(clip),
                    Err(e) => self.record_failure(LoadStage::Decode, url, &e),
                }
            }
        }
    }

    fn spawn_transcode(&self, url: String, bytes: Vec<u8>) {
        tracing::debug!(url = %url, "mp3 transcode started");
        let transcoder = self.decoders.mp3.clone();
        let tx = self.events_tx.clone();
        std::thread::spawn(move || {
            let result = transcoder.transcode(bytes);
            let _ = tx.send(LoadEvent::Transcoded { url, result });
        });
    }

    fn record_failure(&mut self, stage: LoadStage, url: String, err: &anyhow::Error) {
        let message = format!("{err:#}");
        tracing::warn!(url = %url, stage = ?stage, "load failed: {message}");
        self.last_failure = Some(LoadFailure {
            stage,
            url,
            message,
        });
    }
}
