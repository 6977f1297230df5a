//! Driver runtime.
//!
//! Builds the player from config, runs the tick loop, and applies commands
//! read from stdin until `q` or Ctrl-C.

use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use music_player::config::PlayerConfig;
use music_player::device;
use music_player::output::{AudioOutput, CpalOutput};
use music_player::player::Player;

use crate::cli::{DriverCommand, HELP, parse_command};

/// Everything `run_play` needs.
#[derive(Clone, Debug)]
pub struct PlaySession {
    pub path: String,
    pub config: PlayerConfig,
    pub tick: Duration,
    pub autoplay: bool,
}

/// Print output devices to stdout.
pub fn list_devices() -> Result<()> {
    let host = cpal::default_host();
    for (i, name) in device::list_devices(&host)?.iter().enumerate() {
        println!("#{i}: {name}");
    }
    Ok(())
}

/// Load the config file (if any) and apply command-line overrides.
pub fn load_config(
    path: Option<&Path>,
    fade_out_seconds: Option<f32>,
    device: Option<String>,
) -> Result<PlayerConfig> {
    let mut config = match path {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    };
    if let Some(secs) = fade_out_seconds {
        config.fade_out_seconds = secs;
    }
    if let Some(device) = normalize_device_name(device) {
        config.output.device = Some(device);
    }
    Ok(config)
}

/// Run the interactive tick loop on the configured output device.
pub fn run_play(session: PlaySession) -> Result<()> {
    let output = CpalOutput::new(&session.config.output)?;
    let mut player = Player::new(&session.config, output);
    tracing::info!(
        path = %session.path,
        fade_out_s = player.fade_out_seconds(),
        tick_ms = session.tick.as_millis() as u64,
        "driver ready"
    );

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))
            .context("install ctrl-c handler")?;
    }

    let commands = spawn_stdin_reader();
    println!("{HELP}");
    if session.autoplay {
        player.play_path(&session.path);
    }

    let mut last = Instant::now();
    'run: while !shutdown.load(Ordering::SeqCst) {
        for cmd in commands.try_iter() {
            if !handle_command(&mut player, &session.path, cmd)? {
                break 'run;
            }
        }

        let now = Instant::now();
        player.tick(now.duration_since(last).as_secs_f32());
        last = now;
        std::thread::sleep(session.tick);
    }

    player.stop(false);
    tracing::info!("driver stopped");
    Ok(())
}

/// Apply one command; returns `false` when the driver should exit.
pub fn handle_command<O: AudioOutput>(
    player: &mut Player<O>,
    path: &str,
    cmd: DriverCommand,
) -> Result<bool> {
    match cmd {
        DriverCommand::Toggle => player.play_path(path),
        DriverCommand::Stop => player.stop(true),
        DriverCommand::StopNow => player.stop(false),
        DriverCommand::Status => {
            let json =
                serde_json::to_string_pretty(&player.status()).context("serialize status")?;
            println!("{json}");
        }
        DriverCommand::Quit => return Ok(false),
    }
    Ok(true)
}

fn spawn_stdin_reader() -> Receiver<DriverCommand> {
    let (tx, rx) = crossbeam_channel::unbounded();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Some(cmd) => {
                    if tx.send(cmd).is_err() {
                        break;
                    }
                }
                None => println!("unknown command {:?}; {HELP}", line.trim()),
            }
        }
    });
    rx
}

fn normalize_device_name(device: Option<String>) -> Option<String> {
    device.and_then(|name| {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use music_player::clip::AudioClip;
    use music_player::PlayerState;

    #[derive(Default)]
    struct SilentOutput {
        playing: bool,
        volume: f32,
    }

    impl AudioOutput for SilentOutput {
        fn assign(&mut self, _clip: AudioClip) {
            self.playing = false;
        }

        fn play(&mut self) -> Result<()> {
            self.playing = true;
            Ok(())
        }

        fn stop(&mut self) {
            self.playing = false;
        }

        fn set_volume(&mut self, volume: f32) {
            self.volume = volume;
        }

        fn volume(&self) -> f32 {
            self.volume
        }

        fn is_playing(&self) -> bool {
            self.playing
        }

        fn position_seconds(&self) -> f32 {
            0.0
        }
    }

    fn new_player(fade: f32) -> Player<SilentOutput> {
        let config = PlayerConfig {
            fade_out_seconds: fade,
            ..PlayerConfig::default()
        };
        Player::new(&config, SilentOutput::default())
    }

    #[test]
    fn normalize_device_name_drops_blank() {
        assert_eq!(normalize_device_name(None), None);
        assert_eq!(normalize_device_name(Some("  ".to_string())), None);
        assert_eq!(
            normalize_device_name(Some(" USB DAC ".to_string())),
            Some("USB DAC".to_string())
        );
    }

    #[test]
    fn load_config_applies_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fade_out_seconds = 3.0").unwrap();
        writeln!(file, "[output]").unwrap();
        writeln!(file, "device = \"Speakers\"").unwrap();

        let from_file = load_config(Some(file.path()), None, None).unwrap();
        assert_eq!(from_file.fade_out_seconds(), 3.0);
        assert_eq!(from_file.output.device.as_deref(), Some("Speakers"));

        let overridden =
            load_config(Some(file.path()), Some(0.5), Some("USB".to_string())).unwrap();
        assert_eq!(overridden.fade_out_seconds(), 0.5);
        assert_eq!(overridden.output.device.as_deref(), Some("USB"));
    }

    #[test]
    fn load_config_without_file_uses_defaults() {
        let config = load_config(None, None, Some(" ".to_string())).unwrap();
        assert_eq!(config.fade_out_seconds(), 1.0);
        assert!(config.output.device.is_none());
    }

    #[test]
    fn quit_ends_the_loop() {
        let mut player = new_player(1.0);
        assert!(!handle_command(&mut player, "a.ogg", DriverCommand::Quit).unwrap());
        assert!(handle_command(&mut player, "a.ogg", DriverCommand::Status).unwrap());
    }

    #[test]
    fn stop_commands_follow_fade_setting() {
        let mut player = new_player(1.0);
        player.play_clip(AudioClip::new("a", vec![0.0; 16], 16, 1));

        handle_command(&mut player, "a.ogg", DriverCommand::Stop).unwrap();
        assert_eq!(player.state(), PlayerState::FadingOut);

        let mut player = new_player(1.0);
        player.play_clip(AudioClip::new("a", vec![0.0; 16], 16, 1));
        handle_command(&mut player, "a.ogg", DriverCommand::StopNow).unwrap();
        assert_eq!(player.state(), PlayerState::Idle);
    }

    #[test]
    fn toggle_requests_the_configured_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.wav");
        let mut player = new_player(1.0);

        handle_command(&mut player, &path.to_string_lossy(), DriverCommand::Toggle).unwrap();
        assert!(player.is_loading());
        assert_eq!(player.state(), PlayerState::Loading);
    }
}
