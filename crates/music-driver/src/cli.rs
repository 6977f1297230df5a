use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "music-driver", version)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play a file and control playback from stdin
    Play {
        /// Local path or file/http(s) URL to an OGG, MP3 or WAV file
        path: String,

        /// Fade-out before stopping or switching tracks (0..=5 seconds)
        #[arg(long)]
        fade_out_seconds: Option<f32>,

        /// Use a specific output device by substring match
        #[arg(long)]
        device: Option<String>,

        /// TOML player config; flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Tick interval in milliseconds
        #[arg(long, default_value_t = 16)]
        tick_ms: u64,

        /// Request playback immediately instead of waiting for a toggle
        #[arg(long)]
        autoplay: bool,
    },

    /// List output devices and exit
    Devices,
}

/// One line of interactive input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverCommand {
    /// Request playback of the configured path.
    Toggle,
    /// Stop with fade-out.
    Stop,
    /// Stop without fading.
    StopNow,
    /// Print the player status as JSON.
    Status,
    Quit,
}

pub const HELP: &str = "commands: <enter>/p play, s stop (fade), x stop now, i status, q quit";

/// Parse a stdin line; `None` for anything unrecognized.
pub fn parse_command(line: &str) -> Option<DriverCommand> {
    match line.trim() {
        "" | "p" => Some(DriverCommand::Toggle),
        "s" => Some(DriverCommand::Stop),
        "x" => Some(DriverCommand::StopNow),
        "i" => Some(DriverCommand::Status),
        "q" => Some(DriverCommand::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_command_maps_keys() {
        assert_eq!(parse_command(""), Some(DriverCommand::Toggle));
        assert_eq!(parse_command("p\n"), Some(DriverCommand::Toggle));
        assert_eq!(parse_command(" s "), Some(DriverCommand::Stop));
        assert_eq!(parse_command("x"), Some(DriverCommand::StopNow));
        assert_eq!(parse_command("i"), Some(DriverCommand::Status));
        assert_eq!(parse_command("q"), Some(DriverCommand::Quit));
        assert_eq!(parse_command("play"), None);
    }

    #[test]
    fn play_args_parse_with_defaults() {
        let args = Args::try_parse_from(["music-driver", "play", "/music/a.ogg"]).unwrap();
        match args.cmd {
            Command::Play {
                path,
                fade_out_seconds,
                device,
                config,
                tick_ms,
                autoplay,
            } => {
                assert_eq!(path, "/music/a.ogg");
                assert!(fade_out_seconds.is_none());
                assert!(device.is_none());
                assert!(config.is_none());
                assert_eq!(tick_ms, 16);
                assert!(!autoplay);
            }
            Command::Devices => panic!("expected play"),
        }
    }

    #[test]
    fn play_args_accept_overrides() {
        let args = Args::try_parse_from([
            "music-driver",
            "play",
            "http://host/a.mp3",
            "--fade-out-seconds",
            "2.5",
            "--device",
            "USB",
            "--autoplay",
        ])
        .unwrap();
        let Command::Play {
            fade_out_seconds,
            device,
            autoplay,
            ..
        } = args.cmd
        else {
            panic!("expected play");
        };
        assert_eq!(fade_out_seconds, Some(2.5));
        assert_eq!(device.as_deref(), Some("USB"));
        assert!(autoplay);
    }

    #[test]
    fn devices_subcommand_parses() {
        let args = Args::try_parse_from(["music-driver", "devices"]).unwrap();
        assert!(matches!(args.cmd, Command::Devices));
    }
}
