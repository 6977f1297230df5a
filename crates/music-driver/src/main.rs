//! Music driver: manual test harness for the fade-aware player.
//!
//! `play` loads a file on demand and reads single-letter commands from stdin;
//! `devices` lists output devices.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use music_driver::{cli, runtime};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = cli::Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("info,music_player=info,music_driver=info")
        }))
        .init();

    match args.cmd {
        cli::Command::Devices => runtime::list_devices(),
        cli::Command::Play {
            path,
            fade_out_seconds,
            device,
            config,
            tick_ms,
            autoplay,
        } => {
            let config = runtime::load_config(config.as_deref(), fade_out_seconds, device)?;
            runtime::run_play(runtime::PlaySession {
                path,
                config,
                tick: Duration::from_millis(tick_ms.max(1)),
                autoplay,
            })
        }
    }
}
