//! Player configuration.
//!
//! Loaded from TOML; every field has a default so an empty file is valid.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Longest fade-out accepted; larger values are clamped.
pub const MAX_FADE_OUT_SECONDS: f32 = 5.0;

/// Top-level player settings.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Fade-out applied before stopping or switching tracks. 0 disables fading.
    pub fade_out_seconds: f32,
    /// Optional per-request HTTP timeout. Unset means wait indefinitely.
    pub fetch_timeout_secs: Option<u64>,
    /// Output channel settings.
    pub output: OutputConfig,
}

/// Output channel settings.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output device substring match; the host default when unset.
    pub device: Option<String>,
    /// Resampler input chunk size in frames.
    pub resample_chunk_frames: usize,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            fade_out_seconds: 1.0,
            fetch_timeout_secs: None,
            output: OutputConfig::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            device: None,
            resample_chunk_frames: 1024,
        }
    }
}

impl PlayerConfig {
    /// Load configuration from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let raw =
            std::fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        let cfg = toml::from_str::<PlayerConfig>(&raw)
            .with_context(|| format!("parse config {:?}", path))?;
        Ok(cfg)
    }

    /// Effective fade-out duration, clamped to `[0, MAX_FADE_OUT_SECONDS]`.
    pub fn fade_out_seconds(&self) -> f32 {
        clamp_fade_seconds(self.fade_out_seconds)
    }

    pub fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout_secs.map(Duration::from_secs)
    }
}

fn clamp_fade_seconds(secs: f32) -> f32 {
    if secs.is_nan() {
        return 0.0;
    }
    secs.clamp(0.0, MAX_FADE_OUT_SECONDS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_sane() {
        let cfg = PlayerConfig::default();
        assert_eq!(cfg.fade_out_seconds(), 1.0);
        assert!(cfg.fetch_timeout().is_none());
        assert!(cfg.output.device.is_none());
        assert_eq!(cfg.output.resample_chunk_frames, 1024);
    }

    #[test]
    fn fade_seconds_are_clamped() {
        assert_eq!(clamp_fade_seconds(-1.0), 0.0);
        assert_eq!(clamp_fade_seconds(2.5), 2.5);
        assert_eq!(clamp_fade_seconds(30.0), MAX_FADE_OUT_SECONDS);
        assert_eq!(clamp_fade_seconds(f32::NAN), 0.0);
        assert_eq!(clamp_fade_seconds(f32::INFINITY), MAX_FADE_OUT_SECONDS);
    }

    #[test]
    fn load_reads_partial_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fade_out_seconds = 2.0").unwrap();
        writeln!(file, "[output]").unwrap();
        writeln!(file, "device = \"USB DAC\"").unwrap();

        let cfg = PlayerConfig::load(file.path()).unwrap();
        assert_eq!(cfg.fade_out_seconds(), 2.0);
        assert_eq!(cfg.output.device.as_deref(), Some("USB DAC"));
        assert_eq!(cfg.output.resample_chunk_frames, 1024);
        assert!(cfg.fetch_timeout_secs.is_none());
    }

    #[test]
    fn load_reports_parse_errors_with_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "fade_out_seconds = \"slow\"").unwrap();

        let err = PlayerConfig::load(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("parse config"));
    }

    #[test]
    fn load_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PlayerConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("read config"));
    }
}
