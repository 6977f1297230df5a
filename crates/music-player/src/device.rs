//! Output device selection.
//!
//! CPAL helpers used by [`crate::output::CpalOutput`]:
//! - pick the host default device, or the first one whose name contains a needle
//! - pick the stream config closest to a clip's sample rate
//! - enumerate device names for the driver's `devices` command

use anyhow::{Context, Result, anyhow};
use cpal::traits::{DeviceTrait, HostTrait};

/// Largest fixed callback buffer requested from a device.
const MAX_BUFFER_FRAMES: u32 = 8_192;

/// Pick the first output device matching `needle` (case-insensitive), or the default device.
pub fn pick_device(host: &cpal::Host, needle: Option<&str>) -> Result<cpal::Device> {
    if let Some(needle) = needle {
        let found = host
            .output_devices()
            .context("enumerate output devices")?
            .find(|d| {
                d.description()
                    .map(|desc| matches_device_name(&desc.name(), needle))
                    .unwrap_or(false)
            });
        return found.ok_or_else(|| anyhow!("No output device matched: {needle}"));
    }

    host.default_output_device()
        .ok_or_else(|| anyhow!("No default output device"))
}

/// Choose the output config closest to `target_rate`.
///
/// An exact match wins; otherwise the highest rate at or below the target,
/// then the lowest above it. Ties go to the better sample format.
pub fn pick_output_config(
    device: &cpal::Device,
    target_rate: u32,
) -> Result<cpal::SupportedStreamConfig> {
    let mut best: Option<(bool, u32, u8, cpal::SupportedStreamConfig)> = None;

    for range in device
        .supported_output_configs()
        .context("query output configs")?
    {
        let rate = pick_rate_for_range(range.min_sample_rate(), range.max_sample_rate(), target_rate);
        let below = rate <= target_rate;
        let rank = sample_format_rank(range.sample_format());
        let replace = match &best {
            None => true,
            Some((b_below, b_rate, b_rank, _)) => {
                is_better_candidate(target_rate, (below, rate, rank), (*b_below, *b_rate, *b_rank))
            }
        };
        if replace {
            best = Some((below, rate, rank, range.with_sample_rate(rate)));
        }
    }

    best.map(|(_, _, _, cfg)| cfg)
        .ok_or_else(|| anyhow!("No supported output configs"))
}

/// Fixed buffer size within the device's advertised range, capped at
/// [`MAX_BUFFER_FRAMES`]; `None` leaves the choice to CPAL.
pub fn pick_buffer_size(config: &cpal::SupportedStreamConfig) -> Option<cpal::BufferSize> {
    match config.buffer_size() {
        cpal::SupportedBufferSize::Range { min, max } => {
            Some(cpal::BufferSize::Fixed((*max).min(MAX_BUFFER_FRAMES).max(*min)))
        }
        cpal::SupportedBufferSize::Unknown => None,
    }
}

/// Names of all output devices on the host, in enumeration order.
pub fn list_devices(host: &cpal::Host) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for device in host.output_devices().context("enumerate output devices")? {
        match device.description() {
            Ok(desc) => names.push(desc.to_string()),
            Err(e) => tracing::debug!("skipping device without description: {e}"),
        }
    }
    Ok(names)
}

fn pick_rate_for_range(min: u32, max: u32, target: u32) -> u32 {
    target.clamp(min, max.max(min))
}

fn sample_format_rank(format: cpal::SampleFormat) -> u8 {
    match format {
        cpal::SampleFormat::F32 => 0,
        cpal::SampleFormat::I32 => 1,
        cpal::SampleFormat::I16 => 2,
        cpal::SampleFormat::U16 => 3,
        _ => 10,
    }
}

/// `(below_target, rate, format_rank)` comparison for config candidates.
fn is_better_candidate(target: u32, cand: (bool, u32, u8), best: (bool, u32, u8)) -> bool {
    let (below, rate, rank) = cand;
    let (b_below, b_rate, b_rank) = best;
    if (rate == target) != (b_rate == target) {
        return rate == target;
    }
    if below != b_below {
        return below;
    }
    if rate != b_rate {
        // Below the target we want the highest rate, above it the lowest.
        return if below { rate > b_rate } else { rate < b_rate };
    }
    rank < b_rank
}

fn matches_device_name(name: &str, needle: &str) -> bool {
    let needle = needle.trim();
    if needle.is_empty() {
        return false;
    }
    name.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_device_name_is_case_insensitive() {
        assert!(matches_device_name("USB DAC", "dac"));
        assert!(matches_device_name("usb dac", " USB "));
        assert!(!matches_device_name("USB DAC", "speaker"));
        assert!(!matches_device_name("USB DAC", "  "));
    }

    #[test]
    fn pick_rate_for_range_clamps_to_range() {
        assert_eq!(pick_rate_for_range(44_100, 96_000, 48_000), 48_000);
        assert_eq!(pick_rate_for_range(44_100, 96_000, 22_050), 44_100);
        assert_eq!(pick_rate_for_range(44_100, 96_000, 192_000), 96_000);
        assert_eq!(pick_rate_for_range(48_000, 48_000, 44_100), 48_000);
    }

    #[test]
    fn exact_rate_beats_everything() {
        assert!(is_better_candidate(
            44_100,
            (true, 44_100, 3),
            (true, 32_000, 0)
        ));
        assert!(!is_better_candidate(
            44_100,
            (false, 48_000, 0),
            (true, 44_100, 3)
        ));
    }

    #[test]
    fn below_target_prefers_highest_rate() {
        assert!(is_better_candidate(
            44_100,
            (true, 32_000, 0),
            (true, 22_050, 0)
        ));
        assert!(is_better_candidate(
            44_100,
            (true, 22_050, 0),
            (false, 48_000, 0)
        ));
    }

    #[test]
    fn above_target_prefers_lowest_rate() {
        assert!(is_better_candidate(
            22_050,
            (false, 44_100, 0),
            (false, 96_000, 0)
        ));
    }

    #[test]
    fn equal_rates_prefer_float_output() {
        assert!(is_better_candidate(
            48_000,
            (true, 48_000, sample_format_rank(cpal::SampleFormat::F32)),
            (true, 48_000, sample_format_rank(cpal::SampleFormat::I16))
        ));
    }
}
