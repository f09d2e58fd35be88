// booster-audio-desktop/src/device.rs
//
// Device enumeration and stream config negotiation

use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{SampleFormat, StreamConfig, SupportedStreamConfigRange};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Capture or playback side of a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    fn label(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

/// Information about an audio device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDeviceInfo {
    /// Device name (human-readable)
    pub name: String,

    pub direction: Direction,

    /// Is this the system default device for its direction?
    pub is_default: bool,

    /// Native sample rate (Hz)
    pub sample_rate: u32,

    /// Channels in the default config
    pub channels: u16,

    /// Supported sample rates (min, max)
    pub sample_rate_range: Option<(u32, u32)>,
}

/// Device-related errors
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Failed to enumerate devices
    #[error("Failed to enumerate audio devices: {0}")]
    EnumerationFailed(String),

    /// No default device for the direction
    #[error("No audio {0} device found")]
    NoDeviceFound(&'static str),

    /// Device with specified name not found
    #[error("Audio device '{0}' not found")]
    DeviceNotFound(String),

    /// Failed to get device information
    #[error("Failed to get device information: {0}")]
    DeviceInfoFailed(String),

    /// Device offers no f32 config usable by the engine
    #[error("Device '{device}' has no f32 {direction} config at {sample_rate} Hz")]
    UnsupportedConfig {
        device: String,
        direction: &'static str,
        sample_rate: u32,
    },
}

/// Human-readable device name
pub fn device_name(device: &cpal::Device) -> String {
    device
        .description()
        .map(|d| d.name().to_string())
        .unwrap_or_else(|_| "<unknown device>".to_string())
}

fn supported_ranges(
    device: &cpal::Device,
    direction: Direction,
) -> Result<Vec<SupportedStreamConfigRange>, DeviceError> {
    let ranges: Vec<_> = match direction {
        Direction::Input => device
            .supported_input_configs()
            .map_err(|e| DeviceError::DeviceInfoFailed(e.to_string()))?
            .collect(),
        Direction::Output => device
            .supported_output_configs()
            .map_err(|e| DeviceError::DeviceInfoFailed(e.to_string()))?
            .collect(),
    };
    Ok(ranges)
}

fn describe(
    device: &cpal::Device,
    direction: Direction,
    default_name: Option<&str>,
) -> Option<AudioDeviceInfo> {
    let name = device.description().ok()?.name().to_string();
    let config = match direction {
        Direction::Input => device.default_input_config().ok()?,
        Direction::Output => device.default_output_config().ok()?,
    };

    let sample_rate_range = supported_ranges(device, direction)
        .ok()
        .and_then(|ranges| {
            let min = ranges.iter().map(|r| r.min_sample_rate()).min()?;
            let max = ranges.iter().map(|r| r.max_sample_rate()).max()?;
            Some((min, max))
        });

    Some(AudioDeviceInfo {
        is_default: default_name == Some(name.as_str()),
        name,
        direction,
        sample_rate: config.sample_rate(),
        channels: config.channels(),
        sample_rate_range,
    })
}

fn sort_default_first(devices: &mut [AudioDeviceInfo]) {
    devices.sort_by(|a, b| match (a.is_default, b.is_default) {
        (true, false) => std::cmp::Ordering::Less,
        (false, true) => std::cmp::Ordering::Greater,
        _ => a.name.cmp(&b.name),
    });
}

fn list_devices(direction: Direction) -> Result<Vec<AudioDeviceInfo>, DeviceError> {
    let host = cpal::default_host();

    let default_device = match direction {
        Direction::Input => host.default_input_device(),
        Direction::Output => host.default_output_device(),
    };
    let default_name = default_device.as_ref().map(device_name);

    let devices: Vec<cpal::Device> = match direction {
        Direction::Input => host
            .input_devices()
            .map_err(|e| DeviceError::EnumerationFailed(e.to_string()))?
            .collect(),
        Direction::Output => host
            .output_devices()
            .map_err(|e| DeviceError::EnumerationFailed(e.to_string()))?
            .collect(),
    };

    let mut list: Vec<_> = devices
        .iter()
        .filter_map(|d| describe(d, direction, default_name.as_deref()))
        .collect();
    sort_default_first(&mut list);
    Ok(list)
}

/// Enumerate capture devices, default first
pub fn list_input_devices() -> Result<Vec<AudioDeviceInfo>, DeviceError> {
    list_devices(Direction::Input)
}

/// Enumerate playback devices, default first
pub fn list_output_devices() -> Result<Vec<AudioDeviceInfo>, DeviceError> {
    list_devices(Direction::Output)
}

/// Resolve a device by name, or the default when `name` is `None`
pub fn find_device(direction: Direction, name: Option<&str>) -> Result<cpal::Device, DeviceError> {
    let host = cpal::default_host();

    let Some(wanted) = name else {
        let default = match direction {
            Direction::Input => host.default_input_device(),
            Direction::Output => host.default_output_device(),
        };
        return default.ok_or(DeviceError::NoDeviceFound(direction.label()));
    };

    let mut devices = match direction {
        Direction::Input => host.input_devices(),
        Direction::Output => host.output_devices(),
    }
    .map_err(|e| DeviceError::EnumerationFailed(e.to_string()))?;

    devices
        .find(|d| device_name(d) == wanted)
        .ok_or_else(|| DeviceError::DeviceNotFound(wanted.to_string()))
}

/// Pick an f32 config at `sample_rate` from `ranges`
///
/// Preference: exactly `channels`, then the smallest count above it, then
/// anything. The device block size is left to the driver.
pub fn choose_config<I>(ranges: I, sample_rate: u32, channels: u16) -> Option<StreamConfig>
where
    I: IntoIterator<Item = SupportedStreamConfigRange>,
{
    let candidates: Vec<_> = ranges
        .into_iter()
        .filter(|r| {
            r.sample_format() == SampleFormat::F32
                && r.min_sample_rate() <= sample_rate
                && sample_rate <= r.max_sample_rate()
        })
        .collect();

    let rank = |r: &SupportedStreamConfigRange| {
        let ch = r.channels();
        if ch == channels {
            (0, 0)
        } else if ch > channels {
            (1, ch - channels)
        } else {
            (2, channels - ch)
        }
    };

    candidates
        .into_iter()
        .min_by_key(rank)
        .map(|r| r.with_sample_rate(sample_rate).config())
}

/// Negotiate a stream config for `device`
///
/// Tries `sample_rate` first and falls back to the device's default rate.
pub fn negotiate_config(
    device: &cpal::Device,
    direction: Direction,
    sample_rate: u32,
    channels: u16,
) -> Result<StreamConfig, DeviceError> {
    let ranges = supported_ranges(device, direction)?;

    if let Some(config) = choose_config(ranges.iter().cloned(), sample_rate, channels) {
        return Ok(config);
    }

    let default_rate = match direction {
        Direction::Input => device.default_input_config(),
        Direction::Output => device.default_output_config(),
    }
    .map(|c| c.sample_rate())
    .map_err(|e| DeviceError::DeviceInfoFailed(e.to_string()))?;

    if default_rate != sample_rate {
        if let Some(config) = choose_config(ranges, default_rate, channels) {
            tracing::warn!(
                "{} does not support {} Hz {}, using {} Hz",
                device_name(device),
                sample_rate,
                direction.label(),
                default_rate
            );
            return Ok(config);
        }
    }

    Err(DeviceError::UnsupportedConfig {
        device: device_name(device),
        direction: direction.label(),
        sample_rate,
    })
}
