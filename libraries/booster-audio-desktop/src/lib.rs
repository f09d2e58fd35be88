//! Desktop audio I/O for the voice booster, using cpal
//!
//! This crate provides:
//! - [`AudioEngine`]: the duplex mic-to-speaker session running the
//!   [`booster_audio::VoiceProcessor`] inside the output callback
//! - [`Recorder`]: capture to mono 16-bit WAV on its own thread
//! - [`CpalAssetPlayer`]: blocking playback of Sample Bank assets
//! - Device enumeration and config negotiation
//!
//! # Example
//!
//! ```no_run
//! use booster_audio::EngineConfig;
//! use booster_audio_desktop::{AudioEngine, DeviceOptions};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(EngineConfig::new(44_100));
//! let mut engine = AudioEngine::new(Arc::clone(&config), DeviceOptions::default());
//!
//! engine.start()?;
//! engine.set_bass_percent(60.0)?;
//! engine.set_noise_reduction(true);
//!
//! engine.start_recording()?;
//! std::thread::sleep(std::time::Duration::from_secs(3));
//! engine.stop_recording(Some("take.wav".as_ref()))?;
//!
//! engine.stop()?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]

pub mod device;
mod engine;
mod error;
mod player;
pub mod recorder;

pub use device::{
    choose_config, find_device, list_input_devices, list_output_devices, negotiate_config,
    AudioDeviceInfo, DeviceError, Direction,
};
pub use engine::{AudioEngine, DeviceOptions, EngineEvent};
pub use error::{AudioError, Result};
pub use player::CpalAssetPlayer;
pub use recorder::{
    CaptureDevice, CpalCapture, Recorder, RecorderStatus, RecordingTask, SaveOutcome,
};
