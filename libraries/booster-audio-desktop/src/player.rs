//! Blocking playback of decoded sounds through a cpal output device

use crate::device::{device_name, find_device, negotiate_config, Direction};
use crate::error::{AudioError, Result};
use booster_core::{AssetPlayer, BoosterError};
use cpal::traits::{DeviceTrait, StreamTrait};
use crossbeam_channel::{bounded, RecvTimeoutError};
use std::sync::Arc;
use std::time::Duration;

/// Slack added to the sound length before giving up on the completion signal
const COMPLETION_GRACE: Duration = Duration::from_millis(500);

/// How the output callback ended
enum Completion {
    Finished,
    Failed(String),
}

/// [`AssetPlayer`] that opens its own output stream per sound
///
/// Independent of the engine's duplex stream, so a sound can be auditioned
/// while the engine is stopped.
#[derive(Debug, Clone, Default)]
pub struct CpalAssetPlayer {
    device: Option<String>,
    channels: u16,
}

impl CpalAssetPlayer {
    /// Player on the default output device
    pub fn new() -> Self {
        Self::with_device(None)
    }

    /// Player on a named output device (`None` = default)
    pub fn with_device(device: Option<String>) -> Self {
        Self { device, channels: 2 }
    }

    /// Play mono `samples` once and wait for the device to drain them
    pub fn play(&self, samples: &[f32], sample_rate: u32) -> Result<()> {
        if samples.is_empty() || sample_rate == 0 {
            return Ok(());
        }

        let device = find_device(Direction::Output, self.device.as_deref())?;
        let config = negotiate_config(&device, Direction::Output, sample_rate, self.channels)?;

        let samples: Arc<[f32]> = if config.sample_rate == sample_rate {
            Arc::from(samples)
        } else {
            booster_audio::resample_mono(samples, sample_rate, config.sample_rate)
                .map_err(BoosterError::from)?
                .into()
        };

        let channels = usize::from(config.channels.max(1));
        let total = samples.len();
        let (done_tx, done_rx) = bounded::<Completion>(2);
        let err_tx = done_tx.clone();

        let mut position = 0usize;
        let mut signalled = false;
        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                for frame in data.chunks_mut(channels) {
                    let sample = samples.get(position).copied().unwrap_or(0.0);
                    frame.fill(sample);
                    position += 1;
                }
                if position >= total && !signalled {
                    signalled = true;
                    let _ = done_tx.try_send(Completion::Finished);
                }
            },
            move |err| {
                let _ = err_tx.try_send(Completion::Failed(err.to_string()));
            },
            None,
        )?;
        stream.play()?;

        let length = Duration::from_secs_f64(total as f64 / f64::from(config.sample_rate));
        tracing::debug!(
            "Playing {:.2}s on {}",
            length.as_secs_f64(),
            device_name(&device)
        );

        let outcome = done_rx.recv_timeout(length + COMPLETION_GRACE);
        drop(stream);

        match outcome {
            Ok(Completion::Finished) => Ok(()),
            Ok(Completion::Failed(msg)) => Err(AudioError::PlayError(msg)),
            Err(RecvTimeoutError::Timeout) => Err(AudioError::PlayError(format!(
                "playback did not finish within {:.1}s",
                (length + COMPLETION_GRACE).as_secs_f64()
            ))),
            Err(RecvTimeoutError::Disconnected) => {
                Err(AudioError::PlayError("output stream closed".to_string()))
            }
        }
    }
}

impl AssetPlayer for CpalAssetPlayer {
    fn play_blocking(&self, samples: &[f32], sample_rate: u32) -> booster_core::Result<()> {
        self.play(samples, sample_rate).map_err(BoosterError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sound_returns_immediately() {
        let player = CpalAssetPlayer::new();
        assert!(player.play(&[], 44_100).is_ok());
    }

    #[test]
    fn unknown_device_is_a_device_error() {
        let player = CpalAssetPlayer::with_device(Some("Nonexistent Device 12345".into()));
        let err = player.play_blocking(&[0.0; 64], 44_100).unwrap_err();
        assert!(err.is_device());
    }
}
