/// Audio device errors
use booster_core::BoosterError;
use thiserror::Error;

use crate::device::DeviceError;

/// Result type for device operations
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio device layer errors
#[derive(Debug, Error)]
pub enum AudioError {
    /// No usable device
    #[error("Audio device not found")]
    DeviceNotFound,

    /// Device enumeration or configuration error
    #[error("Device error: {0}")]
    DeviceError(#[from] DeviceError),

    /// Failed to build a stream
    #[error("Failed to build stream: {0}")]
    StreamBuildError(String),

    /// Failed to start a stream
    #[error("Failed to play stream: {0}")]
    PlayError(String),

    /// Device vanished while a stream was running
    #[error("Audio device disconnected: {0}")]
    Disconnected(String),

    /// Engine thread could not be reached
    #[error("Engine thread error: {0}")]
    EngineThread(String),

    /// Recorder operation invalid in the current state
    #[error("Recorder is {0}")]
    RecorderState(&'static str),

    /// Error from the processing layer
    #[error(transparent)]
    Booster(#[from] BoosterError),
}

impl From<cpal::BuildStreamError> for AudioError {
    fn from(err: cpal::BuildStreamError) -> Self {
        match err {
            cpal::BuildStreamError::DeviceNotAvailable => {
                AudioError::Disconnected(err.to_string())
            }
            other => AudioError::StreamBuildError(other.to_string()),
        }
    }
}

impl From<cpal::PlayStreamError> for AudioError {
    fn from(err: cpal::PlayStreamError) -> Self {
        AudioError::PlayError(err.to_string())
    }
}

impl From<AudioError> for BoosterError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::Booster(inner) => inner,
            other => BoosterError::device(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_layer_errors_become_device_errors() {
        let err: BoosterError = AudioError::Disconnected("usb mic".into()).into();
        assert!(err.is_device());
        assert!(err.to_string().contains("usb mic"));
    }

    #[test]
    fn wrapped_booster_errors_pass_through() {
        let inner = BoosterError::not_found("a.wav");
        let err: BoosterError = AudioError::Booster(inner).into();
        assert!(matches!(err, BoosterError::NotFound(_)));
    }

    #[test]
    fn unavailable_device_on_build_is_disconnect() {
        let err: AudioError = cpal::BuildStreamError::DeviceNotAvailable.into();
        assert!(matches!(err, AudioError::Disconnected(_)));
    }
}
