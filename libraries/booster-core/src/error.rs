/// Core error types for the voice booster
use crate::types::AssetId;
use thiserror::Error;

/// Result type alias using `BoosterError`
pub type Result<T> = std::result::Result<T, BoosterError>;

/// Error taxonomy shared by the engine, the sample bank and the recorder
#[derive(Error, Debug)]
pub enum BoosterError {
    /// Stream open/close failure or device loss; retrying `start()` may recover
    #[error("Device error: {0}")]
    Device(String),

    /// Asset path does not resolve to a readable, decodable audio file
    #[error("Audio file not found or unreadable: {0}")]
    NotFound(String),

    /// Playback requested for an id that was never loaded
    #[error("Unknown asset: {0}")]
    UnknownAsset(AssetId),

    /// Parameter outside its permitted range; the prior value is kept
    #[error("{parameter} = {value} is outside [{min}, {max}]")]
    ConfigValidation {
        parameter: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },

    /// Decoding failed after the file was opened
    #[error("Decode error: {0}")]
    Decode(String),

    /// I/O errors (recording flush, file access)
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl BoosterError {
    /// Create a device error
    pub fn device(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Create a not found error
    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create a range validation error
    pub fn invalid(parameter: &'static str, value: f32, min: f32, max: f32) -> Self {
        Self::ConfigValidation {
            parameter,
            value,
            min,
            max,
        }
    }

    /// Whether the error came from the audio device layer
    pub fn is_device(&self) -> bool {
        matches!(self, Self::Device(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_names_parameter_and_range() {
        let err = BoosterError::invalid("mic_volume", 201.0, 0.0, 200.0);
        assert_eq!(err.to_string(), "mic_volume = 201 is outside [0, 200]");
    }

    #[test]
    fn unknown_asset_displays_path() {
        let err = BoosterError::UnknownAsset(AssetId::new("a.wav"));
        assert_eq!(err.to_string(), "Unknown asset: a.wav");
    }

    #[test]
    fn io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: BoosterError = io.into();
        assert!(matches!(err, BoosterError::Io(_)));
        assert!(!err.is_device());
    }
}
