/// Audio-specific errors
use booster_core::BoosterError;
use thiserror::Error;

/// Result type alias using `AudioError`
pub type Result<T> = std::result::Result<T, AudioError>;

/// Audio error types
#[derive(Error, Debug)]
pub enum AudioError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Decoding error
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Symphonia error
    #[error("Symphonia error: {0}")]
    Symphonia(#[from] symphonia::core::errors::Error),

    /// Resampler construction or processing failed
    #[error("Resample error: {0}")]
    Resample(String),

    /// WAV container error
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<AudioError> for BoosterError {
    fn from(err: AudioError) -> Self {
        match err {
            AudioError::FileNotFound(path) => BoosterError::not_found(path),
            AudioError::UnsupportedFormat(msg) => BoosterError::not_found(msg),
            AudioError::DecodeError(msg) => BoosterError::decode(msg),
            AudioError::Symphonia(e) => BoosterError::decode(e.to_string()),
            AudioError::Resample(msg) => BoosterError::Other(msg),
            AudioError::Wav(hound::Error::IoError(e)) | AudioError::Io(e) => BoosterError::Io(e),
            AudioError::Wav(e) => BoosterError::Io(std::io::Error::other(e.to_string())),
        }
    }
}
