/// Core traits for the voice booster
use crate::error::Result;
use crate::types::AudioBuffer;
use std::path::Path;

/// Audio decoder trait
///
/// Implementers decode a whole audio file into an `AudioBuffer`. Assets are
/// decoded fully at load time, never streamed.
pub trait AudioDecoder: Send {
    /// Decode an audio file from the given path
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or decoded
    fn decode(&mut self, path: &Path) -> Result<AudioBuffer>;

    /// Check if the decoder supports the given file format
    fn supports_format(&self, path: &Path) -> bool;
}

/// Blocking playback of a decoded asset
///
/// Runs outside the real-time path, independent of the duplex stream.
pub trait AssetPlayer {
    /// Play mono samples at `sample_rate` and return once playback finishes
    ///
    /// # Errors
    /// Returns an error if no output device can be opened
    fn play_blocking(&self, samples: &[f32], sample_rate: u32) -> Result<()>;
}
