/// Recorded audio and its WAV encoding
///
/// A [`CaptureBuffer`] collects fixed-length chunks from the capture loop in
/// order. On stop it is concatenated and written as single-channel 16-bit
/// little-endian PCM WAV at the capture sample rate.
use crate::error::Result;
use std::path::Path;

/// Default chunk length of the capture loop
pub const DEFAULT_CHUNK_SECONDS: u32 = 1;

/// Ordered chunks of mono f32 capture
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    sample_rate: u32,
    chunks: Vec<Vec<f32>>,
}

impl CaptureBuffer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            chunks: Vec::new(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Append a chunk; empty chunks are ignored
    pub fn push_chunk(&mut self, chunk: Vec<f32>) {
        if !chunk.is_empty() {
            self.chunks.push(chunk);
        }
    }

    pub fn chunks(&self) -> &[Vec<f32>] {
        &self.chunks
    }

    /// Total captured samples
    pub fn frames(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frames() as f64 / f64::from(self.sample_rate)
    }

    /// All chunks in capture order
    pub fn concat(&self) -> Vec<f32> {
        self.chunks.concat()
    }

    /// Write as mono 16-bit WAV, returning the number of frames written
    pub fn write_wav(&self, path: &Path) -> Result<usize> {
        write_wav_mono16(path, &self.concat(), self.sample_rate)
    }
}

/// Convert a float sample to 16-bit signed PCM
#[inline]
pub fn to_pcm16(sample: f32) -> i16 {
    if !sample.is_finite() {
        return 0;
    }
    (sample.clamp(-1.0, 1.0) * 32767.0).round() as i16
}

/// Write `samples` as single-channel 16-bit PCM WAV
pub fn write_wav_mono16(path: &Path, samples: &[f32], sample_rate: u32) -> Result<usize> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(to_pcm16(sample))?;
    }
    writer.finalize()?;

    tracing::info!(
        "Wrote {} samples ({:.2}s) to {}",
        samples.len(),
        samples.len() as f64 / f64::from(sample_rate.max(1)),
        path.display()
    );
    Ok(samples.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AudioError;

    #[test]
    fn pcm16_conversion_clamps_and_rounds() {
        assert_eq!(to_pcm16(0.0), 0);
        assert_eq!(to_pcm16(1.0), 32767);
        assert_eq!(to_pcm16(-1.0), -32767);
        assert_eq!(to_pcm16(2.5), 32767);
        assert_eq!(to_pcm16(0.5), 16384);
        assert_eq!(to_pcm16(f32::NAN), 0);
    }

    #[test]
    fn concat_keeps_chunk_order() {
        let mut buffer = CaptureBuffer::new(8);
        buffer.push_chunk(vec![0.1; 8]);
        buffer.push_chunk(Vec::new());
        buffer.push_chunk(vec![0.2; 3]);

        assert_eq!(buffer.chunks().len(), 2);
        assert_eq!(buffer.frames(), 11);
        let all = buffer.concat();
        assert_eq!(all[7], 0.1);
        assert_eq!(all[8], 0.2);
    }

    #[test]
    fn written_wav_is_mono_16_bit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("take.wav");
        let mut buffer = CaptureBuffer::new(16_000);
        buffer.push_chunk(vec![0.25; 16_000]);
        buffer.push_chunk(vec![-0.25; 400]);

        let written = buffer.write_wav(&path).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(written, 16_400);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.bits_per_sample, 16);
        assert_eq!(spec.sample_rate, 16_000);
        assert_eq!(reader.len(), 16_400);
    }

    #[test]
    fn unwritable_destination_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing_dir").join("take.wav");

        let err = write_wav_mono16(&path, &[0.0; 10], 44_100).unwrap_err();

        assert!(matches!(err, AudioError::Wav(hound::Error::IoError(_))));
    }
}
