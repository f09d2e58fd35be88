/// Audio decoder implementation using Symphonia
use crate::error::{AudioError, Result};
use booster_core::{AudioBuffer, AudioDecoder, AudioFormat, SampleRate};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Whole-file decoder using Symphonia
///
/// Supports: WAV, MP3, FLAC, OGG/Vorbis. Output keeps the source channel
/// layout, interleaved f32.
#[derive(Debug, Default)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode `path` into interleaved f32 samples
    pub fn decode_file(path: &Path) -> Result<AudioBuffer> {
        if !path.is_file() {
            return Err(AudioError::FileNotFound(path.display().to_string()));
        }

        let file = std::fs::File::open(path)?;
        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::UnsupportedFormat(format!("{}: {}", path.display(), e)))?;

        let mut format = probed.format;
        let track = format
            .default_track()
            .ok_or_else(|| AudioError::UnsupportedFormat("No audio tracks found".into()))?;

        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(44_100);
        let mut channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(1);

        let mut decoder =
            symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

        let mut samples = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                // Corrupt packet, skip it
                Err(SymphoniaError::DecodeError(msg)) => {
                    tracing::debug!("Skipping undecodable packet: {}", msg);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let spec = *decoded.spec();
            sample_rate = spec.rate;
            channels = spec.channels.count() as u16;

            let mut buf = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
            buf.copy_interleaved_ref(decoded);
            samples.extend_from_slice(buf.samples());
        }

        if samples.is_empty() {
            return Err(AudioError::DecodeError(format!(
                "{} contains no audio",
                path.display()
            )));
        }

        let format = AudioFormat::new(SampleRate::new(sample_rate), channels.max(1), 32);
        Ok(AudioBuffer::new(samples, format))
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&mut self, path: &Path) -> booster_core::Result<AudioBuffer> {
        Ok(Self::decode_file(path)?)
    }

    fn supports_format(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                matches!(
                    ext.to_lowercase().as_str(),
                    "wav" | "mp3" | "flac" | "ogg"
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use booster_core::BoosterError;

    fn write_wav(path: &Path, channels: u16, sample_rate: u32, frames: usize) {
        let spec = hound::WavSpec {
            channels,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            let v = ((i as f32 * 0.01).sin() * 16_000.0) as i16;
            for _ in 0..channels {
                writer.write_sample(v).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn supports_common_formats() {
        let decoder = SymphoniaDecoder::new();
        assert!(decoder.supports_format(Path::new("horn.mp3")));
        assert!(decoder.supports_format(Path::new("horn.WAV")));
        assert!(decoder.supports_format(Path::new("horn.ogg")));
        assert!(!decoder.supports_format(Path::new("notes.txt")));
        assert!(!decoder.supports_format(Path::new("no_extension")));
    }

    #[test]
    fn decode_nonexistent_file_is_not_found() {
        let mut decoder = SymphoniaDecoder::new();
        let err = decoder.decode(Path::new("/nonexistent/horn.wav")).unwrap_err();
        assert!(matches!(err, BoosterError::NotFound(_)));
    }

    #[test]
    fn decode_garbage_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.wav");
        std::fs::write(&path, b"definitely not audio").unwrap();

        let mut decoder = SymphoniaDecoder::new();
        assert!(matches!(
            decoder.decode(&path).unwrap_err(),
            BoosterError::NotFound(_)
        ));
    }

    #[test]
    fn decodes_stereo_wav() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, 22_050, 4410);

        let buffer = SymphoniaDecoder::decode_file(&path).unwrap();

        assert_eq!(buffer.format.channels, 2);
        assert_eq!(buffer.format.sample_rate.as_hz(), 22_050);
        assert_eq!(buffer.frames(), 4410);
        assert!(buffer.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }
}
