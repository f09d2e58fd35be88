//! Voice Booster Audio
//!
//! Device-free voice processing for the booster engine.
//!
//! This crate provides:
//! - The per-tick pipeline ([`VoiceProcessor`]): source selection, bass and
//!   treble boost, noise suppression, gain with a safety ceiling
//! - Lock-free live parameters ([`EngineConfig`])
//! - The Sample Bank: whole-file decoding via Symphonia, resampling via rubato
//! - Capture buffers and mono 16-bit WAV output via hound
//!
//! # Example: Processing a Tick
//!
//! ```rust
//! use booster_audio::{source_channel, EngineConfig, SampleBank, VoiceProcessor};
//! use std::sync::Arc;
//!
//! let config = Arc::new(EngineConfig::new(44_100));
//! let bank = SampleBank::new(44_100);
//! let (_cues, selector) = source_channel(bank.occupancy());
//! let mut processor = VoiceProcessor::new(Arc::clone(&config), selector);
//!
//! config.set_bass_percent(40.0).unwrap();
//!
//! let mic = vec![0.0_f32; 256];
//! let mut speakers = vec![0.0_f32; 512]; // stereo
//! processor.process_tick(&mic, &mut speakers, 2);
//! ```

pub mod capture;
pub mod config;
mod decoder;
pub mod effects;
mod error;
pub mod processor;
mod resample;
pub mod sample_bank;
pub mod source;

pub use capture::{write_wav_mono16, CaptureBuffer, DEFAULT_CHUNK_SECONDS};
pub use config::{EngineConfig, EngineSettings, ParamSnapshot, DEFAULT_MAX_SAFE_VOLUME};
pub use decoder::SymphoniaDecoder;
pub use error::{AudioError, Result};
pub use processor::{ProcessorStats, VoiceProcessor, MAX_BLOCK_FRAMES};
pub use resample::resample_mono;
pub use sample_bank::{DecodedAsset, SampleBank};
pub use source::{source_channel, CueSender, SignalSource, SourceSelector};
