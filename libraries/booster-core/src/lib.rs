//! Voice Booster Core
//!
//! Device-agnostic types, traits, and error handling shared by the voice
//! booster crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Audio Types**: `AudioBuffer`, `AudioFormat`, `SampleRate`, `AssetId`
//! - **Core Traits**: `AudioDecoder`, `AssetPlayer`
//! - **Error Handling**: the `BoosterError` taxonomy and its `Result` alias
//!
//! # Example
//!
//! ```rust
//! use booster_core::{AssetId, AudioBuffer, AudioFormat, SampleRate};
//!
//! let id = AssetId::new("sounds/airhorn.wav");
//! let format = AudioFormat::new(SampleRate::CD_QUALITY, 1, 32);
//! let buffer = AudioBuffer::new(vec![0.0; 44_100], format);
//!
//! assert_eq!(id.as_str(), "sounds/airhorn.wav");
//! assert!((buffer.duration_secs() - 1.0).abs() < 1e-9);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{BoosterError, Result};
pub use traits::{AssetPlayer, AudioDecoder};
pub use types::{AssetId, AudioBuffer, AudioFormat, SampleRate};
