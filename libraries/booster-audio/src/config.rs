/// Engine parameters
///
/// [`EngineSettings`] is the plain, serializable form loaded from config
/// files. [`EngineConfig`] is the live form: every parameter is a single
/// atomic word so the control thread can write while the audio thread reads
/// once per tick without locking.
use booster_core::{BoosterError, Result};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Default ceiling for mic and output volume, in percent
pub const DEFAULT_MAX_SAFE_VOLUME: f32 = 200.0;

/// Default engine sample rate
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Serializable engine settings
///
/// Volumes are percentages (100 = unity gain), tone levels are percentages
/// of full boost (0-100).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub sample_rate: u32,
    pub mic_volume: f32,
    pub output_volume: f32,
    pub bass_percent: f32,
    pub treble_percent: f32,
    pub noise_reduction: bool,
    pub max_safe_volume: f32,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            mic_volume: 100.0,
            output_volume: 100.0,
            bass_percent: 0.0,
            treble_percent: 0.0,
            noise_reduction: true,
            max_safe_volume: DEFAULT_MAX_SAFE_VOLUME,
        }
    }
}

/// Parameter values read once at the top of a tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSnapshot {
    /// Linear mic gain
    pub mic_gain: f32,
    /// Linear output gain
    pub output_gain: f32,
    /// Bass level in [0, 1]
    pub bass_level: f32,
    /// Treble level in [0, 1]
    pub treble_level: f32,
    pub noise_reduction: bool,
}

/// f32 stored as its bit pattern
#[derive(Debug)]
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    #[inline]
    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Live engine parameters shared between control and audio threads
///
/// Sample rate and the safety ceiling are fixed at construction. Setters
/// reject out-of-range values with `ConfigValidation` and keep the prior
/// value.
#[derive(Debug)]
pub struct EngineConfig {
    sample_rate: u32,
    max_safe_volume: f32,
    mic_volume: AtomicF32,
    output_volume: AtomicF32,
    bass_level: AtomicF32,
    treble_level: AtomicF32,
    noise_reduction: AtomicBool,
}

fn check_range(parameter: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        tracing::warn!(parameter, value, min, max, "Rejected out-of-range parameter");
        Err(BoosterError::invalid(parameter, value, min, max))
    }
}

impl EngineConfig {
    /// Defaults at the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        Self::with_max_safe_volume(sample_rate, DEFAULT_MAX_SAFE_VOLUME)
    }

    /// Defaults with a custom safety ceiling (percent)
    pub fn with_max_safe_volume(sample_rate: u32, max_safe_volume: f32) -> Self {
        let defaults = EngineSettings::default();
        Self {
            sample_rate,
            max_safe_volume,
            mic_volume: AtomicF32::new(defaults.mic_volume.min(max_safe_volume)),
            output_volume: AtomicF32::new(defaults.output_volume.min(max_safe_volume)),
            bass_level: AtomicF32::new(0.0),
            treble_level: AtomicF32::new(0.0),
            noise_reduction: AtomicBool::new(defaults.noise_reduction),
        }
    }

    /// Build from settings, validating every field
    pub fn from_settings(settings: &EngineSettings) -> Result<Self> {
        if settings.sample_rate == 0 {
            return Err(BoosterError::invalid(
                "sample_rate",
                0.0,
                1.0,
                u32::MAX as f32,
            ));
        }
        check_range(
            "max_safe_volume",
            settings.max_safe_volume,
            0.0,
            f32::MAX,
        )?;

        let config = Self::with_max_safe_volume(settings.sample_rate, settings.max_safe_volume);
        config.set_mic_volume(settings.mic_volume)?;
        config.set_output_volume(settings.output_volume)?;
        config.set_bass_percent(settings.bass_percent)?;
        config.set_treble_percent(settings.treble_percent)?;
        config.set_noise_reduction(settings.noise_reduction);
        Ok(config)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn max_safe_volume(&self) -> f32 {
        self.max_safe_volume
    }

    /// Mic volume in percent, `[0, max_safe_volume]`
    pub fn set_mic_volume(&self, percent: f32) -> Result<()> {
        check_range("mic_volume", percent, 0.0, self.max_safe_volume)?;
        self.mic_volume.store(percent);
        Ok(())
    }

    pub fn mic_volume(&self) -> f32 {
        self.mic_volume.load()
    }

    /// Output (headphone) volume in percent, `[0, max_safe_volume]`
    pub fn set_output_volume(&self, percent: f32) -> Result<()> {
        check_range("output_volume", percent, 0.0, self.max_safe_volume)?;
        self.output_volume.store(percent);
        Ok(())
    }

    pub fn output_volume(&self) -> f32 {
        self.output_volume.load()
    }

    /// Bass level in `[0, 1]`
    pub fn set_bass_level(&self, level: f32) -> Result<()> {
        check_range("bass_level", level, 0.0, 1.0)?;
        self.bass_level.store(level);
        Ok(())
    }

    /// Bass level from a 0-100 slider value
    pub fn set_bass_percent(&self, percent: f32) -> Result<()> {
        check_range("bass_percent", percent, 0.0, 100.0)?;
        self.bass_level.store(percent / 100.0);
        Ok(())
    }

    pub fn bass_level(&self) -> f32 {
        self.bass_level.load()
    }

    /// Treble level in `[0, 1]`
    pub fn set_treble_level(&self, level: f32) -> Result<()> {
        check_range("treble_level", level, 0.0, 1.0)?;
        self.treble_level.store(level);
        Ok(())
    }

    /// Treble level from a 0-100 slider value
    pub fn set_treble_percent(&self, percent: f32) -> Result<()> {
        check_range("treble_percent", percent, 0.0, 100.0)?;
        self.treble_level.store(percent / 100.0);
        Ok(())
    }

    pub fn treble_level(&self) -> f32 {
        self.treble_level.load()
    }

    pub fn set_noise_reduction(&self, enabled: bool) {
        self.noise_reduction.store(enabled, Ordering::Relaxed);
    }

    pub fn noise_reduction(&self) -> bool {
        self.noise_reduction.load(Ordering::Relaxed)
    }

    /// Read every parameter once
    #[inline]
    pub fn snapshot(&self) -> ParamSnapshot {
        ParamSnapshot {
            mic_gain: self.mic_volume.load() / 100.0,
            output_gain: self.output_volume.load() / 100.0,
            bass_level: self.bass_level.load(),
            treble_level: self.treble_level.load(),
            noise_reduction: self.noise_reduction.load(Ordering::Relaxed),
        }
    }

    /// Current values in settings form
    pub fn to_settings(&self) -> EngineSettings {
        EngineSettings {
            sample_rate: self.sample_rate,
            mic_volume: self.mic_volume(),
            output_volume: self.output_volume(),
            bass_percent: self.bass_level() * 100.0,
            treble_percent: self.treble_level() * 100.0,
            noise_reduction: self.noise_reduction(),
            max_safe_volume: self.max_safe_volume,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}
