//! Per-tick signal transforms
//!
//! All transforms work in place on mono f32 blocks and are real-time safe:
//! no allocation, no locking, no blocking I/O once constructed.
//!
//! - **ToneStage**: bass (low-pass 150 Hz) and treble (high-pass 5 kHz)
//!   boosts built from second-order Butterworth sections
//! - **NoiseGate**: downward expander driven by an adaptive noise profile

mod noise;
mod tone;

pub use noise::{reduce_noise, NoiseGate, NoiseProfile, NoiseSuppressor};
pub use tone::{ToneFilter, ToneKind, ToneStage, BASS_CUTOFF_HZ, TREBLE_CUTOFF_HZ};

#[cfg(test)]
pub(crate) mod test_signals {
    /// Generate a mono sine wave
    pub(crate) fn sine(
        freq: f32,
        sample_rate: u32,
        duration_secs: f32,
        amplitude: f32,
    ) -> Vec<f32> {
        let num_samples = (sample_rate as f32 * duration_secs) as usize;
        (0..num_samples)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                amplitude * (2.0 * std::f32::consts::PI * freq * t).sin()
            })
            .collect()
    }

    /// Deterministic white noise in [-amplitude, amplitude]
    pub(crate) fn noise(len: usize, amplitude: f32, seed: u32) -> Vec<f32> {
        let mut state = seed.max(1);
        (0..len)
            .map(|_| {
                // xorshift32
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                amplitude * ((state as f32 / u32::MAX as f32) * 2.0 - 1.0)
            })
            .collect()
    }

    pub(crate) fn rms(samples: &[f32]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }
}
