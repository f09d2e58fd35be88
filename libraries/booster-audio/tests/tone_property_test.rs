//! Property-based tests for the bass and treble boosts
//!
//! Bypass must be bit-exact, and a boost must grow the energy of a tone in
//! its pass band monotonically with the level.

use booster_audio::effects::{ToneFilter, ToneStage};
use proptest::prelude::*;

const SAMPLE_RATE: u32 = 44_100;

fn sine(freq: f32, duration_secs: f32) -> Vec<f32> {
    let n = (SAMPLE_RATE as f32 * duration_secs) as usize;
    (0..n)
        .map(|i| 0.25 * (2.0 * std::f32::consts::PI * freq * i as f32 / SAMPLE_RATE as f32).sin())
        .collect()
}

fn rms(samples: &[f32]) -> f32 {
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

/// RMS of the boosted tone, skipping the filter's settling time
fn boosted_rms(mut filter: ToneFilter, input: &[f32], level: f32) -> f32 {
    let mut frame = input.to_vec();
    for block in frame.chunks_mut(512) {
        filter.apply(block, level);
    }
    rms(&frame[SAMPLE_RATE as usize / 10..])
}

fn ordered_levels() -> impl Strategy<Value = (f32, f32)> {
    (0.01f32..=1.0, 0.01f32..=1.0)
        .prop_filter("levels must differ", |(a, b)| (a - b).abs() > 0.01)
        .prop_map(|(a, b)| if a < b { (a, b) } else { (b, a) })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Property: level zero returns the frame unchanged, bit for bit
    #[test]
    fn zero_level_is_identity(
        samples in prop::collection::vec(-1.0f32..1.0, 1..2048)
    ) {
        let mut stage = ToneStage::new(SAMPLE_RATE);
        let mut frame = samples.clone();

        stage.apply_bass(&mut frame, 0.0);
        stage.apply_treble(&mut frame, 0.0);

        prop_assert_eq!(frame, samples);
    }

    /// Property: more bass means more energy for a tone well below 150 Hz
    #[test]
    fn bass_energy_grows_with_level((low, high) in ordered_levels(), freq in 30.0f32..60.0) {
        let input = sine(freq, 0.4);
        let dry = rms(&input[SAMPLE_RATE as usize / 10..]);

        let at_low = boosted_rms(ToneFilter::bass(SAMPLE_RATE), &input, low);
        let at_high = boosted_rms(ToneFilter::bass(SAMPLE_RATE), &input, high);

        prop_assert!(at_low > dry, "level {} gave {} vs dry {}", low, at_low, dry);
        prop_assert!(at_high > at_low, "level {} gave {} <= {}", high, at_high, at_low);
    }

    /// Property: more treble means more energy for a tone well above 5 kHz
    #[test]
    fn treble_energy_grows_with_level(
        (low, high) in ordered_levels(),
        freq in 10_000.0f32..14_000.0,
    ) {
        let input = sine(freq, 0.4);
        let dry = rms(&input[SAMPLE_RATE as usize / 10..]);

        let at_low = boosted_rms(ToneFilter::treble(SAMPLE_RATE), &input, low);
        let at_high = boosted_rms(ToneFilter::treble(SAMPLE_RATE), &input, high);

        prop_assert!(at_low > dry, "level {} gave {} vs dry {}", low, at_low, dry);
        prop_assert!(at_high > at_low, "level {} gave {} <= {}", high, at_high, at_low);
    }

    /// Property: boosts never produce NaN or Inf for bounded input
    #[test]
    fn boosts_stay_finite(
        bass in 0.0f32..=1.0,
        treble in 0.0f32..=1.0,
        samples in prop::collection::vec(-1.0f32..1.0, 64..4096)
    ) {
        let mut stage = ToneStage::new(SAMPLE_RATE);
        let mut frame = samples;

        stage.apply_bass(&mut frame, bass);
        stage.apply_treble(&mut frame, treble);

        prop_assert!(frame.iter().all(|s| s.is_finite()));
    }
}

#[test]
fn full_boost_roughly_doubles_deep_bass() {
    let input = sine(40.0, 0.5);
    let dry = rms(&input[SAMPLE_RATE as usize / 10..]);
    let wet = boosted_rms(ToneFilter::bass(SAMPLE_RATE), &input, 1.0);

    let ratio = wet / dry;
    assert!(ratio > 1.8 && ratio < 2.05, "ratio {ratio}");
}
