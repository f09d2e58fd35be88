//! Concurrency tests for the tick processor
//!
//! The audio thread reads parameters with single atomic loads while the
//! control thread writes them. These tests run the processor continuously on
//! one thread while another fuzzes every setter.

use booster_audio::{source_channel, EngineConfig, SampleBank, VoiceProcessor};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44_100;
const BLOCK: usize = 256;

fn mic_block(offset: usize) -> Vec<f32> {
    (0..BLOCK)
        .map(|i| {
            let t = (offset + i) as f32 / SAMPLE_RATE as f32;
            0.3 * (2.0 * std::f32::consts::PI * 220.0 * t).sin()
        })
        .collect()
}

// ============================================================================
// Parameter fuzzing while ticking
// ============================================================================

#[test]
fn concurrent_parameter_writes_never_glitch() {
    let config = Arc::new(EngineConfig::new(SAMPLE_RATE));
    let bank = SampleBank::new(SAMPLE_RATE);
    let (_cues, selector) = source_channel(bank.occupancy());
    let mut processor = VoiceProcessor::new(Arc::clone(&config), selector);
    let stats = processor.stats();
    let running = Arc::new(AtomicBool::new(true));

    let audio = {
        let running = Arc::clone(&running);
        thread::spawn(move || {
            let mut output = vec![0.0; BLOCK * 2];
            let mut offset = 0;
            let mut bad_samples = 0usize;
            while running.load(Ordering::Relaxed) {
                let input = mic_block(offset);
                processor.process_tick(&input, &mut output, 2);
                bad_samples += output
                    .iter()
                    .filter(|s| !s.is_finite() || s.abs() > 1.0)
                    .count();
                offset += BLOCK;
            }
            bad_samples
        })
    };

    let control = {
        let config = Arc::clone(&config);
        thread::spawn(move || {
            let mut seed = 0x9E37_79B9_u32;
            for _ in 0..20_000 {
                seed ^= seed << 13;
                seed ^= seed >> 17;
                seed ^= seed << 5;
                let unit = seed as f32 / u32::MAX as f32;

                config.set_bass_level(unit).unwrap();
                config.set_treble_level(1.0 - unit).unwrap();
                config.set_mic_volume(unit * config.max_safe_volume()).unwrap();
                config.set_output_volume((1.0 - unit) * 150.0).unwrap();
                config.set_noise_reduction(seed & 1 == 0);
                // Out-of-range writes must bounce off without effect
                assert!(config.set_mic_volume(config.max_safe_volume() + 1.0).is_err());
            }
        })
    };

    control.join().unwrap();
    thread::sleep(Duration::from_millis(20));
    running.store(false, Ordering::Relaxed);
    let bad_samples = audio.join().unwrap();

    assert_eq!(bad_samples, 0);
    assert_eq!(stats.silenced_ticks(), 0);
    assert!(stats.ticks() > 0);
}

#[test]
fn parameter_change_is_seen_by_next_tick() {
    let config = Arc::new(EngineConfig::new(SAMPLE_RATE));
    config.set_noise_reduction(false);
    let bank = SampleBank::new(SAMPLE_RATE);
    let (_cues, selector) = source_channel(bank.occupancy());
    let mut processor = VoiceProcessor::new(Arc::clone(&config), selector);
    let input = vec![0.5; BLOCK];
    let mut output = vec![0.0; BLOCK * 2];

    processor.process_tick(&input, &mut output, 2);
    assert!(output.iter().all(|s| *s == 0.5));

    let writer = {
        let config = Arc::clone(&config);
        thread::spawn(move || config.set_mic_volume(0.0).unwrap())
    };
    writer.join().unwrap();

    processor.process_tick(&input, &mut output, 2);
    assert!(output.iter().all(|s| *s == 0.0));
}

#[test]
fn processor_moves_to_audio_thread() {
    fn assert_send<T: Send>() {}
    assert_send::<VoiceProcessor>();
    assert_send::<Arc<EngineConfig>>();
}
