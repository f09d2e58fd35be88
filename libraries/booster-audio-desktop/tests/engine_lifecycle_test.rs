//! Engine lifecycle tests
//!
//! Hardware-dependent tests are marked `#[ignore]` and can be run with:
//! ```bash
//! cargo test -p booster-audio-desktop engine_lifecycle_test -- --ignored
//! ```

use booster_audio::EngineConfig;
use booster_audio_desktop::{
    list_input_devices, list_output_devices, AudioEngine, DeviceOptions, EngineEvent,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn has_duplex_hardware() -> bool {
    let inputs = list_input_devices().unwrap_or_default();
    let outputs = list_output_devices().unwrap_or_default();
    !inputs.is_empty() && !outputs.is_empty()
}

fn engine() -> AudioEngine {
    AudioEngine::new(Arc::new(EngineConfig::new(44_100)), DeviceOptions::default())
}

#[test]
fn stop_is_idempotent_without_hardware() {
    let mut engine = engine();
    engine.stop().unwrap();
    engine.stop().unwrap();
    assert!(!engine.is_running());
    assert!(engine.stats().is_none());
}

#[test]
fn device_listings_put_default_first() {
    for devices in [
        list_input_devices().unwrap_or_default(),
        list_output_devices().unwrap_or_default(),
    ] {
        let defaults = devices.iter().filter(|d| d.is_default).count();
        assert!(defaults <= 1);
        if defaults == 1 {
            assert!(devices[0].is_default);
        }
    }
}

#[test]
#[ignore = "requires audio input and output devices"]
fn start_stop_cycle_on_real_devices() {
    if !has_duplex_hardware() {
        return;
    }

    let mut engine = engine();
    engine.start().unwrap();
    engine.start().unwrap();
    assert!(engine.is_running());

    let rate = engine.sample_rate().unwrap();
    assert_eq!(engine.poll_event(), Some(EngineEvent::Started { sample_rate: rate }));

    thread::sleep(Duration::from_millis(300));
    let stats = engine.stats().unwrap();
    assert!(stats.ticks() > 0);
    assert_eq!(stats.silenced_ticks(), 0);

    engine.stop().unwrap();
    assert!(!engine.is_running());
    assert_eq!(engine.poll_event(), Some(EngineEvent::Stopped));

    engine.stop().unwrap();
    engine.start().unwrap();
    assert!(engine.is_running());
    engine.stop().unwrap();
}

#[test]
#[ignore = "requires audio input and output devices"]
fn parameters_change_while_running() {
    if !has_duplex_hardware() {
        return;
    }

    let mut engine = engine();
    engine.start().unwrap();

    for step in 0..20 {
        let pct = (step * 5) as f32;
        engine.set_bass_percent(pct).unwrap();
        engine.set_treble_percent(100.0 - pct).unwrap();
        engine.set_noise_reduction(step % 2 == 0);
        thread::sleep(Duration::from_millis(10));
    }

    engine.check_health().unwrap();
    engine.stop().unwrap();
}
