//! Full-duplex voice engine on cpal
//!
//! cpal has no duplex stream, so the engine opens an input stream and an
//! output stream at the same rate and joins them with a lock-free SPSC ring
//! buffer. The output callback drains the ring, runs the [`VoiceProcessor`]
//! and writes every output channel.
//!
//! Both streams live on a dedicated engine thread (cpal streams are not
//! `Send` on every host). The control thread talks to it over a crossbeam
//! channel and receives [`EngineEvent`]s back.

use crate::device::{device_name, find_device, negotiate_config, Direction};
use crate::error::{AudioError, Result};
use crate::player::CpalAssetPlayer;
use crate::recorder::{Recorder, RecorderStatus, SaveOutcome};
use booster_audio::{
    source_channel, CueSender, EngineConfig, ProcessorStats, SampleBank, VoiceProcessor,
    MAX_BLOCK_FRAMES,
};
use booster_core::{AssetId, BoosterError};
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::StreamConfig;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::HeapRb;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often the engine thread checks for device loss
const HEALTH_POLL: Duration = Duration::from_millis(50);

const EVENT_CAPACITY: usize = 64;

/// Device selection and buffering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceOptions {
    /// Input device name (`None` = system default)
    pub input: Option<String>,
    /// Output device name (`None` = system default)
    pub output: Option<String>,
    /// Output channel count requested from the device
    pub output_channels: u16,
    /// Silence queued between capture and playback, in milliseconds
    pub latency_ms: u32,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            input: None,
            output: None,
            output_channels: 2,
            latency_ms: 20,
        }
    }
}

/// Notifications from the engine thread
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Streams are running at `sample_rate`
    Started { sample_rate: u32 },
    /// Streams were closed by `stop()`
    Stopped,
    /// A device disappeared; the session has ended
    DeviceLost(String),
}

enum EngineCommand {
    Stop,
}

/// A running pair of streams
struct Session {
    command_tx: Sender<EngineCommand>,
    thread: JoinHandle<()>,
    stats: Arc<ProcessorStats>,
    lost: Arc<AtomicBool>,
    sample_rate: u32,
}

/// Negotiated devices for one session
struct StreamPlan {
    input: cpal::Device,
    output: cpal::Device,
    input_config: StreamConfig,
    output_config: StreamConfig,
}

/// Voice booster engine
///
/// Owns the live parameters, the Sample Bank and the Recorder, and runs one
/// duplex session at a time.
pub struct AudioEngine {
    config: Arc<EngineConfig>,
    options: DeviceOptions,
    bank: SampleBank,
    cued: Option<AssetId>,
    cues: Option<CueSender>,
    session: Option<Session>,
    recorder: Recorder,
    event_tx: Sender<EngineEvent>,
    event_rx: Receiver<EngineEvent>,
}

impl AudioEngine {
    pub fn new(config: Arc<EngineConfig>, options: DeviceOptions) -> Self {
        let (event_tx, event_rx) = bounded(EVENT_CAPACITY);
        let bank = SampleBank::new(config.sample_rate());
        Self {
            config,
            options,
            bank,
            cued: None,
            cues: None,
            session: None,
            recorder: Recorder::new(),
            event_tx,
            event_rx,
        }
    }

    /// Replace the recorder (e.g. to change the chunk length)
    pub fn with_recorder(mut self, recorder: Recorder) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn config(&self) -> &Arc<EngineConfig> {
        &self.config
    }

    pub fn options(&self) -> &DeviceOptions {
        &self.options
    }

    pub fn sample_bank(&self) -> &SampleBank {
        &self.bank
    }

    /// Change devices; takes effect on the next `start()`
    pub fn set_options(&mut self, options: DeviceOptions) {
        self.options = options;
    }

    /// Rate of the running session, if any
    pub fn sample_rate(&self) -> Option<u32> {
        self.session
            .as_ref()
            .filter(|s| !s.thread.is_finished())
            .map(|s| s.sample_rate)
    }

    pub fn is_running(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|s| !s.thread.is_finished())
    }

    /// Open both devices and start processing
    ///
    /// No-op if already running. Fails with a device error when either
    /// device is missing or cannot run f32 at a common rate.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }
        self.reap();

        let plan = self.plan_streams()?;
        let sample_rate = plan.output_config.sample_rate;
        self.bank.set_sample_rate(sample_rate)?;

        let (cues, selector) = source_channel(self.bank.occupancy());
        if let Some(asset) = self.cued.as_ref().and_then(|id| self.bank.get(id)) {
            cues.cue(asset);
        }

        let mut processor = VoiceProcessor::new(Arc::clone(&self.config), selector);
        processor.set_sample_rate(sample_rate);
        let stats = processor.stats();

        let lost = Arc::new(AtomicBool::new(false));
        let (command_tx, command_rx) = bounded::<EngineCommand>(8);
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);

        let latency_frames = (sample_rate as usize * self.options.latency_ms as usize) / 1000;
        let thread_lost = Arc::clone(&lost);
        let events = self.event_tx.clone();

        let thread = thread::Builder::new()
            .name("booster-engine".to_string())
            .spawn(move || {
                engine_thread_run(
                    plan,
                    processor,
                    latency_frames,
                    thread_lost,
                    events,
                    command_rx,
                    ready_tx,
                );
            })
            .map_err(|e| AudioError::EngineThread(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                let _ = thread.join();
                return Err(e);
            }
            Err(_) => {
                let _ = thread.join();
                return Err(AudioError::EngineThread(
                    "engine thread exited during startup".to_string(),
                ));
            }
        }

        self.cues = Some(cues);
        self.session = Some(Session {
            command_tx,
            thread,
            stats,
            lost,
            sample_rate,
        });

        tracing::info!("Engine started at {} Hz", sample_rate);
        let _ = self.event_tx.try_send(EngineEvent::Started { sample_rate });
        Ok(())
    }

    /// Close both streams and wait until they are gone
    ///
    /// Safe to call when not running.
    pub fn stop(&mut self) -> Result<()> {
        self.cues = None;
        let Some(session) = self.session.take() else {
            return Ok(());
        };

        let _ = session.command_tx.send(EngineCommand::Stop);
        session
            .thread
            .join()
            .map_err(|_| AudioError::EngineThread("engine thread panicked".to_string()))?;

        if !session.lost.load(Ordering::Acquire) {
            tracing::info!("Engine stopped");
            let _ = self.event_tx.try_send(EngineEvent::Stopped);
        }
        Ok(())
    }

    /// Next pending event, if any
    ///
    /// A `DeviceLost` event also releases the dead session.
    pub fn poll_event(&mut self) -> Option<EngineEvent> {
        let event = self.event_rx.try_recv().ok()?;
        if matches!(event, EngineEvent::DeviceLost(_)) {
            self.reap();
        }
        Some(event)
    }

    /// Fail if the current session lost its device
    pub fn check_health(&mut self) -> Result<()> {
        let lost = self
            .session
            .as_ref()
            .is_some_and(|s| s.lost.load(Ordering::Acquire));
        if lost {
            self.reap();
            return Err(AudioError::Disconnected(
                "device lost while running".to_string(),
            ));
        }
        Ok(())
    }

    /// Counters of the current or last session
    pub fn stats(&self) -> Option<Arc<ProcessorStats>> {
        self.session.as_ref().map(|s| Arc::clone(&s.stats))
    }

    pub fn set_mic_volume(&self, percent: f32) -> Result<()> {
        Ok(self.config.set_mic_volume(percent)?)
    }

    pub fn set_output_volume(&self, percent: f32) -> Result<()> {
        Ok(self.config.set_output_volume(percent)?)
    }

    pub fn set_bass_percent(&self, percent: f32) -> Result<()> {
        Ok(self.config.set_bass_percent(percent)?)
    }

    pub fn set_treble_percent(&self, percent: f32) -> Result<()> {
        Ok(self.config.set_treble_percent(percent)?)
    }

    /// Bass level in `[0, 1]`
    pub fn set_bass_level(&self, level: f32) -> Result<()> {
        Ok(self.config.set_bass_level(level)?)
    }

    /// Treble level in `[0, 1]`
    pub fn set_treble_level(&self, level: f32) -> Result<()> {
        Ok(self.config.set_treble_level(level)?)
    }

    pub fn set_noise_reduction(&self, enabled: bool) {
        self.config.set_noise_reduction(enabled);
    }

    /// Decode a sound into the bank and cue it for injection
    pub fn load_sound(&mut self, path: impl AsRef<Path>) -> Result<AssetId> {
        let id = self.bank.load(path)?;
        self.cue_sound(&id)?;
        Ok(id)
    }

    /// Remove a sound; the bank returning to empty resumes live input
    pub fn unload_sound(&mut self, id: &AssetId) -> Result<()> {
        if self.bank.unload(id).is_none() {
            return Err(BoosterError::UnknownAsset(id.clone()).into());
        }
        if self.cued.as_ref() == Some(id) {
            self.cued = None;
            if let Some(cues) = &self.cues {
                cues.clear();
            }
        }
        Ok(())
    }

    /// Restart injection from the beginning of `id`
    pub fn cue_sound(&mut self, id: &AssetId) -> Result<()> {
        let asset = self
            .bank
            .get(id)
            .ok_or_else(|| BoosterError::UnknownAsset(id.clone()))?;
        self.cued = Some(id.clone());
        if let Some(cues) = &self.cues {
            cues.cue(asset);
        }
        Ok(())
    }

    /// Play a loaded sound on the output device, blocking until done
    pub fn play_sound(&self, id: &AssetId) -> Result<()> {
        let player = CpalAssetPlayer::with_device(self.options.output.clone());
        Ok(self.bank.play(id, &player)?)
    }

    /// Begin capturing the input device to memory
    pub fn start_recording(&mut self) -> Result<()> {
        let rate = self.sample_rate().unwrap_or_else(|| self.config.sample_rate());
        self.recorder.start(self.options.input.clone(), rate)
    }

    /// Finish capturing and save to `destination`, or discard with `None`
    pub fn stop_recording(&mut self, destination: Option<&Path>) -> Result<SaveOutcome> {
        self.recorder.stop(destination)
    }

    pub fn recorder_status(&self) -> RecorderStatus {
        self.recorder.status()
    }

    fn reap(&mut self) {
        if let Some(session) = self.session.take() {
            self.cues = None;
            let _ = session.command_tx.send(EngineCommand::Stop);
            if session.thread.join().is_err() {
                tracing::error!("Engine thread panicked");
            }
        }
    }

    fn plan_streams(&self) -> Result<StreamPlan> {
        let output = find_device(Direction::Output, self.options.output.as_deref())?;
        let output_config = negotiate_config(
            &output,
            Direction::Output,
            self.config.sample_rate(),
            self.options.output_channels,
        )?;

        // Input must match the output rate; the ring buffer does not resample
        let input = find_device(Direction::Input, self.options.input.as_deref())?;
        let input_config =
            negotiate_config(&input, Direction::Input, output_config.sample_rate, 1)?;
        if input_config.sample_rate != output_config.sample_rate {
            return Err(crate::device::DeviceError::UnsupportedConfig {
                device: device_name(&input),
                direction: "input",
                sample_rate: output_config.sample_rate,
            }
            .into());
        }

        tracing::debug!(
            "Duplex plan: {} ({} ch) -> {} ({} ch) at {} Hz",
            device_name(&input),
            input_config.channels,
            device_name(&output),
            output_config.channels,
            output_config.sample_rate
        );

        Ok(StreamPlan {
            input,
            output,
            input_config,
            output_config,
        })
    }
}

impl Drop for AudioEngine {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn error_callback(
    lost: Arc<AtomicBool>,
    events: Sender<EngineEvent>,
    side: &'static str,
) -> impl FnMut(cpal::StreamError) + Send + 'static {
    move |err| {
        if matches!(err, cpal::StreamError::DeviceNotAvailable) {
            if !lost.swap(true, Ordering::AcqRel) {
                let _ = events.try_send(EngineEvent::DeviceLost(format!("{side} device")));
            }
        } else {
            tracing::warn!("{} stream error: {}", side, err);
        }
    }
}

fn build_streams(
    plan: StreamPlan,
    mut processor: VoiceProcessor,
    latency_frames: usize,
    lost: &Arc<AtomicBool>,
    events: &Sender<EngineEvent>,
) -> Result<(cpal::Stream, cpal::Stream)> {
    let capacity = (latency_frames * 4).max(MAX_BLOCK_FRAMES * 2);
    let (mut producer, mut consumer) = HeapRb::<f32>::new(capacity).split();
    for _ in 0..latency_frames {
        let _ = producer.try_push(0.0);
    }

    let in_channels = usize::from(plan.input_config.channels.max(1));
    let input_stream = plan.input.build_input_stream(
        &plan.input_config,
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            for frame in data.chunks(in_channels) {
                let _ = producer.try_push(frame[0]);
            }
        },
        error_callback(Arc::clone(lost), events.clone(), "input"),
        None,
    )?;

    let out_channels = usize::from(plan.output_config.channels.max(1));
    let max_backlog = latency_frames * 2 + MAX_BLOCK_FRAMES;
    let mut mic = vec![0.0_f32; MAX_BLOCK_FRAMES];
    let output_stream = plan.output.build_output_stream(
        &plan.output_config,
        move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
            let backlog = consumer.occupied_len();
            if backlog > max_backlog {
                consumer.skip(backlog - latency_frames);
            }

            for block in data.chunks_mut(MAX_BLOCK_FRAMES * out_channels) {
                let frames = block.len() / out_channels;
                let got = consumer.pop_slice(&mut mic[..frames]);
                mic[got..frames].fill(0.0);
                processor.process_tick(&mic[..frames], block, out_channels);
            }
        },
        error_callback(Arc::clone(lost), events.clone(), "output"),
        None,
    )?;

    input_stream.play()?;
    output_stream.play()?;
    Ok((input_stream, output_stream))
}

/// Engine thread body: owns the streams until told to stop or a device dies
fn engine_thread_run(
    plan: StreamPlan,
    processor: VoiceProcessor,
    latency_frames: usize,
    lost: Arc<AtomicBool>,
    events: Sender<EngineEvent>,
    command_rx: Receiver<EngineCommand>,
    ready_tx: Sender<Result<()>>,
) {
    let streams = match build_streams(plan, processor, latency_frames, &lost, &events) {
        Ok(streams) => streams,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    let _ = ready_tx.send(Ok(()));

    loop {
        match command_rx.recv_timeout(HEALTH_POLL) {
            Ok(EngineCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                if lost.load(Ordering::Acquire) {
                    tracing::error!("Audio device lost, stopping engine");
                    break;
                }
            }
        }
    }

    let (input_stream, output_stream) = streams;
    drop(output_stream);
    drop(input_stream);
}
