//! Microphone recording on a dedicated capture thread
//!
//! The [`Recorder`] is a two-state machine (`Idle`, `Recording`). Starting a
//! recording spawns a capture thread behind a [`RecordingTask`] handle. The
//! thread opens its own input through a [`CaptureDevice`] and appends fixed
//! chunks to a [`CaptureBuffer`]. Stopping cancels the task, waits for the
//! in-flight chunk, and writes the audio as mono 16-bit WAV.

use crate::device::{device_name, find_device, negotiate_config, Direction};
use crate::error::{AudioError, Result};
use booster_audio::{CaptureBuffer, DEFAULT_CHUNK_SECONDS};
use booster_core::BoosterError;
use cpal::traits::{DeviceTrait, StreamTrait};
use crossbeam_channel::bounded;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapRb};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Sleep between ring buffer polls while a chunk fills
const READ_POLL: Duration = Duration::from_millis(5);

/// Source of mono capture samples
///
/// Opened on the capture thread, so implementations need not be `Send`.
pub trait CaptureDevice {
    /// Rate of the samples produced by `read`
    fn sample_rate(&self) -> u32;

    /// Fill `buf`, blocking until it is full or `stop` is raised
    ///
    /// Returns the number of samples written. Fewer than `buf.len()` means
    /// either `stop` was raised or the source is exhausted.
    fn read(&mut self, buf: &mut [f32], stop: &AtomicBool) -> Result<usize>;
}

/// Microphone capture through cpal
pub struct CpalCapture {
    _stream: cpal::Stream,
    consumer: HeapCons<f32>,
    sample_rate: u32,
    lost: Arc<AtomicBool>,
}

impl CpalCapture {
    /// Open an input device (`None` = default) at `sample_rate`
    ///
    /// Falls back to the device's default rate when `sample_rate` is not
    /// offered.
    pub fn open(device: Option<&str>, sample_rate: u32) -> Result<Self> {
        let device = find_device(Direction::Input, device)?;
        let config = negotiate_config(&device, Direction::Input, sample_rate, 1)?;
        let channels = usize::from(config.channels.max(1));

        let capacity = (config.sample_rate as usize * 2).max(4096);
        let (mut producer, consumer) = HeapRb::<f32>::new(capacity).split();
        let lost = Arc::new(AtomicBool::new(false));
        let lost_flag = Arc::clone(&lost);

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                for frame in data.chunks(channels) {
                    let _ = producer.try_push(frame[0]);
                }
            },
            move |err| {
                if matches!(err, cpal::StreamError::DeviceNotAvailable) {
                    lost_flag.store(true, Ordering::Release);
                }
                tracing::warn!("Capture stream error: {}", err);
            },
            None,
        )?;
        stream.play()?;

        tracing::info!(
            "Recording from {} at {} Hz",
            device_name(&device),
            config.sample_rate
        );

        Ok(Self {
            _stream: stream,
            consumer,
            sample_rate: config.sample_rate,
            lost,
        })
    }
}

impl CaptureDevice for CpalCapture {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn read(&mut self, buf: &mut [f32], stop: &AtomicBool) -> Result<usize> {
        let mut filled = 0;
        loop {
            filled += self.consumer.pop_slice(&mut buf[filled..]);
            if filled == buf.len() || stop.load(Ordering::Acquire) {
                return Ok(filled);
            }
            if self.lost.load(Ordering::Acquire) {
                return Err(AudioError::Disconnected("capture device".to_string()));
            }
            thread::sleep(READ_POLL);
        }
    }
}

/// Handle to a running capture thread
pub struct RecordingTask {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<CaptureBuffer>,
}

impl RecordingTask {
    /// Spawn the capture loop; `open` runs on the new thread
    ///
    /// Returns once the device is open, so an open failure is reported here
    /// and no task is left behind.
    pub fn spawn<F, D>(open: F, chunk_seconds: u32) -> Result<Self>
    where
        F: FnOnce() -> Result<D> + Send + 'static,
        D: CaptureDevice,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);
        let (ready_tx, ready_rx) = bounded::<Result<()>>(1);

        let handle = thread::Builder::new()
            .name("booster-recorder".to_string())
            .spawn(move || {
                let device = match open() {
                    Ok(device) => device,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return CaptureBuffer::default();
                    }
                };
                let _ = ready_tx.send(Ok(()));
                capture_loop(device, chunk_seconds, &stop_flag)
            })
            .map_err(|e| AudioError::EngineThread(e.to_string()))?;

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self { stop, handle }),
            Ok(Err(e)) => {
                let _ = handle.join();
                Err(e)
            }
            Err(_) => {
                let _ = handle.join();
                Err(AudioError::EngineThread(
                    "capture thread exited during startup".to_string(),
                ))
            }
        }
    }

    /// Ask the loop to finish after the current chunk
    pub fn cancel(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Join the capture thread and take its buffer
    pub fn wait(self) -> Result<CaptureBuffer> {
        self.handle
            .join()
            .map_err(|_| AudioError::EngineThread("capture thread panicked".to_string()))
    }
}

fn capture_loop<D: CaptureDevice>(
    mut device: D,
    chunk_seconds: u32,
    stop: &AtomicBool,
) -> CaptureBuffer {
    let sample_rate = device.sample_rate();
    let chunk_len = (sample_rate as usize * chunk_seconds.max(1) as usize).max(1);
    let mut buffer = CaptureBuffer::new(sample_rate);

    loop {
        let mut chunk = vec![0.0_f32; chunk_len];
        let filled = match device.read(&mut chunk, stop) {
            Ok(n) => n,
            Err(e) => {
                tracing::error!("Capture stopped early: {}", e);
                break;
            }
        };
        chunk.truncate(filled);
        buffer.push_chunk(chunk);

        if stop.load(Ordering::Acquire) {
            break;
        }
        if filled < chunk_len {
            tracing::warn!("Capture source ended");
            break;
        }
    }

    buffer
}

/// Recorder state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderStatus {
    Idle,
    Recording,
}

/// Result of stopping a recording
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Audio written to `path`
    Saved { path: PathBuf, frames: usize },
    /// No destination chosen; the capture was dropped
    Cancelled { discarded_frames: usize },
}

/// Idle/Recording state machine around a [`RecordingTask`]
pub struct Recorder {
    task: Option<RecordingTask>,
    chunk_seconds: u32,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    pub fn new() -> Self {
        Self::with_chunk_seconds(DEFAULT_CHUNK_SECONDS)
    }

    pub fn with_chunk_seconds(chunk_seconds: u32) -> Self {
        Self {
            task: None,
            chunk_seconds: chunk_seconds.max(1),
        }
    }

    pub fn status(&self) -> RecorderStatus {
        if self.task.is_some() {
            RecorderStatus::Recording
        } else {
            RecorderStatus::Idle
        }
    }

    pub fn is_recording(&self) -> bool {
        self.task.is_some()
    }

    /// Idle -> Recording with a capture device opened by `open`
    pub fn start_with<F, D>(&mut self, open: F) -> Result<()>
    where
        F: FnOnce() -> Result<D> + Send + 'static,
        D: CaptureDevice,
    {
        if self.task.is_some() {
            return Err(AudioError::RecorderState("already recording"));
        }
        self.task = Some(RecordingTask::spawn(open, self.chunk_seconds)?);
        tracing::info!("Recording started");
        Ok(())
    }

    /// Idle -> Recording from a cpal input device
    pub fn start(&mut self, device: Option<String>, sample_rate: u32) -> Result<()> {
        self.start_with(move || CpalCapture::open(device.as_deref(), sample_rate))
    }

    /// Recording -> Idle, saving to `destination` when one is given
    pub fn stop(&mut self, destination: Option<&Path>) -> Result<SaveOutcome> {
        let task = self
            .task
            .take()
            .ok_or(AudioError::RecorderState("not recording"))?;

        task.cancel();
        let buffer = task.wait()?;

        let Some(path) = destination else {
            let discarded_frames = buffer.frames();
            tracing::warn!(
                "Recording discarded ({:.2}s), no destination chosen",
                buffer.duration_secs()
            );
            return Ok(SaveOutcome::Cancelled { discarded_frames });
        };

        let frames = buffer.write_wav(path).map_err(BoosterError::from)?;
        Ok(SaveOutcome::Saved {
            path: path.to_path_buf(),
            frames,
        })
    }
}

impl Drop for Recorder {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.cancel();
            let _ = task.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Produces a ramp in fixed blocks, then runs dry
    struct Ramp {
        sample_rate: u32,
        remaining: usize,
        next: usize,
    }

    impl CaptureDevice for Ramp {
        fn sample_rate(&self) -> u32 {
            self.sample_rate
        }

        fn read(&mut self, buf: &mut [f32], _stop: &AtomicBool) -> Result<usize> {
            let n = buf.len().min(self.remaining);
            for sample in &mut buf[..n] {
                *sample = (self.next % 100) as f32 / 100.0;
                self.next += 1;
            }
            self.remaining -= n;
            Ok(n)
        }
    }

    struct Broken;

    impl CaptureDevice for Broken {
        fn sample_rate(&self) -> u32 {
            8_000
        }

        fn read(&mut self, _buf: &mut [f32], _stop: &AtomicBool) -> Result<usize> {
            Err(AudioError::Disconnected("test".into()))
        }
    }

    #[test]
    fn loop_keeps_partial_last_chunk() {
        let stop = AtomicBool::new(false);
        let device = Ramp {
            sample_rate: 1_000,
            remaining: 2_500,
            next: 0,
        };

        let buffer = capture_loop(device, 1, &stop);

        let sizes: Vec<_> = buffer.chunks().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![1_000, 1_000, 500]);
        assert_eq!(buffer.sample_rate(), 1_000);
    }

    #[test]
    fn loop_ends_on_device_error() {
        let stop = AtomicBool::new(false);
        let buffer = capture_loop(Broken, 1, &stop);
        assert!(buffer.is_empty());
    }

    #[test]
    fn stop_when_idle_is_rejected() {
        let mut recorder = Recorder::new();
        assert!(matches!(
            recorder.stop(None),
            Err(AudioError::RecorderState(_))
        ));
        assert_eq!(recorder.status(), RecorderStatus::Idle);
    }

    #[test]
    fn double_start_is_rejected() {
        let mut recorder = Recorder::new();
        let ramp = || {
            Ok(Ramp {
                sample_rate: 1_000,
                remaining: 1_000,
                next: 0,
            })
        };

        recorder.start_with(ramp).unwrap();
        assert!(matches!(
            recorder.start_with(ramp),
            Err(AudioError::RecorderState(_))
        ));

        let outcome = recorder.stop(None).unwrap();
        assert_eq!(outcome, SaveOutcome::Cancelled { discarded_frames: 1_000 });
        assert!(!recorder.is_recording());
    }

    #[test]
    fn open_failure_is_reported_by_start() {
        let mut recorder = Recorder::new();

        let err = recorder
            .start_with(|| -> Result<Ramp> { Err(AudioError::DeviceNotFound) })
            .unwrap_err();

        assert!(matches!(err, AudioError::DeviceNotFound));
        assert_eq!(recorder.status(), RecorderStatus::Idle);
        assert!(matches!(
            recorder.stop(None),
            Err(AudioError::RecorderState(_))
        ));
    }

    #[test]
    fn unwritable_destination_is_io_error() {
        let mut recorder = Recorder::new();
        recorder
            .start_with(|| {
                Ok(Ramp {
                    sample_rate: 1_000,
                    remaining: 500,
                    next: 0,
                })
            })
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("take.wav");
        let err = recorder.stop(Some(&path)).unwrap_err();

        assert!(matches!(err, AudioError::Booster(BoosterError::Io(_))));
    }
}
