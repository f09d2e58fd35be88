/// The per-tick voice pipeline
///
/// `process_tick` is the body of the real-time callback:
/// select source -> bass -> treble -> noise reduction -> gain -> clamp ->
/// duplicate mono to every output channel.
///
/// Everything the tick touches is preallocated. Device blocks larger than
/// [`MAX_BLOCK_FRAMES`] are processed in sub-blocks.
use crate::config::EngineConfig;
use crate::effects::{reduce_noise, NoiseGate, NoiseSuppressor, ToneStage};
use crate::source::{SignalSource, SourceSelector};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Largest sub-block processed in one pass
pub const MAX_BLOCK_FRAMES: usize = 8192;

/// Counters readable from the control thread
#[derive(Debug, Default)]
pub struct ProcessorStats {
    ticks: AtomicU64,
    silenced_ticks: AtomicU64,
    injected_ticks: AtomicU64,
}

impl ProcessorStats {
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Ticks replaced by silence after a non-finite result
    pub fn silenced_ticks(&self) -> u64 {
        self.silenced_ticks.load(Ordering::Relaxed)
    }

    /// Ticks run in sample-injection mode
    pub fn injected_ticks(&self) -> u64 {
        self.injected_ticks.load(Ordering::Relaxed)
    }
}

/// Real-time voice processor owned by the audio thread
pub struct VoiceProcessor {
    config: Arc<EngineConfig>,
    tone: ToneStage,
    suppressor: Box<dyn NoiseSuppressor>,
    selector: SourceSelector,
    scratch: Vec<f32>,
    sample_rate: u32,
    stats: Arc<ProcessorStats>,
}

impl VoiceProcessor {
    /// Processor with the default noise gate
    pub fn new(config: Arc<EngineConfig>, selector: SourceSelector) -> Self {
        Self::with_suppressor(config, selector, Box::new(NoiseGate::new()))
    }

    pub fn with_suppressor(
        config: Arc<EngineConfig>,
        selector: SourceSelector,
        suppressor: Box<dyn NoiseSuppressor>,
    ) -> Self {
        let sample_rate = config.sample_rate();
        Self {
            config,
            tone: ToneStage::new(sample_rate),
            suppressor,
            selector,
            scratch: vec![0.0; MAX_BLOCK_FRAMES],
            sample_rate,
            stats: Arc::new(ProcessorStats::default()),
        }
    }

    pub fn stats(&self) -> Arc<ProcessorStats> {
        Arc::clone(&self.stats)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Follow a device-negotiated rate; call before the stream starts
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.tone.set_sample_rate(sample_rate);
            self.suppressor.reset();
        }
    }

    /// Clear filter history and noise statistics
    pub fn reset(&mut self) {
        self.tone.reset();
        self.suppressor.reset();
    }

    /// Source chosen by the last tick
    pub fn source(&self) -> SignalSource<'_> {
        self.selector.source()
    }

    /// Process one device block
    ///
    /// `input` is the mono microphone block, `output` is interleaved with
    /// `channels` channels. Never fails: a non-finite result produces a
    /// silent block and resets filter state.
    pub fn process_tick(&mut self, input: &[f32], output: &mut [f32], channels: usize) {
        let channels = channels.max(1);
        let frames = output.len() / channels;
        let params = self.config.snapshot();

        let live = self.selector.select().is_live();
        let gain = if live {
            params.mic_gain * params.output_gain
        } else {
            self.stats.injected_ticks.fetch_add(1, Ordering::Relaxed);
            params.output_gain
        };

        let mut start = 0;
        while start < frames {
            let n = (frames - start).min(MAX_BLOCK_FRAMES);
            let block = &mut self.scratch[..n];

            let input_block = input.get(start..).unwrap_or(&[]);
            let input_block = &input_block[..input_block.len().min(n)];
            self.selector.fill(input_block, block);

            self.tone.apply_bass(block, params.bass_level);
            self.tone.apply_treble(block, params.treble_level);
            reduce_noise(
                self.suppressor.as_mut(),
                block,
                self.sample_rate,
                params.noise_reduction,
            );

            let mut finite = true;
            for sample in block.iter_mut() {
                let scaled = *sample * gain;
                finite &= scaled.is_finite();
                *sample = scaled.clamp(-1.0, 1.0);
            }

            if !finite {
                output.fill(0.0);
                self.reset();
                self.stats.silenced_ticks.fetch_add(1, Ordering::Relaxed);
                self.stats.ticks.fetch_add(1, Ordering::Relaxed);
                return;
            }

            let out = &mut output[start * channels..(start + n) * channels];
            for (frame, &sample) in out.chunks_exact_mut(channels).zip(block.iter()) {
                frame.fill(sample);
            }

            start += n;
        }

        // Trailing partial frame, if any
        output[frames * channels..].fill(0.0);
        self.stats.ticks.fetch_add(1, Ordering::Relaxed);
    }
}
