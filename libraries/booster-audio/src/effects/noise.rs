/// Noise suppression
///
/// The suppressor is pluggable behind [`NoiseSuppressor`]. The default
/// [`NoiseGate`] is a time-domain downward expander: an explicit
/// [`NoiseProfile`] tracks the background level as a sliding-window minimum
/// and blocks close to that floor are attenuated toward `FLOOR_GAIN_DB`.

/// Interchangeable denoiser run after tone shaping
///
/// Implementations must not allocate in `reduce` and must keep all state in
/// `self`.
pub trait NoiseSuppressor: Send {
    /// Denoise `frame` in place; length is preserved
    fn reduce(&mut self, frame: &mut [f32], sample_rate: u32);

    /// Forget all learned statistics
    fn reset(&mut self);

    /// Suppressor name (for logging)
    fn name(&self) -> &str;
}

/// Run `suppressor` when `enabled`, identity otherwise
#[inline]
pub fn reduce_noise(
    suppressor: &mut dyn NoiseSuppressor,
    frame: &mut [f32],
    sample_rate: u32,
    enabled: bool,
) {
    if enabled {
        suppressor.reduce(frame, sample_rate);
    }
}

// Floor before anything has been observed, roughly -100 dBFS
const FLOOR_INIT: f32 = 1e-5;
const FLOOR_MIN: f32 = 1e-7;
// Backgrounds louder than -40 dBFS are treated as signal, never as floor
const FLOOR_MAX: f32 = 0.01;
// Minimum is taken over the last ~1.5 s, kept as sub-window minima
const WINDOW_SECS: f32 = 1.5;
const SUBWINDOWS: usize = 6;
// Below OPEN_DB over the floor the gate starts closing, fully closed at CLOSE_DB
const OPEN_DB: f32 = 12.0;
const CLOSE_DB: f32 = 3.0;
const FLOOR_GAIN_DB: f32 = -24.0;
// Per-sample gain smoothing
const GAIN_SMOOTH_SECS: f32 = 0.005;

#[inline]
fn db_to_gain(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[inline]
fn time_coeff(block_len: usize, seconds: f32, sample_rate: u32) -> f32 {
    (-(block_len as f32) / (seconds * sample_rate as f32)).exp()
}

/// Running estimate of the background noise level
///
/// Minimum statistics: the floor is the quietest block RMS seen in a sliding
/// window, capped at `FLOOR_MAX`. A pause in speech pulls it down at once; a
/// sustained sound lifts it only as far as the cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseProfile {
    minima: [f32; SUBWINDOWS],
    next: usize,
    current_min: f32,
    current_samples: usize,
    floor: f32,
    blocks: u64,
}

impl NoiseProfile {
    pub fn new() -> Self {
        Self {
            minima: [f32::INFINITY; SUBWINDOWS],
            next: 0,
            current_min: f32::INFINITY,
            current_samples: 0,
            floor: FLOOR_INIT,
            blocks: 0,
        }
    }

    /// Current floor as linear RMS
    pub fn floor(&self) -> f32 {
        self.floor
    }

    /// Number of blocks observed
    pub fn blocks(&self) -> u64 {
        self.blocks
    }

    /// Fold one block's RMS into the estimate
    pub fn observe(&mut self, block_rms: f32, block_len: usize, sample_rate: u32) {
        if block_len == 0 || sample_rate == 0 || !block_rms.is_finite() {
            return;
        }

        self.current_min = self.current_min.min(block_rms);
        self.current_samples += block_len;

        let subwindow_len =
            ((WINDOW_SECS / SUBWINDOWS as f32) * sample_rate as f32).max(1.0) as usize;
        if self.current_samples >= subwindow_len {
            self.minima[self.next] = self.current_min;
            self.next = (self.next + 1) % SUBWINDOWS;
            self.current_min = f32::INFINITY;
            self.current_samples = 0;
        }

        let window_min = self.minima.iter().copied().fold(self.current_min, f32::min);
        self.floor = window_min.clamp(FLOOR_MIN, FLOOR_MAX);
        self.blocks += 1;
    }

    /// Gate gain for a block at `block_rms` against the current floor
    pub fn target_gain(&self, block_rms: f32) -> f32 {
        let snr_db = 20.0 * (block_rms.max(FLOOR_MIN) / self.floor).log10();
        let open = smoothstep(CLOSE_DB, OPEN_DB, snr_db);
        let floor_gain = db_to_gain(FLOOR_GAIN_DB);
        floor_gain + (1.0 - floor_gain) * open
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for NoiseProfile {
    fn default() -> Self {
        Self::new()
    }
}

/// Adaptive downward expander
#[derive(Debug, Clone)]
pub struct NoiseGate {
    profile: NoiseProfile,
    gain: f32,
}

impl NoiseGate {
    pub fn new() -> Self {
        Self {
            profile: NoiseProfile::new(),
            gain: 1.0,
        }
    }

    pub fn profile(&self) -> &NoiseProfile {
        &self.profile
    }

    /// Gain applied to the last sample
    pub fn current_gain(&self) -> f32 {
        self.gain
    }
}

impl Default for NoiseGate {
    fn default() -> Self {
        Self::new()
    }
}

impl NoiseSuppressor for NoiseGate {
    fn reduce(&mut self, frame: &mut [f32], sample_rate: u32) {
        if frame.is_empty() || sample_rate == 0 {
            return;
        }

        let energy: f32 = frame.iter().map(|s| s * s).sum();
        let block_rms = (energy / frame.len() as f32).sqrt();

        self.profile.observe(block_rms, frame.len(), sample_rate);
        let target = self.profile.target_gain(block_rms);

        let smooth = time_coeff(1, GAIN_SMOOTH_SECS, sample_rate);
        for sample in frame.iter_mut() {
            self.gain = smooth * self.gain + (1.0 - smooth) * target;
            *sample *= self.gain;
        }
    }

    fn reset(&mut self) {
        self.profile.reset();
        self.gain = 1.0;
    }

    fn name(&self) -> &str {
        "Noise Gate"
    }
}
