/// Bass and treble boost
///
/// Each boost is a fixed second-order Butterworth section (RBJ biquad with
/// Q = 1/sqrt(2)) whose output is mixed back onto the dry signal:
/// `out = in + level * filtered(in)`.

/// Bass boost cutoff (low-pass)
pub const BASS_CUTOFF_HZ: f32 = 150.0;

/// Treble boost cutoff (high-pass)
pub const TREBLE_CUTOFF_HZ: f32 = 5000.0;

const BUTTERWORTH_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Which side of the cutoff a tone filter passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneKind {
    /// Passes below the cutoff (bass)
    LowPass,
    /// Passes above the cutoff (treble)
    HighPass,
}

/// Direct Form I biquad, double-precision accumulation
#[derive(Debug, Clone)]
struct Biquad {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,

    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    fn design(kind: ToneKind, cutoff_hz: f32, sample_rate: u32) -> Self {
        let mut filter = Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        };

        if sample_rate < 1 {
            return filter;
        }

        let fs = f64::from(sample_rate);
        // Stay clear of Nyquist for very low device rates
        let freq = f64::from(cutoff_hz).min(fs * 0.45);
        let omega = 2.0 * std::f64::consts::PI * freq / fs;
        let cos_omega = omega.cos();
        let alpha = omega.sin() / (2.0 * BUTTERWORTH_Q);

        let (b0, b1, b2) = match kind {
            ToneKind::LowPass => {
                let k = (1.0 - cos_omega) / 2.0;
                (k, 1.0 - cos_omega, k)
            }
            ToneKind::HighPass => {
                let k = (1.0 + cos_omega) / 2.0;
                (k, -(1.0 + cos_omega), k)
            }
        };
        let a0 = 1.0 + alpha;

        filter.b0 = b0 / a0;
        filter.b1 = b1 / a0;
        filter.b2 = b2 / a0;
        filter.a1 = -2.0 * cos_omega / a0;
        filter.a2 = (1.0 - alpha) / a0;
        filter
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let x = f64::from(input);
        let mut y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        if y.abs() < 1e-15 {
            y = 0.0;
        }

        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;

        y as f32
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
    }

    fn coefficients(&self) -> [f64; 5] {
        [self.b0, self.b1, self.b2, self.a1, self.a2]
    }
}

/// One boost filter with cached coefficients and persistent history
///
/// History is owned by the real-time thread only. A level of exactly zero
/// skips the recurrence entirely; the first active block after a bypass
/// starts from cleared history.
#[derive(Debug, Clone)]
pub struct ToneFilter {
    kind: ToneKind,
    cutoff_hz: f32,
    sample_rate: u32,
    biquad: Biquad,
    active: bool,
}

impl ToneFilter {
    /// Create a filter for the given kind, cutoff and sample rate
    pub fn new(kind: ToneKind, cutoff_hz: f32, sample_rate: u32) -> Self {
        Self {
            kind,
            cutoff_hz,
            sample_rate,
            biquad: Biquad::design(kind, cutoff_hz, sample_rate),
            active: false,
        }
    }

    /// Low-pass at 150 Hz
    pub fn bass(sample_rate: u32) -> Self {
        Self::new(ToneKind::LowPass, BASS_CUTOFF_HZ, sample_rate)
    }

    /// High-pass at 5 kHz
    pub fn treble(sample_rate: u32) -> Self {
        Self::new(ToneKind::HighPass, TREBLE_CUTOFF_HZ, sample_rate)
    }

    pub fn kind(&self) -> ToneKind {
        self.kind
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Recompute coefficients if the rate actually changed
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if sample_rate == self.sample_rate {
            return;
        }
        self.sample_rate = sample_rate;
        self.biquad = Biquad::design(self.kind, self.cutoff_hz, sample_rate);
        self.active = false;
    }

    /// Mix `level * filtered(frame)` onto `frame` in place
    ///
    /// Output is not clamped.
    pub fn apply(&mut self, frame: &mut [f32], level: f32) {
        if level == 0.0 {
            self.active = false;
            return;
        }

        if !self.active {
            self.biquad.reset();
            self.active = true;
        }

        for sample in frame.iter_mut() {
            let filtered = self.biquad.process(*sample);
            *sample += level * filtered;
        }
    }

    /// Whether the last call ran the recurrence
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Clear history, keep coefficients
    pub fn reset(&mut self) {
        self.biquad.reset();
        self.active = false;
    }

    /// Normalized `[b0, b1, b2, a1, a2]`
    pub fn coefficients(&self) -> [f64; 5] {
        self.biquad.coefficients()
    }
}

/// Bass followed by treble, as run by the tick processor
#[derive(Debug, Clone)]
pub struct ToneStage {
    bass: ToneFilter,
    treble: ToneFilter,
}

impl ToneStage {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            bass: ToneFilter::bass(sample_rate),
            treble: ToneFilter::treble(sample_rate),
        }
    }

    pub fn apply_bass(&mut self, frame: &mut [f32], level: f32) {
        self.bass.apply(frame, level);
    }

    pub fn apply_treble(&mut self, frame: &mut [f32], level: f32) {
        self.treble.apply(frame, level);
    }

    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.bass.set_sample_rate(sample_rate);
        self.treble.set_sample_rate(sample_rate);
    }

    pub fn reset(&mut self) {
        self.bass.reset();
        self.treble.reset();
    }

    pub fn bass(&self) -> &ToneFilter {
        &self.bass
    }

    pub fn treble(&self) -> &ToneFilter {
        &self.treble
    }
}
