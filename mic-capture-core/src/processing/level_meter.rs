/// Loudness meter for UI feedback.
///
/// Converts a block of samples into a normalized level in `[0.0, 1.0]`:
/// RMS amplitude → decibels → the `[-60 dB, 0 dB]` range mapped onto
/// `[0.0, 1.0]` → exponential smoothing across blocks.
///
/// Smoothing state is per-meter; a recorder owns exactly one meter, so two
/// recorders never share level state. The level feeds the UI only and never
/// touches the captured audio.
#[derive(Debug, Clone)]
pub struct LevelMeter {
    smoothed: f32,
}

/// Smoothing factor. Higher is more reactive, lower is smoother.
pub const SMOOTHING: f32 = 0.2;

/// Bottom of the normalized range, in dB below full scale.
const DB_FLOOR: f32 = -60.0;

/// Keeps `log10` finite for an all-zero block.
const SILENCE_EPSILON: f32 = 1e-10;

impl LevelMeter {
    pub fn new() -> Self {
        Self { smoothed: 0.0 }
    }

    /// Normalized level of a single block, before smoothing.
    ///
    /// Always finite and within `[0.0, 1.0]`; an all-zero block maps to 0.0
    /// and a full-scale block to 1.0.
    pub fn instantaneous(block: &[f32]) -> f32 {
        let rms = Self::rms(block);
        let db = 20.0 * rms.max(SILENCE_EPSILON).log10();
        ((db - DB_FLOOR) / -DB_FLOOR).clamp(0.0, 1.0)
    }

    /// Fold a block into the smoothed level and return the new value.
    pub fn process(&mut self, block: &[f32]) -> f32 {
        let instant = Self::instantaneous(block);
        self.smoothed = SMOOTHING * instant + (1.0 - SMOOTHING) * self.smoothed;
        self.smoothed
    }

    /// Most recent smoothed level.
    pub fn level(&self) -> f32 {
        self.smoothed
    }

    fn rms(block: &[f32]) -> f32 {
        if block.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = block.iter().map(|s| s * s).sum();
        (sum_sq / block.len() as f32).sqrt()
    }
}

impl Default for LevelMeter {
    fn default() -> Self {
        Self::new()
    }
}
