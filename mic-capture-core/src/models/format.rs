/// PCM format of a capture session.
///
/// Dictation capture is fixed at 22.05 kHz / mono / 16-bit. 16 kHz is
/// enough for speech-to-text; 22.05 kHz leaves a safety margin while a
/// minute of audio still lands around 2.6 MB. Stereo buys nothing for a
/// single microphone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureFormat {
    /// Sample rate in Hz.
    pub sample_rate: u32,

    /// Number of interleaved channels.
    pub channels: u16,

    /// Bit depth for PCM output.
    pub bits_per_sample: u16,
}

impl CaptureFormat {
    /// The fixed format every dictation session records at.
    pub const DICTATION: CaptureFormat = CaptureFormat {
        sample_rate: 22_050,
        channels: 1,
        bits_per_sample: 16,
    };

    /// Seconds of audio represented by `samples` mono samples.
    pub fn duration_secs(&self, samples: u64) -> f64 {
        let frames = samples / self.channels as u64;
        frames as f64 / self.sample_rate as f64
    }

    pub(crate) fn wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: hound::SampleFormat::Int,
        }
    }
}

impl Default for CaptureFormat {
    fn default() -> Self {
        Self::DICTATION
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dictation_format() {
        let f = CaptureFormat::DICTATION;
        assert_eq!(f.sample_rate, 22_050);
        assert_eq!(f.channels, 1);
        assert_eq!(f.bits_per_sample, 16);
    }

    #[test]
    fn duration_from_sample_count() {
        let f = CaptureFormat::DICTATION;
        assert!((f.duration_secs(22_050) - 1.0).abs() < 1e-9);
        assert!((f.duration_secs(11_025) - 0.5).abs() < 1e-9);
        assert_eq!(f.duration_secs(0), 0.0);
    }
}
