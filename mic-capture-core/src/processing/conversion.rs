//! Sample-format helpers shared by the sink and the hardware backends.
//!
//! All functions are pure math on `f32` buffers normalized to `[-1.0, 1.0]`.

/// Downmix interleaved multi-channel audio to mono by averaging channels per
/// frame.
pub fn downmix_to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    let frame_count = samples.len() / channels;
    let scale = 1.0 / channels as f32;
    let mut mono = Vec::with_capacity(frame_count);
    for frame in 0..frame_count {
        let mut sum = 0.0f32;
        for ch in 0..channels {
            sum += samples[frame * channels + ch];
        }
        mono.push(sum * scale);
    }
    mono
}

/// Linear-interpolation resampling for mono audio.
///
/// Returns the input unchanged if the rates already match. Each block is
/// resampled independently; at dictation block sizes the boundary error is
/// inaudible and irrelevant to transcription.
pub fn resample_linear(samples: &[f32], source_rate: f64, target_rate: f64) -> Vec<f32> {
    if (source_rate - target_rate).abs() < 0.01 || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = target_rate / source_rate;
    let output_count = (samples.len() as f64 * ratio) as usize;
    if output_count == 0 {
        return Vec::new();
    }

    let mut output = vec![0.0f32; output_count];
    for (i, sample) in output.iter_mut().enumerate() {
        let source_index = i as f64 / ratio;
        let index = source_index as usize;
        let fraction = (source_index - index as f64) as f32;

        if index + 1 < samples.len() {
            *sample = samples[index] * (1.0 - fraction) + samples[index + 1] * fraction;
        } else if index < samples.len() {
            *sample = samples[index];
        }
    }
    output
}

/// Convert one `f32` sample in `[-1.0, 1.0]` to 16-bit PCM, clamping
/// out-of-range values.
pub fn sample_to_i16(sample: f32) -> i16 {
    let clamped = sample.clamp(-1.0, 1.0);
    (clamped * i16::MAX as f32) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_stereo_to_mono() {
        let stereo = [0.2, 0.8, 0.4, 0.6];
        let mono = downmix_to_mono(&stereo, 2);
        assert_eq!(mono.len(), 2);
        assert!((mono[0] - 0.5).abs() < 1e-6);
        assert!((mono[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn downmix_mono_passthrough() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(downmix_to_mono(&samples, 1), samples);
    }

    #[test]
    fn downmix_ignores_trailing_partial_frame() {
        let samples = [0.2, 0.4, 0.6];
        let mono = downmix_to_mono(&samples, 2);
        assert_eq!(mono.len(), 1);
        assert!((mono[0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn resample_same_rate_is_passthrough() {
        let samples = vec![1.0, 2.0, 3.0];
        assert_eq!(resample_linear(&samples, 22_050.0, 22_050.0), samples);
    }

    #[test]
    fn resample_upsample_2x() {
        let samples = vec![0.0, 1.0];
        let result = resample_linear(&samples, 11_025.0, 22_050.0);

        assert_eq!(result.len(), 4);
        assert!((result[0] - 0.0).abs() < 0.01);
        // Midpoint of a linear ramp.
        assert!((result[1] - 0.5).abs() < 0.1);
    }

    #[test]
    fn resample_downsample() {
        let samples: Vec<f32> = (0..100).map(|i| i as f32 / 100.0).collect();
        let result = resample_linear(&samples, 44_100.0, 22_050.0);
        assert_eq!(result.len(), 50);
    }

    #[test]
    fn resample_empty_input() {
        assert!(resample_linear(&[], 44_100.0, 22_050.0).is_empty());
    }

    #[test]
    fn i16_conversion_endpoints() {
        assert_eq!(sample_to_i16(0.0), 0);
        assert_eq!(sample_to_i16(1.0), i16::MAX);
        assert_eq!(sample_to_i16(-1.0), -i16::MAX);
    }

    #[test]
    fn i16_conversion_clamps_out_of_range() {
        assert_eq!(sample_to_i16(2.0), i16::MAX);
        assert_eq!(sample_to_i16(-3.0), -i16::MAX);
    }
}
