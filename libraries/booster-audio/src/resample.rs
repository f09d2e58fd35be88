/// Offline sample-rate conversion for loaded assets
use crate::error::{AudioError, Result};
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};

/// Convert a whole mono buffer from `from_rate` to `to_rate`
///
/// Runs once at load time, off the real-time path.
pub fn resample_mono(samples: &[f32], from_rate: u32, to_rate: u32) -> Result<Vec<f32>> {
    if from_rate == to_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }
    if from_rate == 0 || to_rate == 0 {
        return Err(AudioError::Resample(format!(
            "invalid rates {from_rate} -> {to_rate}"
        )));
    }

    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Cubic,
        oversampling_factor: 128,
        window: WindowFunction::BlackmanHarris2,
    };

    let mut resampler = SincFixedIn::<f32>::new(
        f64::from(to_rate) / f64::from(from_rate),
        2.0,
        params,
        samples.len(),
        1,
    )
    .map_err(|e| AudioError::Resample(e.to_string()))?;

    let expected = (samples.len() as u64 * u64::from(to_rate)).div_ceil(u64::from(from_rate));
    let delay = resampler.output_delay();

    let mut output = resampler
        .process(&[samples], None)
        .map_err(|e| AudioError::Resample(e.to_string()))?
        .pop()
        .unwrap_or_default();

    // Zero-padded flushes push the filter tail out
    while output.len() < expected as usize + delay {
        let tail = resampler
            .process_partial(None::<&[Vec<f32>]>, None)
            .map_err(|e| AudioError::Resample(e.to_string()))?
            .pop()
            .unwrap_or_default();
        if tail.is_empty() {
            break;
        }
        output.extend_from_slice(&tail);
    }

    output.drain(..delay.min(output.len()));
    output.truncate(expected as usize);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_rate_is_copy() {
        let input = vec![0.1, 0.2, 0.3];
        assert_eq!(resample_mono(&input, 44_100, 44_100).unwrap(), input);
    }

    #[test]
    fn upsampling_scales_length() {
        let input: Vec<f32> = (0..22_050).map(|i| (i as f32 * 0.05).sin() * 0.5).collect();
        let output = resample_mono(&input, 22_050, 44_100).unwrap();

        assert_eq!(output.len(), 44_100);
    }

    #[test]
    fn downsampling_keeps_duration() {
        let input: Vec<f32> = (0..48_000).map(|i| (i as f32 * 0.01).sin() * 0.5).collect();
        let output = resample_mono(&input, 48_000, 44_100).unwrap();

        assert_eq!(output.len(), 44_100);
    }

    #[test]
    fn output_is_aligned_with_input() {
        // Impulse at 0.5 s should stay near 0.5 s after conversion
        let mut input = vec![0.0f32; 22_050];
        input[11_025] = 1.0;
        let output = resample_mono(&input, 22_050, 44_100).unwrap();

        let peak = output
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.abs().total_cmp(&b.1.abs()))
            .map(|(i, _)| i)
            .unwrap();
        assert!((peak as i64 - 22_050).abs() <= 4, "peak at {peak}");
    }

    #[test]
    fn ending_is_not_cut_off() {
        let input = vec![0.5f32; 22_050];
        let output = resample_mono(&input, 22_050, 44_100).unwrap();

        let last = &output[output.len() - 2_000..output.len() - 400];
        assert!(last.iter().all(|s| (s - 0.5).abs() < 0.05));
    }

    #[test]
    fn short_buffer_is_fully_converted() {
        let output = resample_mono(&[0.25; 16], 22_050, 44_100).unwrap();
        assert_eq!(output.len(), 32);
    }

    #[test]
    fn zero_rate_is_rejected() {
        assert!(resample_mono(&[0.0; 16], 0, 44_100).is_err());
    }
}
