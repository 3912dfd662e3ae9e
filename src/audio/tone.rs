//! Pure-tone sample generation.

use super::window::tukey_window;
use crate::error::{CochleaError, Result};
use std::f64::consts::PI;

/// Piano key frequencies C4 through C5 (Hz)
pub const C_MAJOR_SCALE: [f64; 8] = [261.62, 293.67, 329.63, 349.23, 392.00, 440.0, 493.88, 523.25];

/// Full-scale sine tone of `len` samples, tapered by a Tukey window.
///
/// The taper keeps segment boundaries from smearing energy across the
/// spectrum when tones are concatenated.
pub fn sine_tone(len: usize, frequency: f64, sample_rate: f64, alpha: f64) -> Result<Vec<i16>> {
    if sample_rate <= 0.0 {
        return Err(CochleaError::InvalidParameter(format!(
            "sample rate must be positive, got {}",
            sample_rate
        )));
    }

    let amplitude = i16::MAX as f64;
    let cycles_per_sample = frequency / sample_rate;
    (0..len)
        .map(|idx| {
            let v = amplitude * (2.0 * PI * idx as f64 * cycles_per_sample).sin();
            Ok((v * tukey_window(idx, len, alpha)?) as i16)
        })
        .collect()
}

/// Tones played back to back, `total_len / frequencies.len()` samples each
pub fn tone_sequence(
    frequencies: &[f64],
    total_len: usize,
    sample_rate: f64,
    alpha: f64,
) -> Result<Vec<i16>> {
    if frequencies.is_empty() {
        return Err(CochleaError::InvalidParameter(
            "tone sequence needs at least one frequency".to_string(),
        ));
    }

    let per_tone = total_len / frequencies.len();
    let mut samples = Vec::with_capacity(per_tone * frequencies.len());
    for &frequency in frequencies {
        samples.extend(sine_tone(per_tone, frequency, sample_rate, alpha)?);
    }
    Ok(samples)
}
