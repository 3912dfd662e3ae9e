//! Recursive radix-2 Cooley-Tukey FFT.

use crate::error::{CochleaError, Result};
use num_complex::Complex64;
use std::f64::consts::PI;

/// Discrete Fourier transform of `input`.
///
/// The length must be an exact power of two (1 included); anything else is
/// rejected before any work is done.
pub fn fft(input: &[Complex64]) -> Result<Vec<Complex64>> {
    if !input.len().is_power_of_two() {
        return Err(CochleaError::NotPowerOfTwo(input.len()));
    }
    Ok(fft_recursive(input))
}

fn fft_recursive(x: &[Complex64]) -> Vec<Complex64> {
    let n = x.len();
    if n == 1 {
        return vec![x[0]];
    }

    let half = n / 2;
    let even: Vec<Complex64> = x.iter().step_by(2).copied().collect();
    let odd: Vec<Complex64> = x.iter().skip(1).step_by(2).copied().collect();
    let q = fft_recursive(&even);
    let r = fft_recursive(&odd);

    let mut y = vec![Complex64::new(0.0, 0.0); n];
    for k in 0..half {
        let wk = Complex64::from_polar(1.0, -2.0 * PI * k as f64 / n as f64);
        let t = wk * r[k];
        y[k] = q[k] + t;
        y[k + half] = q[k] - t;
    }
    y
}

/// |X[k]| for every bin
pub fn magnitudes(spectrum: &[Complex64]) -> Vec<f64> {
    spectrum.iter().map(|c| c.norm()).collect()
}

/// Magnitude spectrum of integer samples
pub fn magnitude_spectrum(samples: &[i16]) -> Result<Vec<f64>> {
    let buffer: Vec<Complex64> = samples
        .iter()
        .map(|&s| Complex64::new(s as f64, 0.0))
        .collect();
    Ok(magnitudes(&fft(&buffer)?))
}
