//! Tukey (tapered cosine) window.

use crate::error::{CochleaError, Result};
use std::f64::consts::PI;

/// Value of the Tukey window of length `len` at index `n`.
///
/// `alpha` is the tapered fraction: 0 gives a rectangular window, 1 a Hann
/// window. The window ramps up for `n < alpha(N-1)/2`, is flat up to
/// `(N-1)(1-alpha/2)` and ramps down after that.
pub fn tukey_window(n: usize, len: usize, alpha: f64) -> Result<f64> {
    if n >= len {
        return Err(CochleaError::WindowIndexOutOfRange { n, len });
    }
    if !(0.0..=1.0).contains(&alpha) {
        return Err(CochleaError::InvalidAlpha(alpha));
    }

    let n = n as f64;
    let span = (len - 1) as f64;
    let low_cut = alpha * span / 2.0;
    let high_cut = span * (1.0 - alpha / 2.0);

    let value = if n < low_cut {
        let x = 2.0 * n / (alpha * span) - 1.0;
        0.5 * (1.0 + (PI * x).cos())
    } else if n <= high_cut {
        1.0
    } else {
        let x = 2.0 * n / (alpha * span) - 2.0 / alpha + 1.0;
        0.5 * (1.0 + (PI * x).cos())
    };

    Ok(value)
}

/// The whole window as a vector
pub fn tukey(len: usize, alpha: f64) -> Result<Vec<f64>> {
    (0..len).map(|n| tukey_window(n, len, alpha)).collect()
}
