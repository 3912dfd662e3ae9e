//! Windowed FFT spectrogram with one global normalization.

use super::fft::magnitude_spectrum;
use crate::error::{CochleaError, Result};
use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// `[frame][bin]` magnitudes scaled into [0, 1].
///
/// Every value is divided by the single largest magnitude in the whole
/// buffer, so relative loudness across frames survives. Built once and
/// never modified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spectrogram {
    data: Array2<f64>,
    samples_per_frame: usize,
}

/// Hop size and total sample count for `frame_count` windows.
///
/// Returns `(round(sample_rate / frame_rate), (frame_count - 1) * hop + window_size)`.
/// Rates must be finite and positive, and the total must fit in `usize`.
pub fn frame_layout(
    sample_rate: f64,
    frame_rate: f64,
    frame_count: usize,
    window_size: usize,
) -> Result<(usize, usize)> {
    if !(sample_rate > 0.0 && sample_rate.is_finite() && frame_rate > 0.0 && frame_rate.is_finite()) {
        return Err(CochleaError::InvalidParameter(format!(
            "rates must be finite and positive (sample rate {}, frame rate {})",
            sample_rate, frame_rate
        )));
    }

    let hop = (sample_rate / frame_rate).round();
    if !(hop.is_finite() && hop < usize::MAX as f64) {
        return Err(CochleaError::InvalidParameter(format!(
            "{} samples per frame is out of range",
            hop
        )));
    }
    let samples_per_frame = hop as usize;

    let needed = frame_count
        .saturating_sub(1)
        .checked_mul(samples_per_frame)
        .and_then(|n| n.checked_add(window_size))
        .ok_or_else(|| {
            CochleaError::InvalidParameter(format!(
                "{} frames of {} samples overflow the sample count",
                frame_count, samples_per_frame
            ))
        })?;

    Ok((samples_per_frame, needed))
}

impl Spectrogram {
    /// Analyse `frame_count` windows of `window_size` samples.
    ///
    /// Window `f` starts at `f * round(sample_rate / frame_rate)`. The buffer
    /// must hold `(frame_count - 1) * samples_per_frame + window_size`
    /// samples.
    pub fn new(
        samples: &[i16],
        sample_rate: f64,
        frame_rate: f64,
        frame_count: usize,
        window_size: usize,
    ) -> Result<Self> {
        if !window_size.is_power_of_two() {
            return Err(CochleaError::NotPowerOfTwo(window_size));
        }
        if frame_count == 0 {
            return Err(CochleaError::InvalidParameter(
                "spectrogram needs at least one frame".to_string(),
            ));
        }
        let (samples_per_frame, needed) = frame_layout(sample_rate, frame_rate, frame_count, window_size)?;
        if samples.len() < needed {
            return Err(CochleaError::SampleUnderrun {
                needed,
                available: samples.len(),
            });
        }

        // Phase 1: per-frame FFTs (independent, parallel)
        let rows = (0..frame_count)
            .into_par_iter()
            .map(|frame| {
                let start = frame * samples_per_frame;
                magnitude_spectrum(&samples[start..start + window_size])
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        let mut data = Array2::from_shape_vec((frame_count, window_size), rows.concat())
            .map_err(|e| CochleaError::InvalidParameter(e.to_string()))?;

        // Phase 2: one shared normalization
        let max = data.iter().fold(0.0f64, |m, &v| m.max(v));
        if max > 0.0 {
            data.mapv_inplace(|v| v / max);
        } else {
            log::warn!("spectrogram of {} frames is silent; leaving all bins at 0", frame_count);
        }

        Ok(Self {
            data,
            samples_per_frame,
        })
    }

    pub fn frame_count(&self) -> usize {
        self.data.nrows()
    }

    pub fn bin_count(&self) -> usize {
        self.data.ncols()
    }

    pub fn samples_per_frame(&self) -> usize {
        self.samples_per_frame
    }

    pub fn get(&self, frame: usize, bin: usize) -> Option<f64> {
        self.data.get((frame, bin)).copied()
    }

    /// All bins of one frame
    pub fn frame(&self, frame: usize) -> Option<ArrayView1<'_, f64>> {
        (frame < self.frame_count()).then(|| self.data.row(frame))
    }

    pub fn max(&self) -> f64 {
        self.data.iter().fold(0.0f64, |m, &v| m.max(v))
    }

    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    pub fn into_array(self) -> Array2<f64> {
        self.data
    }
}

/// `[frame_count][window_size]` normalized magnitudes
pub fn make_spectrogram(
    samples: &[i16],
    sample_rate: f64,
    frame_rate: f64,
    frame_count: usize,
    window_size: usize,
) -> Result<Array2<f64>> {
    Spectrogram::new(samples, sample_rate, frame_rate, frame_count, window_size)
        .map(Spectrogram::into_array)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::tone::sine_tone;

    #[test]
    fn test_bin_aligned_tone_peaks_in_its_bin() {
        // 500 Hz is exactly bin 16 of a 256-point FFT at 8 kHz
        let samples = sine_tone(2400, 500.0, 8000.0, 0.0).unwrap();
        let spectrogram = Spectrogram::new(&samples, 8000.0, 10.0, 3, 256).unwrap();

        assert_eq!(spectrogram.frame_count(), 3);
        assert_eq!(spectrogram.bin_count(), 256);
        assert_eq!(spectrogram.samples_per_frame(), 800);
        assert!((spectrogram.max() - 1.0).abs() < 1e-12);

        for f in 0..3 {
            let row = spectrogram.frame(f).unwrap();
            let peak = (0..128)
                .max_by(|&a, &b| row[a].partial_cmp(&row[b]).unwrap())
                .unwrap();
            assert_eq!(peak, 16);
            assert!(row[16] > 0.99);
        }
    }

    #[test]
    fn test_normalization_is_global() {
        let mut samples = vec![1000i16; 8];
        samples.extend(vec![10i16; 8]);
        let spectrogram = Spectrogram::new(&samples, 80.0, 10.0, 2, 8).unwrap();

        assert!((spectrogram.get(0, 0).unwrap() - 1.0).abs() < 1e-12);
        assert!((spectrogram.get(1, 0).unwrap() - 0.01).abs() < 1e-12);
        assert!(spectrogram.as_array().iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_samples_per_frame_rounds() {
        let samples = vec![1i16; 4096];
        let spectrogram = Spectrogram::new(&samples, 8000.0, 30.0, 2, 256).unwrap();
        assert_eq!(spectrogram.samples_per_frame(), 267);
        let spectrogram = Spectrogram::new(&samples, 8000.0, 15.0, 2, 256).unwrap();
        assert_eq!(spectrogram.samples_per_frame(), 533);
    }

    #[test]
    fn test_underrun_rejected() {
        let samples = vec![0i16; 1855];
        let err = Spectrogram::new(&samples, 8000.0, 10.0, 3, 256).unwrap_err();
        assert!(matches!(
            err,
            CochleaError::SampleUnderrun { needed: 1856, available: 1855 }
        ));
    }

    #[test]
    fn test_window_must_be_power_of_two() {
        let samples = vec![0i16; 1000];
        assert!(matches!(
            make_spectrogram(&samples, 8000.0, 10.0, 1, 100),
            Err(CochleaError::NotPowerOfTwo(100))
        ));
    }

    #[test]
    fn test_silence_stays_finite() {
        let samples = vec![0i16; 64];
        let spectrogram = make_spectrogram(&samples, 80.0, 10.0, 2, 16).unwrap();
        assert!(spectrogram.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_extreme_frame_rate_is_an_error() {
        let samples = vec![0i16; 64];
        assert!(matches!(
            Spectrogram::new(&samples, 44100.0, 1e-20, 2, 16),
            Err(CochleaError::InvalidParameter(_))
        ));
        assert!(matches!(
            Spectrogram::new(&samples, 1e300, 1e-300, 2, 16),
            Err(CochleaError::InvalidParameter(_))
        ));
        // one frame never hops, so a huge hop is harmless
        assert_eq!(frame_layout(44100.0, 1e-9, 1, 16).unwrap().1, 16);
    }

    #[test]
    fn test_non_finite_rates_rejected() {
        let samples = vec![0i16; 64];
        for (sample_rate, frame_rate) in [
            (f64::NAN, 10.0),
            (80.0, f64::NAN),
            (f64::INFINITY, 10.0),
            (80.0, f64::INFINITY),
            (80.0, 0.0),
            (-80.0, 10.0),
        ] {
            assert!(matches!(
                Spectrogram::new(&samples, sample_rate, frame_rate, 2, 16),
                Err(CochleaError::InvalidParameter(_))
            ));
        }
    }
}
