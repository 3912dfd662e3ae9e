//! Audio front end: tones, windowing, FFT and spectrograms.
//!
//! Raw samples become per-frame, per-bin amplitudes in [0, 1]; bin `i` of
//! frame `f` is what a sensory neuron receives at frame `f`.

pub mod fft;
pub mod spectrogram;
pub mod tone;
pub mod window;

pub use fft::{fft, magnitude_spectrum, magnitudes};
pub use spectrogram::{frame_layout, make_spectrogram, Spectrogram};
pub use tone::{sine_tone, tone_sequence, C_MAJOR_SCALE};
pub use window::{tukey, tukey_window};
