//! # Fast Fourier Transform (FFT) Module
//!
//! Turns one analysis window into a magnitude spectrum. The FFT plan, the Hann
//! coefficients and every working buffer are created once per `Spectrum` and
//! reused for each call, so steady-state analysis does not allocate.
//!
//! ## Features
//! - High-performance FFT using RustFFT
//! - Hann windowing for reduced spectral leakage
//! - `W/2` magnitude bins, bin `i` at `i * sample_rate / W`

use std::sync::Arc;

use rustfft::{Fft, FftPlanner, num_complex::Complex};

/// Computes the Hann window coefficients for a frame of `n` samples.
///
/// Uses the symmetric form `0.5 * (1 - cos(2πi / (n - 1)))`, which is zero at
/// both edges of the frame.
pub fn hann_window(n: usize) -> Vec<f32> {
    if n < 2 {
        return vec![1.0; n];
    }
    let n_minus_1 = (n - 1) as f32;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos()))
        .collect()
}

/// Reusable windowed-FFT magnitude calculator for a fixed frame size.
pub struct Spectrum {
    size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl Spectrum {
    /// Plans a forward FFT of `size` points and allocates the work buffers.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(size);
        let scratch_len = fft.get_inplace_scratch_len();

        Self {
            size,
            fft,
            window: hann_window(size),
            buffer: vec![Complex { re: 0.0, im: 0.0 }; size],
            scratch: vec![Complex { re: 0.0, im: 0.0 }; scratch_len],
            magnitudes: vec![0.0; size / 2],
        }
    }

    /// Frame size this spectrum was planned for.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Windows `signal`, transforms it and returns the `size / 2` magnitudes.
    ///
    /// Returns `None` if `signal` is not exactly `size` samples long.
    pub fn compute(&mut self, signal: &[f32]) -> Option<&[f32]> {
        if signal.len() != self.size {
            return None;
        }

        for ((slot, &sample), &w) in self.buffer.iter_mut().zip(signal).zip(&self.window) {
            *slot = Complex { re: sample * w, im: 0.0 };
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        // Only the first half carries information for a real input.
        for (mag, c) in self.magnitudes.iter_mut().zip(&self.buffer) {
            *mag = c.norm(); // .norm() is sqrt(re^2 + im^2)
        }
        Some(&self.magnitudes)
    }

    /// Magnitudes from the most recent `compute` call (zeros before the first).
    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }
}

impl std::fmt::Debug for Spectrum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Spectrum").field("size", &self.size).finish()
    }
}
