//! # Pitch Detection Module
//!
//! Picks the dominant musical peak out of a magnitude spectrum.
//!
//! ## Features
//! - Band limit to 80 Hz - 2 kHz (instrument fundamentals; skips hum and hiss)
//! - Adaptive noise threshold at twice the mean band magnitude
//! - Parabolic interpolation for sub-bin accuracy

use tracing::debug;

use crate::fft::Spectrum;

/// Lowest fundamental considered, in Hz.
pub const MIN_FREQUENCY: f32 = 80.0;
/// Highest fundamental considered, in Hz.
pub const MAX_FREQUENCY: f32 = 2000.0;
/// Absolute floor for the peak threshold.
pub const NOISE_FLOOR: f32 = 0.001;

/// True for frequencies strictly inside the musical band.
pub fn is_valid_frequency(freq: f32) -> bool {
    freq > MIN_FREQUENCY && freq < MAX_FREQUENCY
}

/// Finds the strongest in-band peak and converts it to Hz.
///
/// # Arguments
/// * `magnitudes` - First half of a magnitude spectrum (`fft_size / 2` bins)
/// * `sample_rate` - Sample rate in Hz
/// * `fft_size` - Length of the transform that produced `magnitudes`
///
/// # Returns
/// * Peak frequency in Hz, or `0.0` when nothing rises above the threshold
pub fn find_peak_frequency(magnitudes: &[f32], sample_rate: f32, fft_size: usize) -> f32 {
    if magnitudes.len() < 2 || fft_size == 0 || sample_rate <= 0.0 {
        return 0.0;
    }

    let bin_width = sample_rate / fft_size as f32;
    let min_index = ((MIN_FREQUENCY * fft_size as f32 / sample_rate) as usize).max(1);
    let max_index =
        ((MAX_FREQUENCY * fft_size as f32 / sample_rate) as usize).min(magnitudes.len() - 1);
    if min_index > max_index {
        return 0.0;
    }

    let band = &magnitudes[min_index..=max_index];
    let mean = band.iter().sum::<f32>() / band.len() as f32;
    let threshold = NOISE_FLOOR.max(mean * 2.0);

    // Strict comparisons keep the earliest bin on equal magnitudes.
    let mut peak: Option<(usize, f32)> = None;
    for (offset, &mag) in band.iter().enumerate() {
        if mag > threshold && peak.is_none_or(|(_, best)| mag > best) {
            peak = Some((min_index + offset, mag));
        }
    }

    let Some((peak_index, _)) = peak else {
        return 0.0;
    };

    let frequency = peak_index as f32 * bin_width;

    if peak_index > min_index && peak_index < max_index {
        let y1 = magnitudes[peak_index - 1];
        let y2 = magnitudes[peak_index];
        let y3 = magnitudes[peak_index + 1];

        let a = (y1 - 2.0 * y2 + y3) / 2.0;
        let b = (y3 - y1) / 2.0;

        if a != 0.0 {
            let offset = -b / (2.0 * a);
            let refined = frequency + offset * bin_width;
            if is_valid_frequency(refined) {
                return refined;
            }
        }
    }

    frequency
}

/// Windowed-FFT pitch detector for a fixed window size.
#[derive(Debug)]
pub struct SpectralAnalyzer {
    spectrum: Spectrum,
}

impl SpectralAnalyzer {
    /// Creates an analyzer for windows of `window_size` samples.
    pub fn new(window_size: usize) -> Self {
        Self {
            spectrum: Spectrum::new(window_size),
        }
    }

    pub fn window_size(&self) -> usize {
        self.spectrum.size()
    }

    /// Returns the dominant frequency of `window` in Hz, `0.0` if none.
    ///
    /// The result is not range-gated beyond the search band; callers decide
    /// whether a value outside (80, 2000) Hz replaces a previous detection.
    pub fn analyze(&mut self, window: &[f32], sample_rate: f32) -> f32 {
        let fft_size = self.spectrum.size();
        let Some(magnitudes) = self.spectrum.compute(window) else {
            debug!(
                got = window.len(),
                expected = fft_size,
                "analysis window has the wrong length"
            );
            return 0.0;
        };
        find_peak_frequency(magnitudes, sample_rate, fft_size)
    }

    /// Spectrum of the last analyzed window.
    pub fn magnitudes(&self) -> &[f32] {
        self.spectrum.magnitudes()
    }

    /// Frequency spacing between bins for the given sample rate.
    pub fn bin_width(&self, sample_rate: f32) -> f32 {
        sample_rate / self.spectrum.size() as f32
    }
}
