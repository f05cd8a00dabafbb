//! FFT engine using realfft for real-valued signals
//!
//! One-sided transforms only: bins k = 0..=n/2.

use std::sync::Arc;

use num_complex::Complex;
use realfft::{RealFftPlanner, RealToComplex};

use crate::error::Result;

/// FFT engine for real-valued signals
pub struct FftEngine {
    /// FFT size (number of samples)
    fft_size: usize,

    /// Real FFT processor
    r2c: Arc<dyn RealToComplex<f64>>,

    /// Reusable input buffer (realfft uses it as scratch)
    input_buffer: Vec<f64>,

    /// Reusable output buffer (complex spectrum)
    output_buffer: Vec<Complex<f64>>,
}

impl FftEngine {
    /// Create new FFT engine
    ///
    /// # Arguments
    /// * `fft_size` - FFT size (number of samples)
    pub fn new(fft_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f64>::new();
        let r2c = planner.plan_fft_forward(fft_size);

        let input_buffer = r2c.make_input_vec();
        let output_buffer = r2c.make_output_vec();

        Self {
            fft_size,
            r2c,
            input_buffer,
            output_buffer,
        }
    }

    /// Compute the one-sided complex spectrum
    ///
    /// # Arguments
    /// * `signal` - Input signal (zero-padded if shorter than fft_size,
    ///   truncated if longer)
    ///
    /// # Returns
    /// X[k] for k = 0..=fft_size/2, borrowed from the engine's buffer
    pub fn process(&mut self, signal: &[f64]) -> Result<&[Complex<f64>]> {
        let copy_len = signal.len().min(self.fft_size);
        self.input_buffer[..copy_len].copy_from_slice(&signal[..copy_len]);
        self.input_buffer[copy_len..].fill(0.0);

        self.r2c
            .process(&mut self.input_buffer, &mut self.output_buffer)?;

        Ok(&self.output_buffer)
    }

    /// Amplitude spectrum |X[k]|·2/n
    ///
    /// A sinusoid of amplitude A that lands on a bin reads as A.
    pub fn compute_amplitude(&mut self, signal: &[f64]) -> Result<Vec<f64>> {
        let scale = 2.0 / self.fft_size as f64;
        let spectrum = self.process(signal)?;
        Ok(spectrum.iter().map(|c| c.norm() * scale).collect())
    }

    /// Unscaled power spectrum |X[k]|²
    pub fn compute_power(&mut self, signal: &[f64]) -> Result<Vec<f64>> {
        let spectrum = self.process(signal)?;
        Ok(spectrum.iter().map(|c| c.norm_sqr()).collect())
    }

    /// Amplitude (as [`compute_amplitude`](Self::compute_amplitude)) and
    /// wrapped phase angle in radians, from one transform
    pub fn compute_polar(&mut self, signal: &[f64]) -> Result<(Vec<f64>, Vec<f64>)> {
        let scale = 2.0 / self.fft_size as f64;
        let spectrum = self.process(signal)?;
        Ok(spectrum
            .iter()
            .map(|c| (c.norm() * scale, c.arg()))
            .unzip())
    }

    /// Get FFT size
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Get number of frequency bins (fft_size/2 + 1 for real FFT)
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2 + 1
    }

    /// Frequency axis in Hz for sampling interval `dt`
    pub fn frequency_axis(&self, dt: f64) -> Vec<f64> {
        rfft_frequencies(self.fft_size, dt)
    }
}

/// Bin frequencies k/(n·dt) for k = 0..=n/2
pub fn rfft_frequencies(n: usize, dt: f64) -> Vec<f64> {
    let span = n as f64 * dt;
    (0..=n / 2).map(|k| k as f64 / span).collect()
}
