//! Welch averaged periodogram
//!
//! Overlapping windowed segments (50 % overlap), one periodogram each,
//! averaged. Trades frequency resolution for a much smoother estimate.

use ndarray::{s, Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use super::fft::{rfft_frequencies, FftEngine};
use super::windowing::SegmentWindow;
use crate::error::Result;
use crate::series::detrend_linear;
use crate::windows::WindowKind;

/// Segment length exponent used when the caller gives none
pub const DEFAULT_SEGMENT_EXP: u32 = 8;

/// Output scaling of the averaged periodogram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WelchScaling {
    /// Amplitude spectral density, sqrt(PSD)
    #[default]
    Density,
    /// Averaged power spectrum, reported as-is
    Spectrum,
}

/// Welch estimate on a uniform frequency axis
#[derive(Debug, Clone)]
pub struct WelchEstimate {
    pub freq: Vec<f64>,
    pub amplitude: Vec<f64>,
    /// Segment length actually used
    pub nperseg: usize,
    /// Number of segments averaged
    pub segments: usize,
}

/// Segment length for a series of `n` samples: `min(2^n_exp, n/2)`, at
/// least 1
pub fn segment_length(n: usize, n_exp: Option<u32>) -> usize {
    let cap = 1usize
        .checked_shl(n_exp.unwrap_or(DEFAULT_SEGMENT_EXP))
        .unwrap_or(usize::MAX);
    cap.min(n / 2).max(1)
}

/// Compute a Welch estimate
///
/// # Arguments
/// * `values` - Uniformly sampled signal
/// * `dt` - Sampling interval in seconds
/// * `nperseg` - Segment length (clamped to the signal length)
/// * `window` - Window applied to every segment
/// * `detrend` - Remove a linear trend from each segment before windowing
/// * `scaling` - Density or power spectrum output
pub fn welch(
    values: &[f64],
    dt: f64,
    nperseg: usize,
    window: WindowKind,
    detrend: bool,
    scaling: WelchScaling,
) -> Result<WelchEstimate> {
    let nperseg = nperseg.min(values.len()).max(1);
    let noverlap = nperseg / 2;
    let step = nperseg - noverlap;
    let segments = values.len().saturating_sub(noverlap) / step;

    let window = SegmentWindow::new(window, nperseg)?;
    let mut engine = FftEngine::new(nperseg);
    let mut accumulated = Array1::<f64>::zeros(engine.num_bins());

    for start in (0..segments).map(|k| k * step) {
        let mut segment = values[start..start + nperseg].to_vec();
        if detrend {
            detrend_linear(&mut segment);
        }
        let power = engine.compute_power(&window.apply(&segment))?;
        accumulated += &ArrayView1::from(power.as_slice());
    }

    let fs = 1.0 / dt;
    let scale = match scaling {
        WelchScaling::Density => 1.0 / (fs * window.sum_sq()),
        WelchScaling::Spectrum => 1.0 / (window.sum() * window.sum()),
    };
    accumulated *= scale / segments.max(1) as f64;

    // One-sided: fold negative frequencies in, except DC and (even sizes) Nyquist
    let last = accumulated.len();
    let folded_end = if nperseg % 2 == 0 { last - 1 } else { last };
    if folded_end > 1 {
        accumulated
            .slice_mut(s![1..folded_end])
            .mapv_inplace(|p| p * 2.0);
    }

    let amplitude = match scaling {
        WelchScaling::Density => accumulated.mapv(f64::sqrt),
        WelchScaling::Spectrum => accumulated,
    };

    Ok(WelchEstimate {
        freq: rfft_frequencies(nperseg, dt),
        amplitude: amplitude.to_vec(),
        nperseg,
        segments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::f64::consts::PI;

    #[test]
    fn test_segment_length() {
        assert_eq!(segment_length(4096, None), 256);
        assert_eq!(segment_length(4096, Some(10)), 1024);
        assert_eq!(segment_length(300, Some(12)), 150);
        assert_eq!(segment_length(2, None), 1);
        assert_eq!(segment_length(4096, Some(200)), 2048);
    }

    #[test]
    fn test_segment_count_with_half_overlap() {
        let values = vec![0.0; 1024];
        let estimate = welch(&values, 0.01, 256, WindowKind::Hann, false, WelchScaling::Density).unwrap();
        assert_eq!(estimate.nperseg, 256);
        assert_eq!(estimate.segments, 7);
        assert_eq!(estimate.freq.len(), 129);
        assert_eq!(estimate.amplitude.len(), 129);
    }

    #[test]
    fn test_white_noise_density_level() {
        // Unit-variance white noise has a one-sided PSD of 2/fs
        let fs = 100.0;
        let mut rng = StdRng::seed_from_u64(7);
        let bound = 3f64.sqrt();
        let values: Vec<f64> = (0..65536).map(|_| rng.random_range(-bound..bound)).collect();

        let estimate = welch(&values, 1.0 / fs, 256, WindowKind::Hann, false, WelchScaling::Density).unwrap();
        let interior = &estimate.amplitude[5..120];
        let mean_psd = interior.iter().map(|a| a * a).sum::<f64>() / interior.len() as f64;
        assert!((mean_psd - 2.0 / fs).abs() < 0.1 * 2.0 / fs, "mean PSD {mean_psd}");
    }

    #[test]
    fn test_tone_power_with_spectrum_scaling() {
        // A bin-centred tone of amplitude A has power A²/2 under spectrum scaling
        let n = 2048;
        let dt = 1.0 / 256.0;
        let values: Vec<f64> = (0..n)
            .map(|i| 2.0 * (2.0 * PI * 32.0 * i as f64 * dt).cos())
            .collect();

        let estimate = welch(&values, dt, 256, WindowKind::Rectangular, false, WelchScaling::Spectrum).unwrap();
        let bin = estimate.freq.iter().position(|&f| (f - 32.0).abs() < 1e-9).unwrap();
        assert!((estimate.amplitude[bin] - 2.0).abs() < 1e-9);
    }
}
