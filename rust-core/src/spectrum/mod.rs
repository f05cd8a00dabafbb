//! Spectral analysis with FFT

pub mod analysis;
pub mod binning;
pub mod fft;
pub mod phase;
pub mod welch;
pub mod windowing;

pub use analysis::{
    compute_phase_spectrum, compute_spectrum, Averaging, PhaseConfig, PhaseSpectralResult,
    SpectralResult, SpectrumAnalyzer, SpectrumConfig, SpectrumMetadata,
};
pub use binning::log_bin;
pub use fft::{rfft_frequencies, FftEngine};
pub use phase::unwrap_phase;
pub use welch::{welch, WelchEstimate, WelchScaling};
pub use windowing::{apply_window, SegmentWindow};
