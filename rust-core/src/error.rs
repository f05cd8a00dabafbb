//! Error types for spectral computation and annotation input

use thiserror::Error;

use crate::spectrum::Averaging;

/// Failure of a single spectrum computation or lookup.
///
/// Every variant is local to one (source, signal) trace: batch callers log it
/// and move on to the next trace.
#[derive(Error, Debug)]
pub enum SpectralError {
    #[error("input table is empty")]
    EmptyInput,

    #[error("missing required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("non-numeric data found in column '{0}'")]
    NonNumeric(String),

    #[error("not enough valid data points for spectral analysis (found {found}, need at least 2)")]
    InsufficientData { found: usize },

    #[error("invalid sampling interval {0} (time column must be increasing)")]
    InvalidSampling(f64),

    #[error("unknown averaging method '{0}'")]
    UnknownAveraging(String),

    #[error("unknown window '{0}'")]
    UnknownWindow(String),

    #[error("window length must be at least 1")]
    InvalidWindowLength,

    #[error("phase is only available for the unaveraged transform (requested with {0} averaging)")]
    UnsupportedPhase(Averaging),

    #[error("frequency and magnitude arrays must have the same length ({freq} != {magnitude})")]
    LengthMismatch { freq: usize, magnitude: usize },

    #[error("query frequency must be finite and non-negative (got {0})")]
    InvalidQuery(f64),

    #[error("FFT processing failed: {0}")]
    Fft(#[from] realfft::FftError),
}

/// Rejected user input for the annotation list. Existing annotations are
/// never modified when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnnotationError {
    #[error("no frequencies given")]
    EmptyFrequencies,

    #[error("invalid frequency format '{0}'. Use comma-separated numbers.")]
    InvalidFrequency(String),

    #[error("frequency must be finite and non-negative (got {0})")]
    OutOfRange(f64),

    #[error("rotor speed must be a positive number of RPM (got {0})")]
    InvalidRotorSpeed(f64),

    #[error("no annotation at index {index} (list has {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

pub type Result<T, E = SpectralError> = std::result::Result<T, E>;
