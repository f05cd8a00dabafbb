//! Windowing of time-domain segments before the FFT

use crate::error::Result;
use crate::windows::{generate_window, WindowKind};

/// Segment window with its normalization sums precomputed
#[derive(Debug, Clone)]
pub struct SegmentWindow {
    kind: WindowKind,
    coefficients: Vec<f64>,
    sum: f64,
    sum_sq: f64,
}

impl SegmentWindow {
    pub fn new(kind: WindowKind, length: usize) -> Result<Self> {
        let coefficients = generate_window(kind, length)?;
        let sum = coefficients.iter().sum();
        let sum_sq = coefficients.iter().map(|&w| w * w).sum();

        Ok(Self {
            kind,
            coefficients,
            sum,
            sum_sq,
        })
    }

    pub fn kind(&self) -> WindowKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    /// Σw
    pub fn sum(&self) -> f64 {
        self.sum
    }

    /// Σw²
    pub fn sum_sq(&self) -> f64 {
        self.sum_sq
    }

    /// Apply to a segment of the same length
    pub fn apply(&self, segment: &[f64]) -> Vec<f64> {
        apply_window(segment, &self.coefficients)
    }
}

/// Multiply a signal by window coefficients sample by sample
///
/// The output is as long as the shorter of the two inputs.
pub fn apply_window(signal: &[f64], window: &[f64]) -> Vec<f64> {
    signal
        .iter()
        .zip(window.iter())
        .map(|(&s, &w)| s * w)
        .collect()
}
