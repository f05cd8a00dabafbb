//! Sample preparation ahead of the transform
//!
//! Slices to a time range, drops missing samples, truncates to a power of two
//! and derives the sampling interval.

use crate::error::{Result, SpectralError};

/// Inclusive time range; either end may be open
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimeRange {
    pub start: Option<f64>,
    pub end: Option<f64>,
}

impl TimeRange {
    pub fn new(start: Option<f64>, end: Option<f64>) -> Self {
        Self { start, end }
    }

    /// No restriction
    pub fn all() -> Self {
        Self::default()
    }

    pub fn contains(&self, t: f64) -> bool {
        self.start.map_or(true, |start| t >= start) && self.end.map_or(true, |end| t <= end)
    }
}

/// Cleaned samples ready for the transform
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedSeries {
    pub time: Vec<f64>,
    pub value: Vec<f64>,
}

impl PreparedSeries {
    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Sampling interval as the median spacing of the time axis.
    ///
    /// Fails if the median spacing is not strictly positive, which happens
    /// when most timestamps repeat.
    pub fn sampling_interval(&self) -> Result<f64> {
        let dt = median_spacing(&self.time);
        if dt.is_finite() && dt > 0.0 {
            Ok(dt)
        } else {
            Err(SpectralError::InvalidSampling(dt))
        }
    }
}

/// Prepare one series for spectral analysis.
///
/// # Arguments
/// * `time`, `value` - Raw columns (equal length)
/// * `range` - Inclusive time range to keep
/// * `n_exp` - If given, keep only the first `min(2^n_exp, len)` samples
///
/// # Returns
/// Samples inside `range` with NaN rows removed. Fails with
/// [`SpectralError::InsufficientData`] when fewer than two remain.
pub fn prepare(
    time: &[f64],
    value: &[f64],
    range: TimeRange,
    n_exp: Option<u32>,
) -> Result<PreparedSeries> {
    let (mut time, mut value): (Vec<f64>, Vec<f64>) = time
        .iter()
        .zip(value.iter())
        .filter_map(|(&t, &y)| {
            (range.contains(t) && !t.is_nan() && !y.is_nan()).then_some((t, y))
        })
        .unzip();

    if let Some(n_exp) = n_exp {
        let n_points = 1usize
            .checked_shl(n_exp)
            .map_or(value.len(), |cap| cap.min(value.len()));
        time.truncate(n_points);
        value.truncate(n_points);
    }

    if value.len() < 2 {
        return Err(SpectralError::InsufficientData { found: value.len() });
    }

    Ok(PreparedSeries { time, value })
}

/// Remove the least-squares line fitted against sample index
pub fn detrend_linear(data: &mut [f64]) {
    let n = data.len();
    if n == 0 {
        return;
    }

    let n_f = n as f64;
    let mean_x = (n_f - 1.0) * 0.5;
    let mean_y = data.iter().sum::<f64>() / n_f;

    let mut num = 0.0;
    let mut den = 0.0;
    for (i, &y) in data.iter().enumerate() {
        let x = i as f64 - mean_x;
        num += x * (y - mean_y);
        den += x * x;
    }
    let slope = if den > 0.0 { num / den } else { 0.0 };
    let intercept = mean_y - slope * mean_x;

    for (i, y) in data.iter_mut().enumerate() {
        *y -= intercept + slope * i as f64;
    }
}

/// Median of consecutive differences; NaN for fewer than two points
pub fn median_spacing(time: &[f64]) -> f64 {
    if time.len() < 2 {
        return f64::NAN;
    }

    let mut diffs: Vec<f64> = time.windows(2).map(|w| w[1] - w[0]).collect();
    diffs.sort_by(|a, b| a.total_cmp(b));

    let mid = diffs.len() / 2;
    if diffs.len() % 2 == 0 {
        (diffs[mid - 1] + diffs[mid]) / 2.0
    } else {
        diffs[mid]
    }
}
