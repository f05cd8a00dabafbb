//! Peak detection on a magnitude spectrum
//!
//! Local maxima (plateaus report their midpoint), then filtered in the order
//! height, threshold, prominence, width. Widths are measured in samples at
//! half the peak's prominence.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpectralError};

/// Default minimum prominence
pub const DEFAULT_PROMINENCE: f64 = 0.1;

/// Height of the width measurement, relative to the prominence
const REL_HEIGHT: f64 = 0.5;

/// Minimum values a peak must reach; `None` disables a filter
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeakCriteria {
    pub prominence: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub threshold: Option<f64>,
}

impl Default for PeakCriteria {
    fn default() -> Self {
        Self {
            prominence: Some(DEFAULT_PROMINENCE),
            width: None,
            height: None,
            threshold: None,
        }
    }
}

/// Per-peak properties, present when the matching filter ran
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeakProperties {
    pub peak_heights: Option<Vec<f64>>,
    pub left_thresholds: Option<Vec<f64>>,
    pub right_thresholds: Option<Vec<f64>>,
    pub prominences: Option<Vec<f64>>,
    pub left_bases: Option<Vec<usize>>,
    pub right_bases: Option<Vec<usize>>,
    pub widths: Option<Vec<f64>>,
}

/// Detected peaks, all vectors aligned
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PeakSet {
    pub indices: Vec<usize>,
    pub frequencies: Vec<f64>,
    pub magnitudes: Vec<f64>,
    pub properties: PeakProperties,
}

impl PeakSet {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
struct Prominence {
    value: f64,
    left_base: usize,
    right_base: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    index: usize,
    thresholds: (f64, f64),
    prominence: Option<Prominence>,
    width: Option<f64>,
}

/// Find peaks in `magnitude` and report them against `freq`
///
/// # Arguments
/// * `freq` - Frequency axis
/// * `magnitude` - Values to search, same length as `freq`
/// * `criteria` - Minimum prominence, width, height and threshold
pub fn find_peaks(freq: &[f64], magnitude: &[f64], criteria: &PeakCriteria) -> Result<PeakSet> {
    if freq.len() != magnitude.len() {
        return Err(SpectralError::LengthMismatch {
            freq: freq.len(),
            magnitude: magnitude.len(),
        });
    }
    if magnitude.is_empty() {
        return Ok(PeakSet::default());
    }

    let x = magnitude;
    let mut candidates: Vec<Candidate> = local_maxima(x)
        .into_iter()
        .map(|index| Candidate {
            index,
            thresholds: (x[index] - x[index - 1], x[index] - x[index + 1]),
            prominence: None,
            width: None,
        })
        .collect();

    if let Some(min_height) = criteria.height {
        candidates.retain(|c| x[c.index] >= min_height);
    }

    if let Some(min_threshold) = criteria.threshold {
        candidates.retain(|c| c.thresholds.0.min(c.thresholds.1) >= min_threshold);
    }

    let needs_prominence = criteria.prominence.is_some() || criteria.width.is_some();
    if needs_prominence {
        for candidate in &mut candidates {
            candidate.prominence = Some(prominence(x, candidate.index));
        }
    }

    if let Some(min_prominence) = criteria.prominence {
        candidates.retain(|c| c.prominence.map_or(false, |p| p.value >= min_prominence));
    }

    if let Some(min_width) = criteria.width {
        for candidate in &mut candidates {
            candidate.width = candidate.prominence.map(|p| width(x, candidate.index, p));
        }
        candidates.retain(|c| c.width.map_or(false, |w| w >= min_width));
    }

    let properties = PeakProperties {
        peak_heights: criteria.height.map(|_| column(&candidates, |c| x[c.index])),
        left_thresholds: criteria.threshold.map(|_| column(&candidates, |c| c.thresholds.0)),
        right_thresholds: criteria.threshold.map(|_| column(&candidates, |c| c.thresholds.1)),
        prominences: needs_prominence.then(|| {
            column(&candidates, |c| c.prominence.map_or(f64::NAN, |p| p.value))
        }),
        left_bases: needs_prominence.then(|| {
            column(&candidates, |c| c.prominence.map_or(c.index, |p| p.left_base))
        }),
        right_bases: needs_prominence.then(|| {
            column(&candidates, |c| c.prominence.map_or(c.index, |p| p.right_base))
        }),
        widths: criteria
            .width
            .map(|_| column(&candidates, |c| c.width.unwrap_or(f64::NAN))),
    };

    Ok(PeakSet {
        indices: candidates.iter().map(|c| c.index).collect(),
        frequencies: candidates.iter().map(|c| freq[c.index]).collect(),
        magnitudes: candidates.iter().map(|c| x[c.index]).collect(),
        properties,
    })
}

fn column<T>(candidates: &[Candidate], f: impl Fn(&Candidate) -> T) -> Vec<T> {
    candidates.iter().map(f).collect()
}

/// Indices of local maxima; a flat top reports its midpoint (rounded down)
fn local_maxima(x: &[f64]) -> Vec<usize> {
    let mut peaks = Vec::new();
    if x.len() < 3 {
        return peaks;
    }

    let last = x.len() - 1;
    let mut i = 1;
    while i < last {
        if x[i - 1] < x[i] {
            let mut ahead = i + 1;
            while ahead < last && x[ahead] == x[i] {
                ahead += 1;
            }
            if x[ahead] < x[i] {
                peaks.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    peaks
}

/// Prominence of the peak at `peak` and the bases it is measured from
fn prominence(x: &[f64], peak: usize) -> Prominence {
    let top = x[peak];

    let mut left_base = peak;
    let mut left_min = top;
    for i in (0..=peak).rev() {
        if x[i] > top {
            break;
        }
        if x[i] < left_min {
            left_min = x[i];
            left_base = i;
        }
    }

    let mut right_base = peak;
    let mut right_min = top;
    for i in peak..x.len() {
        if x[i] > top {
            break;
        }
        if x[i] < right_min {
            right_min = x[i];
            right_base = i;
        }
    }

    Prominence {
        value: top - left_min.max(right_min),
        left_base,
        right_base,
    }
}

/// Width in samples at `REL_HEIGHT` of the prominence, linearly interpolated
fn width(x: &[f64], peak: usize, prominence: Prominence) -> f64 {
    let height = x[peak] - prominence.value * REL_HEIGHT;

    let mut i = peak;
    while prominence.left_base < i && height < x[i] {
        i -= 1;
    }
    let mut left_ip = i as f64;
    if x[i] < height {
        left_ip += (height - x[i]) / (x[i + 1] - x[i]);
    }

    let mut i = peak;
    while i < prominence.right_base && height < x[i] {
        i += 1;
    }
    let mut right_ip = i as f64;
    if x[i] < height {
        right_ip -= (height - x[i]) / (x[i - 1] - x[i]);
    }

    right_ip - left_ip
}
