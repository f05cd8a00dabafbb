//! User frequency annotations

use serde::{Deserialize, Serialize};

use super::harmonics::generate_harmonics;
use crate::error::AnnotationError;

/// Labelled marker at a frequency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "freq")]
    pub frequency: f64,
    pub label: String,
}

impl Annotation {
    pub fn new(frequency: f64, label: impl Into<String>) -> Self {
        Self {
            frequency,
            label: label.into(),
        }
    }
}

/// Sort by frequency, keeping insertion order among equal frequencies
pub(crate) fn sort_by_frequency(annotations: &mut [Annotation]) {
    annotations.sort_by(|a, b| a.frequency.total_cmp(&b.frequency));
}

/// Parse annotation text and merge it into `existing`.
///
/// `freq_text` is a comma-separated list of frequencies; blank entries are
/// ignored. `label_text` is an optional comma-separated list of labels.
/// Frequencies without a label are named `F1`, `F2`, ... after their
/// position, and surplus labels are dropped.
///
/// # Returns
/// `existing` plus the new annotations, sorted by frequency. On error nothing
/// is returned and `existing` is untouched.
pub fn add_annotations(
    freq_text: &str,
    label_text: Option<&str>,
    existing: &[Annotation],
) -> Result<Vec<Annotation>, AnnotationError> {
    let frequencies = freq_text
        .split(',')
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(|piece| {
            let frequency: f64 = piece
                .parse()
                .map_err(|_| AnnotationError::InvalidFrequency(freq_text.trim().to_string()))?;
            if frequency.is_finite() && frequency >= 0.0 {
                Ok(frequency)
            } else {
                Err(AnnotationError::OutOfRange(frequency))
            }
        })
        .collect::<Result<Vec<f64>, _>>()?;

    if frequencies.is_empty() {
        return Err(AnnotationError::EmptyFrequencies);
    }

    let labels: Vec<&str> = match label_text {
        Some(text) if !text.is_empty() => text.split(',').map(str::trim).collect(),
        _ => Vec::new(),
    };

    let mut merged = existing.to_vec();
    merged.extend(frequencies.iter().enumerate().map(|(i, &frequency)| {
        let label = labels
            .get(i)
            .map_or_else(|| format!("F{}", i + 1), |label| label.to_string());
        Annotation::new(frequency, label)
    }));
    sort_by_frequency(&mut merged);

    Ok(merged)
}

/// Annotation list kept sorted by frequency
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_annotations(mut annotations: Vec<Annotation>) -> Self {
        sort_by_frequency(&mut annotations);
        Self { annotations }
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    /// Add annotations from text, returning how many were added
    pub fn add_text(
        &mut self,
        freq_text: &str,
        label_text: Option<&str>,
    ) -> Result<usize, AnnotationError> {
        let before = self.annotations.len();
        self.annotations = add_annotations(freq_text, label_text, &self.annotations)?;
        Ok(self.annotations.len() - before)
    }

    /// Add rotor harmonics for `rpm`, returning how many were new
    pub fn add_harmonics(&mut self, rpm: f64, orders: &[u32]) -> Result<usize, AnnotationError> {
        let before = self.annotations.len();
        self.annotations = generate_harmonics(rpm, orders, &self.annotations)?;
        Ok(self.annotations.len() - before)
    }

    pub fn remove(&mut self, index: usize) -> Result<Annotation, AnnotationError> {
        if index >= self.annotations.len() {
            return Err(AnnotationError::IndexOutOfRange {
                index,
                len: self.annotations.len(),
            });
        }
        Ok(self.annotations.remove(index))
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
    }
}
