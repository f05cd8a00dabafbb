//! Rotor harmonic annotations
//!
//! Harmonic h of a rotor turning at `rpm` sits at h·rpm/60 Hz and is
//! labelled `"{h}P"`.

use super::store::{sort_by_frequency, Annotation};
use crate::error::AnnotationError;

/// Harmonic orders added when none are given
pub const DEFAULT_HARMONIC_ORDERS: [u32; 7] = [1, 2, 3, 4, 6, 8, 9];

/// Frequencies closer than this count as the same annotation
const FREQUENCY_MATCH: f64 = 1e-3;

/// Merge rotor harmonics into `existing`.
///
/// An order is skipped when an annotation with the same label already sits
/// within 1e-3 Hz of it.
pub fn generate_harmonics(
    rpm: f64,
    orders: &[u32],
    existing: &[Annotation],
) -> Result<Vec<Annotation>, AnnotationError> {
    if !rpm.is_finite() || rpm <= 0.0 {
        return Err(AnnotationError::InvalidRotorSpeed(rpm));
    }

    let base = rpm / 60.0;
    let mut merged = existing.to_vec();
    for &order in orders {
        let frequency = base * f64::from(order);
        let label = format!("{order}P");
        let exists = existing
            .iter()
            .any(|a| (a.frequency - frequency).abs() < FREQUENCY_MATCH && a.label == label);
        if !exists {
            merged.push(Annotation::new(frequency, label));
        }
    }
    sort_by_frequency(&mut merged);

    Ok(merged)
}
