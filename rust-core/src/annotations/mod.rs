//! Frequency annotations

pub mod harmonics;
pub mod store;

pub use harmonics::{generate_harmonics, DEFAULT_HARMONIC_ORDERS};
pub use store::{add_annotations, Annotation, AnnotationStore};
