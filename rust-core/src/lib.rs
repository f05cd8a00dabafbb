//! Spectrum Correlator - spectral analysis and peak correlation core
//!
//! Turns sampled engineering signals into magnitude (and phase) spectra,
//! then lines up features across many (signal, source) traces: a queried
//! frequency becomes one comparison row per trace. Python bindings are
//! available behind the `python` feature.

// Suppress PyO3 non-local impl warnings (harmless macro-generated code)
#![cfg_attr(feature = "python", allow(non_local_definitions))]

pub mod annotations;
pub mod error;
pub mod naming;
pub mod peaks;
pub mod series;
pub mod session;
pub mod settings;
pub mod spectrum;
pub mod windows;

#[cfg(feature = "python")]
pub mod python_bindings;

pub use annotations::{add_annotations, generate_harmonics, Annotation, AnnotationStore};
pub use error::{AnnotationError, SpectralError};
pub use peaks::{find_peaks, PeakCriteria, PeakRecord, PeakTable, SpectrumCache, TraceId};
pub use series::{Column, DataTable, SampleTable, TimeRange};
pub use session::{AnalysisSession, BatchReport};
pub use settings::{MemoryStore, PreferenceStore, Preferences, TransformSettings};
pub use spectrum::{
    compute_phase_spectrum, compute_spectrum, Averaging, PhaseConfig, SpectralResult,
    SpectrumConfig,
};
pub use windows::{generate_window, WindowKind};
