//! Peak detection and cross-trace correlation

pub mod correlate;
pub mod detect;

pub use correlate::{
    CachedTrace, CorrelatorConfig, PeakRecord, PeakTable, SpectrumCache, TraceId,
};
pub use detect::{find_peaks, PeakCriteria, PeakProperties, PeakSet};
