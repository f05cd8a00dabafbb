//! Analysis session
//!
//! Owns everything that outlives a single computation: the spectrum cache
//! used for correlation, the peak comparison table, the annotation list and
//! the user's transform settings. Settings and annotations are written back
//! to the preference store whenever they change.

use log::{debug, warn};

use crate::annotations::{Annotation, AnnotationStore, DEFAULT_HARMONIC_ORDERS};
use crate::error::{AnnotationError, Result, SpectralError};
use crate::peaks::{
    CorrelatorConfig, PeakCriteria, PeakRecord, PeakSet, PeakTable, SpectrumCache, TraceId,
};
use crate::series::{SampleTable, TimeRange};
use crate::settings::{PreferenceStore, Preferences, TransformSettings};
use crate::spectrum::{compute_phase_spectrum, compute_spectrum, SpectralResult};

/// A named data source handed to a batch
pub type Source<'a> = (&'a str, &'a dyn SampleTable);

/// Outcome of computing many traces at once
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Computed spectra in (source, signal) order
    pub results: Vec<(TraceId, SpectralResult)>,
    /// Traces that failed, with the reason
    pub skipped: Vec<(TraceId, SpectralError)>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.skipped.is_empty()
    }
}

pub struct AnalysisSession {
    preferences: Preferences,
    cache: SpectrumCache,
    peaks: PeakTable,
    annotations: AnnotationStore,
    store: Box<dyn PreferenceStore>,
}

impl AnalysisSession {
    /// Open a session with preferences read from `store`
    pub fn new(store: Box<dyn PreferenceStore>) -> Self {
        Self::with_correlator(store, CorrelatorConfig::default())
    }

    pub fn with_correlator(store: Box<dyn PreferenceStore>, correlator: CorrelatorConfig) -> Self {
        let preferences = Preferences::load_from(store.as_ref());
        let annotations = AnnotationStore::from_annotations(preferences.annotations.clone());

        Self {
            preferences,
            cache: SpectrumCache::new(),
            peaks: PeakTable::new(correlator),
            annotations,
            store,
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn settings(&self) -> &TransformSettings {
        &self.preferences.transform
    }

    pub fn update_settings(&mut self, settings: TransformSettings) {
        self.preferences.transform = settings;
        self.persist();
    }

    pub fn cache(&self) -> &SpectrumCache {
        &self.cache
    }

    pub fn peaks(&self) -> &PeakTable {
        &self.peaks
    }

    pub fn annotations(&self) -> &[Annotation] {
        self.annotations.annotations()
    }

    /// Compute magnitude spectra for every (source, signal) pair.
    ///
    /// The cache is replaced by this batch. A trace that fails is logged and
    /// reported in [`BatchReport::skipped`]; the rest still run.
    pub fn compute_batch(
        &mut self,
        sources: &[Source<'_>],
        signals: &[&str],
        time_column: &str,
        range: TimeRange,
    ) -> BatchReport {
        let config = self.preferences.transform.spectrum_config();
        self.run_batch(sources, signals, |table, signal| {
            compute_spectrum(table, signal, time_column, range, &config)
        })
    }

    /// Compute direct-transform spectra with unwrapped phase for every
    /// (source, signal) pair
    pub fn compute_phase_batch(
        &mut self,
        sources: &[Source<'_>],
        signals: &[&str],
        time_column: &str,
        range: TimeRange,
    ) -> BatchReport {
        let config = self.preferences.transform.phase_config();
        self.run_batch(sources, signals, |table, signal| {
            compute_phase_spectrum(table, signal, time_column, range, &config).map(Into::into)
        })
    }

    fn run_batch<F>(&mut self, sources: &[Source<'_>], signals: &[&str], compute: F) -> BatchReport
    where
        F: Fn(&dyn SampleTable, &str) -> Result<SpectralResult>,
    {
        self.cache.clear();
        let mut report = BatchReport::default();

        for &(source, table) in sources {
            for &signal in signals {
                let id = TraceId::new(signal, source);
                match compute(table, signal) {
                    Ok(result) => {
                        self.cache.insert(id.clone(), result.clone());
                        report.results.push((id, result));
                    }
                    Err(e) => {
                        warn!("skipping {id}: {e}");
                        report.skipped.push((id, e));
                    }
                }
            }
        }

        debug!(
            "batch computed {} traces, skipped {}",
            report.results.len(),
            report.skipped.len()
        );
        report
    }

    /// Correlate a clicked frequency across every cached trace
    pub fn select_frequency(&mut self, frequency: f64) -> Result<Vec<PeakRecord>> {
        self.peaks.correlate(frequency, &self.cache)
    }

    /// Detect peaks on the strongest trace and correlate them
    pub fn detect_peaks(&mut self, criteria: &PeakCriteria) -> Result<PeakSet> {
        self.peaks.auto_detect(&self.cache, criteria)
    }

    pub fn remove_peak(&mut self, index: usize) -> Option<PeakRecord> {
        self.peaks.remove(index)
    }

    pub fn remove_peak_group(&mut self, label: &str) -> usize {
        self.peaks.remove_group(label)
    }

    pub fn clear_peaks(&mut self) {
        self.peaks.clear();
    }

    /// Add annotations from comma-separated text
    pub fn add_annotations(
        &mut self,
        freq_text: &str,
        label_text: Option<&str>,
    ) -> Result<usize, AnnotationError> {
        let added = self.annotations.add_text(freq_text, label_text)?;
        self.persist();
        Ok(added)
    }

    /// Add rotor harmonics; `None` uses the default orders
    pub fn add_harmonics(&mut self, rpm: f64, orders: Option<&[u32]>) -> Result<usize, AnnotationError> {
        let added = self
            .annotations
            .add_harmonics(rpm, orders.unwrap_or(&DEFAULT_HARMONIC_ORDERS))?;
        self.persist();
        Ok(added)
    }

    pub fn remove_annotation(&mut self, index: usize) -> Result<Annotation, AnnotationError> {
        let removed = self.annotations.remove(index)?;
        self.persist();
        Ok(removed)
    }

    pub fn clear_annotations(&mut self) {
        self.annotations.clear();
        self.persist();
    }

    fn persist(&mut self) {
        self.preferences.annotations = self.annotations.annotations().to_vec();
        if let Err(e) = self.preferences.save_to(self.store.as_mut()) {
            warn!("could not save preferences: {e}");
        }
    }
}
