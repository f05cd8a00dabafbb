//! Cross-trace peak correlation
//!
//! A queried frequency is looked up on every cached trace. Each trace that
//! has a sample close enough contributes one record, and all records from
//! one query share a frequency label. Querying the same label again replaces
//! the whole group, so the table always holds at most one row per trace and
//! label.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use super::detect::{find_peaks, PeakCriteria, PeakSet};
use crate::error::{Result, SpectralError};
use crate::spectrum::{PhaseSpectralResult, SpectralResult};

/// Default relative distance allowed between query and matched frequency
pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 0.01;

/// Default number of decimals in a frequency label
pub const DEFAULT_LABEL_PRECISION: usize = 4;

/// One (signal, source) combination
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TraceId {
    pub signal: String,
    pub source: String,
}

impl TraceId {
    pub fn new(signal: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            signal: signal.into(),
            source: source.into(),
        }
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.signal, self.source)
    }
}

/// Spectrum kept for correlation lookups
#[derive(Debug, Clone, PartialEq)]
pub struct CachedTrace {
    pub freq: Vec<f64>,
    pub magnitude: Vec<f64>,
    pub phase: Option<Vec<f64>>,
}

impl CachedTrace {
    /// Index of the sample nearest to `frequency` (first one on ties)
    pub fn nearest(&self, frequency: f64) -> Option<usize> {
        self.freq
            .iter()
            .take(self.magnitude.len())
            .map(|f| (f - frequency).abs())
            .enumerate()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(index, _)| index)
    }

    /// Largest magnitude, NaN samples ignored
    pub fn peak_magnitude(&self) -> Option<f64> {
        self.magnitude
            .iter()
            .copied()
            .filter(|m| !m.is_nan())
            .max_by(f64::total_cmp)
    }
}

impl From<SpectralResult> for CachedTrace {
    fn from(result: SpectralResult) -> Self {
        Self {
            freq: result.freq,
            magnitude: result.magnitude,
            phase: result.phase,
        }
    }
}

impl From<PhaseSpectralResult> for CachedTrace {
    fn from(result: PhaseSpectralResult) -> Self {
        Self {
            freq: result.freq,
            magnitude: result.magnitude,
            phase: Some(result.phase),
        }
    }
}

/// Computed spectra by trace, iterated in trace order
#[derive(Debug, Clone, Default)]
pub struct SpectrumCache {
    traces: BTreeMap<TraceId, CachedTrace>,
}

impl SpectrumCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a trace, replacing any previous spectrum for the same id
    pub fn insert(&mut self, id: TraceId, trace: impl Into<CachedTrace>) {
        self.traces.insert(id, trace.into());
    }

    pub fn get(&self, id: &TraceId) -> Option<&CachedTrace> {
        self.traces.get(id)
    }

    pub fn remove(&mut self, id: &TraceId) -> Option<CachedTrace> {
        self.traces.remove(id)
    }

    pub fn clear(&mut self) {
        self.traces.clear();
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TraceId, &CachedTrace)> {
        self.traces.iter()
    }

    /// Trace holding the largest magnitude
    pub fn strongest(&self) -> Option<(&TraceId, &CachedTrace)> {
        self.traces
            .iter()
            .filter_map(|(id, trace)| trace.peak_magnitude().map(|peak| (peak, id, trace)))
            .max_by(|(a, _, _), (b, _, _)| a.total_cmp(b))
            .map(|(_, id, trace)| (id, trace))
    }
}

/// Correlation settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelatorConfig {
    pub relative_tolerance: f64,
    pub label_precision: usize,
}

impl Default for CorrelatorConfig {
    fn default() -> Self {
        Self {
            relative_tolerance: DEFAULT_RELATIVE_TOLERANCE,
            label_precision: DEFAULT_LABEL_PRECISION,
        }
    }
}

/// One trace's values at a queried frequency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakRecord {
    /// Matched frequency on the trace's own axis
    pub frequency: f64,
    pub magnitude: f64,
    pub phase: Option<f64>,
    pub trace: TraceId,
    /// Query frequency formatted to the label precision
    pub frequency_label: String,
}

/// Comparison table built from correlation queries
#[derive(Debug, Clone, Default)]
pub struct PeakTable {
    config: CorrelatorConfig,
    records: Vec<PeakRecord>,
}

impl PeakTable {
    pub fn new(config: CorrelatorConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
        }
    }

    pub fn config(&self) -> &CorrelatorConfig {
        &self.config
    }

    /// Records sorted by (frequency, trace)
    pub fn records(&self) -> &[PeakRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Group label for a query frequency
    pub fn label_for(&self, frequency: f64) -> String {
        format!("{:.*}", self.config.label_precision, frequency)
    }

    /// Look `frequency` up on every cached trace and replace its group.
    ///
    /// # Returns
    /// The new records, strongest first. When no trace matches, nothing is
    /// returned and the table is left as it was.
    pub fn correlate(&mut self, frequency: f64, cache: &SpectrumCache) -> Result<Vec<PeakRecord>> {
        if !frequency.is_finite() || frequency < 0.0 {
            return Err(SpectralError::InvalidQuery(frequency));
        }

        let label = self.label_for(frequency);
        let mut batch: Vec<PeakRecord> = cache
            .iter()
            .filter_map(|(id, trace)| self.lookup(frequency, id, trace, &label))
            .collect();

        if batch.is_empty() {
            debug!("no trace has data near {frequency} Hz");
            return Ok(batch);
        }

        batch.sort_by(|a, b| b.magnitude.total_cmp(&a.magnitude));

        self.records.retain(|r| r.frequency_label != label);
        self.records.extend(batch.iter().cloned());
        self.records.sort_by(|a, b| {
            a.frequency
                .total_cmp(&b.frequency)
                .then_with(|| a.trace.cmp(&b.trace))
        });

        Ok(batch)
    }

    fn lookup(
        &self,
        frequency: f64,
        id: &TraceId,
        trace: &CachedTrace,
        label: &str,
    ) -> Option<PeakRecord> {
        let index = trace.nearest(frequency)?;
        let matched = trace.freq[index];

        let within = if frequency == 0.0 {
            matched == 0.0
        } else {
            (matched - frequency).abs() / frequency <= self.config.relative_tolerance
        };
        if !within {
            debug!("{id}: nearest sample {matched} Hz is outside tolerance of {frequency} Hz");
            return None;
        }

        let magnitude = trace.magnitude[index];
        let phase = match &trace.phase {
            Some(phase) => Some(*phase.get(index)?),
            None => None,
        };
        if magnitude.is_nan() || phase.map_or(false, f64::is_nan) {
            debug!("{id}: no valid value at {matched} Hz");
            return None;
        }

        Some(PeakRecord {
            frequency: matched,
            magnitude,
            phase,
            trace: id.clone(),
            frequency_label: label.to_string(),
        })
    }

    /// Detect peaks on the strongest trace and correlate each of them.
    ///
    /// # Returns
    /// The peaks found on the strongest trace; empty when the cache is.
    pub fn auto_detect(&mut self, cache: &SpectrumCache, criteria: &PeakCriteria) -> Result<PeakSet> {
        let Some((id, trace)) = cache.strongest() else {
            return Ok(PeakSet::default());
        };

        let peaks = find_peaks(&trace.freq, &trace.magnitude, criteria)?;
        debug!("{} peaks detected on {id}", peaks.len());

        for &frequency in &peaks.frequencies {
            self.correlate(frequency, cache)?;
        }
        Ok(peaks)
    }

    /// Remove one record by position
    pub fn remove(&mut self, index: usize) -> Option<PeakRecord> {
        (index < self.records.len()).then(|| self.records.remove(index))
    }

    /// Remove every record of a group, returning how many went
    pub fn remove_group(&mut self, label: &str) -> usize {
        let before = self.records.len();
        self.records.retain(|r| r.frequency_label != label);
        before - self.records.len()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Distinct labels in table order
    pub fn groups(&self) -> Vec<&str> {
        let mut groups: Vec<&str> = Vec::new();
        for record in &self.records {
            if !groups.contains(&record.frequency_label.as_str()) {
                groups.push(&record.frequency_label);
            }
        }
        groups
    }
}
