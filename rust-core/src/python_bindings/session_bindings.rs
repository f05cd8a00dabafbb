//! Python bindings for the analysis session

use std::collections::HashMap;

use numpy::{PyArray1, PyReadonlyArray1};
use pyo3::exceptions::PyKeyError;
use pyo3::prelude::*;

use super::to_py_err;
use crate::peaks::{PeakCriteria, TraceId};
use crate::series::{Column, DataTable, SampleTable, TimeRange};
use crate::session::{AnalysisSession, Source};
use crate::settings::{MemoryStore, TransformSettings};

type PyPeakRow = (f64, f64, Option<f64>, String, String);

/// Analysis session exposed to Python
///
/// Preferences live in memory; read them with `preferences_json()` and
/// persist them wherever the application keeps its files.
#[pyclass(name = "AnalysisSession", unsendable)]
pub struct PyAnalysisSession {
    session: AnalysisSession,
    sources: Vec<(String, DataTable)>,
}

#[pymethods]
impl PyAnalysisSession {
    /// Create a session
    ///
    /// Args:
    ///     preferences_json: Previously saved preferences, if any
    #[new]
    #[pyo3(signature = (preferences_json=None))]
    fn new(preferences_json: Option<&str>) -> PyResult<Self> {
        let store = match preferences_json {
            Some(text) => MemoryStore::with_value(serde_json::from_str(text).map_err(to_py_err)?),
            None => MemoryStore::new(),
        };
        Ok(Self {
            session: AnalysisSession::new(Box::new(store)),
            sources: Vec::new(),
        })
    }

    /// Register a data source
    ///
    /// Args:
    ///     name: Display name of the source
    ///     columns: Mapping of column name to numpy array
    fn add_source(&mut self, name: String, columns: HashMap<String, PyReadonlyArray1<f64>>) -> PyResult<()> {
        let mut table = DataTable::new();
        for (column, values) in &columns {
            table.insert(column.as_str(), Column::Numeric(values.as_slice()?.to_vec()));
        }
        self.sources.retain(|(existing, _)| *existing != name);
        self.sources.push((name, table));
        Ok(())
    }

    fn clear_sources(&mut self) {
        self.sources.clear();
    }

    /// Compute spectra for every registered source and signal
    ///
    /// Returns:
    ///     Messages for traces that could not be computed
    #[pyo3(signature = (signals, time_column="Time", start_time=None, end_time=None, phase=false))]
    fn compute(
        &mut self,
        signals: Vec<String>,
        time_column: &str,
        start_time: Option<f64>,
        end_time: Option<f64>,
        phase: bool,
    ) -> Vec<String> {
        let sources: Vec<Source<'_>> = self
            .sources
            .iter()
            .map(|(name, table)| (name.as_str(), table as &dyn SampleTable))
            .collect();
        let signals: Vec<&str> = signals.iter().map(String::as_str).collect();
        let range = TimeRange::new(start_time, end_time);

        let report = if phase {
            self.session
                .compute_phase_batch(&sources, &signals, time_column, range)
        } else {
            self.session.compute_batch(&sources, &signals, time_column, range)
        };

        report
            .skipped
            .iter()
            .map(|(id, e)| format!("{id}: {e}"))
            .collect()
    }

    /// Cached (freq, magnitude) of one trace
    fn trace<'py>(
        &self,
        py: Python<'py>,
        signal: &str,
        source: &str,
    ) -> PyResult<(&'py PyArray1<f64>, &'py PyArray1<f64>)> {
        let id = TraceId::new(signal, source);
        let trace = self
            .session
            .cache()
            .get(&id)
            .ok_or_else(|| PyKeyError::new_err(id.to_string()))?;
        Ok((
            PyArray1::from_slice(py, &trace.freq),
            PyArray1::from_slice(py, &trace.magnitude),
        ))
    }

    /// Correlate a frequency across all traces; returns the number matched
    fn select_frequency(&mut self, frequency: f64) -> PyResult<usize> {
        let batch = self.session.select_frequency(frequency).map_err(to_py_err)?;
        Ok(batch.len())
    }

    /// Detect peaks on the strongest trace and correlate them
    ///
    /// Returns:
    ///     Detected frequencies
    #[pyo3(signature = (prominence=Some(0.1)))]
    fn detect_peaks(&mut self, prominence: Option<f64>) -> PyResult<Vec<f64>> {
        let criteria = PeakCriteria {
            prominence,
            ..Default::default()
        };
        let peaks = self.session.detect_peaks(&criteria).map_err(to_py_err)?;
        Ok(peaks.frequencies)
    }

    /// Peak table rows as (frequency, magnitude, phase, trace, label)
    fn peaks(&self) -> Vec<PyPeakRow> {
        self.session
            .peaks()
            .records()
            .iter()
            .map(|r| {
                (
                    r.frequency,
                    r.magnitude,
                    r.phase,
                    r.trace.to_string(),
                    r.frequency_label.clone(),
                )
            })
            .collect()
    }

    fn remove_peak(&mut self, index: usize) -> bool {
        self.session.remove_peak(index).is_some()
    }

    fn remove_peak_group(&mut self, label: &str) -> usize {
        self.session.remove_peak_group(label)
    }

    fn clear_peaks(&mut self) {
        self.session.clear_peaks();
    }

    #[pyo3(signature = (freq_text, label_text=None))]
    fn add_annotations(&mut self, freq_text: &str, label_text: Option<&str>) -> PyResult<usize> {
        self.session
            .add_annotations(freq_text, label_text)
            .map_err(to_py_err)
    }

    #[pyo3(signature = (rpm, orders=None))]
    fn add_harmonics(&mut self, rpm: f64, orders: Option<Vec<u32>>) -> PyResult<usize> {
        self.session
            .add_harmonics(rpm, orders.as_deref())
            .map_err(to_py_err)
    }

    fn remove_annotation(&mut self, index: usize) -> PyResult<()> {
        self.session.remove_annotation(index).map_err(to_py_err)?;
        Ok(())
    }

    fn clear_annotations(&mut self) {
        self.session.clear_annotations();
    }

    /// Annotations as (frequency, label)
    fn annotations(&self) -> Vec<(f64, String)> {
        self.session
            .annotations()
            .iter()
            .map(|a| (a.frequency, a.label.clone()))
            .collect()
    }

    /// Replace the transform settings from a JSON object
    fn update_settings(&mut self, settings_json: &str) -> PyResult<()> {
        let settings: TransformSettings = serde_json::from_str(settings_json).map_err(to_py_err)?;
        self.session.update_settings(settings);
        Ok(())
    }

    /// Current preferences as JSON
    fn preferences_json(&self) -> PyResult<String> {
        serde_json::to_string(&self.session.preferences()).map_err(to_py_err)
    }
}
