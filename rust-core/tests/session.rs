use std::cell::RefCell;
use std::f64::consts::PI;
use std::rc::Rc;

use serde_json::Value;
use spectrum_correlator::peaks::PeakCriteria;
use spectrum_correlator::settings::PreferenceError;
use spectrum_correlator::{
    AnalysisSession, Averaging, Column, DataTable, MemoryStore, PreferenceStore, SampleTable,
    SpectralError, TimeRange, TraceId, TransformSettings,
};

const FS: f64 = 100.0;
const N: usize = 1000;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn tone_table(fx_amplitude: f64) -> DataTable {
    let time: Vec<f64> = (0..N).map(|i| i as f64 / FS).collect();
    let fx = time
        .iter()
        .map(|t| fx_amplitude * (2.0 * PI * 2.0 * t).sin())
        .collect();
    let fy = time.iter().map(|t| (2.0 * PI * 5.0 * t).cos()).collect();

    DataTable::new()
        .with_column("Time", Column::Numeric(time))
        .with_column("Fx", Column::Numeric(fx))
        .with_column("Fy", Column::Numeric(fy))
}

fn direct_settings() -> TransformSettings {
    TransformSettings {
        averaging: Averaging::None,
        n_exp: None,
        detrend: false,
        ..Default::default()
    }
}

/// Store whose document stays visible to the test after the session takes it
#[derive(Clone, Default)]
struct SharedStore(Rc<RefCell<Option<Value>>>);

impl PreferenceStore for SharedStore {
    fn load(&self) -> Result<Option<Value>, PreferenceError> {
        Ok(self.0.borrow().clone())
    }

    fn save(&mut self, value: &Value) -> Result<(), PreferenceError> {
        *self.0.borrow_mut() = Some(value.clone());
        Ok(())
    }
}

struct BrokenStore;

impl PreferenceStore for BrokenStore {
    fn load(&self) -> Result<Option<Value>, PreferenceError> {
        Err(PreferenceError::Storage("disk unavailable".into()))
    }

    fn save(&mut self, _value: &Value) -> Result<(), PreferenceError> {
        Err(PreferenceError::Storage("disk unavailable".into()))
    }
}

#[test]
fn test_batch_skips_failing_traces() {
    init_logging();
    let run_a = tone_table(1.0);
    let run_b = tone_table(3.0);
    let empty = DataTable::new();
    let sources: [(&str, &dyn SampleTable); 3] =
        [("run_a", &run_a), ("run_b", &run_b), ("run_c", &empty)];

    let mut session = AnalysisSession::new(Box::new(MemoryStore::new()));
    session.update_settings(direct_settings());
    let report = session.compute_batch(&sources, &["Fx", "Fy", "Mz"], "Time", TimeRange::all());

    assert_eq!(report.results.len(), 4);
    assert_eq!(report.skipped.len(), 5);
    assert!(!report.is_complete());
    assert_eq!(session.cache().len(), 4);

    let missing = report
        .skipped
        .iter()
        .find(|(id, _)| id == &TraceId::new("Mz", "run_a"))
        .unwrap();
    assert!(matches!(&missing.1, SpectralError::MissingColumns(names) if names == &["Mz"]));

    let (_, empty_err) = report
        .skipped
        .iter()
        .find(|(id, _)| id.source == "run_c")
        .unwrap();
    assert!(matches!(empty_err, SpectralError::EmptyInput));
}

#[test]
fn test_click_correlates_across_traces() {
    init_logging();
    let run_a = tone_table(1.0);
    let run_b = tone_table(3.0);
    let sources: [(&str, &dyn SampleTable); 2] = [("run_a", &run_a), ("run_b", &run_b)];

    let mut session = AnalysisSession::new(Box::new(MemoryStore::new()));
    session.update_settings(direct_settings());
    session.compute_batch(&sources, &["Fx", "Fy"], "Time", TimeRange::all());

    let batch = session.select_frequency(2.0).unwrap();
    assert_eq!(batch.len(), 4);
    assert_eq!(batch[0].trace, TraceId::new("Fx", "run_b"));
    assert!((batch[0].magnitude - 3.0).abs() < 1e-6);
    assert!(batch.iter().all(|r| r.frequency_label == "2.0000"));
    assert!(batch.iter().all(|r| r.phase.is_none()));

    let before = session.peaks().records().to_vec();
    session.select_frequency(2.0).unwrap();
    assert_eq!(session.peaks().records(), before.as_slice());

    // Far outside every axis: nothing changes
    assert!(session.select_frequency(400.0).unwrap().is_empty());
    assert_eq!(session.peaks().len(), 4);
}

#[test]
fn test_detect_peaks_then_phase() {
    init_logging();
    let run_a = tone_table(1.0);
    let run_b = tone_table(3.0);
    let sources: [(&str, &dyn SampleTable); 2] = [("run_a", &run_a), ("run_b", &run_b)];

    let mut session = AnalysisSession::new(Box::new(MemoryStore::new()));
    session.update_settings(direct_settings());
    session.compute_batch(&sources, &["Fx"], "Time", TimeRange::all());

    let peaks = session.detect_peaks(&PeakCriteria::default()).unwrap();
    assert_eq!(peaks.len(), 1);
    assert!((peaks.frequencies[0] - 2.0).abs() < 1e-6);
    assert_eq!(session.peaks().groups(), vec!["2.0000"]);

    session.clear_peaks();
    let report = session.compute_phase_batch(&sources, &["Fy"], "Time", TimeRange::all());
    assert!(report.is_complete());
    for (_, result) in &report.results {
        let phase = result.phase.as_ref().unwrap();
        assert_eq!(phase.len(), result.freq.len());
        assert!(phase.windows(2).all(|w| (w[1] - w[0]).abs() <= PI + 1e-12));
    }

    let batch = session.select_frequency(5.0).unwrap();
    assert_eq!(batch.len(), 2);
    assert!(batch.iter().all(|r| r.phase.is_some()));
}

#[test]
fn test_annotations_are_persisted() {
    init_logging();
    let store = SharedStore::default();
    let mut session = AnalysisSession::new(Box::new(store.clone()));

    session.add_harmonics(60.0, None).unwrap();
    assert_eq!(session.add_harmonics(60.0, None).unwrap(), 0);
    session.add_annotations("2.5, 7", Some("tower")).unwrap();
    assert_eq!(session.annotations().len(), 9);

    let saved = store.0.borrow().clone().unwrap();
    let saved_annotations = saved["custom_annotations"].as_array().unwrap();
    assert_eq!(saved_annotations.len(), 9);
    assert_eq!(saved_annotations[2]["label"], "tower");

    // A new session picks the list back up
    let reopened = AnalysisSession::new(Box::new(store.clone()));
    assert_eq!(reopened.annotations(), session.annotations());

    session.remove_annotation(0).unwrap();
    session.clear_annotations();
    assert!(store.0.borrow().as_ref().unwrap()["custom_annotations"]
        .as_array()
        .unwrap()
        .is_empty());
}

#[test]
fn test_storage_failures_do_not_abort() {
    init_logging();
    let mut session = AnalysisSession::new(Box::new(BrokenStore));

    assert_eq!(session.settings(), &TransformSettings::default());
    session.update_settings(direct_settings());
    assert_eq!(session.settings().averaging, Averaging::None);
    assert_eq!(session.add_annotations("1", None).unwrap(), 1);
}
